use super::{render::quote_ident, render::quote_literal, *};
use crate::value::{Oid, Value};
use proptest::prelude::*;

fn test_view_select() -> Select {
    Select::new()
        .column(col("t1", "code"), "code")
        .column(col("t1", "val"), "val1")
        .column(col("t2", "val"), "val2")
        .from_table("t1")
        .from_table("t2")
        .filter(col("t1", "code").equals(col("t2", "code")))
}

#[test]
fn create_renders_select_inline() {
    let sql = compile_create("testview", &test_view_select().into());

    assert_eq!(
        sql,
        "CREATE MATERIALIZED VIEW testview AS SELECT t1.code AS code, t1.val AS val1, \
         t2.val AS val2 FROM t1, t2 WHERE t1.code = t2.code"
    );
}

#[test]
fn create_inlines_bound_values_as_literals() {
    let select = Select::new()
        .column(col("t1", "code"), "code")
        .from_table("t1")
        .filter(col("t1", "code").equals(bind("it's")))
        .filter(col("t1", "val").equals(bind(3)));

    let sql = compile_create("v", &select.into());

    assert!(sql.ends_with("WHERE (t1.code = 'it''s') AND (t1.val = 3)"), "{sql}");
    assert!(!sql.contains('$'));
    assert!(!sql.contains("%("));
}

#[test]
fn mixed_case_view_names_are_quoted() {
    let select: Selectable = Select::new().column(bind(1), "a").into();

    assert_eq!(
        compile_create("TestView", &select),
        "CREATE MATERIALIZED VIEW \"TestView\" AS SELECT 1 AS a"
    );
    assert_eq!(
        compile_drop("TestView"),
        "DROP MATERIALIZED VIEW IF EXISTS \"TestView\""
    );
}

#[test]
fn drop_is_idempotent_text() {
    assert_eq!(
        compile_drop("testview"),
        "DROP MATERIALIZED VIEW IF EXISTS testview"
    );
}

#[test]
fn refresh_text_with_and_without_concurrently() {
    assert_eq!(
        compile_refresh("testview", false),
        "REFRESH MATERIALIZED VIEW testview"
    );
    assert_eq!(
        compile_refresh("testview", true),
        "REFRESH MATERIALIZED VIEW CONCURRENTLY testview"
    );
    assert_eq!(
        RefreshMaterializedView::with_no_data("testview").to_string(),
        "REFRESH MATERIALIZED VIEW testview WITH NO DATA"
    );
}

#[test]
fn unique_index_text() {
    let stmt = CreateUniqueIndex::for_view("testview", &["code".to_string()]);

    assert_eq!(
        stmt.to_string(),
        "CREATE UNIQUE INDEX testview_code_uidx ON testview (code)"
    );
}

#[test]
fn ddl_statement_reports_target_view() {
    let stmt: DdlStatement = DropMaterializedView {
        name: "v".to_string(),
    }
    .into();

    assert_eq!(stmt.view_name(), "v");
    assert_eq!(stmt.to_sql(), "DROP MATERIALIZED VIEW IF EXISTS v");
}

#[test]
fn phases_display_as_lifecycle_hooks() {
    assert_eq!(DdlPhase::BeforeCreate.to_string(), "before-create");
    assert_eq!(DdlPhase::AfterCreate.to_string(), "after-create");
    assert_eq!(DdlPhase::BeforeDrop.to_string(), "before-drop");
}

#[test]
fn union_with_aliased_self_join() {
    let with_parent = Select::new()
        .column(col("t1", "code"), "code")
        .column(col("tp", "code"), "parent_code")
        .from_table("t1")
        .from_aliased("t1", "tp")
        .filter(col("t1", "parent_id").equals(col("tp", "id")));
    let without_parent = Select::new()
        .column(col("t1", "code"), "code")
        .column(Expr::Null, "parent_code")
        .from_table("t1")
        .filter(col("t1", "parent_id").is_null());

    let sql = render_selectable(&Selectable::union(vec![with_parent, without_parent]));

    assert_eq!(
        sql,
        "SELECT t1.code AS code, tp.code AS parent_code FROM t1, t1 AS tp \
         WHERE t1.parent_id = tp.id UNION SELECT t1.code AS code, NULL AS parent_code \
         FROM t1 WHERE t1.parent_id IS NULL"
    );
}

#[test]
fn query_reduces_to_subquery() {
    let selectable = Query::new(test_view_select()).subquery();

    assert_eq!(selectable.column_names(), vec!["code", "val1", "val2"]);
    assert_eq!(
        render_selectable(&selectable),
        "SELECT anon_1.code AS code, anon_1.val1 AS val1, anon_1.val2 AS val2 FROM \
         (SELECT t1.code AS code, t1.val AS val1, t2.val AS val2 FROM t1, t2 \
         WHERE t1.code = t2.code) AS anon_1"
    );
}

#[test]
fn view_query_passes_selectables_through() {
    let direct: ViewQuery = test_view_select().into();
    assert_eq!(direct.into_selectable(), test_view_select().into());

    let composed: ViewQuery = Query::new(test_view_select()).into();
    assert!(matches!(
        composed.into_selectable(),
        Selectable::Select(Select { ref from, .. }) if matches!(from[0].source, Source::Subquery(_))
    ));
}

#[test]
fn identifiers_are_quoted_only_when_needed() {
    assert_eq!(quote_ident("testview"), "testview");
    assert_eq!(quote_ident("_v2"), "_v2");
    assert_eq!(quote_ident("TestView"), "\"TestView\"");
    assert_eq!(quote_ident("2view"), "\"2view\"");
    assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
}

#[test]
fn literal_forms() {
    assert_eq!(render_literal(&Value::Null), "NULL");
    assert_eq!(render_literal(&Value::Bool(true)), "true");
    assert_eq!(render_literal(&Value::Int(-4)), "-4");
    assert_eq!(render_literal(&Value::Float(1.0)), "1.0");
    assert_eq!(render_literal(&Value::Float(f64::NAN)), "'NaN'::float8");
    assert_eq!(
        render_literal(&Value::Float(f64::NEG_INFINITY)),
        "'-Infinity'::float8"
    );
    assert_eq!(
        render_literal(&Value::Bytes(vec![0xde, 0xad])),
        "'\\xdead'::bytea"
    );
    assert_eq!(
        render_literal(&Value::Json(serde_json::json!({"a": [1, null]}))),
        "'{\"a\":[1,null]}'::jsonb"
    );
    assert_eq!(render_literal(&Value::Oid(Oid(42))), "42::oid");
}

proptest! {
    #[test]
    fn quoted_literal_round_trips(text in ".*") {
        let quoted = quote_literal(&text);

        prop_assert!(quoted.starts_with('\'') && quoted.ends_with('\''));
        let body = &quoted[1..quoted.len() - 1];
        prop_assert_eq!(body.replace("''", "'"), text);
        // Every quote inside the body is doubled, so none can terminate it.
        prop_assert_eq!(body.matches('\'').count() % 2, 0);
    }

    #[test]
    fn quoted_ident_never_leaks_a_lone_quote(ident in "[A-Za-z0-9_\"]{1,16}") {
        let quoted = quote_ident(&ident);

        if quoted.starts_with('"') {
            let body = &quoted[1..quoted.len() - 1];
            prop_assert_eq!(body.replace("\"\"", "\""), ident);
        } else {
            prop_assert_eq!(quoted, ident);
        }
    }
}
