use pgblok::{
    DeclarationError, Error, ErrorClass,
    core::{
        obs::{metrics_report, metrics_reset_all},
        sql::{DdlPhase, DdlStatement, Expr},
        test_support::{EngineError, MemoryEngine, MemoryMapper, MemoryRelation, Row},
        traits::Session,
    },
    prelude::*,
};

// ------------------------------------------------------------------
// fixtures
// ------------------------------------------------------------------

fn engine() -> MemoryEngine {
    let mut engine = MemoryEngine::new();
    engine
        .create_table("t1", &["id", "code", "val", "parent_id", "rs_id"])
        .unwrap();
    engine.create_table("t2", &["id", "code", "val"]).unwrap();
    engine.create_table("rs", &["id"]).unwrap();

    engine
}

fn bind_all(
    engine: &mut MemoryEngine,
    tables: &[ModelDeclaration],
    views: &[ModelDeclaration],
) -> Result<Vec<ViewModel<MemoryMapper>>, Error> {
    let mut build = RegistryBuild::new(engine);
    for table in tables {
        build.add_table_model(table)?;
    }

    views.iter().map(|decl| build.add_view_model(decl)).collect()
}

fn bind_one(engine: &mut MemoryEngine, decl: &ModelDeclaration) -> ViewModel<MemoryMapper> {
    bind_all(engine, &[], std::slice::from_ref(decl))
        .unwrap()
        .remove(0)
}

fn test_view() -> ModelDeclaration {
    ModelDeclaration::new("Model.TestView")
        .column(string("code").primary_key())
        .column(integer("val1"))
        .column(integer("val2"))
        .view_declaration(|| {
            Select::new()
                .column(col("t1", "code"), "code")
                .column(col("t1", "val"), "val1")
                .column(col("t2", "val"), "val2")
                .from_table("t1")
                .from_table("t2")
                .filter(col("t1", "code").equals(col("t2", "code")))
                .into()
        })
}

fn insert_pair(engine: &mut MemoryEngine, code: &str, val1: i64, val2: i64) {
    engine
        .insert("t1", [("code", Value::from(code)), ("val", Value::Int(val1))])
        .unwrap();
    engine
        .insert("t2", [("code", Value::from(code)), ("val", Value::Int(val2))])
        .unwrap();
}

fn first_where(engine: &MemoryEngine, view: &str, code: &str) -> Row {
    engine
        .select_where(view, "code", &Value::from(code))
        .unwrap()
        .into_iter()
        .next()
        .unwrap()
}

// ------------------------------------------------------------------
// shared views
// ------------------------------------------------------------------

#[test]
fn every_reuse_style_shares_one_descriptor() {
    let mut engine = engine();

    let models = bind_all(
        &mut engine,
        &[],
        &[
            test_view(),
            ModelDeclaration::new("Model.TestView2")
                .tablename("testview")
                .column(string("code").primary_key())
                .column(integer("val1")),
            ModelDeclaration::new("Model.TestView3")
                .view_of("Model.TestView")
                .column(string("code").primary_key()),
            ModelDeclaration::new("Model.TestView4")
                .inherits("Model.TestView")
                .column(string("code").primary_key())
                .column(integer("val2")),
        ],
    )
    .unwrap();

    for other in &models[1..] {
        assert!(models[0].shares_view_with(other), "{}", other.name());
        assert_eq!(other.tablename(), "testview");
    }

    let creates = engine
        .scheduled()
        .iter()
        .filter(|(_, s)| matches!(s, DdlStatement::CreateMaterializedView(_)))
        .count();
    assert_eq!(creates, 1);
}

#[test]
fn inheriting_from_an_unbound_parent_builds_its_own_view() {
    let mut engine = engine();

    let model = bind_one(
        &mut engine,
        &ModelDeclaration::new("Model.Child")
            .inherits("Model.Nowhere")
            .column(integer("id").primary_key())
            .view_declaration(|| Select::new().column(col("rs", "id"), "id").from_table("rs").into()),
    );

    assert_eq!(model.tablename(), "child");
}

#[test]
fn rebuild_starts_from_an_empty_registry() {
    let mut engine = engine();

    let first = bind_one(&mut engine, &test_view());
    let second = bind_one(&mut engine, &test_view());

    assert!(!first.shares_view_with(&second));
    assert_eq!(engine.scheduled().len(), 6);
}

// ------------------------------------------------------------------
// declaration errors
// ------------------------------------------------------------------

#[test]
fn view_without_primary_key_fails_registry_build() {
    let mut engine = engine();
    let decl = ModelDeclaration::new("Model.TestView")
        .column(string("code"))
        .view_declaration(|| Select::new().column(col("t1", "code"), "code").from_table("t1").into());

    let err = bind_all(&mut engine, &[], &[decl]).unwrap_err();

    assert_eq!(err.class(), ErrorClass::Declaration);
    assert_eq!(
        err.as_declaration(),
        Some(&DeclarationError::MissingPrimaryKey {
            model: "Model.TestView".to_string()
        })
    );
    assert!(engine.scheduled().is_empty());
}

#[test]
fn primary_key_without_view_declaration_fails_registry_build() {
    let mut engine = engine();
    let decl = ModelDeclaration::new("Model.TestView").column(string("code").primary_key());

    let err = bind_all(&mut engine, &[], &[decl]).unwrap_err();

    assert!(matches!(
        err.as_declaration(),
        Some(DeclarationError::MissingViewDeclaration { model }) if model == "Model.TestView"
    ));
    assert!(engine.scheduled().is_empty());
}

#[test]
fn mapper_errors_propagate_unchanged() {
    let mut engine = engine();
    engine.fail_mappers_with("mapper rejected the view");

    let err = bind_all(&mut engine, &[], &[test_view()]).unwrap_err();

    assert_eq!(err.class(), ErrorClass::Collaborator);
    assert_eq!(err.to_string(), "mapper rejected the view");
    assert!(engine.scheduled().is_empty());

    engine.create_all().unwrap();
    assert!(engine.relation("testview").is_none());
}

// ------------------------------------------------------------------
// population and refresh
// ------------------------------------------------------------------

#[test]
fn view_with_no_data_fails_until_refreshed() {
    let mut engine = engine();
    let model = bind_one(&mut engine, &test_view().with_data(false));
    insert_pair(&mut engine, "test1", 1, 2);
    engine.flush().unwrap();
    engine.create_all().unwrap();

    let err = engine.select("testview").unwrap_err();
    assert_eq!(
        err,
        EngineError::NotPopulated {
            view: "testview".to_string()
        }
    );
    assert_eq!(
        err.to_string(),
        "materialized view \"testview\" has not been populated"
    );

    model.refresh_materialized_view(&mut engine, false).unwrap();
    assert_eq!(engine.select("testview").unwrap().len(), 1);
}

#[test]
fn view_with_data_is_populated_at_creation() {
    let mut engine = engine();
    bind_one(&mut engine, &test_view());
    insert_pair(&mut engine, "test1", 1, 2);
    engine.flush().unwrap();
    engine.create_all().unwrap();

    let row = first_where(&engine, "testview", "test1");
    assert_eq!(row["val1"], Value::Int(1));
    assert_eq!(row["val2"], Value::Int(2));

    let create = &engine.executed()[1];
    assert!(create.starts_with("CREATE MATERIALIZED VIEW testview AS SELECT"));
    assert!(!create.contains("WITH"));
}

#[test]
fn refresh_shows_new_rows_exactly_once() {
    let mut engine = engine();
    let model = bind_one(&mut engine, &test_view());
    insert_pair(&mut engine, "test1", 1, 2);
    engine.flush().unwrap();
    engine.create_all().unwrap();
    assert_eq!(engine.select("testview").unwrap().len(), 1);

    // staged, not yet flushed: refresh must flush first
    insert_pair(&mut engine, "test2", 3, 4);
    assert_eq!(engine.select("testview").unwrap().len(), 1);

    model.refresh_materialized_view(&mut engine, false).unwrap();
    let after_first = engine.select("testview").unwrap();
    assert_eq!(after_first.len(), 2);
    assert_eq!(first_where(&engine, "testview", "test2")["val2"], Value::Int(4));

    model.refresh_materialized_view(&mut engine, false).unwrap();
    assert_eq!(engine.select("testview").unwrap(), after_first);
}

#[test]
fn test_view_scenario() {
    let mut engine = engine();
    let model = bind_one(&mut engine, &test_view());
    engine.create_all().unwrap();

    insert_pair(&mut engine, "test1", 1, 2);
    model.refresh_materialized_view(&mut engine, false).unwrap();

    let row = first_where(&engine, model.tablename(), "test1");
    assert_eq!(row["code"], Value::from("test1"));
    assert_eq!(row["val1"], Value::Int(1));
    assert_eq!(row["val2"], Value::Int(2));
}

#[test]
fn concurrent_refresh_requires_a_unique_index() {
    let mut engine = engine();
    let model = bind_one(&mut engine, &test_view());
    engine.create_all().unwrap();

    let err = model
        .refresh_materialized_view(&mut engine, true)
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "cannot refresh materialized view \"testview\" concurrently"
    );
}

#[test]
fn concurrent_refresh_with_unique_index() {
    let mut engine = engine();
    let model = bind_one(&mut engine, &test_view().unique_index(&["code"]));
    engine.create_all().unwrap();
    assert!(engine.has_unique_index("testview"));

    insert_pair(&mut engine, "test1", 1, 2);
    model.refresh_materialized_view(&mut engine, true).unwrap();

    assert_eq!(engine.select("testview").unwrap().len(), 1);
    assert_eq!(
        engine.executed().last().map(String::as_str),
        Some("REFRESH MATERIALIZED VIEW CONCURRENTLY testview")
    );
}

#[test]
fn configured_refresh_mode_is_used() {
    let mut engine = engine();
    let model = bind_one(&mut engine, &test_view());
    engine.create_all().unwrap();

    let config = Config::from_toml_str("[view]\nrefresh_concurrently = true\n").unwrap();
    let err = model.refresh(&mut engine, &config).unwrap_err();

    assert!(matches!(err, EngineError::ConcurrentRefreshWithoutIndex { .. }));
}

#[test]
fn refresh_metrics_are_counted() {
    metrics_reset_all();
    let mut engine = engine();
    let model = bind_one(&mut engine, &test_view());
    engine.create_all().unwrap();

    model.refresh_materialized_view(&mut engine, false).unwrap();
    model.refresh_materialized_view(&mut engine, true).unwrap_err();

    let report = metrics_report();
    assert_eq!(report.ops.refreshes, 1);
    assert_eq!(report.views["testview"].refreshes, 1);
}

// ------------------------------------------------------------------
// lifecycle
// ------------------------------------------------------------------

#[test]
fn views_are_read_only() {
    let mut engine = engine();
    bind_one(&mut engine, &test_view());
    engine.create_all().unwrap();

    let err = engine
        .insert("testview", [("code", Value::from("x"))])
        .unwrap_err();

    assert_eq!(err.to_string(), "cannot change materialized view \"testview\"");
}

#[test]
fn drop_all_removes_the_view() {
    let mut engine = engine();
    bind_one(&mut engine, &test_view());
    engine.create_all().unwrap();
    assert!(matches!(
        engine.relation("testview"),
        Some(MemoryRelation::MaterializedView { .. })
    ));

    engine.drop_all().unwrap();
    assert!(engine.relation("testview").is_none());
    assert!(matches!(
        engine.relation("t1"),
        Some(MemoryRelation::Table { .. })
    ));

    // drop is idempotent, so a second create pass starts clean
    engine.create_all().unwrap();
    assert!(engine.relation("testview").is_some());
}

#[test]
fn scheduled_phases_follow_the_schema_lifecycle() {
    let mut engine = engine();
    bind_one(&mut engine, &test_view().with_data(false));

    let phases: Vec<DdlPhase> = engine.scheduled().iter().map(|(p, _)| *p).collect();
    assert_eq!(
        phases,
        vec![
            DdlPhase::BeforeCreate,
            DdlPhase::AfterCreate,
            DdlPhase::AfterCreate,
            DdlPhase::BeforeDrop,
        ]
    );
}

// ------------------------------------------------------------------
// relations
// ------------------------------------------------------------------

#[test]
fn many2one_resolves_related_row() {
    let mut engine = engine();
    let rs = ModelDeclaration::new("Model.Rs").column(integer("id").primary_key());
    let view = ModelDeclaration::new("Model.TestView")
        .column(string("code").primary_key())
        .column(integer("rs_id"))
        .relation(Many2One::new("rs", "Model.Rs"))
        .view_declaration(|| {
            Select::new()
                .column(col("t1", "code"), "code")
                .column(col("t1", "rs_id"), "rs_id")
                .from_table("t1")
                .into()
        });

    let model = bind_all(&mut engine, &[rs], &[view]).unwrap().remove(0);
    engine.create_all().unwrap();

    let related = engine.insert("rs", Vec::<(&str, Value)>::new()).unwrap();
    let rs_id = related["id"].clone();
    engine
        .insert("t1", [("code", Value::from("test")), ("rs_id", rs_id.clone())])
        .unwrap();
    model.refresh_materialized_view(&mut engine, false).unwrap();

    let row = first_where(&engine, "testview", "test");
    let target = engine.related(model.mapper(), &row, "rs").unwrap().unwrap();
    assert_eq!(target["id"], rs_id);
}

#[test]
fn self_referencing_view_exposes_parent() {
    let mut engine = engine();

    let view = ModelDeclaration::new("Model.TestView")
        .column(string("code").primary_key())
        .column(integer("val"))
        .column(string("parent_code"))
        .relation(Many2One::new("parent", "Model.TestView").column_names(&["parent_code"]))
        .view_declaration(|| {
            let with_parent = Select::new()
                .column(col("t1", "code"), "code")
                .column(col("t1", "val"), "val")
                .column(col("tp", "code"), "parent_code")
                .from_table("t1")
                .from_aliased("t1", "tp")
                .filter(col("t1", "parent_id").equals(col("tp", "id")));
            let without_parent = Select::new()
                .column(col("t1", "code"), "code")
                .column(col("t1", "val"), "val")
                .column(Expr::Null, "parent_code")
                .from_table("t1")
                .filter(col("t1", "parent_id").is_null());

            Query::new(Selectable::union(vec![with_parent, without_parent])).into()
        });

    let model = bind_one(&mut engine, &view);
    engine.create_all().unwrap();

    let parent = engine
        .insert("t1", [("code", Value::from("test1")), ("val", Value::Int(1))])
        .unwrap();
    engine
        .insert(
            "t1",
            [
                ("code", Value::from("test2")),
                ("val", Value::Int(3)),
                ("parent_id", parent["id"].clone()),
            ],
        )
        .unwrap();
    model.refresh_materialized_view(&mut engine, false).unwrap();

    let v1 = first_where(&engine, "testview", "test1");
    let v2 = first_where(&engine, "testview", "test2");

    assert_eq!(engine.related(model.mapper(), &v1, "parent").unwrap(), None);
    let p2 = engine.related(model.mapper(), &v2, "parent").unwrap().unwrap();
    assert_eq!(p2["code"], v1["code"]);

    let create = engine
        .executed()
        .iter()
        .find(|sql| sql.starts_with("CREATE MATERIALIZED VIEW"))
        .unwrap();
    assert!(create.contains("UNION"));
    assert!(create.contains(") AS anon_1"));
}
