//! PostgreSQL text rendering with every bound value inlined as a literal.
//!
//! Materialized views have no runtime parameters, so nothing here emits
//! placeholders.

use crate::{
    sql::{
        expr::Expr,
        select::{FromItem, Select, Selectable, Source},
    },
    value::Value,
};
use std::fmt::Write as _;

/// Quote an identifier unless it is a plain lower-case name.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    let bare = !ident.is_empty()
        && ident
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if bare {
        ident.to_string()
    } else {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

/// Quote a string literal, doubling embedded single quotes.
#[must_use]
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Render one value as an inline SQL literal.
#[must_use]
pub fn render_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => render_float(*v),
        Value::Text(v) => quote_literal(v),
        Value::Bytes(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2 + 2);
            hex.push_str("\\x");
            for b in bytes {
                let _ = write!(hex, "{b:02x}");
            }
            format!("{}::bytea", quote_literal(&hex))
        }
        Value::Json(json) => format!("{}::jsonb", quote_literal(&json.to_string())),
        Value::Oid(oid) => format!("{oid}::oid"),
    }
}

fn render_float(v: f64) -> String {
    if v.is_nan() {
        "'NaN'::float8".to_string()
    } else if v.is_infinite() {
        if v.is_sign_positive() {
            "'Infinity'::float8".to_string()
        } else {
            "'-Infinity'::float8".to_string()
        }
    } else {
        // `{:?}` keeps a trailing `.0` so the literal stays a float.
        format!("{v:?}")
    }
}

/// Render an expression.
#[must_use]
pub fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Column(col) => format!("{}.{}", quote_ident(&col.source), quote_ident(&col.name)),
        Expr::Bind(value) => render_literal(value),
        Expr::Null => "NULL".to_string(),
        Expr::Eq(lhs, rhs) => format!("{} = {}", render_operand(lhs), render_operand(rhs)),
        Expr::IsNull(inner) => format!("{} IS NULL", render_operand(inner)),
        Expr::IsNotNull(inner) => format!("{} IS NOT NULL", render_operand(inner)),
        Expr::And(terms) => terms
            .iter()
            .map(render_operand)
            .collect::<Vec<_>>()
            .join(" AND "),
    }
}

// Parenthesize compound operands so precedence never depends on context.
fn render_operand(expr: &Expr) -> String {
    match expr {
        Expr::Column(_) | Expr::Bind(_) | Expr::Null => render_expr(expr),
        _ => format!("({})", render_expr(expr)),
    }
}

/// Render a selectable as standalone SQL text.
#[must_use]
pub fn render_selectable(selectable: &Selectable) -> String {
    match selectable {
        Selectable::Select(select) => render_select(select),
        Selectable::Union(selects) => selects
            .iter()
            .map(render_select)
            .collect::<Vec<_>>()
            .join(" UNION "),
    }
}

fn render_select(select: &Select) -> String {
    let mut sql = String::from("SELECT ");

    let columns = select
        .columns
        .iter()
        .map(|p| format!("{} AS {}", render_expr(&p.expr), quote_ident(&p.label)))
        .collect::<Vec<_>>()
        .join(", ");
    sql.push_str(&columns);

    if !select.from.is_empty() {
        let from = select
            .from
            .iter()
            .map(render_from_item)
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(" FROM ");
        sql.push_str(&from);
    }

    if let Some(filter) = &select.filter {
        sql.push_str(" WHERE ");
        sql.push_str(&render_expr(filter));
    }

    sql
}

fn render_from_item(item: &FromItem) -> String {
    match &item.source {
        Source::Table(name) if item.is_aliased() => {
            format!("{} AS {}", quote_ident(name), quote_ident(&item.alias))
        }
        Source::Table(name) => quote_ident(name),
        Source::Subquery(sub) => {
            format!("({}) AS {}", render_selectable(sub), quote_ident(&item.alias))
        }
    }
}
