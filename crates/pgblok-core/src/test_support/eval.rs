use crate::{
    sql::{ColumnRef, Expr, FromItem, Select, Selectable, Source},
    test_support::engine::{EngineError, Relation, Row},
    value::Value,
};
use std::collections::BTreeMap;

// One joined input row: FROM-item alias -> its row.
type Env = Vec<(String, Row)>;

/// Evaluate a selectable against the current relations.
pub(super) fn evaluate(
    relations: &BTreeMap<String, Relation>,
    selectable: &Selectable,
) -> Result<Vec<Row>, EngineError> {
    match selectable {
        Selectable::Select(select) => {
            let names = select.column_names().collect::<Vec<_>>();
            let tuples = evaluate_select(relations, select)?;

            Ok(tuples.into_iter().map(|t| named(&names, t)).collect())
        }
        Selectable::Union(selects) => {
            let names = selectable.column_names();
            let mut tuples: Vec<Vec<Value>> = Vec::new();
            for select in selects {
                for tuple in evaluate_select(relations, select)? {
                    if !tuples.contains(&tuple) {
                        tuples.push(tuple);
                    }
                }
            }

            Ok(tuples.into_iter().map(|t| named(&names, t)).collect())
        }
    }
}

fn named(names: &[&str], tuple: Vec<Value>) -> Row {
    names
        .iter()
        .map(|n| (*n).to_string())
        .zip(tuple)
        .collect()
}

fn evaluate_select(
    relations: &BTreeMap<String, Relation>,
    select: &Select,
) -> Result<Vec<Vec<Value>>, EngineError> {
    let mut envs: Vec<Env> = vec![Vec::new()];
    for item in &select.from {
        let rows = source_rows(relations, item)?;
        envs = envs
            .into_iter()
            .flat_map(|env| {
                rows.iter().map(move |row| {
                    let mut next = env.clone();
                    next.push((item.alias.clone(), row.clone()));
                    next
                })
            })
            .collect();
    }

    let mut out = Vec::new();
    for env in envs {
        if let Some(filter) = &select.filter
            && predicate(filter, &env)? != Some(true)
        {
            continue;
        }

        let tuple = select
            .columns
            .iter()
            .map(|p| value(&p.expr, &env))
            .collect::<Result<Vec<_>, _>>()?;
        out.push(tuple);
    }

    Ok(out)
}

fn source_rows(
    relations: &BTreeMap<String, Relation>,
    item: &FromItem,
) -> Result<Vec<Row>, EngineError> {
    match &item.source {
        Source::Table(name) => relations
            .get(name)
            .ok_or_else(|| EngineError::UndefinedRelation { name: name.clone() })?
            .readable_rows(name)
            .map(<[Row]>::to_vec),
        Source::Subquery(sub) => evaluate(relations, sub),
    }
}

fn value(expr: &Expr, env: &Env) -> Result<Value, EngineError> {
    match expr {
        Expr::Column(column) => lookup(column, env),
        Expr::Bind(v) => Ok(v.clone()),
        Expr::Null => Ok(Value::Null),
        Expr::Eq(..) | Expr::IsNull(_) | Expr::IsNotNull(_) | Expr::And(_) => {
            Ok(predicate(expr, env)?.map_or(Value::Null, Value::Bool))
        }
    }
}

// SQL three-valued logic: `None` is UNKNOWN.
fn predicate(expr: &Expr, env: &Env) -> Result<Option<bool>, EngineError> {
    match expr {
        Expr::Eq(left, right) => Ok(value(left, env)?.sql_eq(&value(right, env)?)),
        Expr::IsNull(inner) => Ok(Some(value(inner, env)?.is_null())),
        Expr::IsNotNull(inner) => Ok(Some(!value(inner, env)?.is_null())),
        Expr::And(terms) => {
            let mut unknown = false;
            for term in terms {
                match predicate(term, env)? {
                    Some(false) => return Ok(Some(false)),
                    None => unknown = true,
                    Some(true) => {}
                }
            }

            Ok(if unknown { None } else { Some(true) })
        }
        Expr::Column(_) | Expr::Bind(_) | Expr::Null => match value(expr, env)? {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(b)),
            _ => Err(EngineError::NotBoolean),
        },
    }
}

fn lookup(column: &ColumnRef, env: &Env) -> Result<Value, EngineError> {
    env.iter()
        .find(|(alias, _)| *alias == column.source)
        .and_then(|(_, row)| row.get(&column.name))
        .cloned()
        .ok_or_else(|| EngineError::UndefinedColumn {
            column: format!("{}.{}", column.source, column.name),
        })
}
