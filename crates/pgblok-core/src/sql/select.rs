use crate::sql::expr::{ColumnRef, Expr};

/// Alias given to a composed query when it is reduced to a sub-selectable.
pub const SUBQUERY_ALIAS: &str = "anon_1";

///
/// Projection
/// One labelled output column of a select.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub expr: Expr,
    pub label: String,
}

///
/// Source
///

#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    Table(String),
    Subquery(Box<Selectable>),
}

///
/// FromItem
///

#[derive(Clone, Debug, PartialEq)]
pub struct FromItem {
    pub source: Source,
    pub alias: String,
}

impl FromItem {
    /// Whether the alias differs from the bare table name and must be rendered.
    #[must_use]
    pub fn is_aliased(&self) -> bool {
        match &self.source {
            Source::Table(name) => name != &self.alias,
            Source::Subquery(_) => true,
        }
    }
}

///
/// Select
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Select {
    pub columns: Vec<Projection>,
    pub from: Vec<FromItem>,
    pub filter: Option<Expr>,
}

impl Select {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn column(mut self, expr: impl Into<Expr>, label: &str) -> Self {
        self.columns.push(Projection {
            expr: expr.into(),
            label: label.to_string(),
        });
        self
    }

    #[must_use]
    pub fn from_table(self, table: &str) -> Self {
        self.from_aliased(table, table)
    }

    #[must_use]
    pub fn from_aliased(mut self, table: &str, alias: &str) -> Self {
        self.from.push(FromItem {
            source: Source::Table(table.to_string()),
            alias: alias.to_string(),
        });
        self
    }

    #[must_use]
    pub fn from_subquery(mut self, sub: impl Into<Selectable>, alias: &str) -> Self {
        self.from.push(FromItem {
            source: Source::Subquery(Box::new(sub.into())),
            alias: alias.to_string(),
        });
        self
    }

    /// Add a predicate; repeated calls are conjoined.
    #[must_use]
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|p| p.label.as_str())
    }
}

///
/// Selectable
///
/// Anything with a named projection that can back a materialized view.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Selectable {
    Select(Select),
    /// `UNION` of selects; output names come from the first branch.
    Union(Vec<Select>),
}

impl Selectable {
    #[must_use]
    pub const fn union(selects: Vec<Select>) -> Self {
        Self::Union(selects)
    }

    /// Projected output column names, in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        match self {
            Self::Select(select) => select.column_names().collect(),
            Self::Union(selects) => selects
                .first()
                .map(|s| s.column_names().collect())
                .unwrap_or_default(),
        }
    }
}

impl From<Select> for Selectable {
    fn from(select: Select) -> Self {
        Self::Select(select)
    }
}

///
/// Query
///
/// Composed query object. It is never rendered directly; the view layer
/// reduces it to a sub-selectable first.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    inner: Selectable,
}

impl Query {
    #[must_use]
    pub fn new(inner: impl Into<Selectable>) -> Self {
        Self {
            inner: inner.into(),
        }
    }

    /// Reduce to `SELECT anon_1.<col>, ... FROM (<inner>) AS anon_1`.
    #[must_use]
    pub fn subquery(self) -> Selectable {
        let names: Vec<String> = self
            .inner
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut select = Select::new().from_subquery(self.inner, SUBQUERY_ALIAS);
        for name in &names {
            select = select.column(ColumnRef::new(SUBQUERY_ALIAS, name.as_str()), name);
        }

        Selectable::Select(select)
    }
}

///
/// ViewQuery
/// Result of a view-declaration function.
///

#[derive(Clone, Debug, PartialEq)]
pub enum ViewQuery {
    Selectable(Selectable),
    Query(Query),
}

impl ViewQuery {
    #[must_use]
    pub fn into_selectable(self) -> Selectable {
        match self {
            Self::Selectable(selectable) => selectable,
            Self::Query(query) => query.subquery(),
        }
    }
}

impl From<Select> for ViewQuery {
    fn from(select: Select) -> Self {
        Self::Selectable(select.into())
    }
}

impl From<Selectable> for ViewQuery {
    fn from(selectable: Selectable) -> Self {
        Self::Selectable(selectable)
    }
}

impl From<Query> for ViewQuery {
    fn from(query: Query) -> Self {
        Self::Query(query)
    }
}
