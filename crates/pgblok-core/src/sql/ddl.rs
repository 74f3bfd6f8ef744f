//! Materialized-view DDL statements and their PostgreSQL text.

use crate::sql::{
    render::{quote_ident, render_selectable},
    select::Selectable,
};
use std::fmt::{self, Display};

///
/// DdlPhase
/// Schema lifecycle hook a statement is attached to.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum DdlPhase {
    BeforeCreate,
    AfterCreate,
    BeforeDrop,
}

impl DdlPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeCreate => "before-create",
            Self::AfterCreate => "after-create",
            Self::BeforeDrop => "before-drop",
        }
    }
}

impl Display for DdlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// CreateMaterializedView
///

#[derive(Clone, Debug, PartialEq)]
pub struct CreateMaterializedView {
    pub name: String,
    pub selectable: Selectable,
}

impl Display for CreateMaterializedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CREATE MATERIALIZED VIEW {} AS {}",
            quote_ident(&self.name),
            render_selectable(&self.selectable)
        )
    }
}

///
/// DropMaterializedView
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DropMaterializedView {
    pub name: String,
}

impl Display for DropMaterializedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DROP MATERIALIZED VIEW IF EXISTS {}",
            quote_ident(&self.name)
        )
    }
}

///
/// RefreshMaterializedView
///
/// `with_data = false` empties the view and marks it unpopulated; it is never
/// combined with `concurrently`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RefreshMaterializedView {
    pub name: String,
    pub concurrently: bool,
    pub with_data: bool,
}

impl RefreshMaterializedView {
    #[must_use]
    pub fn new(name: &str, concurrently: bool) -> Self {
        Self {
            name: name.to_string(),
            concurrently,
            with_data: true,
        }
    }

    #[must_use]
    pub fn with_no_data(name: &str) -> Self {
        Self {
            name: name.to_string(),
            concurrently: false,
            with_data: false,
        }
    }
}

impl Display for RefreshMaterializedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("REFRESH MATERIALIZED VIEW ")?;
        if self.concurrently {
            f.write_str("CONCURRENTLY ")?;
        }
        f.write_str(&quote_ident(&self.name))?;
        if !self.with_data {
            f.write_str(" WITH NO DATA")?;
        }

        Ok(())
    }
}

///
/// CreateUniqueIndex
/// Unique index on a materialized view; enables concurrent refresh.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateUniqueIndex {
    pub name: String,
    pub view: String,
    pub columns: Vec<String>,
}

impl CreateUniqueIndex {
    #[must_use]
    pub fn for_view(view: &str, columns: &[String]) -> Self {
        Self {
            name: format!("{view}_{}_uidx", columns.join("_")),
            view: view.to_string(),
            columns: columns.to_vec(),
        }
    }
}

impl Display for CreateUniqueIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self
            .columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");

        write!(
            f,
            "CREATE UNIQUE INDEX {} ON {} ({columns})",
            quote_ident(&self.name),
            quote_ident(&self.view)
        )
    }
}

///
/// DdlStatement
///
/// Typed statement handed to collaborators. Text backends call `to_sql`;
/// structured backends match on the variant.
///

#[derive(Clone, Debug, PartialEq)]
pub enum DdlStatement {
    CreateMaterializedView(CreateMaterializedView),
    DropMaterializedView(DropMaterializedView),
    RefreshMaterializedView(RefreshMaterializedView),
    CreateUniqueIndex(CreateUniqueIndex),
}

impl DdlStatement {
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.to_string()
    }

    /// Name of the view the statement targets.
    #[must_use]
    pub fn view_name(&self) -> &str {
        match self {
            Self::CreateMaterializedView(s) => &s.name,
            Self::DropMaterializedView(s) => &s.name,
            Self::RefreshMaterializedView(s) => &s.name,
            Self::CreateUniqueIndex(s) => &s.view,
        }
    }
}

impl Display for DdlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateMaterializedView(s) => s.fmt(f),
            Self::DropMaterializedView(s) => s.fmt(f),
            Self::RefreshMaterializedView(s) => s.fmt(f),
            Self::CreateUniqueIndex(s) => s.fmt(f),
        }
    }
}

impl From<CreateMaterializedView> for DdlStatement {
    fn from(s: CreateMaterializedView) -> Self {
        Self::CreateMaterializedView(s)
    }
}

impl From<DropMaterializedView> for DdlStatement {
    fn from(s: DropMaterializedView) -> Self {
        Self::DropMaterializedView(s)
    }
}

impl From<RefreshMaterializedView> for DdlStatement {
    fn from(s: RefreshMaterializedView) -> Self {
        Self::RefreshMaterializedView(s)
    }
}

impl From<CreateUniqueIndex> for DdlStatement {
    fn from(s: CreateUniqueIndex) -> Self {
        Self::CreateUniqueIndex(s)
    }
}

/// `CREATE MATERIALIZED VIEW <name> AS <select>` with literal binds.
#[must_use]
pub fn compile_create(name: &str, selectable: &Selectable) -> String {
    CreateMaterializedView {
        name: name.to_string(),
        selectable: selectable.clone(),
    }
    .to_string()
}

/// `DROP MATERIALIZED VIEW IF EXISTS <name>`.
#[must_use]
pub fn compile_drop(name: &str) -> String {
    DropMaterializedView {
        name: name.to_string(),
    }
    .to_string()
}

/// `REFRESH MATERIALIZED VIEW [CONCURRENTLY ]<name>`.
#[must_use]
pub fn compile_refresh(name: &str, concurrently: bool) -> String {
    RefreshMaterializedView::new(name, concurrently).to_string()
}
