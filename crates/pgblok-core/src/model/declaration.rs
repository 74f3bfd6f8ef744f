use crate::{
    model::{column::ColumnDecl, relation::Many2One},
    sql::ViewQuery,
};
use std::{fmt, sync::Arc};

/// Registry namespace stripped when deriving a default tablename.
pub const MODEL_NAMESPACE: &str = "Model.";

///
/// ViewDeclarationFn
/// Produces the query a materialized view is built from.
///

pub type ViewDeclarationFn = Arc<dyn Fn() -> ViewQuery + Send + Sync>;

///
/// ModelDeclaration
///
/// Everything a model supplies at declaration time. Table models only need
/// a name and primary key; view models add a view source.
///

#[derive(Clone)]
pub struct ModelDeclaration {
    name: String,
    tablename: Option<String>,
    columns: Vec<ColumnDecl>,
    relations: Vec<Many2One>,
    view_declaration: Option<ViewDeclarationFn>,
    view_of: Option<String>,
    inherits: Option<String>,
    with_data: Option<bool>,
    unique_indexes: Vec<Vec<String>>,
}

impl ModelDeclaration {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tablename: None,
            columns: Vec::new(),
            relations: Vec::new(),
            view_declaration: None,
            view_of: None,
            inherits: None,
            with_data: None,
            unique_indexes: Vec::new(),
        }
    }

    /// Explicit relation name. Names that are not lower-case identifiers are
    /// double-quoted in DDL, so `TestView` names the relation `"TestView"`,
    /// not `testview`.
    #[must_use]
    pub fn tablename(mut self, tablename: &str) -> Self {
        self.tablename = Some(tablename.to_string());
        self
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDecl) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn relation(mut self, relation: Many2One) -> Self {
        self.relations.push(relation);
        self
    }

    #[must_use]
    pub fn view_declaration<F>(mut self, f: F) -> Self
    where
        F: Fn() -> ViewQuery + Send + Sync + 'static,
    {
        self.view_declaration = Some(Arc::new(f));
        self
    }

    /// Bind to the view of another, already bound, model.
    #[must_use]
    pub fn view_of(mut self, model: &str) -> Self {
        self.view_of = Some(model.to_string());
        self
    }

    #[must_use]
    pub fn inherits(mut self, model: &str) -> Self {
        self.inherits = Some(model.to_string());
        self
    }

    #[must_use]
    pub const fn with_data(mut self, with_data: bool) -> Self {
        self.with_data = Some(with_data);
        self
    }

    #[must_use]
    pub fn unique_index(mut self, columns: &[&str]) -> Self {
        self.unique_indexes
            .push(columns.iter().map(ToString::to_string).collect());
        self
    }

    // ------------------------------------------------------------------
    // accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Explicit tablename, or one derived from the registry name.
    #[must_use]
    pub fn resolved_tablename(&self) -> String {
        self.tablename
            .clone()
            .unwrap_or_else(|| default_tablename(&self.name))
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDecl] {
        &self.columns
    }

    #[must_use]
    pub fn relations(&self) -> &[Many2One] {
        &self.relations
    }

    #[must_use]
    pub fn primary_key(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.clone())
            .collect()
    }

    #[must_use]
    pub fn get_view_declaration(&self) -> Option<&ViewDeclarationFn> {
        self.view_declaration.as_ref()
    }

    #[must_use]
    pub fn get_view_of(&self) -> Option<&str> {
        self.view_of.as_deref()
    }

    #[must_use]
    pub fn get_inherits(&self) -> Option<&str> {
        self.inherits.as_deref()
    }

    #[must_use]
    pub const fn get_with_data(&self) -> Option<bool> {
        self.with_data
    }

    #[must_use]
    pub fn unique_indexes(&self) -> &[Vec<String>] {
        &self.unique_indexes
    }
}

impl fmt::Debug for ModelDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDeclaration")
            .field("name", &self.name)
            .field("tablename", &self.tablename)
            .field("columns", &self.columns)
            .field("relations", &self.relations)
            .field("view_declaration", &self.view_declaration.is_some())
            .field("view_of", &self.view_of)
            .field("inherits", &self.inherits)
            .field("with_data", &self.with_data)
            .field("unique_indexes", &self.unique_indexes)
            .finish()
    }
}

/// `Model.Foo.Bar` -> `foo_bar`.
#[must_use]
pub fn default_tablename(name: &str) -> String {
    name.strip_prefix(MODEL_NAMESPACE)
        .unwrap_or(name)
        .to_lowercase()
        .replace('.', "_")
}
