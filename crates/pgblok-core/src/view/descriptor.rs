use crate::sql::{CreateMaterializedView, DropMaterializedView, Selectable};

///
/// ProjectedColumn
/// Proxy of one selectable output column, re-homed onto the view.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ProjectedColumn {
    pub view: String,
    pub name: String,
    pub position: usize,
}

///
/// ViewDescriptor
///
/// The single shared representation of one materialized view. Models that
/// resolve to the same view hold the same `Arc`, never a copy.
///

#[derive(Debug)]
pub struct ViewDescriptor {
    name: String,
    selectable: Selectable,
    columns: Vec<ProjectedColumn>,
    with_data: bool,
}

impl ViewDescriptor {
    pub(crate) fn new(name: &str, selectable: Selectable, with_data: bool) -> Self {
        let columns = selectable
            .column_names()
            .into_iter()
            .enumerate()
            .map(|(position, column)| ProjectedColumn {
                view: name.to_string(),
                name: column.to_string(),
                position,
            })
            .collect();

        Self {
            name: name.to_string(),
            selectable,
            columns,
            with_data,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn selectable(&self) -> &Selectable {
        &self.selectable
    }

    #[must_use]
    pub fn columns(&self) -> &[ProjectedColumn] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ProjectedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether the view is populated when created.
    #[must_use]
    pub const fn with_data(&self) -> bool {
        self.with_data
    }

    #[must_use]
    pub fn create_statement(&self) -> CreateMaterializedView {
        CreateMaterializedView {
            name: self.name.clone(),
            selectable: self.selectable.clone(),
        }
    }

    #[must_use]
    pub fn drop_statement(&self) -> DropMaterializedView {
        DropMaterializedView {
            name: self.name.clone(),
        }
    }
}
