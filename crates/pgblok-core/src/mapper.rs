use crate::view::{ProjectedColumn, ViewDescriptor};
use std::{collections::BTreeMap, sync::Arc};

///
/// RelationProperty
///
/// Many2One resolved against the view: local columns are projected columns,
/// remote columns belong to the target model.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationProperty {
    pub target: String,
    pub target_tablename: String,
    pub local_columns: Vec<ProjectedColumn>,
    pub remote_columns: Vec<String>,
}

///
/// Property
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Property {
    Column(ProjectedColumn),
    Relation(RelationProperty),
}

impl Property {
    #[must_use]
    pub const fn as_column(&self) -> Option<&ProjectedColumn> {
        match self {
            Self::Column(col) => Some(col),
            Self::Relation(_) => None,
        }
    }

    #[must_use]
    pub const fn as_relation(&self) -> Option<&RelationProperty> {
        match self {
            Self::Relation(rel) => Some(rel),
            Self::Column(_) => None,
        }
    }
}

///
/// MapperRequest
///
/// Everything the host needs to build one mapper: the shared view, its
/// primary-key columns, and the property mapping.
///

#[derive(Debug)]
pub struct MapperRequest<'a> {
    pub model: &'a str,
    pub tablename: &'a str,
    pub view: &'a Arc<ViewDescriptor>,
    pub primary_key: Vec<ProjectedColumn>,
    pub properties: BTreeMap<String, Property>,
}
