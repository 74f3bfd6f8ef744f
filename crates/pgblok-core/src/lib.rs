//! Core of pgblok: materialized-view models, their DDL, and the JSONB and
//! large-object column adapters.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod column;
pub mod error;
pub mod mapper;
pub mod model;
pub mod obs;
pub mod sql;
pub mod traits;
pub mod value;
pub mod view;

// test
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

///
/// Prelude
///
/// Declaration vocabulary only. Errors, collaborators and the SQL builder
/// stay in their modules.
///

pub mod prelude {
    pub use crate::{
        model::{ColumnDecl, ColumnKind, Many2One, ModelDeclaration},
        value::{Oid, Value},
        view::{Refreshable, RegistryBuild, ViewModel},
    };
}
