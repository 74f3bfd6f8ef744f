//! ## Crate layout
//! - `config`: TOML configuration for view and large-object defaults.
//! - `core`: materialized-view models, DDL text, column adapters and
//!   observability.
//!
//! The `prelude` module carries the declaration vocabulary; SQL builders and
//! collaborator traits live under `core::sql` and `core::traits`.

pub use pgblok_config as config;
pub use pgblok_core as core;

/// re-exports
///
/// declaration code can use these without listing them in its own
/// Cargo.toml
pub mod __reexports {
    pub use serde;
    pub use serde_json;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::Config;
pub use crate::core::error::{DeclarationError, Error, ErrorClass};

#[cfg(feature = "test-support")]
pub use crate::core::test_support;

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        column::{Jsonb, LargeObject},
        model::{
            ColumnDecl, ColumnKind, Many2One, ModelDeclaration,
            column::{boolean, float, integer, jsonb, large_object, string},
        },
        sql::{Query, Select, Selectable, ViewQuery, bind, col},
        traits::{LargeObjectStore as _, MapperBuilder as _, Session as _},
        value::{Oid, Value},
        view::{Refreshable, RegistryBuild, ViewModel},
    };
    pub use crate::{Config, Error};
}
