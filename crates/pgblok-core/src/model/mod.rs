//! Declaration-time model descriptions.
//!
//! - `declaration` defines *what a model asks for*
//! - `view` turns those requests into shared views and mapper bindings

pub mod column;
pub mod declaration;
pub mod relation;

pub use column::{ColumnDecl, ColumnKind};
pub use declaration::{ModelDeclaration, ViewDeclarationFn, default_tablename};
pub use relation::Many2One;
