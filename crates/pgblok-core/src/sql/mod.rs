//! Module: sql
//! Responsibility: renderable selectables and materialized-view DDL text.
//! Does not own: statement execution or scheduling.
//!
//! Invariants:
//! - Rendered SQL never contains bind placeholders.
//! - DDL text matches PostgreSQL's materialized-view grammar exactly.

pub mod ddl;
pub mod expr;
pub mod render;
pub mod select;

#[cfg(test)]
mod tests;

pub use ddl::{
    CreateMaterializedView, CreateUniqueIndex, DdlPhase, DdlStatement, DropMaterializedView,
    RefreshMaterializedView, compile_create, compile_drop, compile_refresh,
};
pub use expr::{ColumnRef, Expr, bind, col};
pub use render::{render_literal, render_selectable};
pub use select::{FromItem, Projection, Query, Select, Selectable, Source, ViewQuery};
