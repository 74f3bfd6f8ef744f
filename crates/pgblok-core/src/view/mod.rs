//! Module: view
//! Responsibility: shared materialized-view descriptors, their resolution,
//! mapper binding, and refresh.
//! Does not own: SQL text (see `sql`) or statement execution.
//!
//! Invariants:
//! - One descriptor per view name per build; reusers hold the same `Arc`.
//! - DDL for a view is scheduled exactly once, when it is first created.
//! - Declaration errors surface before any DDL for that model is scheduled.
//! - A failed bind (declaration or mapper error) leaves the registry and the
//!   DDL catalog as they were.

mod build;
mod descriptor;
mod refresh;
mod registry;
mod resolve;


pub use build::RegistryBuild;
pub use descriptor::{ProjectedColumn, ViewDescriptor};
pub use refresh::{Refreshable, ViewModel};
pub use registry::{PreparedView, ViewRegistry};
pub use resolve::{ViewResolution, resolve_view};
