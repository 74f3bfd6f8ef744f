//! In-memory PostgreSQL stand-in for tests.
//!
//! `MemoryEngine` plays every collaborator at once: DDL catalog, mapper
//! builder, session and large-object store. It evaluates view selectables
//! over its own tables and reports the same failures PostgreSQL does for
//! unpopulated views, concurrent refreshes and writes into views.

mod engine;
mod eval;
mod large_object;

pub use engine::{EngineError, MemoryEngine, MemoryMapper, MemoryRelation, Row};
pub use large_object::MemoryCursor;

/// First oid handed out for large objects, as on a fresh cluster.
pub const FIRST_LARGE_OBJECT_OID: u32 = 16_384;
