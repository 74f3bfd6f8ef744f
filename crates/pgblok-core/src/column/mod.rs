//! Column adapters for PostgreSQL-specific types.

mod jsonb;
mod large_object;

pub use jsonb::{Jsonb, JsonbError};
pub use large_object::LargeObject;
