//! Collaborator seams.
//!
//! The host ORM and the database driver sit behind these traits. The core
//! only schedules DDL, asks for mapper bindings, executes statements on a
//! session, and moves large-object bytes through short-lived cursors.

use crate::{
    error::BoxError,
    mapper::MapperRequest,
    sql::{DdlPhase, DdlStatement},
    value::Oid,
};

///
/// DdlCatalog
/// Schema-wide catalog that runs statements at lifecycle phases.
///

pub trait DdlCatalog {
    fn schedule(&mut self, phase: DdlPhase, statement: DdlStatement);
}

///
/// MapperBuilder
/// Host ORM hook that binds a model to a table-like selectable.
///

pub trait MapperBuilder {
    type Mapper;
    type Error: Into<BoxError>;

    fn build_mapper(&mut self, request: MapperRequest<'_>) -> Result<Self::Mapper, Self::Error>;
}

///
/// Session
/// Unit-of-work plus the active connection.
///

pub trait Session {
    type Error;

    /// Push pending unit-of-work changes to the connection.
    fn flush(&mut self) -> Result<(), Self::Error>;

    fn execute(&mut self, statement: &DdlStatement) -> Result<(), Self::Error>;
}

///
/// LargeObjectStore
///
/// Hands out one cursor per large-object operation. Cursors release their
/// handle on drop, so every exit path closes them.
///

pub trait LargeObjectStore {
    type Error;
    type Cursor<'a>: LargeObjectCursor<Error = Self::Error>
    where
        Self: 'a;

    fn cursor(&mut self) -> Result<Self::Cursor<'_>, Self::Error>;
}

///
/// LargeObjectCursor
///

pub trait LargeObjectCursor {
    type Error;

    /// Allocate a new, empty large object.
    fn create(&mut self) -> Result<Oid, Self::Error>;

    /// Replace the full contents of `oid`.
    fn write(&mut self, oid: Oid, data: &[u8]) -> Result<(), Self::Error>;

    fn read(&mut self, oid: Oid) -> Result<Vec<u8>, Self::Error>;

    fn unlink(&mut self, oid: Oid) -> Result<(), Self::Error>;
}
