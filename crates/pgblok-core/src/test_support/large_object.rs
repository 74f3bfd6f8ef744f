use crate::{
    test_support::engine::{EngineError, MemoryEngine},
    traits::{LargeObjectCursor, LargeObjectStore},
    value::Oid,
};

///
/// MemoryCursor
/// Short-lived large-object handle; counted open until dropped.
///

#[derive(Debug)]
pub struct MemoryCursor<'a> {
    engine: &'a mut MemoryEngine,
}

impl Drop for MemoryCursor<'_> {
    fn drop(&mut self) {
        self.engine.open_cursors = self.engine.open_cursors.saturating_sub(1);
    }
}

impl LargeObjectCursor for MemoryCursor<'_> {
    type Error = EngineError;

    fn create(&mut self) -> Result<Oid, Self::Error> {
        let oid = self.engine.allocate_oid();
        self.engine.large_objects.insert(oid, Vec::new());

        Ok(oid)
    }

    fn write(&mut self, oid: Oid, data: &[u8]) -> Result<(), Self::Error> {
        if let Some(message) = &self.engine.large_object_write_failure {
            return Err(EngineError::Injected {
                message: message.clone(),
            });
        }

        let stored = self
            .engine
            .large_objects
            .get_mut(&oid)
            .ok_or(EngineError::UndefinedLargeObject { oid })?;
        stored.clear();
        stored.extend_from_slice(data);

        Ok(())
    }

    fn read(&mut self, oid: Oid) -> Result<Vec<u8>, Self::Error> {
        self.engine
            .large_objects
            .get(&oid)
            .cloned()
            .ok_or(EngineError::UndefinedLargeObject { oid })
    }

    fn unlink(&mut self, oid: Oid) -> Result<(), Self::Error> {
        self.engine
            .large_objects
            .remove(&oid)
            .map(|_| ())
            .ok_or(EngineError::UndefinedLargeObject { oid })
    }
}

impl LargeObjectStore for MemoryEngine {
    type Error = EngineError;
    type Cursor<'a> = MemoryCursor<'a>;

    fn cursor(&mut self) -> Result<Self::Cursor<'_>, Self::Error> {
        self.open_cursors += 1;
        self.cursors_opened += 1;

        Ok(MemoryCursor { engine: self })
    }
}

impl MemoryEngine {
    /// Cursors handed out and not yet dropped.
    #[must_use]
    pub const fn open_cursors(&self) -> usize {
        self.open_cursors
    }

    #[must_use]
    pub const fn cursors_opened(&self) -> usize {
        self.cursors_opened
    }

    /// Whether `oid` still names a stored large object.
    #[must_use]
    pub fn large_object_exists(&self, oid: Oid) -> bool {
        self.large_objects.contains_key(&oid)
    }

    #[must_use]
    pub fn large_object_count(&self) -> usize {
        self.large_objects.len()
    }
}
