use crate::{
    obs::sink::{MetricsEvent, record},
    traits::{LargeObjectCursor, LargeObjectStore},
    value::Oid,
};
use pgblok_config::LargeObjectConfig;

///
/// LargeObject
///
/// Large-object column adapter. The row stores only the oid; bytes live in
/// the server's large-object store and move through one cursor per call.
///
/// Without `keep_blob`, replacing a value overwrites the previous object in
/// place and clearing it unlinks the object. With `keep_blob`, old objects
/// are never touched.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LargeObject {
    keep_blob: bool,
}

impl LargeObject {
    #[must_use]
    pub const fn new() -> Self {
        Self { keep_blob: false }
    }

    #[must_use]
    pub const fn keep_blob(mut self, keep_blob: bool) -> Self {
        self.keep_blob = keep_blob;
        self
    }

    #[must_use]
    pub const fn from_config(config: &LargeObjectConfig) -> Self {
        Self {
            keep_blob: config.keep_blob,
        }
    }

    #[must_use]
    pub const fn keeps_blob(&self) -> bool {
        self.keep_blob
    }

    /// Store `data` for a row currently referencing `previous`.
    /// Returns the oid the row should reference afterwards.
    pub fn write<S>(
        &self,
        store: &mut S,
        previous: Option<Oid>,
        data: Option<&[u8]>,
    ) -> Result<Option<Oid>, S::Error>
    where
        S: LargeObjectStore + ?Sized,
    {
        let Some(bytes) = data else {
            if let Some(oid) = previous
                && !self.keep_blob
            {
                let mut cursor = store.cursor()?;
                cursor.unlink(oid)?;

                record(MetricsEvent::LargeObjectUnlink);
                tracing::debug!(%oid, "large object unlinked");
            }

            return Ok(None);
        };

        let mut cursor = store.cursor()?;
        let oid = match previous {
            Some(oid) if !self.keep_blob => oid,
            _ => {
                let oid = cursor.create()?;
                tracing::debug!(%oid, "large object allocated");
                oid
            }
        };
        cursor.write(oid, bytes)?;

        record(MetricsEvent::LargeObjectWrite {
            bytes: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
        });

        Ok(Some(oid))
    }

    /// Full contents of `oid`; a row without an oid reads as `None`.
    pub fn read<S>(&self, store: &mut S, oid: Option<Oid>) -> Result<Option<Vec<u8>>, S::Error>
    where
        S: LargeObjectStore + ?Sized,
    {
        let Some(oid) = oid else {
            return Ok(None);
        };

        let mut cursor = store.cursor()?;
        cursor.read(oid).map(Some)
    }
}
