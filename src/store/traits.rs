use std::path::Path;

use crate::error::Result;

/// One stored key/value pair. The value is an opaque serialized container;
/// key uniqueness and ordering are defined by the underlying engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Record {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Sequential read access to one embedded storage engine instance.
///
/// Both engine variants expose the same positional contract: `seek_first`
/// establishes the position, `read_current` copies out the record under it,
/// and `advance` moves forward, returning `false` when the position has run
/// past the last record. The caller decides what past-the-end means: the
/// training cursor reseeks to the first record (cyclic reads), the migration
/// scan stops (finite pass). Engine-specific end-of-data signals never leak
/// through this trait; only native I/O faults surface, as fatal errors.
pub trait SequentialStore {
    /// Positions the cursor at the first record in key order.
    ///
    /// Returns `false` when the store holds no records, leaving the cursor
    /// unpositioned.
    fn seek_first(&mut self) -> Result<bool>;

    /// Copies out the record under the current position.
    ///
    /// # Errors
    ///
    /// Fails if the cursor is not positioned on a record.
    fn read_current(&self) -> Result<Record>;

    /// Moves the cursor to the next record in key order.
    ///
    /// Returns `false` when the cursor was on the last record; the position
    /// is then stale and the caller must reseek before reading again.
    fn advance(&mut self) -> Result<bool>;

    /// Releases the engine's native resources.
    ///
    /// Each variant tears down in reverse-acquisition order; dropping the
    /// handle has the same effect, but teardown paths call this explicitly.
    fn close(self: Box<Self>) -> Result<()>;

    /// Path the store was opened from, for diagnostics.
    fn path(&self) -> &Path;
}
