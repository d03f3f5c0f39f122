//! Log-structured store variant.
//!
//! Reads are served by the engine's native iterator: `seek_first` issues a
//! seek-to-first, `advance` simply moves the iterator, and running off the
//! end reports past-the-end rather than an error. The store is always opened
//! read-only; the ingestion path never writes to a log-structured store.

use std::mem;
use std::path::{Path, PathBuf};

use rocksdb::{DBRawIterator, Options, DB};

use super::traits::{Record, SequentialStore};
use crate::error::{DataError, Result};

/// Read-only handle over a log-structured store with one long-lived
/// native iterator.
pub struct LogStore {
    // Declared before `_db` so the iterator is torn down before the engine
    // handle it points into.
    iter: DBRawIterator<'static>,
    // Held for ownership only; the iterator borrows into it.
    _db: DB,
    path: PathBuf,
}

impl LogStore {
    /// Opens an existing store read-only.
    ///
    /// # Errors
    ///
    /// Fails if the store is missing, unreadable, or corrupt. This is a
    /// non-recoverable setup error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        tracing::info!("opening log-structured store {}", path.display());

        let mut opts = Options::default();
        opts.create_if_missing(false);
        let db = DB::open_for_read_only(&opts, &path, false)
            .map_err(|e| DataError::store_with_source(&path, "failed to open store", e))?;

        let iter = db.raw_iterator();
        // SAFETY: the iterator holds a pointer into the engine's heap-side
        // handle, which stays valid until `_db` is dropped. `iter` is
        // declared before `_db`, so it is always dropped first, and the
        // `'static` lifetime never outlives the handle.
        let iter = unsafe { mem::transmute::<DBRawIterator<'_>, DBRawIterator<'static>>(iter) };

        Ok(Self {
            iter,
            _db: db,
            path,
        })
    }

    /// Promotes a pending iterator I/O fault to a fatal store error.
    fn check_status(&self) -> Result<()> {
        self.iter
            .status()
            .map_err(|e| DataError::store_with_source(&self.path, "iterator fault during scan", e))
    }
}

impl SequentialStore for LogStore {
    fn seek_first(&mut self) -> Result<bool> {
        self.iter.seek_to_first();
        if self.iter.valid() {
            Ok(true)
        } else {
            self.check_status()?;
            Ok(false)
        }
    }

    fn read_current(&self) -> Result<Record> {
        match (self.iter.key(), self.iter.value()) {
            (Some(key), Some(value)) => Ok(Record::new(key, value)),
            _ => Err(DataError::store(
                &self.path,
                "cursor is not positioned on a record",
            )),
        }
    }

    fn advance(&mut self) -> Result<bool> {
        if !self.iter.valid() {
            self.check_status()?;
            return Err(DataError::store(
                &self.path,
                "advance called on an unpositioned cursor",
            ));
        }
        self.iter.next();
        if self.iter.valid() {
            Ok(true)
        } else {
            self.check_status()?;
            Ok(false)
        }
    }

    fn close(self: Box<Self>) -> Result<()> {
        // Field order drops the iterator, then the database handle.
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
