//! Memory-mapped store variant.
//!
//! The environment is opened with a 1 TiB map size. That figure is an
//! address-space reservation the engine requires up front, not a disk or
//! memory commitment. Reads happen under a single read transaction held open
//! for the whole life of the handle, matching the engine's
//! single-writer/many-reader model; the cursor position is the owned current
//! key, and `advance` asks the engine for the next greater key under that
//! same transaction.
//!
//! [`MappedWriter`] is the write-only counterpart used as a migration
//! destination: records are appended in batches, each batch written and
//! committed under one scoped write transaction.

use std::fs;
use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvFlags, EnvOpenOptions, RoTxn};

use super::traits::{Record, SequentialStore};
use crate::error::{DataError, Result};

/// Fixed virtual address reservation requested at environment creation.
const MAP_SIZE: usize = 1 << 40; // 1 TiB

/// Read-only handle over a mapped store, holding one long-lived read
/// transaction.
pub struct MappedStore {
    // Declared before `_env`: the read transaction must end before the
    // environment closes.
    txn: RoTxn<'static>,
    db: Database<Bytes, Bytes>,
    // Held for ownership only; reads go through `txn`.
    _env: Env,
    current: Option<Record>,
    path: PathBuf,
}

impl MappedStore {
    /// Opens an existing store read-only and begins the handle's read
    /// transaction.
    ///
    /// # Errors
    ///
    /// Fails if the store is missing, unreadable, or corrupt. This is a
    /// non-recoverable setup error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        tracing::info!("opening mapped store {}", path.display());

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(MAP_SIZE)
                .flags(EnvFlags::READ_ONLY)
                .open(&path)
        }
        .map_err(|e| DataError::store_with_source(&path, "failed to open environment", e))?;

        let txn = env
            .clone()
            .static_read_txn()
            .map_err(|e| DataError::store_with_source(&path, "failed to begin read txn", e))?;
        let db = env
            .open_database::<Bytes, Bytes>(&txn, None)
            .map_err(|e| DataError::store_with_source(&path, "failed to open database", e))?
            .ok_or_else(|| DataError::store(&path, "main database missing"))?;

        Ok(Self {
            txn,
            db,
            _env: env,
            current: None,
            path,
        })
    }
}

impl SequentialStore for MappedStore {
    fn seek_first(&mut self) -> Result<bool> {
        let first = self
            .db
            .first(&self.txn)
            .map_err(|e| DataError::store_with_source(&self.path, "first-entry read failed", e))?;
        match first {
            Some((key, value)) => {
                self.current = Some(Record::new(key, value));
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    fn read_current(&self) -> Result<Record> {
        self.current
            .clone()
            .ok_or_else(|| DataError::store(&self.path, "cursor is not positioned on a record"))
    }

    fn advance(&mut self) -> Result<bool> {
        let key = match &self.current {
            Some(record) => record.key.clone(),
            None => {
                return Err(DataError::store(
                    &self.path,
                    "advance called on an unpositioned cursor",
                ))
            }
        };
        let next = self
            .db
            .get_greater_than(&self.txn, &key)
            .map_err(|e| DataError::store_with_source(&self.path, "next-entry read failed", e))?;
        match next {
            Some((key, value)) => {
                self.current = Some(Record::new(key, value));
                Ok(true)
            }
            // Past the last record; position stays on it until the caller
            // reseeks.
            None => Ok(false),
        }
    }

    fn close(self: Box<Self>) -> Result<()> {
        // Field order ends the read transaction, then closes the environment.
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Write-only handle used as a migration destination.
///
/// Appends are buffered and written under one scoped write transaction per
/// [`commit`](Self::commit) call, so the amount of uncommitted data is
/// bounded by the caller's commit cadence.
pub struct MappedWriter {
    db: Database<Bytes, Bytes>,
    env: Env,
    pending: Vec<Record>,
    commits: u64,
    path: PathBuf,
}

impl MappedWriter {
    /// Creates a fresh store at `path`.
    ///
    /// # Errors
    ///
    /// Fails if `path` already exists: a destination must never overwrite a
    /// prior dataset.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::create_dir(&path).map_err(|e| {
            DataError::store_with_source(&path, "destination must not already exist", e)
        })?;
        tracing::info!("creating mapped store {}", path.display());

        let env = unsafe { EnvOpenOptions::new().map_size(MAP_SIZE).open(&path) }
            .map_err(|e| DataError::store_with_source(&path, "failed to open environment", e))?;
        let mut wtxn = env
            .write_txn()
            .map_err(|e| DataError::store_with_source(&path, "failed to begin write txn", e))?;
        let db = env
            .create_database::<Bytes, Bytes>(&mut wtxn, None)
            .map_err(|e| DataError::store_with_source(&path, "failed to create database", e))?;
        wtxn.commit()
            .map_err(|e| DataError::store_with_source(&path, "failed to commit schema", e))?;

        Ok(Self {
            db,
            env,
            pending: Vec::new(),
            commits: 0,
            path,
        })
    }

    /// Buffers one key/value pair for the next commit. The value is opaque
    /// bytes and is stored unchanged.
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.pending.push(Record::new(key, value));
    }

    /// Writes and commits all buffered records under one write transaction.
    ///
    /// A no-op when nothing is buffered.
    pub fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| DataError::store_with_source(&self.path, "failed to begin write txn", e))?;
        for record in &self.pending {
            self.db
                .put(&mut wtxn, &record.key, &record.value)
                .map_err(|e| DataError::store_with_source(&self.path, "record write failed", e))?;
        }
        wtxn.commit()
            .map_err(|e| DataError::store_with_source(&self.path, "commit failed", e))?;
        self.pending.clear();
        self.commits += 1;
        Ok(())
    }

    /// Number of records buffered since the last commit.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of data commits performed so far (the schema-creation
    /// transaction is not counted).
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Releases the destination environment.
    ///
    /// # Errors
    ///
    /// Fails if records were buffered but never committed; the caller must
    /// flush explicitly so a partial tail is never dropped silently.
    pub fn close(self) -> Result<()> {
        if !self.pending.is_empty() {
            return Err(DataError::store(
                &self.path,
                format!("{} buffered records were never committed", self.pending.len()),
            ));
        }
        Ok(())
    }
}
