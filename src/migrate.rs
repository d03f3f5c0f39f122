//! Bulk dataset migration between engine formats.
//!
//! Copies every record of a log-structured store into a freshly created
//! mapped store, in key order, treating keys and values as opaque bytes. The
//! record codec is never consulted, so any record schema survives the copy
//! byte for byte.
//!
//! Writes are committed every [`COMMIT_INTERVAL`] records, bounding both the
//! engine's uncommitted write state and the amount of work lost if the
//! process dies mid-copy.

use std::path::Path;

use crate::config::StoreKind;
use crate::error::Result;
use crate::store::{self, MappedWriter};

/// Records written per destination commit.
pub const COMMIT_INTERVAL: usize = 1000;

/// Outcome of one completed migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records copied from source to destination.
    pub records: u64,
    /// Write transactions committed on the destination.
    pub commits: u64,
}

impl std::fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "copied {} records in {} commits",
            self.records, self.commits
        )
    }
}

/// Copies the log-structured store at `source` into a new mapped store at
/// `dest`.
///
/// # Errors
///
/// Fails if the source cannot be opened, the destination already exists, or
/// any native read or write faults. A failed run may leave a partially
/// written destination behind; reruns must target a fresh path.
pub fn run(source: &Path, dest: &Path) -> Result<MigrationReport> {
    let mut reader = store::open(StoreKind::LogStructured, source)?;
    let mut writer = MappedWriter::create(dest)?;

    let mut records = 0u64;
    if reader.seek_first()? {
        loop {
            let record = reader.read_current()?;
            writer.put(&record.key, &record.value);
            records += 1;
            if writer.pending_len() >= COMMIT_INTERVAL {
                writer.commit()?;
                tracing::info!("migrated {records} records");
            }
            if !reader.advance()? {
                break;
            }
        }
    }
    // Flush the partial tail batch, if any.
    writer.commit()?;
    let commits = writer.commits();
    writer.close()?;
    reader.close()?;

    let report = MigrationReport { records, commits };
    tracing::info!("migration finished: {report}");
    Ok(report)
}
