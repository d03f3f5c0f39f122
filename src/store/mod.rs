//! Embedded storage engine backends.
//!
//! Two structurally different engines back map datasets: a log-structured
//! store read through its native iterator, and a memory-mapped B-tree store
//! read under one long-lived transaction. Both are driven through the
//! [`SequentialStore`] trait, so callers never see engine-specific position
//! primitives or end-of-data codes.

mod log;
mod mapped;
mod traits;

pub use log::LogStore;
pub use mapped::{MappedStore, MappedWriter};
pub use traits::{Record, SequentialStore};

use std::path::Path;

use crate::config::StoreKind;
use crate::error::Result;

/// Opens the engine variant named by `kind` for sequential reading.
pub fn open(kind: StoreKind, path: &Path) -> Result<Box<dyn SequentialStore>> {
    match kind {
        StoreKind::LogStructured => Ok(Box::new(LogStore::open(path)?)),
        StoreKind::Mapped => Ok(Box::new(MappedStore::open(path)?)),
    }
}
