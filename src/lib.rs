//! Sequential map-dataset ingestion over embedded key-value stores.
//!
//! Datasets are stored as ordered key-value records in an embedded engine,
//! each value holding one serialized (data, label) tensor pair. This crate
//! reads them back for training: it drives two structurally different engines
//! through one cursor contract, wraps the scan into an infinite cyclic
//! sequence, and double-buffers decoded batches on a background prefetch
//! thread. A bulk migration path copies whole datasets between engine
//! formats without touching record contents.
//!
//! ```no_run
//! use mapdata::config::DatasetConfig;
//! use mapdata::dataset::{MapDataset, Transform};
//!
//! # fn main() -> mapdata::error::Result<()> {
//! let config = DatasetConfig::from_file("dataset.toml")?.with_env_overrides();
//! let transform = Transform::from_config(&config.transform);
//! let dataset = MapDataset::open(&config, transform)?;
//! loop {
//!     let batch = dataset.next_batch()?;
//!     let _ = batch.data();
//! }
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod dataset;
pub mod error;
pub mod migrate;
pub mod store;

pub use config::{DatasetConfig, StoreKind};
pub use dataset::MapDataset;
pub use error::{DataError, Result};
