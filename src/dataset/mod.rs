//! Sequential map-dataset ingestion.
//!
//! A [`MapDataset`] turns one embedded store of serialized (data, label)
//! record pairs into an endless sequence of prefetched, fixed-shape batches:
//! a cyclic [`SequentialCursor`] walks the store in key order, the prefetch
//! stage decodes and transforms records into [`Batch`] buffers on a
//! background thread, and the consumer drains them one [`BatchGuard`] at a
//! time.

mod batch;
mod cursor;
mod prefetch;
mod transform;

pub use batch::Batch;
pub use cursor::SequentialCursor;
pub use prefetch::{BatchGuard, MapDataset};
pub use transform::Transform;
