//! Background prefetch stage.
//!
//! One fill thread per open dataset reads ahead of the consumer: it owns the
//! backend store and cursor outright, decodes each record into its batch
//! slot, and exchanges whole batch buffers with the consumer over two bounded
//! channels. Exactly two buffers circulate, so the consumer always processes
//! one batch while the thread fills the other, and ownership transfer makes
//! aliasing impossible by construction.
//!
//! Teardown joins the fill thread before returning; the store lives inside
//! the thread, so its native resources are guaranteed released once the join
//! completes.

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender};
use rand::Rng;

use super::batch::Batch;
use super::cursor::SequentialCursor;
use super::transform::Transform;
use crate::codec::{self, TensorShape};
use crate::config::DatasetConfig;
use crate::error::{DataError, Result};
use crate::store;

/// An open map dataset with a running prefetch stage.
pub struct MapDataset {
    batch_size: usize,
    data_shape: TensorShape,
    label_shape: TensorShape,
    empty_tx: Option<Sender<Batch>>,
    full_rx: Option<Receiver<Result<Batch>>>,
    stop: Arc<AtomicBool>,
    fill_thread: Option<JoinHandle<()>>,
}

impl MapDataset {
    /// Opens the configured store and starts the fill thread.
    ///
    /// The thread performs the whole setup sequence: open the backend, apply
    /// the initial random skip, read the first record to fix the dataset's
    /// data and label shapes, and allocate the two batch buffers. Setup
    /// failures are reported here, after the thread has released whatever it
    /// had acquired.
    pub fn open(config: &DatasetConfig, transform: Transform) -> Result<Self> {
        config.validate()?;

        let (setup_tx, setup_rx) = bounded::<Result<(TensorShape, TensorShape)>>(1);
        let (empty_tx, empty_rx) = bounded::<Batch>(2);
        let (full_tx, full_rx) = bounded::<Result<Batch>>(2);
        let stop = Arc::new(AtomicBool::new(false));

        let thread_config = config.clone();
        let label_transform = transform.label_variant();
        let seed_tx = empty_tx.clone();
        let thread_stop = stop.clone();
        let fill_thread = thread::spawn(move || {
            fill_loop(
                thread_config,
                transform,
                label_transform,
                setup_tx,
                seed_tx,
                empty_rx,
                full_tx,
                thread_stop,
            );
        });

        let (data_shape, label_shape) = match setup_rx.recv() {
            Ok(Ok(shapes)) => shapes,
            Ok(Err(e)) => {
                let _ = fill_thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = fill_thread.join();
                return Err(DataError::prefetch("fill thread terminated during setup"));
            }
        };

        Ok(Self {
            batch_size: config.batch_size,
            data_shape,
            label_shape,
            empty_tx: Some(empty_tx),
            full_rx: Some(full_rx),
            stop,
            fill_thread: Some(fill_thread),
        })
    }

    /// Hands out the next completed batch, blocking until the fill thread
    /// has fully produced it.
    ///
    /// The returned guard recycles the buffer back to the fill thread when
    /// dropped; holding it keeps the thread from reusing that buffer, so the
    /// consumer never observes a batch being mutated under it.
    ///
    /// # Errors
    ///
    /// Fill-side failures (native I/O faults, schema violations) are fatal
    /// and surface here; they are never swallowed, since a silently stalled
    /// prefetch would deadlock the consumer.
    pub fn next_batch(&self) -> Result<BatchGuard<'_>> {
        let full_rx = self
            .full_rx
            .as_ref()
            .ok_or_else(|| DataError::prefetch("dataset is shut down"))?;
        let empty_tx = self
            .empty_tx
            .as_ref()
            .ok_or_else(|| DataError::prefetch("dataset is shut down"))?;

        match full_rx.recv() {
            Ok(Ok(batch)) => Ok(BatchGuard {
                batch: Some(batch),
                recycle: empty_tx,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DataError::prefetch("fill thread stopped unexpectedly")),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Shape of every data tensor, fixed by the first record read at setup.
    pub fn data_shape(&self) -> TensorShape {
        self.data_shape
    }

    /// Shape of every label tensor.
    pub fn label_shape(&self) -> TensorShape {
        self.label_shape
    }
}

impl Drop for MapDataset {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // Closing both channels unblocks the fill thread wherever it waits.
        drop(self.empty_tx.take());
        drop(self.full_rx.take());
        if let Some(handle) = self.fill_thread.take() {
            let _ = handle.join();
        }
    }
}

/// A completed batch on loan to the consumer.
///
/// Dereferences to [`Batch`]; dropping it returns the buffer to the fill
/// thread for the next cycle.
#[derive(Debug)]
pub struct BatchGuard<'a> {
    batch: Option<Batch>,
    recycle: &'a Sender<Batch>,
}

impl Deref for BatchGuard<'_> {
    type Target = Batch;

    fn deref(&self) -> &Batch {
        // Present from construction until drop
        self.batch.as_ref().expect("batch taken before drop")
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if let Some(batch) = self.batch.take() {
            let _ = self.recycle.send(batch);
        }
    }
}

/// Opens the store and establishes the dataset's fixed shapes.
fn open_cursor(config: &DatasetConfig) -> Result<(SequentialCursor, TensorShape, TensorShape)> {
    let store = store::open(config.backend, &config.source)?;
    let mut cursor = SequentialCursor::new(store)?;

    if config.rand_skip > 0 {
        let skip = rand::thread_rng().gen_range(0..config.rand_skip);
        tracing::info!("skipping first {skip} records");
        cursor.init_skip(u64::from(skip))?;
    }

    let first = cursor.current()?;
    let pair = codec::decode_pair(&first.value)?;
    Ok((cursor, pair.data.shape(), pair.label.shape()))
}

#[allow(clippy::too_many_arguments)]
fn fill_loop(
    config: DatasetConfig,
    data_transform: Transform,
    label_transform: Transform,
    setup_tx: Sender<Result<(TensorShape, TensorShape)>>,
    seed_tx: Sender<Batch>,
    empty_rx: Receiver<Batch>,
    full_tx: Sender<Result<Batch>>,
    stop: Arc<AtomicBool>,
) {
    let (mut cursor, data_shape, label_shape) = match open_cursor(&config) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = setup_tx.send(Err(e));
            return;
        }
    };
    if setup_tx.send(Ok((data_shape, label_shape))).is_err() {
        release(cursor);
        return;
    }

    // Seed the exchange with the two circulating buffers.
    for _ in 0..2 {
        let batch = Batch::new(config.batch_size, data_shape, label_shape);
        if seed_tx.send(batch).is_err() {
            release(cursor);
            return;
        }
    }
    drop(seed_tx);

    loop {
        let mut batch = match empty_rx.recv() {
            Ok(batch) => batch,
            Err(_) => break,
        };
        if stop.load(Ordering::Relaxed) {
            break;
        }
        match fill_batch(&mut cursor, &mut batch, &data_transform, &label_transform) {
            Ok(()) => {
                if full_tx.send(Ok(batch)).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = full_tx.send(Err(e));
                break;
            }
        }
    }
    release(cursor);
}

fn fill_batch(
    cursor: &mut SequentialCursor,
    batch: &mut Batch,
    data_transform: &Transform,
    label_transform: &Transform,
) -> Result<()> {
    for slot in 0..batch.batch_size() {
        let record = cursor.next()?;
        let pair = codec::decode_pair(&record.value)?;
        if pair.data.shape() != batch.data_shape() {
            return Err(DataError::schema(format!(
                "record data shape {} differs from dataset shape {}",
                pair.data.shape(),
                batch.data_shape()
            )));
        }
        if pair.label.shape() != batch.label_shape() {
            return Err(DataError::schema(format!(
                "record label shape {} differs from dataset shape {}",
                pair.label.shape(),
                batch.label_shape()
            )));
        }
        data_transform.apply(&pair.data, batch.data_slot_mut(slot))?;
        label_transform.apply(&pair.label, batch.label_slot_mut(slot))?;
    }
    Ok(())
}

fn release(cursor: SequentialCursor) {
    if let Err(e) = cursor.close() {
        tracing::warn!("store teardown failed: {e}");
    }
}
