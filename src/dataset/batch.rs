//! Preallocated batch buffers.

use crate::codec::TensorShape;

/// A fixed-size group of decoded record pairs, materialized into two planes:
/// one holding every data tensor stacked along the batch dimension, one for
/// labels.
///
/// Buffers are allocated once at dataset setup and refilled in place on every
/// cycle; steady-state operation performs no per-record or per-batch heap
/// allocation.
#[derive(Debug)]
pub struct Batch {
    batch_size: usize,
    data_shape: TensorShape,
    label_shape: TensorShape,
    data: Vec<f32>,
    label: Vec<f32>,
}

impl Batch {
    pub fn new(batch_size: usize, data_shape: TensorShape, label_shape: TensorShape) -> Self {
        Self {
            batch_size,
            data_shape,
            label_shape,
            data: vec![0.0; batch_size * data_shape.len()],
            label: vec![0.0; batch_size * label_shape.len()],
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn data_shape(&self) -> TensorShape {
        self.data_shape
    }

    pub fn label_shape(&self) -> TensorShape {
        self.label_shape
    }

    /// The full stacked data plane, `batch_size * data_shape.len()` values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The full stacked label plane.
    pub fn label(&self) -> &[f32] {
        &self.label
    }

    /// Data slice of one slot.
    pub fn data_slot(&self, slot: usize) -> &[f32] {
        let len = self.data_shape.len();
        &self.data[slot * len..(slot + 1) * len]
    }

    /// Label slice of one slot.
    pub fn label_slot(&self, slot: usize) -> &[f32] {
        let len = self.label_shape.len();
        &self.label[slot * len..(slot + 1) * len]
    }

    pub(crate) fn data_slot_mut(&mut self, slot: usize) -> &mut [f32] {
        let len = self.data_shape.len();
        &mut self.data[slot * len..(slot + 1) * len]
    }

    pub(crate) fn label_slot_mut(&mut self, slot: usize) -> &mut [f32] {
        let len = self.label_shape.len();
        &mut self.label[slot * len..(slot + 1) * len]
    }
}
