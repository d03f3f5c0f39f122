//! Boundary type for the downstream tensor transform collaborator.
//!
//! The numeric transform pipeline (cropping, mirroring, full mean-image
//! handling) lives outside this crate; the prefetch stage only needs mean
//! subtraction and scaling when copying a decoded tensor into its batch
//! slot, plus the label-side variant with scale forced to 1 and the mean
//! cleared.

use crate::codec::Tensor;
use crate::config::TransformConfig;
use crate::error::{DataError, Result};

#[derive(Debug, Clone)]
pub struct Transform {
    scale: f32,
    mean: Option<Vec<f32>>,
}

impl Transform {
    pub fn new(scale: f32) -> Self {
        Self { scale, mean: None }
    }

    pub fn from_config(config: &TransformConfig) -> Self {
        Self::new(config.scale)
    }

    /// Attaches per-element mean values subtracted before scaling.
    #[must_use]
    pub fn with_mean(mut self, mean: Vec<f32>) -> Self {
        self.mean = Some(mean);
        self
    }

    /// The variant applied to label tensors: scale forced to 1, mean cleared.
    /// Label maps carry positional values that must pass through untouched.
    pub fn label_variant(&self) -> Self {
        Self {
            scale: 1.0,
            mean: None,
        }
    }

    /// Writes `(value - mean) * scale` for every element of `tensor` into
    /// `out`.
    pub fn apply(&self, tensor: &Tensor, out: &mut [f32]) -> Result<()> {
        let values = &tensor.values;
        if out.len() != values.len() {
            return Err(DataError::schema(format!(
                "transform output holds {} elements, tensor holds {}",
                out.len(),
                values.len()
            )));
        }
        match &self.mean {
            Some(mean) => {
                if mean.len() != values.len() {
                    return Err(DataError::config(format!(
                        "mean holds {} elements, tensor holds {}",
                        mean.len(),
                        values.len()
                    )));
                }
                for ((out, value), mean) in out.iter_mut().zip(values).zip(mean) {
                    *out = (value - mean) * self.scale;
                }
            }
            None => {
                for (out, value) in out.iter_mut().zip(values) {
                    *out = value * self.scale;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(values: Vec<f32>) -> Tensor {
        Tensor::new(1, 1, values.len() as u32, values)
    }

    #[test]
    fn test_scale_only() {
        let transform = Transform::new(0.5);
        let mut out = [0.0; 3];
        transform.apply(&tensor(vec![2.0, 4.0, 6.0]), &mut out).unwrap();
        assert_eq!(out, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_mean_then_scale() {
        let transform = Transform::new(2.0).with_mean(vec![1.0, 2.0]);
        let mut out = [0.0; 2];
        transform.apply(&tensor(vec![3.0, 3.0]), &mut out).unwrap();
        assert_eq!(out, [4.0, 2.0]);
    }

    #[test]
    fn test_mean_length_mismatch() {
        let transform = Transform::new(1.0).with_mean(vec![0.0]);
        let mut out = [0.0; 2];
        assert!(transform.apply(&tensor(vec![1.0, 2.0]), &mut out).is_err());
    }

    #[test]
    fn test_output_length_mismatch() {
        let transform = Transform::new(1.0);
        let mut out = [0.0; 1];
        assert!(transform.apply(&tensor(vec![1.0, 2.0]), &mut out).is_err());
    }

    #[test]
    fn test_label_variant_is_identity() {
        let transform = Transform::new(0.25).with_mean(vec![5.0, 5.0]);
        let label = transform.label_variant();
        let mut out = [0.0; 2];
        label.apply(&tensor(vec![7.0, 9.0]), &mut out).unwrap();
        assert_eq!(out, [7.0, 9.0]);
    }
}
