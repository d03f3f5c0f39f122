//! Record value codec.
//!
//! A stored value is a bincode-serialized sequence of tensor records:
//!
//! ```text
//! +---------------------+
//! | count (u64)         |
//! +---------------------+
//! | Tensor 0 (data)     |  <- channels/height/width + flat f32 payload
//! +---------------------+
//! | Tensor 1 (label)    |
//! +---------------------+
//! ```
//!
//! Exactly two embedded tensors are expected: index 0 is the data map,
//! index 1 is the label map. Any other count means the dataset is corrupt or
//! written for a different consumer, and the whole run must stop.
//!
//! Migration never calls into this module: it copies keys and values as
//! opaque bytes, preserving whatever schema the records carry.

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// Shape metadata of one tensor record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorShape {
    pub channels: u32,
    pub height: u32,
    pub width: u32,
}

impl TensorShape {
    /// Number of elements in the flattened payload.
    pub fn len(&self) -> usize {
        self.channels as usize * self.height as usize * self.width as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for TensorShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.channels, self.height, self.width)
    }
}

/// One embedded tensor record: shape metadata plus a flat float payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub channels: u32,
    pub height: u32,
    pub width: u32,
    pub values: Vec<f32>,
}

impl Tensor {
    pub fn new(channels: u32, height: u32, width: u32, values: Vec<f32>) -> Self {
        Self {
            channels,
            height,
            width,
            values,
        }
    }

    pub fn shape(&self) -> TensorShape {
        TensorShape {
            channels: self.channels,
            height: self.height,
            width: self.width,
        }
    }
}

/// Decoded form of one stored value: the (data, label) tensor pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPair {
    pub data: Tensor,
    pub label: Tensor,
}

/// Decodes a stored value into its (data, label) tensor pair.
///
/// # Errors
///
/// Returns `DataError::Schema` if the value does not decode, does not hold
/// exactly two embedded tensors, or a tensor's payload length disagrees with
/// its shape metadata.
pub fn decode_pair(value: &[u8]) -> Result<RecordPair> {
    let tensors: Vec<Tensor> = bincode::deserialize(value)
        .map_err(|e| DataError::schema(format!("undecodable record value: {e}")))?;

    if tensors.len() != 2 {
        return Err(DataError::schema(format!(
            "expected exactly 2 embedded tensors (data, label), found {}",
            tensors.len()
        )));
    }
    for (index, tensor) in tensors.iter().enumerate() {
        let expected = tensor.shape().len();
        if tensor.values.len() != expected {
            return Err(DataError::schema(format!(
                "tensor {index} payload holds {} values, shape {} implies {expected}",
                tensor.values.len(),
                tensor.shape(),
            )));
        }
    }

    let [data, label]: [Tensor; 2] = tensors
        .try_into()
        .map_err(|_| DataError::schema("tensor pair extraction failed"))?;
    Ok(RecordPair { data, label })
}

/// Encodes a sequence of tensor records into the stored value format.
///
/// The ingestion path only ever reads values, but dataset-authoring tools and
/// tests need the inverse of [`decode_pair`].
pub fn encode_records(tensors: &[Tensor]) -> Result<Vec<u8>> {
    bincode::serialize(tensors)
        .map_err(|e| DataError::schema(format!("failed to encode record value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(channels: u32, height: u32, width: u32) -> Tensor {
        let len = (channels * height * width) as usize;
        Tensor::new(channels, height, width, (0..len).map(|i| i as f32).collect())
    }

    #[test]
    fn test_shape_len() {
        let shape = TensorShape {
            channels: 3,
            height: 4,
            width: 5,
        };
        assert_eq!(shape.len(), 60);
        assert_eq!(shape.to_string(), "3x4x5");
    }

    #[test]
    fn test_decode_pair_roundtrip() {
        let data = tensor(3, 2, 2);
        let label = tensor(1, 2, 2);
        let value = encode_records(&[data.clone(), label.clone()]).unwrap();

        let pair = decode_pair(&value).unwrap();
        assert_eq!(pair.data, data);
        assert_eq!(pair.label, label);
        assert_eq!(pair.data.values.len(), pair.data.shape().len());
    }

    #[test]
    fn test_decode_rejects_wrong_count() {
        for count in [0usize, 1, 3] {
            let tensors: Vec<Tensor> = (0..count).map(|_| tensor(1, 1, 1)).collect();
            let value = encode_records(&tensors).unwrap();
            let err = decode_pair(&value).unwrap_err();
            assert!(
                matches!(err, DataError::Schema { .. }),
                "count {count} must be a schema violation"
            );
        }
    }

    #[test]
    fn test_decode_rejects_payload_mismatch() {
        let mut data = tensor(2, 2, 2);
        data.values.pop();
        let value = encode_records(&[data, tensor(1, 1, 1)]).unwrap();

        let err = decode_pair(&value).unwrap_err();
        assert!(err.to_string().contains("payload"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_pair(b"\xff\xff\xff").unwrap_err();
        assert!(matches!(err, DataError::Schema { .. }));
    }
}
