//! Dataset configuration.
//!
//! This module provides configuration parsing from TOML files, environment
//! variable overrides, and validation of configuration values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{DataError, Result};

/// Embedded storage engine kind backing a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Log-structured store, opened read-only through its native iterator.
    #[default]
    LogStructured,
    /// Memory-mapped B-tree store, read under one long-lived transaction.
    Mapped,
}

impl FromStr for StoreKind {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "log_structured" | "log-structured" => Ok(Self::LogStructured),
            "mapped" => Ok(Self::Mapped),
            other => Err(DataError::config(format!("unknown backend kind '{other}'"))),
        }
    }
}

// Top-level dataset configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Storage engine kind: "log_structured" or "mapped".
    pub backend: StoreKind,
    // Path of the store directory to read records from.
    pub source: PathBuf,
    // Number of record pairs materialized per batch.
    pub batch_size: usize,
    // Upper bound for the initial random skip; 0 disables skipping.
    pub rand_skip: u32,
    /// Transform parameters applied to the data plane of each record.
    pub transform: TransformConfig,
}

/// Transform parameters handed to the downstream transform collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    // Multiplier applied to every data value after mean subtraction.
    pub scale: f32,
    // Spatial crop size; map datasets do not support cropping.
    pub crop_size: u32,
    // Whether to mirror inputs; map datasets do not support mirroring.
    pub mirror: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            backend: StoreKind::LogStructured,
            source: PathBuf::from("./data"),
            batch_size: 32,
            rand_skip: 0,
            transform: TransformConfig::default(),
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            crop_size: 0,
            mirror: false,
        }
    }
}

impl FromStr for DatasetConfig {
    type Err = DataError;

    /// Parse configuration from a TOML string.
    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| DataError::config_with_source("failed to parse TOML config", e))
    }
}

impl DatasetConfig {
    // Load configuration from a TOML file.
    //
    // # Errors
    //
    // Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DataError::store_with_source(path, "failed to read config file", e))?;
        let config: Self = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    // Apply environment variable overrides.
    //
    // Environment variables are prefixed with `MAPDATA_`:
    // - `MAPDATA_BACKEND` overrides `backend` ("log_structured" or "mapped")
    // - `MAPDATA_SOURCE` overrides `source`
    // - `MAPDATA_BATCH_SIZE` overrides `batch_size`
    // - `MAPDATA_RAND_SKIP` overrides `rand_skip`
    // - `MAPDATA_SCALE` overrides `transform.scale`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("MAPDATA_BACKEND") {
            if let Ok(kind) = val.parse() {
                self.backend = kind;
            }
        }
        if let Ok(val) = std::env::var("MAPDATA_SOURCE") {
            self.source = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("MAPDATA_BATCH_SIZE") {
            if let Ok(v) = val.parse() {
                self.batch_size = v;
            }
        }
        if let Ok(val) = std::env::var("MAPDATA_RAND_SKIP") {
            if let Ok(v) = val.parse() {
                self.rand_skip = v;
            }
        }
        if let Ok(val) = std::env::var("MAPDATA_SCALE") {
            if let Ok(v) = val.parse() {
                self.transform.scale = v;
            }
        }
        self
    }

    // Validate all configuration values.
    //
    // Runs before any record is read: positional map records (segmentation
    // label maps and the like) cannot be cropped or mirrored independently of
    // their paired data, so either request is a fatal configuration error.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(DataError::config("batch_size must be greater than 0"));
        }
        if self.transform.crop_size != 0 {
            return Err(DataError::config(
                "map datasets do not support cropping (crop_size must be 0)",
            ));
        }
        if self.transform.mirror {
            return Err(DataError::config(
                "map datasets do not support mirroring (mirror must be false)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = DatasetConfig::default();

        assert_eq!(config.backend, StoreKind::LogStructured);
        assert_eq!(config.source, PathBuf::from("./data"));
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.rand_skip, 0);
        assert_eq!(config.transform.scale, 1.0);
        assert_eq!(config.transform.crop_size, 0);
        assert!(!config.transform.mirror);
    }

    #[test]
    fn test_default_validates() {
        assert!(DatasetConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_str_partial() {
        let toml = r#"
            backend = "mapped"
            source = "/datasets/train"
            batch_size = 8
        "#;
        let config: DatasetConfig = toml.parse().unwrap();

        assert_eq!(config.backend, StoreKind::Mapped);
        assert_eq!(config.source, PathBuf::from("/datasets/train"));
        assert_eq!(config.batch_size, 8);
        // Remaining fields keep their defaults
        assert_eq!(config.rand_skip, 0);
        assert_eq!(config.transform.scale, 1.0);
    }

    #[test]
    fn test_from_str_full() {
        let toml = r#"
            backend = "log_structured"
            source = "/datasets/train"
            batch_size = 16
            rand_skip = 100

            [transform]
            scale = 0.00390625
        "#;
        let config: DatasetConfig = toml.parse().unwrap();

        assert_eq!(config.backend, StoreKind::LogStructured);
        assert_eq!(config.batch_size, 16);
        assert_eq!(config.rand_skip, 100);
        assert_eq!(config.transform.scale, 0.00390625);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result: std::result::Result<DatasetConfig, _> = "invalid = [".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "source = \"/tmp/train-db\"").unwrap();

        let config = DatasetConfig::from_file(file.path()).unwrap();
        assert_eq!(config.source, PathBuf::from("/tmp/train-db"));
    }

    #[test]
    fn test_from_file_not_found() {
        assert!(DatasetConfig::from_file("/nonexistent/config.toml").is_err());
    }

    #[test]
    fn test_validate_zero_batch_size() {
        let mut config = DatasetConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_crop() {
        let mut config = DatasetConfig::default();
        config.transform.crop_size = 227;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cropping"));
    }

    #[test]
    fn test_validate_rejects_mirror() {
        let mut config = DatasetConfig::default();
        config.transform.mirror = true;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mirroring"));
    }

    #[test]
    fn test_store_kind_from_str() {
        assert_eq!(
            "log_structured".parse::<StoreKind>().unwrap(),
            StoreKind::LogStructured
        );
        assert_eq!(
            "log-structured".parse::<StoreKind>().unwrap(),
            StoreKind::LogStructured
        );
        assert_eq!("mapped".parse::<StoreKind>().unwrap(), StoreKind::Mapped);
        assert!("btree".parse::<StoreKind>().is_err());
    }

    // Env var tests are combined into one test to avoid races between
    // parallel tests, since env vars are global state.
    #[test]
    fn test_env_overrides() {
        std::env::remove_var("MAPDATA_BACKEND");
        std::env::remove_var("MAPDATA_BATCH_SIZE");

        std::env::set_var("MAPDATA_BACKEND", "mapped");
        std::env::set_var("MAPDATA_BATCH_SIZE", "64");

        let config = DatasetConfig::default().with_env_overrides();
        assert_eq!(config.backend, StoreKind::Mapped);
        assert_eq!(config.batch_size, 64);

        std::env::set_var("MAPDATA_BATCH_SIZE", "not_a_number");
        let config = DatasetConfig::default().with_env_overrides();
        // Unparseable values are ignored
        assert_eq!(config.batch_size, 32);

        std::env::remove_var("MAPDATA_BACKEND");
        std::env::remove_var("MAPDATA_BATCH_SIZE");
    }
}
