//! Triage configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file
//! (or no file at all) is valid. Command-line flags override file values.
//!
//! # Example
//! ```
//! use apktriage::config::TriageConfig;
//!
//! let config: TriageConfig = toml::from_str(r#"
//!     primary_model = "models/primary.apr"
//!     matcher = "word-boundary"
//! "#).unwrap();
//! assert_eq!(config.anomaly_model.to_str(), Some("isolation_forest_model.apr"));
//! ```

use crate::matcher::MatcherKind;
use crate::schema::{FeatureSchema, SchemaError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid feature catalog: {0}")]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriageConfig {
    /// Primary (gradient-boosted) model artifact
    pub primary_model: PathBuf,

    /// Anomaly (isolation forest) model artifact
    pub anomaly_model: PathBuf,

    /// apktool executable used when the target is a package file
    pub apktool: PathBuf,

    /// Where packages are decompiled to
    pub work_dir: PathBuf,

    /// Token matching strategy for the listing scan
    pub matcher: MatcherKind,

    /// Custom feature catalog; the built-in Android catalog when absent
    ///
    /// Must match the catalog the models were trained on, in order.
    pub features: Option<Vec<String>>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            primary_model: PathBuf::from("optimal_lightgbm_model.apr"),
            anomaly_model: PathBuf::from("isolation_forest_model.apr"),
            apktool: PathBuf::from("apktool"),
            work_dir: PathBuf::from("decompiled_output"),
            matcher: MatcherKind::Substring,
            features: None,
        }
    }
}

impl TriageConfig {
    /// Read a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// The schema this configuration selects
    pub fn schema(&self) -> Result<FeatureSchema, SchemaError> {
        match &self.features {
            Some(names) => FeatureSchema::new(names.iter().cloned()),
            None => Ok(FeatureSchema::android()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schema()?;
        Ok(())
    }
}
