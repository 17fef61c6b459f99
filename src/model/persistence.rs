//! Model artifact persistence
//!
//! Artifacts are stored either in aprender's `.apr` container (compressed,
//! the default) or as plain JSON, which is what the export script of the
//! training environment emits. The format is chosen by file extension.
//!
//! Saving exists for tooling and fixtures. Nothing in this crate trains a
//! model.

use super::boosted::GradientBoostedClassifier;
use super::isolation::IsolationForestDetector;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while writing model artifacts
#[derive(Error, Debug)]
pub enum ModelPersistenceError {
    #[error("Failed to save model: {0}")]
    SaveError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// On-disk artifact format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// aprender `.apr` container
    Apr,
    /// serde_json document
    Json,
}

impl ArtifactFormat {
    /// `.json` files are JSON; everything else is treated as `.apr`
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ArtifactFormat::Json,
            _ => ArtifactFormat::Apr,
        }
    }
}

/// Metadata carried by every artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Tool and version that exported the model
    #[serde(default)]
    pub producer: String,
    /// When the model was trained (ISO 8601 or Unix seconds)
    #[serde(default)]
    pub trained_at: String,
    /// Number of samples used for training
    #[serde(default)]
    pub training_samples: usize,
    /// Column names in training order; empty when the exporter did not record them
    #[serde(default)]
    pub feature_names: Vec<String>,
    /// Model-specific hyperparameters
    #[serde(default)]
    pub hyperparameters: HashMap<String, String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ModelMetadata {
    pub fn new(training_samples: usize) -> Self {
        Self {
            producer: format!("apktriage {}", env!("CARGO_PKG_VERSION")),
            trained_at: unix_timestamp(),
            training_samples,
            ..Self::default()
        }
    }

    pub fn with_feature_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hyperparameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.hyperparameters.insert(key.into(), value.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

fn unix_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", duration.as_secs())
}

/// Options for saving models
#[derive(Debug, Clone)]
pub struct PersistenceOptions {
    /// zstd compression for `.apr` (default: true)
    pub compress: bool,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Default for PersistenceOptions {
    fn default() -> Self {
        Self {
            compress: true,
            name: None,
            description: None,
        }
    }
}

impl PersistenceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Write a primary model artifact
pub fn save_primary(
    model: &GradientBoostedClassifier,
    path: impl AsRef<Path>,
    options: PersistenceOptions,
) -> Result<(), ModelPersistenceError> {
    save_artifact(model, path.as_ref(), options)
}

/// Write an anomaly model artifact
pub fn save_anomaly(
    model: &IsolationForestDetector,
    path: impl AsRef<Path>,
    options: PersistenceOptions,
) -> Result<(), ModelPersistenceError> {
    save_artifact(model, path.as_ref(), options)
}

fn save_artifact<T: Serialize>(
    model: &T,
    path: &Path,
    options: PersistenceOptions,
) -> Result<(), ModelPersistenceError> {
    match ArtifactFormat::from_path(path) {
        ArtifactFormat::Json => {
            let json = serde_json::to_string_pretty(model)
                .map_err(|e| ModelPersistenceError::SaveError(e.to_string()))?;
            fs::write(path, json)?;
            Ok(())
        }
        ArtifactFormat::Apr => {
            use aprender::format::{save, Compression, ModelType, SaveOptions};

            let compression = if options.compress {
                Compression::ZstdDefault
            } else {
                Compression::None
            };

            let mut save_options = SaveOptions::new().with_compression(compression);
            if let Some(name) = options.name {
                save_options = save_options.with_name(name);
            }
            if let Some(desc) = options.description {
                save_options = save_options.with_description(desc);
            }

            save(model, ModelType::Custom, path, save_options)
                .map_err(|e| ModelPersistenceError::SaveError(e.to_string()))
        }
    }
}

/// Deserialize an artifact; the error string is reported by the gateway
pub(crate) fn load_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    match ArtifactFormat::from_path(path) {
        ArtifactFormat::Json => {
            let data = fs::read_to_string(path).map_err(|e| e.to_string())?;
            serde_json::from_str(&data).map_err(|e| e.to_string())
        }
        ArtifactFormat::Apr => {
            use aprender::format::{load, ModelType};
            load::<T>(path, ModelType::Custom).map_err(|e| e.to_string())
        }
    }
}
