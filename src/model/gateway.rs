//! Loading and validating model artifacts
//!
//! A model trained on a different feature layout would still produce a
//! label, just a meaningless one. Every load therefore checks the
//! artifact's dimension against the schema, and its recorded column names
//! when the exporter wrote them.

use super::boosted::GradientBoostedClassifier;
use super::isolation::IsolationForestDetector;
use super::persistence::{load_artifact, ModelMetadata};
use crate::schema::FeatureSchema;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Which model an artifact provides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactRole {
    Primary,
    Anomaly,
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactRole::Primary => write!(f, "primary"),
            ArtifactRole::Anomaly => write!(f, "anomaly"),
        }
    }
}

/// Fatal errors while loading a model artifact
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("{role} model file not found: {}", .path.display())]
    NotFound { role: ArtifactRole, path: PathBuf },

    #[error("Failed to load {role} model {}: {message}", .path.display())]
    Unreadable {
        role: ArtifactRole,
        path: PathBuf,
        message: String,
    },

    #[error("Invalid {role} model {}: {message}", .path.display())]
    Invalid {
        role: ArtifactRole,
        path: PathBuf,
        message: String,
    },

    #[error(
        "{role} model {} was trained on {found} features, schema has {expected}",
        .path.display()
    )]
    DimensionMismatch {
        role: ArtifactRole,
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error(
        "{role} model {} column {column} is {found:?}, schema expects {expected:?}",
        .path.display()
    )]
    FeatureMismatch {
        role: ArtifactRole,
        path: PathBuf,
        column: usize,
        expected: String,
        found: String,
    },
}

impl ModelLoadError {
    pub fn role(&self) -> ArtifactRole {
        match self {
            ModelLoadError::NotFound { role, .. }
            | ModelLoadError::Unreadable { role, .. }
            | ModelLoadError::Invalid { role, .. }
            | ModelLoadError::DimensionMismatch { role, .. }
            | ModelLoadError::FeatureMismatch { role, .. } => *role,
        }
    }
}

/// Load the primary classifier and check it against `schema`
pub fn load_primary(
    path: impl AsRef<Path>,
    schema: &FeatureSchema,
) -> Result<GradientBoostedClassifier, ModelLoadError> {
    let path = path.as_ref();
    let role = ArtifactRole::Primary;
    let model: GradientBoostedClassifier = read(role, path)?;

    check_layout(role, path, model.n_features, &model.metadata, schema)?;
    model.validate().map_err(|message| ModelLoadError::Invalid {
        role,
        path: path.to_path_buf(),
        message,
    })?;

    info!(
        trees = model.trees.len(),
        features = model.n_features,
        "loaded primary model from {}",
        path.display()
    );
    Ok(model)
}

/// Load the anomaly detector and check it against `schema`
pub fn load_anomaly(
    path: impl AsRef<Path>,
    schema: &FeatureSchema,
) -> Result<IsolationForestDetector, ModelLoadError> {
    let path = path.as_ref();
    let role = ArtifactRole::Anomaly;
    let model: IsolationForestDetector = read(role, path)?;

    check_layout(role, path, model.n_features, &model.metadata, schema)?;
    model.validate().map_err(|message| ModelLoadError::Invalid {
        role,
        path: path.to_path_buf(),
        message,
    })?;

    info!(
        trees = model.trees.len(),
        features = model.n_features,
        "loaded anomaly model from {}",
        path.display()
    );
    Ok(model)
}

fn read<T: serde::de::DeserializeOwned>(role: ArtifactRole, path: &Path) -> Result<T, ModelLoadError> {
    if !path.is_file() {
        return Err(ModelLoadError::NotFound {
            role,
            path: path.to_path_buf(),
        });
    }
    load_artifact(path).map_err(|message| ModelLoadError::Unreadable {
        role,
        path: path.to_path_buf(),
        message,
    })
}

fn check_layout(
    role: ArtifactRole,
    path: &Path,
    n_features: usize,
    metadata: &ModelMetadata,
    schema: &FeatureSchema,
) -> Result<(), ModelLoadError> {
    if n_features != schema.len() {
        return Err(ModelLoadError::DimensionMismatch {
            role,
            path: path.to_path_buf(),
            expected: schema.len(),
            found: n_features,
        });
    }

    if metadata.feature_names.is_empty() {
        return Ok(());
    }
    if metadata.feature_names.len() != schema.len() {
        return Err(ModelLoadError::DimensionMismatch {
            role,
            path: path.to_path_buf(),
            expected: schema.len(),
            found: metadata.feature_names.len(),
        });
    }

    let mismatch = schema
        .names()
        .iter()
        .zip(&metadata.feature_names)
        .position(|(expected, found)| expected != found);
    match mismatch {
        Some(column) => Err(ModelLoadError::FeatureMismatch {
            role,
            path: path.to_path_buf(),
            column,
            expected: schema.names()[column].clone(),
            found: metadata.feature_names[column].clone(),
        }),
        None => Ok(()),
    }
}
