//! Model gateway
//!
//! Wraps the two pre-trained models behind one contract: given an
//! indicator vector, return a label. The cascade only sees
//! [`ModelArtifact`]; concrete model technologies live in submodules.
//!
//! - [`GradientBoostedClassifier`]: supervised primary model
//!   (Malicious/Benign)
//! - [`IsolationForestDetector`]: unsupervised anomaly model
//!   (Outlier/Normal)

mod boosted;
mod gateway;
mod isolation;
mod persistence;

pub use boosted::{GradientBoostedClassifier, TreeNode};
pub use gateway::{load_anomaly, load_primary, ArtifactRole, ModelLoadError};
pub use isolation::{IsolationForestDetector, IsolationNode, DEFAULT_OUTLIER_THRESHOLD};
pub use persistence::{
    save_anomaly, save_primary, ArtifactFormat, ModelMetadata, ModelPersistenceError,
    PersistenceOptions,
};

use crate::vector::IndicatorVector;
use serde::Serialize;
use std::fmt;

/// A loaded, immutable decision function over indicator vectors
///
/// Implementations must be pure: predicting never mutates the model, so a
/// loaded artifact can be shared across any number of analyses.
pub trait ModelArtifact: Send + Sync {
    type Label;

    /// Vector length the model was trained on
    fn n_features(&self) -> usize;

    fn predict(&self, vector: &IndicatorVector) -> Self::Label;
}

impl<M: ModelArtifact + ?Sized> ModelArtifact for Box<M> {
    type Label = M::Label;

    fn n_features(&self) -> usize {
        (**self).n_features()
    }

    fn predict(&self, vector: &IndicatorVector) -> Self::Label {
        (**self).predict(vector)
    }
}

/// Output of the primary classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrimaryLabel {
    Malicious,
    Benign,
}

/// Output of the anomaly detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnomalyLabel {
    /// Outside the learned distribution; treated as a malicious signal
    Outlier,
    Normal,
}

impl fmt::Display for PrimaryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryLabel::Malicious => write!(f, "Malicious"),
            PrimaryLabel::Benign => write!(f, "Benign"),
        }
    }
}

impl fmt::Display for AnomalyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyLabel::Outlier => write!(f, "Outlier"),
            AnomalyLabel::Normal => write!(f, "Normal"),
        }
    }
}
