//! Isolation Forest scoring (anomaly detector)
//!
//! Anomalies are easier to isolate than normal points, so they end up at
//! shorter average path lengths across the forest. The forest here is
//! persisted and only scored; it is never refit. Splits send
//! `x <= threshold` left, the way scikit-learn's tree traversal does.
//!
//! # References
//!
//! Liu, F. T., Ting, K. M., & Zhou, Z. H. (2008). Isolation forest.
//! In 2008 Eighth IEEE International Conference on Data Mining (pp. 413-422).

use super::persistence::ModelMetadata;
use super::{AnomalyLabel, ModelArtifact};
use crate::vector::IndicatorVector;
use serde::{Deserialize, Serialize};

/// Score above which a sample is an outlier (the "auto" contamination offset)
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 0.5;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

fn default_threshold() -> f64 {
    DEFAULT_OUTLIER_THRESHOLD
}

/// A node in an Isolation Tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationNode {
    /// Internal node with split feature and threshold
    Internal {
        feature_idx: usize,
        threshold: f64,
        left: Box<IsolationNode>,
        right: Box<IsolationNode>,
    },
    /// Leaf node with the training sample count that reached it
    Leaf { size: usize },
}

impl IsolationNode {
    /// Path length from this node for a given sample
    fn path_length(&self, sample: &[f64], current_depth: usize) -> f64 {
        match self {
            IsolationNode::Internal {
                feature_idx,
                threshold,
                left,
                right,
            } => {
                let x = sample.get(*feature_idx).copied().unwrap_or(0.0);
                if x <= *threshold {
                    left.path_length(sample, current_depth + 1)
                } else {
                    right.path_length(sample, current_depth + 1)
                }
            }
            IsolationNode::Leaf { size } => {
                // Unresolved instances add the expected BST path length
                current_depth as f64 + Self::average_path_length(*size)
            }
        }
    }

    /// Expected path length of an unsuccessful BST search over `n` samples
    pub fn average_path_length(n: usize) -> f64 {
        match n {
            0 | 1 => 0.0,
            2 => 1.0,
            _ => {
                let n_minus_1 = (n - 1) as f64;
                2.0 * (n_minus_1.ln() + EULER_GAMMA) - 2.0 * n_minus_1 / n as f64
            }
        }
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        match self {
            IsolationNode::Internal {
                feature_idx,
                threshold,
                left,
                right,
            } => {
                if *feature_idx >= n_features {
                    return Err(format!(
                        "split on feature {} but model has {} features",
                        feature_idx, n_features
                    ));
                }
                if !threshold.is_finite() {
                    return Err(format!(
                        "non-finite split threshold on feature {}",
                        feature_idx
                    ));
                }
                left.validate(n_features)?;
                right.validate(n_features)
            }
            IsolationNode::Leaf { .. } => Ok(()),
        }
    }
}

/// Persisted Isolation Forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForestDetector {
    pub n_features: usize,
    /// Sub-sampling size each tree was built from
    pub subsample_size: usize,
    /// Anomaly score above which a sample is an Outlier
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub trees: Vec<IsolationNode>,
    #[serde(default)]
    pub metadata: ModelMetadata,
}

impl IsolationForestDetector {
    pub fn new(n_features: usize, subsample_size: usize, trees: Vec<IsolationNode>) -> Self {
        Self {
            n_features,
            subsample_size,
            threshold: DEFAULT_OUTLIER_THRESHOLD,
            trees,
            metadata: ModelMetadata::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Anomaly score in (0, 1]; higher is more anomalous, ~0.5 is unremarkable
    pub fn anomaly_score(&self, vector: &IndicatorVector) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sample = vector.to_f64();

        let avg_path_length: f64 = self
            .trees
            .iter()
            .map(|tree| tree.path_length(&sample, 0))
            .sum::<f64>()
            / self.trees.len() as f64;

        let c = IsolationNode::average_path_length(self.subsample_size);
        2_f64.powf(-avg_path_length / c)
    }

    /// Structural checks run once at load time
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        if self.subsample_size < 2 {
            return Err(format!(
                "subsample size must be >= 2, got {}",
                self.subsample_size
            ));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(format!(
                "outlier threshold must be in (0, 1), got {}",
                self.threshold
            ));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| format!("tree {}: {}", idx, e))?;
        }
        Ok(())
    }
}

impl ModelArtifact for IsolationForestDetector {
    type Label = AnomalyLabel;

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, vector: &IndicatorVector) -> AnomalyLabel {
        if self.anomaly_score(vector) > self.threshold {
            AnomalyLabel::Outlier
        } else {
            AnomalyLabel::Normal
        }
    }
}
