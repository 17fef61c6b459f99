//! Gradient-boosted decision trees (primary classifier)
//!
//! Binary classifier over indicator vectors: the raw score is the base
//! score plus the leaf value each tree assigns, and the positive class
//! (Malicious) is predicted when the logistic of the raw score exceeds
//! `threshold`. Splits send `x <= threshold` to the left child, matching
//! how LightGBM dumps numerical splits, and a probability of exactly
//! `threshold` resolves to Benign like LightGBM's argmax does.

use super::persistence::ModelMetadata;
use super::{ModelArtifact, PrimaryLabel};
use crate::vector::IndicatorVector;
use serde::{Deserialize, Serialize};

fn default_threshold() -> f64 {
    0.5
}

/// One node of a regression tree
///
/// Externally tagged (`{"split": {...}}` / `{"leaf": {...}}`) so the same
/// shape survives both JSON and the bincode payload of `.apr` files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        value: f64,
    },
}

impl TreeNode {
    fn leaf_value(&self, sample: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = sample.get(*feature).copied().unwrap_or(0.0);
                    node = if x <= *threshold { left.as_ref() } else { right.as_ref() };
                }
                TreeNode::Leaf { value } => return *value,
            }
        }
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        match self {
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= n_features {
                    return Err(format!(
                        "split on feature {} but model has {} features",
                        feature, n_features
                    ));
                }
                if !threshold.is_finite() {
                    return Err(format!("non-finite split threshold on feature {}", feature));
                }
                left.validate(n_features)?;
                right.validate(n_features)
            }
            TreeNode::Leaf { value } => {
                if value.is_finite() {
                    Ok(())
                } else {
                    Err("non-finite leaf value".to_string())
                }
            }
        }
    }
}

/// Boosted tree ensemble with a logistic link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    pub n_features: usize,
    #[serde(default)]
    pub base_score: f64,
    /// Probability above which the sample is Malicious
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub trees: Vec<TreeNode>,
    #[serde(default)]
    pub metadata: ModelMetadata,
}

impl GradientBoostedClassifier {
    pub fn new(n_features: usize, trees: Vec<TreeNode>) -> Self {
        Self {
            n_features,
            base_score: 0.0,
            threshold: default_threshold(),
            trees,
            metadata: ModelMetadata::default(),
        }
    }

    pub fn with_base_score(mut self, base_score: f64) -> Self {
        self.base_score = base_score;
        self
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sum of base score and every tree's leaf value
    pub fn raw_score(&self, sample: &[f64]) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|tree| tree.leaf_value(sample))
                .sum::<f64>()
    }

    /// Probability of the Malicious class
    pub fn probability(&self, vector: &IndicatorVector) -> f64 {
        let raw = self.raw_score(&vector.to_f64());
        1.0 / (1.0 + (-raw).exp())
    }

    /// Structural checks run once at load time
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(format!(
                "decision threshold must be in (0, 1), got {}",
                self.threshold
            ));
        }
        if !self.base_score.is_finite() {
            return Err("non-finite base score".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| format!("tree {}: {}", idx, e))?;
        }
        Ok(())
    }
}

impl ModelArtifact for GradientBoostedClassifier {
    type Label = PrimaryLabel;

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, vector: &IndicatorVector) -> PrimaryLabel {
        if self.probability(vector) > self.threshold {
            PrimaryLabel::Malicious
        } else {
            PrimaryLabel::Benign
        }
    }
}
