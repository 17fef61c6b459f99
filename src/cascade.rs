//! Cascade decision engine
//!
//! Combines the primary classifier and the anomaly detector into one
//! verdict:
//!
//! ```text
//! Start ── primary ──> PrimaryEvaluated
//!   Malicious                      ──> Final(Malicious)   anomaly skipped
//!   Benign ── anomaly ── Outlier   ──> Final(Malicious)   override
//!                    └── Normal    ──> Final(Benign)
//! ```
//!
//! The override is recall-biased: a sample the supervised model calls
//! benign but that sits outside the learned population is escalated.

use crate::model::{AnomalyLabel, ModelArtifact, PrimaryLabel};
use crate::vector::IndicatorVector;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Final classification of one application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Malicious,
    Benign,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Malicious => write!(f, "Malicious"),
            Verdict::Benign => write!(f, "Benign"),
        }
    }
}

/// Rule that produced the final verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    /// Primary said Malicious; anomaly model not consulted
    PrimaryMalicious,
    /// Primary said Benign, anomaly model flagged an outlier
    AnomalyOverride,
    /// Both stages consistent with benign
    BothBenign,
}

/// Final verdict plus the per-stage sub-verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub verdict: Verdict,
    pub primary: PrimaryLabel,
    /// `None` when the anomaly stage was skipped
    pub anomaly: Option<AnomalyLabel>,
    pub rule: DecisionRule,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CascadeError {
    #[error("Indicator vector has {found} entries, models expect {expected}")]
    InvalidVectorLength { expected: usize, found: usize },

    #[error("Primary model expects {primary} features but anomaly model expects {anomaly}")]
    IncompatibleModels { primary: usize, anomaly: usize },
}

enum CascadeState {
    Start,
    PrimaryEvaluated(PrimaryLabel),
    Final(Decision),
}

/// Two-stage classifier over indicator vectors
///
/// Holds loaded models only; `decide` never mutates, so one cascade can
/// serve any number of analyses.
pub struct Cascade<P, A> {
    primary: P,
    anomaly: A,
}

impl<P, A> Cascade<P, A>
where
    P: ModelArtifact<Label = PrimaryLabel>,
    A: ModelArtifact<Label = AnomalyLabel>,
{
    /// Pair two models trained on the same vector layout
    pub fn new(primary: P, anomaly: A) -> Result<Self, CascadeError> {
        if primary.n_features() != anomaly.n_features() {
            return Err(CascadeError::IncompatibleModels {
                primary: primary.n_features(),
                anomaly: anomaly.n_features(),
            });
        }
        Ok(Self { primary, anomaly })
    }

    pub fn n_features(&self) -> usize {
        self.primary.n_features()
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn anomaly(&self) -> &A {
        &self.anomaly
    }

    /// Final verdict for one vector
    pub fn decide(&self, vector: &IndicatorVector) -> Result<Verdict, CascadeError> {
        self.evaluate(vector).map(|decision| decision.verdict)
    }

    /// Final verdict with the sub-verdicts of each stage
    pub fn evaluate(&self, vector: &IndicatorVector) -> Result<Decision, CascadeError> {
        if vector.len() != self.n_features() {
            return Err(CascadeError::InvalidVectorLength {
                expected: self.n_features(),
                found: vector.len(),
            });
        }

        let mut state = CascadeState::Start;
        loop {
            state = match state {
                CascadeState::Start => {
                    let label = self.primary.predict(vector);
                    debug!(%label, "primary model evaluated");
                    CascadeState::PrimaryEvaluated(label)
                }
                CascadeState::PrimaryEvaluated(PrimaryLabel::Malicious) => {
                    CascadeState::Final(Decision {
                        verdict: Verdict::Malicious,
                        primary: PrimaryLabel::Malicious,
                        anomaly: None,
                        rule: DecisionRule::PrimaryMalicious,
                    })
                }
                CascadeState::PrimaryEvaluated(PrimaryLabel::Benign) => {
                    let label = self.anomaly.predict(vector);
                    debug!(%label, "anomaly model evaluated");
                    let (verdict, rule) = match label {
                        AnomalyLabel::Outlier => (Verdict::Malicious, DecisionRule::AnomalyOverride),
                        AnomalyLabel::Normal => (Verdict::Benign, DecisionRule::BothBenign),
                    };
                    CascadeState::Final(Decision {
                        verdict,
                        primary: PrimaryLabel::Benign,
                        anomaly: Some(label),
                        rule,
                    })
                }
                CascadeState::Final(decision) => return Ok(decision),
            };
        }
    }
}
