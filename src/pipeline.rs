//! End-to-end triage of one application
//!
//! decompile (when given a package) → extract → cascade. Models are loaded
//! once when the [`Triage`] is built and reused for every analysis.

use crate::cascade::{Cascade, CascadeError};
use crate::config::TriageConfig;
use crate::decompile::Decompiler;
use crate::extractor::FeatureExtractor;
use crate::matcher::MatcherKind;
use crate::model::{
    load_anomaly, load_primary, AnomalyLabel, GradientBoostedClassifier, IsolationForestDetector,
    ModelArtifact, PrimaryLabel,
};
use crate::reader::DecompiledApp;
use crate::report::TriageReport;
use crate::schema::FeatureSchema;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Loaded schema, matcher, and models
pub struct Triage<P = GradientBoostedClassifier, A = IsolationForestDetector> {
    schema: FeatureSchema,
    matcher: MatcherKind,
    cascade: Cascade<P, A>,
}

impl Triage {
    /// Build the schema and load both model artifacts named by `config`
    pub fn load(config: &TriageConfig) -> Result<Self> {
        let schema = config.schema().context("invalid feature catalog")?;
        let primary = load_primary(&config.primary_model, &schema)?;
        let anomaly = load_anomaly(&config.anomaly_model, &schema)?;
        let cascade = Cascade::new(primary, anomaly)?;
        Ok(Self::new(schema, config.matcher, cascade))
    }
}

impl<P, A> Triage<P, A>
where
    P: ModelArtifact<Label = PrimaryLabel>,
    A: ModelArtifact<Label = AnomalyLabel>,
{
    pub fn new(schema: FeatureSchema, matcher: MatcherKind, cascade: Cascade<P, A>) -> Self {
        Self {
            schema,
            matcher,
            cascade,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn cascade(&self) -> &Cascade<P, A> {
        &self.cascade
    }

    /// Classify an already decompiled package directory
    pub fn analyze_dir(&self, root: &Path) -> Result<TriageReport, CascadeError> {
        let mut report = extract_report(&self.schema, self.matcher, root);
        let decision = self.cascade.evaluate(&report.vector)?;
        info!(verdict = %decision.verdict, "triage complete for {}", root.display());
        report.decision = Some(decision);
        Ok(report)
    }

    /// Decompile (if needed) and classify `target`
    pub fn analyze(
        &self,
        target: &Path,
        decompiler: &dyn Decompiler,
        work_dir: &Path,
    ) -> Result<TriageReport> {
        let root = prepare_target(target, decompiler, work_dir)?;
        let mut report = self.analyze_dir(&root)?;
        report.target = target.to_path_buf();
        Ok(report)
    }
}

/// Feature extraction only; no models involved
pub fn extract_report(schema: &FeatureSchema, matcher: MatcherKind, root: &Path) -> TriageReport {
    let extractor = FeatureExtractor::with_matcher(schema, matcher.build());
    let extraction = extractor.extract(&DecompiledApp::new(root));
    TriageReport::new(root, schema, extraction)
}

/// Directory targets are used as-is; files are decompiled into `work_dir`
pub fn prepare_target(
    target: &Path,
    decompiler: &dyn Decompiler,
    work_dir: &Path,
) -> Result<PathBuf> {
    if target.is_dir() {
        return Ok(target.to_path_buf());
    }
    decompiler
        .decompile(target, work_dir)
        .with_context(|| format!("failed to decompile {}", target.display()))
}
