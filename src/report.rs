//! Output formatting for triage results

use crate::cascade::Decision;
use crate::extractor::{Extraction, ExtractionReport, MatchSource};
use crate::schema::FeatureSchema;
use crate::vector::IndicatorVector;
use clap::ValueEnum;
use serde::{Serialize, Serializer};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Output format for triage reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

/// Everything known about one analyzed application
#[derive(Debug, Clone, Serialize)]
pub struct TriageReport {
    #[serde(serialize_with = "serialize_path")]
    pub target: PathBuf,
    pub schema_fingerprint: String,
    pub features: Vec<String>,
    pub vector: IndicatorVector,
    pub extraction: ExtractionReport,
    /// `None` in extract-only mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
}

impl TriageReport {
    pub fn new(target: &Path, schema: &FeatureSchema, extraction: Extraction) -> Self {
        Self {
            target: target.to_path_buf(),
            schema_fingerprint: schema.fingerprint(),
            features: schema.names().to_vec(),
            vector: extraction.vector,
            extraction: extraction.report,
            decision: None,
        }
    }

    pub fn render(&self, format: OutputFormat, show_features: bool) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.render_text(show_features)),
            OutputFormat::Json => serde_json::to_string_pretty(self),
        }
    }

    fn render_text(&self, show_features: bool) -> String {
        let mut out = String::new();
        let rule = "=".repeat(70);

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "TRIAGE: {}", self.target.display());
        let _ = writeln!(out, "{}", rule);

        let ext = &self.extraction;
        let _ = writeln!(
            out,
            "Manifest: {:?} ({} permissions declared)",
            ext.manifest, ext.permissions_declared
        );
        let _ = writeln!(
            out,
            "Listings: {} scanned, {} skipped",
            ext.listings_scanned, ext.listings_skipped
        );
        let _ = writeln!(
            out,
            "Features: {}/{} matched",
            self.vector.count_set(),
            self.vector.len()
        );

        if show_features {
            let _ = writeln!(out);
            for m in &ext.matches {
                match &m.source {
                    MatchSource::Manifest => {
                        let _ = writeln!(out, "  [{:>2}] {} (manifest)", m.index, m.name);
                    }
                    MatchSource::Listing { path } => {
                        let _ = writeln!(out, "  [{:>2}] {} ({})", m.index, m.name, path.display());
                    }
                }
            }
        }

        if let Some(decision) = &self.decision {
            let _ = writeln!(out);
            let _ = writeln!(out, "Primary model:  {}", decision.primary);
            match decision.anomaly {
                Some(label) => {
                    let _ = writeln!(out, "Anomaly model:  {}", label);
                }
                None => {
                    let _ = writeln!(out, "Anomaly model:  skipped");
                }
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "Final verdict:  {}", decision.verdict);
        }

        let _ = writeln!(out, "{}", rule);
        out
    }
}

/// Paths are written lossily; listing names are not guaranteed to be UTF-8
pub(crate) fn serialize_path<P, S>(path: &P, serializer: S) -> Result<S::Ok, S::Error>
where
    P: AsRef<Path>,
    S: Serializer,
{
    serializer.serialize_str(&path.as_ref().to_string_lossy())
}
