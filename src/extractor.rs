//! Feature extraction
//!
//! Two passes over a decompiled package, both of which only ever set bits:
//!
//! 1. Manifest pass: each declared permission equal to a schema entry
//!    sets that entry.
//! 2. Corpus pass: each listing text is tested against every entry not yet
//!    set, using the configured [`TokenMatcher`].
//!
//! Because both passes are an OR-accumulation, the result does not depend
//! on pass order or listing order. The corpus walk stops early once every
//! entry is set.

use crate::matcher::{SubstringMatcher, TokenMatcher};
use crate::reader::{DecompiledApp, ReaderError};
use crate::schema::FeatureSchema;
use crate::vector::IndicatorVector;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a feature was first observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum MatchSource {
    Manifest,
    Listing {
        #[serde(serialize_with = "crate::report::serialize_path")]
        path: PathBuf,
    },
}

/// A matched feature and its first observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureMatch {
    pub index: usize,
    pub name: String,
    #[serde(flatten)]
    pub source: MatchSource,
}

/// State of the manifest during extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestStatus {
    Parsed,
    Missing,
    Unusable,
}

/// Per-application extraction details
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub manifest: ManifestStatus,
    pub permissions_declared: usize,
    pub listings_scanned: usize,
    pub listings_skipped: usize,
    /// True when every feature was set before the walk finished
    pub short_circuited: bool,
    pub matches: Vec<FeatureMatch>,
}

/// Result of extracting one application
#[derive(Debug, Clone)]
pub struct Extraction {
    pub vector: IndicatorVector,
    pub report: ExtractionReport,
}

/// Mutable bit set behind an extraction
///
/// Exposes the two passes independently so callers can apply them in any
/// order. Bits are never cleared.
pub struct FeatureAccumulator<'a> {
    schema: &'a FeatureSchema,
    bits: Vec<bool>,
    remaining: usize,
    matches: Vec<FeatureMatch>,
}

impl<'a> FeatureAccumulator<'a> {
    pub fn new(schema: &'a FeatureSchema) -> Self {
        Self {
            schema,
            bits: vec![false; schema.len()],
            remaining: schema.len(),
            matches: Vec::new(),
        }
    }

    /// Set the entries whose names equal a declared permission
    ///
    /// Returns the number of newly set entries.
    pub fn observe_permissions<I, S>(&mut self, permissions: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let schema = self.schema;
        let mut newly_set = 0;
        for permission in permissions {
            if let Some(idx) = schema.index_of(permission.as_ref()) {
                if self.set(idx, MatchSource::Manifest) {
                    debug!(feature = %permission.as_ref(), "found feature in manifest");
                    newly_set += 1;
                }
            }
        }
        newly_set
    }

    /// Test every unset entry against one listing text
    ///
    /// Returns the number of newly set entries.
    pub fn observe_listing(&mut self, path: &Path, text: &str, matcher: &dyn TokenMatcher) -> usize {
        let schema = self.schema;
        let mut newly_set = 0;
        for (idx, token) in schema.names().iter().enumerate() {
            if self.bits[idx] {
                continue;
            }
            if matcher.contains(token, text) {
                self.set(
                    idx,
                    MatchSource::Listing {
                        path: path.to_path_buf(),
                    },
                );
                debug!(feature = %token, file = %path.display(), "found feature in listing");
                newly_set += 1;
            }
        }
        newly_set
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    pub fn vector(&self) -> IndicatorVector {
        IndicatorVector::from_bits(self.bits.clone())
    }

    /// Freeze into a vector plus the matches, ordered by column
    pub fn finish(mut self) -> (IndicatorVector, Vec<FeatureMatch>) {
        self.matches.sort_by_key(|m| m.index);
        (IndicatorVector::from_bits(self.bits), self.matches)
    }

    fn set(&mut self, idx: usize, source: MatchSource) -> bool {
        if self.bits[idx] {
            return false;
        }
        self.bits[idx] = true;
        self.remaining -= 1;
        self.matches.push(FeatureMatch {
            index: idx,
            name: self.schema.names()[idx].clone(),
            source,
        });
        true
    }
}

/// Builds indicator vectors for a fixed schema and matcher
pub struct FeatureExtractor<'a> {
    schema: &'a FeatureSchema,
    matcher: Box<dyn TokenMatcher>,
}

impl<'a> FeatureExtractor<'a> {
    /// Extractor using substring containment
    pub fn new(schema: &'a FeatureSchema) -> Self {
        Self::with_matcher(schema, Box::new(SubstringMatcher))
    }

    pub fn with_matcher(schema: &'a FeatureSchema, matcher: Box<dyn TokenMatcher>) -> Self {
        Self { schema, matcher }
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.schema
    }

    /// Run both passes over a decompiled package
    pub fn extract(&self, app: &DecompiledApp) -> Extraction {
        let mut acc = FeatureAccumulator::new(self.schema);

        let (manifest, permissions_declared) = match app.read_manifest_permissions() {
            Ok(permissions) => {
                acc.observe_permissions(&permissions);
                (ManifestStatus::Parsed, permissions.len())
            }
            Err(ReaderError::MissingManifest(path)) => {
                info!("no manifest at {}, scanning listings only", path.display());
                (ManifestStatus::Missing, 0)
            }
            Err(e) => {
                warn!("{}; scanning listings only", e);
                (ManifestStatus::Unusable, 0)
            }
        };

        let mut listings = app.listing_texts();
        let mut short_circuited = acc.is_complete();
        if !short_circuited {
            for listing in listings.by_ref() {
                acc.observe_listing(&listing.path, &listing.text, self.matcher.as_ref());
                if acc.is_complete() {
                    debug!("all features set, stopping listing scan");
                    short_circuited = true;
                    break;
                }
            }
        }

        let listings_scanned = listings.scanned();
        let listings_skipped = listings.skipped();
        let (vector, matches) = acc.finish();

        info!(
            matched = vector.count_set(),
            total = vector.len(),
            listings_scanned,
            "feature extraction complete"
        );

        Extraction {
            vector,
            report: ExtractionReport {
                manifest,
                permissions_declared,
                listings_scanned,
                listings_skipped,
                short_circuited,
                matches,
            },
        }
    }
}

/// Extract the indicator vector for the package decompiled at `root`
pub fn extract(root: &Path, schema: &FeatureSchema) -> IndicatorVector {
    FeatureExtractor::new(schema)
        .extract(&DecompiledApp::new(root))
        .vector
}
