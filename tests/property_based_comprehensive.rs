//! Property-based tests for extraction and cascade invariants
//!
//! Core properties covered:
//! 1. Manifest parsing never panics on arbitrary input
//! 2. Extraction is an order-independent OR-accumulation
//! 3. Observing more text never clears a bit
//! 4. Cascade short-circuit and override rule

use apktriage::cascade::{Cascade, Verdict};
use apktriage::extractor::FeatureAccumulator;
use apktriage::matcher::{SubstringMatcher, TokenMatcher, WordBoundaryMatcher};
use apktriage::model::{AnomalyLabel, ModelArtifact, PrimaryLabel};
use apktriage::reader::parse_manifest_permissions;
use apktriage::schema::FeatureSchema;
use apktriage::vector::IndicatorVector;
use proptest::prelude::*;
use std::path::Path;

fn token_soup() -> impl Strategy<Value = String> {
    let schema = FeatureSchema::android();
    let tokens: Vec<String> = schema.names().to_vec();
    prop::collection::vec(
        prop_oneof![
            prop::sample::select(tokens),
            "[a-zA-Z0-9_;/>() -]{0,12}".prop_map(|s| s),
        ],
        0..8,
    )
    .prop_map(|parts| parts.join(" "))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_manifest_parser_never_panics(xml in ".{0,200}") {
        let _ = parse_manifest_permissions(&xml);
    }

    #[test]
    fn prop_pass_order_independent(
        permissions in prop::collection::vec("[A-Z_]{3,12}|SEND_SMS|INTERNET", 0..6),
        texts in prop::collection::vec(token_soup(), 0..5),
    ) {
        let schema = FeatureSchema::android();
        let m = SubstringMatcher;
        let path = Path::new("x.smali");

        let mut a = FeatureAccumulator::new(&schema);
        a.observe_permissions(&permissions);
        for t in &texts {
            a.observe_listing(path, t, &m);
        }

        let mut b = FeatureAccumulator::new(&schema);
        for t in texts.iter().rev() {
            b.observe_listing(path, t, &m);
        }
        b.observe_permissions(&permissions);

        prop_assert_eq!(a.vector(), b.vector());
    }

    #[test]
    fn prop_more_text_never_clears_bits(
        base in prop::collection::vec(token_soup(), 0..4),
        extra in token_soup(),
    ) {
        let schema = FeatureSchema::android();
        let m = SubstringMatcher;
        let path = Path::new("x.smali");

        let mut acc = FeatureAccumulator::new(&schema);
        for t in &base {
            acc.observe_listing(path, t, &m);
        }
        let before = acc.vector();
        let newly_set = acc.observe_listing(path, &extra, &m);
        let after = acc.vector();

        for idx in 0..schema.len() {
            prop_assert!(!before.is_set(idx) || after.is_set(idx));
        }
        prop_assert_eq!(after.count_set(), before.count_set() + newly_set);
    }

    #[test]
    fn prop_word_boundary_implies_substring(token in "[a-zA-Z]{1,6}", text in ".{0,40}") {
        if WordBoundaryMatcher.contains(&token, &text) {
            prop_assert!(SubstringMatcher.contains(&token, &text));
        }
    }
}

struct ByBit<L: Copy> {
    bit: usize,
    set: L,
    unset: L,
}

impl<L: Copy + Send + Sync> ModelArtifact for ByBit<L> {
    type Label = L;

    fn n_features(&self) -> usize {
        4
    }

    fn predict(&self, v: &IndicatorVector) -> L {
        if v.is_set(self.bit) {
            self.set
        } else {
            self.unset
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cascade_matches_override_rule(bits in prop::collection::vec(0u8..2, 4)) {
        let primary = ByBit { bit: 0, set: PrimaryLabel::Malicious, unset: PrimaryLabel::Benign };
        let anomaly = ByBit { bit: 1, set: AnomalyLabel::Outlier, unset: AnomalyLabel::Normal };
        let cascade = Cascade::new(primary, anomaly).unwrap();

        let v = IndicatorVector::from_values(&bits);
        let expected = if bits[0] == 1 || bits[1] == 1 {
            Verdict::Malicious
        } else {
            Verdict::Benign
        };
        let decision = cascade.evaluate(&v).unwrap();

        prop_assert_eq!(decision.verdict, expected);
        prop_assert_eq!(decision.anomaly.is_none(), bits[0] == 1);
    }
}
