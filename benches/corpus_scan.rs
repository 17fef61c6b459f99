//! Listing scan throughput
//!
//! Measures the per-listing cost of testing every unset catalog entry
//! against a listing text, for both matcher strategies.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench corpus_scan
//! ```

use apktriage::extractor::FeatureAccumulator;
use apktriage::matcher::{MatcherKind, TokenMatcher};
use apktriage::schema::FeatureSchema;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::{Path, PathBuf};

/// Synthetic smali body with no catalog tokens, so nothing short-circuits
fn synthetic_listing(i: usize, methods: usize) -> String {
    let mut text = format!(".class public Lcom/bench/C{};\n.super Ljava/lang/Object;\n", i);
    for m in 0..methods {
        text.push_str(&format!(
            ".method public m{}()V\n    const/4 v0, 0x{:x}\n    invoke-static {{v0}}, Lcom/bench/Util;->noop(I)V\n    return-void\n.end method\n",
            m, m
        ));
    }
    text
}

fn scan(schema: &FeatureSchema, corpus: &[(PathBuf, String)], matcher: &dyn TokenMatcher) -> usize {
    let mut acc = FeatureAccumulator::new(schema);
    for (path, text) in corpus {
        acc.observe_listing(path, text, matcher);
    }
    acc.vector().count_set()
}

fn bench_scan(c: &mut Criterion) {
    let schema = FeatureSchema::android();
    let mut group = c.benchmark_group("corpus_scan");

    for listings in [10usize, 100] {
        let corpus: Vec<(PathBuf, String)> = (0..listings)
            .map(|i| {
                (
                    Path::new("smali/com/bench").join(format!("C{}.smali", i)),
                    synthetic_listing(i, 20),
                )
            })
            .collect();

        for kind in [MatcherKind::Substring, MatcherKind::WordBoundary] {
            let matcher = kind.build();
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", kind), listings),
                &corpus,
                |b, corpus| b.iter(|| scan(black_box(&schema), black_box(corpus), matcher.as_ref())),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
