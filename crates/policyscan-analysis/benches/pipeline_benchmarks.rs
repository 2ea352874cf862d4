//! Throughput benchmarks for the analysis pipeline
//!
//! Run with: cargo bench -p policyscan-analysis

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use policyscan_analysis::{
    AnalysisConfig, Classifier, Normalizer, PatternClassifier, PatternRegistry, PolicyAnalyzer,
    Segmenter,
};
use policyscan_core::{RawDocumentText, Segment};

const POLICY_PAGE: &str = "SECTION 4 - EXCLUSIONS\n\n\
    The Company shall not be liable for any claim arising out of pre-existing diseases \
    until 48 months of continuous cover have elapsed. Cosmetic surgery, dental treat-\n\
    ment and spectacles are excluded. Benefits are payable subject to the sum insured \
    and at the sole discretion of the Company.\n\n\
    \u{2022} Cashless hospitalization is available at network hospitals.\n\
    \u{2022} A no claim bonus of 10% of the sum insured is included for every claim-free year.\n\
    (a) Room rent is capped at 1% of the sum insured per day; \
    (b) claims must be submitted within 30 days of discharge.\n\n\
    Page 1 of 20";

fn document(pages: usize) -> RawDocumentText {
    RawDocumentText::from_pages(std::iter::repeat(POLICY_PAGE).take(pages))
}

/// Benchmark the full pipeline over growing documents
fn benchmark_pipeline(c: &mut Criterion) {
    let registry = Arc::new(PatternRegistry::builtin().expect("Failed to load builtin patterns"));
    let analyzer = PolicyAnalyzer::new(registry, &AnalysisConfig::default())
        .expect("Failed to build analyzer");

    let mut group = c.benchmark_group("pipeline");
    for pages in [1, 10, 50] {
        let doc = document(pages);
        group.throughput(Throughput::Bytes((POLICY_PAGE.len() * pages) as u64));
        group.bench_with_input(BenchmarkId::new("analyze", pages), &doc, |b, doc| {
            b.iter(|| analyzer.analyze(black_box(doc)).unwrap());
        });
    }
    group.finish();
}

/// Benchmark each stage on a single page
fn benchmark_stages(c: &mut Criterion) {
    let registry = Arc::new(PatternRegistry::builtin().expect("Failed to load builtin patterns"));
    let classifier = PatternClassifier::new(registry, Default::default())
        .expect("Failed to build classifier");
    let normalizer = Normalizer::default();
    let segmenter = Segmenter::new(Default::default()).expect("Failed to build segmenter");

    let doc = document(1);
    let normalized = normalizer.normalize(&doc);
    let segments: Vec<Segment> = segmenter.segment(&normalized);

    let mut group = c.benchmark_group("stages");
    group.bench_function("normalize", |b| b.iter(|| normalizer.normalize(black_box(&doc))));
    group.bench_function("segment", |b| b.iter(|| segmenter.segment(black_box(&normalized))));
    group.bench_function("classify", |b| {
        b.iter(|| {
            for segment in &segments {
                black_box(classifier.classify(segment).unwrap());
            }
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_pipeline, benchmark_stages);
criterion_main!(benches);
