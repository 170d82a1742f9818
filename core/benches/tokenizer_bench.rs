use criterion::{criterion_group, criterion_main, Criterion};
use fluxdocs_core::tokenizer::tokenize_with_counts;
use fluxdocs_core::{InvertedIndex, Metadata, SourceDocument};

const TEXT: &str = "The HelmRelease API allows for controller-driven reconciliation of Helm releases \
via Helm actions such as install, upgrade, test, uninstall, and rollback. In addition to this, it \
detects and corrects cluster state drift from the desired release state. HelmReleases reference \
HelmCharts produced from HelmRepositories, GitRepositories, Buckets or OCIRepositories, and support \
v2beta1 and v2 API versions with SSH and token authentication for private sources.";

fn corpus() -> InvertedIndex {
    let docs = (0..50).map(|i| SourceDocument {
        id: format!("doc{i}"),
        content: format!("{TEXT} document{i} retry{}", i % 7),
        metadata: Metadata { keywords: vec![format!("keyword{}", i % 5)], ..Default::default() },
    });
    InvertedIndex::build(docs).expect("non-empty corpus")
}

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_paragraph", |b| b.iter(|| tokenize_with_counts(TEXT)));
}

fn bench_search(c: &mut Criterion) {
    let index = corpus();
    c.bench_function("search_50_docs", |b| b.iter(|| index.search("helm drift detection retry3 keyword2", 10)));
}

criterion_group!(benches, bench_tokenize, bench_search);
criterion_main!(benches);
