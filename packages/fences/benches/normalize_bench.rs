use criterion::{black_box, criterion_group, criterion_main, Criterion};
use folio_fences::normalize;

fn normalize_small_document(c: &mut Criterion) {
    let source = "# Install\n\n```sh\nnpm install\n```\n\nThen run:\n\n```js\nrun()\n```\n";

    c.bench_function("normalize_small_document", |b| {
        b.iter(|| normalize(black_box(source)))
    });
}

fn normalize_large_document(c: &mut Criterion) {
    let section = "## Step\n\nSome prose about the step.\n\n```yml\nkey: value\nlist:\n  - a\n  - b\n```\n\n```\nplain output\n```\n\n";
    let source = section.repeat(500);

    c.bench_function("normalize_large_document", |b| {
        b.iter(|| normalize(black_box(&source)))
    });

    let normalized = normalize(&source).normalized;
    c.bench_function("normalize_already_normalized", |b| {
        b.iter(|| normalize(black_box(&normalized)))
    });
}

criterion_group!(benches, normalize_small_document, normalize_large_document);
criterion_main!(benches);
