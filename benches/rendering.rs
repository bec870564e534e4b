//! Benchmarks for windowed row rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use outliner::geometry::GeometryConfig;
use outliner::listener::NoopListener;
use outliner::prelude::*;
use outliner::ui::TextRowFactory;

fn flat_source(count: usize) -> MemoryTree {
    let mut source = MemoryTree::new("root");
    let root = source.root();
    for i in 0..count {
        source.add(root, format!("item {i}")).unwrap();
    }
    source
}

fn open(source: &MemoryTree) -> Outline<TextRowFactory, NoopListener> {
    Outline::new(
        source,
        OutlineConfig::default(),
        GeometryConfig::terminal(),
        TextRowFactory::default(),
        NoopListener,
        40,
    )
}

fn bench_scroll_within_block(c: &mut Criterion) {
    let source = flat_source(100_000);
    let mut outline = open(&source);
    let mut now = 0;
    c.bench_function("scroll_within_block", |b| {
        b.iter(|| {
            now += 1;
            outline.scroll_by(black_box(1), now);
            outline.scroll_by(black_box(-1), now);
        })
    });
}

fn bench_scroll_across_blocks(c: &mut Criterion) {
    let source = flat_source(100_000);
    let mut outline = open(&source);
    let mut offset = 0;
    let mut now = 0;
    c.bench_function("scroll_across_blocks", |b| {
        b.iter(|| {
            offset = (offset + 137) % 99_000;
            now += 1;
            outline.scroll_to(black_box(offset), now);
        })
    });
}

fn bench_settled_refresh(c: &mut Criterion) {
    let source = flat_source(100_000);
    let mut outline = open(&source);
    outline.scroll_to(50_000, 0);
    outline.tick(1_000);
    c.bench_function("settled_refresh", |b| b.iter(|| outline.refresh()));
}

fn bench_open_large_outline(c: &mut Criterion) {
    let source = flat_source(20_000);
    c.bench_function("open_20k", |b| b.iter(|| open(black_box(&source))));
}

criterion_group!(
    benches,
    bench_scroll_within_block,
    bench_scroll_across_blocks,
    bench_settled_refresh,
    bench_open_large_outline
);
criterion_main!(benches);
