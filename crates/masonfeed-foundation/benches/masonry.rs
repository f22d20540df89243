use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use masonfeed_core::Post;
use masonfeed_foundation::masonry::{
    place_items, share_posts, AspectRatioEstimator, MasonryConfig, MasonryLayoutEngine,
    MeasuredHeights,
};

fn feed(count: u64) -> Vec<std::rc::Rc<Post>> {
    share_posts((0..count).map(|id| Post::new(id, format!("photo {id}"))))
}

/// Raw placement with varying card heights.
fn bench_place_items(c: &mut Criterion) {
    let mut group = c.benchmark_group("place_items");

    for item_count in [100usize, 1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(item_count),
            &item_count,
            |b, &count| {
                b.iter(|| {
                    place_items(black_box(count), 4, 16.0, |i| 200.0 + (i % 7) as f32 * 40.0)
                });
            },
        );
    }

    group.finish();
}

/// Full engine pass, half the cards with measured heights.
fn bench_engine_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_layout");
    let engine = MasonryLayoutEngine::new(MasonryConfig::default())
        .expect("default config is valid")
        .with_estimator(AspectRatioEstimator::portrait_card());

    for item_count in [100u64, 1_000] {
        let posts = feed(item_count);
        let mut measured = MeasuredHeights::new();
        for id in (0..item_count).step_by(2) {
            measured.record(id, 300.0 + (id % 5) as f32 * 25.0);
        }

        for width in [480.0f32, 900.0, 1400.0] {
            group.bench_with_input(
                BenchmarkId::new(format!("{item_count}_items"), width),
                &width,
                |b, &width| b.iter(|| engine.layout(black_box(&posts), width, &measured)),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_place_items, bench_engine_layout);
criterion_main!(benches);
