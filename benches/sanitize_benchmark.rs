use criterion::{black_box, criterion_group, criterion_main, Criterion};
use muse_usage::models::{CounterUpdate, Tier, UsageUpdate};
use muse_usage::services::sanitize_for_persistence;
use serde_json::{json, Value};

/// Build a payload shaped like a real writing-canvas autosave: chapters,
/// scenes, and a sprinkling of framework-internal keys to strip.
fn autosave_payload(chapters: usize) -> Value {
    let chapter = |i: usize| {
        json!({
            "title": format!("Chapter {}", i),
            "__reactFiber$abc": {"stateNode": i},
            "scenes": (0..8).map(|s| json!({
                "heading": format!("Scene {}", s),
                "beats": ["setup", "turn", "payoff"],
                "__draftMarker": true
            })).collect::<Vec<_>>()
        })
    };

    json!({
        "title": "Working Title",
        "$schema": "muse/v1",
        "chapters": (0..chapters).map(chapter).collect::<Vec<_>>()
    })
}

fn benchmark_sanitize(c: &mut Criterion) {
    let small = autosave_payload(3);
    let large = autosave_payload(60);

    let mut group = c.benchmark_group("sanitize_for_persistence");
    group.bench_function("autosave_small", |b| {
        b.iter(|| sanitize_for_persistence(black_box(&small)))
    });
    group.bench_function("autosave_large", |b| {
        b.iter(|| sanitize_for_persistence(black_box(&large)))
    });
    group.finish();
}

fn benchmark_merge(c: &mut Criterion) {
    let current = Tier::Pro.default_limits();
    let update = UsageUpdate {
        arc_analyses: Some(CounterUpdate {
            used: 12,
            limit: 0,
            unlimited: true,
        }),
        projects: Some(CounterUpdate {
            used: 4,
            limit: 25,
            unlimited: false,
        }),
        ..Default::default()
    };

    c.bench_function("usage_merge", |b| {
        b.iter(|| black_box(&current).merge(black_box(&update)))
    });
}

criterion_group!(benches, benchmark_sanitize, benchmark_merge);
criterion_main!(benches);
