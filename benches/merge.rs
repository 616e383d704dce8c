/// Performance benchmarks for configuration merging, cloning and
/// documentation rendering.
///
/// Class definition happens once per program start and instance cloning
/// once per student, so the budgets are generous:
/// - Subclass preparation (merge): <1ms for a realistic tree
/// - Instance clone: <100us
///
/// Run with: cargo bench --bench merge
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use examforge::exam::builtin_classes;
use examforge::group::{ConfigGroup, GroupMode};
use examforge::render::{render, RenderOptions};
use examforge::value::Definer;
use serde_json::json;
use std::time::Duration;

/// A tree shaped like a realistic exam class: a few dozen values across
/// a handful of subgroups.
fn wide_group(class: &str) -> ConfigGroup {
    let mut g = ConfigGroup::new_root("bench tree", Definer::Class(class.to_string()));
    for i in 0..8 {
        let sub = g.new_group(&format!("section_{i}"), "one section").unwrap();
        for j in 0..8 {
            sub.new_value(&format!("field_{j}"), json!(i * 8 + j), "a field")
                .unwrap();
        }
    }
    g
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    group.measurement_time(Duration::from_secs(5));
    group.sample_size(100);

    group.bench_function("disjoint_update", |b| {
        let source = wide_group("B");
        b.iter(|| {
            let mut target = ConfigGroup::new_root("", Definer::Class("A".into()));
            target.update(black_box(&source)).unwrap();
            black_box(target);
        });
    });

    group.bench_function("overlapping_update", |b| {
        let target = wide_group("A");
        let source = wide_group("B");
        b.iter(|| {
            let mut t = target.clone();
            t.update(black_box(&source)).unwrap();
            black_box(t);
        });
    });

    group.finish();
}

fn bench_clone(c: &mut Criterion) {
    let mut group = c.benchmark_group("instance_clone");
    group.measurement_time(Duration::from_secs(5));
    group.sample_size(100);

    let frozen = wide_group("Exam");
    let definer = Definer::Instance {
        class: "Exam".into(),
        label: "student".into(),
    };
    group.bench_function("clone_with", |b| {
        b.iter(|| {
            black_box(frozen.clone_with(definer.clone(), GroupMode::Instance));
        });
    });

    group.bench_function("value_dict", |b| {
        b.iter(|| {
            black_box(frozen.value_dict());
        });
    });

    group.finish();
}

fn bench_lifecycle_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("lifecycle");
    group.measurement_time(Duration::from_secs(5));
    group.sample_size(50);

    group.bench_function("builtin_hierarchy", |b| {
        b.iter(|| {
            black_box(builtin_classes().unwrap());
        });
    });

    let tree = wide_group("Exam");
    let options = RenderOptions::default();
    group.bench_function("render_combined", |b| {
        b.iter(|| {
            black_box(render(&tree, &options).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_merge, bench_clone, bench_lifecycle_and_render);
criterion_main!(benches);
