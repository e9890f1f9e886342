//! Benchmarks for drop-target resolution and the reducer.
//!
//! Run with: cargo bench -p ninezone-layout

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use ninezone_layout::{
    DragItem, LayoutAction, LayoutGeometry, LayoutState, PanelSide, Point, Rect, Size,
    TargetTuning, Widget, reduce, resolve_target, resolve_target_in,
};
use std::hint::black_box;

/// A layout with `floating` overlapping floating widgets on top of a fully
/// populated set of panels.
fn make_state(floating: usize) -> LayoutState {
    let mut builder = LayoutState::builder(Size::new(1920.0, 1080.0));
    for (side, prefix) in [
        (PanelSide::Left, "l"),
        (PanelSide::Right, "r"),
        (PanelSide::Top, "t"),
        (PanelSide::Bottom, "b"),
    ] {
        builder = builder
            .dock(
                side,
                Widget::single(format!("{prefix}1"), format!("{prefix}1-a"))
                    .with_tab(format!("{prefix}1-b")),
            )
            .dock(side, Widget::single(format!("{prefix}2"), format!("{prefix}2-a")))
            .dock_in(side, 1, Widget::single(format!("{prefix}3"), format!("{prefix}3-a")));
    }
    for i in 0..floating {
        let offset = (i * 17) as f64;
        builder = builder.float(
            Widget::single(format!("f{i}"), format!("f{i}-a")),
            Rect::new(300.0 + offset, 200.0 + offset, 320.0, 240.0),
        );
    }
    builder.build().expect("bench layout is valid")
}

fn pointers() -> Vec<Point> {
    (0..64)
        .map(|i| Point::new((i * 29 % 1920) as f64, (i * 53 % 1080) as f64))
        .collect()
}

fn bench_resolve_target(c: &mut Criterion) {
    let mut group = c.benchmark_group("target/resolve");
    let tuning = TargetTuning::default();
    let item = DragItem::tab("l1-b");
    let points = pointers();

    for floating in [0, 4, 16, 64] {
        let state = make_state(floating);
        group.bench_with_input(BenchmarkId::new("solve_each", floating), &state, |b, state| {
            b.iter(|| {
                for pointer in &points {
                    black_box(resolve_target(state, &item, *pointer, &tuning).ok());
                }
            })
        });

        let geometry = LayoutGeometry::solve(&state, &tuning);
        group.bench_with_input(
            BenchmarkId::new("cached_geometry", floating),
            &state,
            |b, state| {
                b.iter(|| {
                    for pointer in &points {
                        black_box(resolve_target_in(state, &geometry, &item, *pointer, &tuning).ok());
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/reduce");

    for floating in [0, 16, 64] {
        let state = make_state(floating);
        group.bench_with_input(BenchmarkId::new("float_send_back", floating), &state, |b, state| {
            b.iter_batched(
                || state.clone(),
                |state| {
                    let floated = reduce(&state, &LayoutAction::float("l2", None)).ok()?;
                    black_box(reduce(&floated, &LayoutAction::send_back("l2")).ok())
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("document_hash", floating), &state, |b, state| {
            b.iter(|| black_box(state.state_hash()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve_target, bench_reduce);
criterion_main!(benches);
