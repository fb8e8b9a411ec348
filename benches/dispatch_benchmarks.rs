//! Performance benchmarks for the dispatch core
//!
//! Hit testing and mouse dispatch over deep and wide window trees.

use aura_dispatch::replay::LoggingCompositor;
use aura_dispatch::{
    AuraConfig, Env, EventFlags, EventType, ManualClock, MouseEvent, Point, Rect, RootWindow, WindowDelegate,
};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::rc::Rc;

struct Sink;

impl WindowDelegate for Sink {}

fn root_window() -> RootWindow {
    RootWindow::new(
        Env::new(),
        Rc::new(LoggingCompositor::default()),
        Rc::new(ManualClock::new()),
        &AuraConfig::default(),
    )
}

/// A chain of nested windows, each inset by one pixel from its parent.
fn deep_tree(depth: usize) -> RootWindow {
    let mut rw = root_window();
    let mut parent = rw.root();
    for _ in 0..depth {
        let delegate: Rc<dyn WindowDelegate> = Rc::new(Sink);
        let window = rw.create_window(Some(delegate));
        let _ = rw.set_bounds(window, Rect::new(1, 1, 600, 500));
        let _ = rw.add_child(parent, window);
        let _ = rw.show(window);
        parent = window;
    }
    rw
}

/// A grid of sibling windows under the root.
fn wide_tree(count: usize) -> RootWindow {
    let mut rw = root_window();
    let root = rw.root();
    for i in 0..count {
        let delegate: Rc<dyn WindowDelegate> = Rc::new(Sink);
        let window = rw.create_window(Some(delegate));
        let x = (i % 40) as i32 * 20;
        let y = (i / 40) as i32 * 20;
        let _ = rw.set_bounds(window, Rect::new(x, y, 20, 20));
        let _ = rw.add_child(root, window);
        let _ = rw.show(window);
    }
    rw
}

fn bench_hit_testing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hit_testing");

    for depth in [8, 32, 128].iter() {
        let rw = deep_tree(*depth);
        group.bench_with_input(format!("deep_{}", depth), depth, |b, _| {
            b.iter(|| {
                black_box(rw.tree().get_event_handler_for_point(rw.root(), black_box(Point::new(300, 300)), None))
            })
        });
    }

    for count in [40, 400, 1200].iter() {
        let rw = wide_tree(*count);
        group.bench_with_input(format!("wide_{}", count), count, |b, _| {
            b.iter(|| black_box(rw.tree().get_event_handler_for_point(rw.root(), black_box(Point::new(5, 5)), None)))
        });
    }

    group.finish();
}

fn bench_mouse_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("mouse_dispatch");

    group.bench_function("moves_across_wide_tree", |b| {
        b.iter_batched(
            || wide_tree(400),
            |mut rw| {
                for i in 0..200 {
                    let event = MouseEvent::at(EventType::MouseMoved, Point::new(i * 4, i), EventFlags::empty());
                    black_box(rw.dispatch_mouse_event(&event));
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("held_drags_in_deep_tree", |b| {
        b.iter_batched(
            || deep_tree(32),
            |mut rw| {
                rw.hold_mouse_moves();
                for i in 0..200 {
                    let event =
                        MouseEvent::at(EventType::MouseDragged, Point::new(100 + i, 100), EventFlags::LEFT_MOUSE_BUTTON);
                    black_box(rw.dispatch_mouse_event(&event));
                }
                rw.release_mouse_moves();
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_hit_testing, bench_mouse_dispatch);
criterion_main!(benches);
