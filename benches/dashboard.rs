use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use crossterm::event::KeyCode;
use termdeck::{
    CellBuffer, Color, ContainerSpec, ContainerTree, Event, EventDistributor, LineStyle,
    MouseButton, MouseEvent, Point, Size,
};

fn pane() -> ContainerSpec {
    ContainerSpec::new()
        .border(LineStyle::Light)
        .border_color(Color::Cyan)
}

/// A dashboard-shaped fixture: header over a body of four bordered
/// panes next to a sidebar split in two.
fn dashboard_spec() -> ContainerSpec {
    ContainerSpec::new()
        .key_focus_next(KeyCode::Tab)
        .split_percent(10)
        .split_horizontal(
            ContainerSpec::new().border(LineStyle::Light),
            ContainerSpec::new().split_percent(75).split_vertical(
                ContainerSpec::new().split_horizontal(
                    ContainerSpec::new().split_vertical(pane(), pane()),
                    ContainerSpec::new().split_vertical(pane(), pane()),
                ),
                ContainerSpec::new().split_horizontal(pane(), pane()),
            ),
        )
}

fn build_tree(size: Size) -> ContainerTree {
    ContainerTree::new(Box::new(CellBuffer::new(size)), dashboard_spec()).expect("valid spec")
}

fn layout_and_draw(c: &mut Criterion) {
    c.bench_function("layout_and_draw", |b| {
        let mut tree = build_tree(Size::new(200, 60));
        b.iter(|| {
            tree.draw().expect("draw");
        });
    });
}

fn hit_test_full_grid(c: &mut Criterion) {
    c.bench_function("hit_test_full_grid", |b| {
        let mut tree = build_tree(Size::new(200, 60));
        tree.draw().expect("draw");
        b.iter(|| {
            let mut hits = 0usize;
            for y in 0..60 {
                for x in 0..200 {
                    if tree.point_container(Point::new(x, y)).is_some() {
                        hits += 1;
                    }
                }
            }
            black_box(hits)
        });
    });
}

fn event_throughput(c: &mut Criterion) {
    c.bench_function("event_throughput_1k", |b| {
        b.iter(|| {
            let tree = build_tree(Size::new(200, 60)).into_shared();
            let eds = EventDistributor::new();
            ContainerTree::subscribe(&tree, &eds);
            tree.lock().unwrap().draw().expect("draw");

            for i in 0..500u16 {
                let x = (i % 200) as i32;
                let y = (i % 60) as i32;
                eds.event(Event::Mouse(MouseEvent::new(
                    Point::new(x, y),
                    MouseButton::Left,
                )));
                eds.event(Event::Key(KeyCode::Tab));
            }
            assert!(eds.drain(Duration::from_secs(30)));
            black_box(eds.processed())
        });
    });
}

criterion_group!(benches, layout_and_draw, hit_test_full_grid, event_throughput);
criterion_main!(benches);
