use criterion::{Criterion, black_box, criterion_group, criterion_main};
use grinder_core::{Point, Region, WidgetTree};

// Two levels of nested containers, each with a row of buttons.
fn build_tree(per_container: usize) -> WidgetTree<u32> {
    let mut tree = WidgetTree::new();
    let root = tree.root();
    let mut next = 0u32;
    for cx in 0..4 {
        let c = tree.add_subscreen(root, Point::new(cx * 80, 0));
        for iy in 0..2 {
            let inner = tree.add_subscreen(c, Point::new(0, iy * 120));
            for b in 0..per_container {
                let id = tree.add_button(inner, Region::new(0, b as i32 * 10, 70, 9), "b", next);
                tree.show(id);
                next += 1;
            }
        }
    }
    tree
}

pub fn bench_dispatch(c: &mut Criterion) {
    let tree = build_tree(10);
    let root = tree.root();
    c.bench_function("dispatch_hit", |b| {
        b.iter(|| tree.dispatch(root, black_box(Point::new(200, 135))))
    });
    c.bench_function("dispatch_miss", |b| {
        b.iter(|| tree.dispatch(root, black_box(Point::new(-5, -5))))
    });
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
