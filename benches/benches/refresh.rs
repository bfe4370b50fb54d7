// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::Rect;
use tableau_render_ref::RefBackend;
use tableau_scene::{DrawContext, Scene, SceneObject, Text, Viewport, Window};
use tableau_transform::Point3;

/// A short labelled polyline at a world position.
struct Marker {
    at: Point3,
}

impl SceneObject for Marker {
    fn draw(&mut self, cx: &mut DrawContext<'_>) {
        cx.clear();
        let end = self.at + Point3::new(6.0, 4.0, 0.0);
        let anchor = cx.to_device(end);
        cx.polyline([self.at, end], None)
            .add_text(Text::new("m", anchor));
    }
}

/// A window with `n` markers laid out on a grid, refreshed once.
fn populated(n: u32) -> (Window<RefBackend>, Vec<tableau_scene::ObjectId>) {
    let mut window = Window::new(RefBackend::new(1024, 768));
    let mut scene = Scene::new(Viewport::new(0, 0, 1024, 768)).unwrap();
    let ids = (0..n)
        .map(|i| {
            let at = Point3::new(f64::from(i % 100) * 10.0, f64::from(i / 100) * 10.0, 0.0);
            scene.add_object(None, Marker { at }).unwrap()
        })
        .collect();
    window.add_scene(scene);
    window.refresh();
    window.process_pending();
    (window, ids)
}

fn bench_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("tableau_scene");
    group.sample_size(30);

    for &n in &[100_u32, 1_000, 5_000] {
        group.bench_function(format!("full_redraw(n={n})"), |b| {
            b.iter_batched(
                || populated(n).0,
                |mut window| {
                    window.redraw();
                    window.refresh();
                    black_box(window.backend().draw_call_count())
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("small_damage(n={n})"), |b| {
            b.iter_batched(
                || {
                    let (mut window, _) = populated(n);
                    window.backend_mut().clear_events();
                    window
                },
                |mut window| {
                    window.update_damage_area(Rect::new(100.0, 100.0, 140.0, 130.0));
                    window.refresh();
                    black_box(window.backend().draw_call_count())
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("move_one(n={n})"), |b| {
            b.iter_batched(
                || populated(n),
                |(mut window, ids)| {
                    let id = window.scenes().next().map(|(id, _)| id).unwrap();
                    let scene = window.scene_mut(id).unwrap();
                    if let Some(m) = scene.objects_mut().object_mut::<Marker>(ids[0]) {
                        m.at = m.at + Point3::new(3.0, 3.0, 0.0);
                    }
                    scene.redraw_object(ids[0]).unwrap();
                    window.refresh();
                    black_box(window.backend().draw_call_count())
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_refresh);
criterion_main!(benches);
