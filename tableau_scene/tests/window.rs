// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window behavior: hit testing, interaction routing, resize and refresh.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::{Point, Rect, Size};
use tableau_region::Region;
use tableau_render::{ComponentId, ImageDesc, RenderBackend};
use tableau_render_ref::{Event, RefBackend};
use tableau_scene::{
    Button, Component, DeviceEvent, DrawContext, InteractionEvent, Scene, SceneConfig,
    SceneObject, Symbol, Text, Viewport, Window,
};
use tableau_transform::Point3;

type Log = Rc<RefCell<Vec<(Option<String>, InteractionEvent, i32, i32)>>>;

fn named(name: &str, viewport: Viewport) -> Scene {
    let mut scene = Scene::new(viewport).unwrap();
    scene.set_name(name);
    scene
}

/// Window 200x200 with scene A at (0,0,100,100) and scene B on top at
/// (50,50,100,100).
fn overlapping() -> Window<RefBackend> {
    let mut window = Window::new(RefBackend::new(200, 200));
    window.add_scene(named("A", Viewport::new(0, 0, 100, 100)));
    window.add_scene(named("B", Viewport::new(50, 50, 100, 100)));
    window
}

fn recorder(window: &mut Window<RefBackend>) -> Log {
    let log = Log::default();
    let sink = Rc::clone(&log);
    window.start_interaction(
        move |scene: Option<&mut Scene>, event: InteractionEvent, x: i32, y: i32| {
            let name = scene.and_then(|s| s.name().map(String::from));
            sink.borrow_mut().push((name, event, x, y));
        },
    );
    log
}

/// A 10x10 device square centered on a world point.
struct Dot {
    at: Point3,
}

impl SceneObject for Dot {
    fn draw(&mut self, cx: &mut DrawContext<'_>) {
        cx.clear();
        let c = cx.to_device(self.at);
        cx.push(tableau_scene::Segment::polygon(vec![
            Point::new(c.x - 5.0, c.y - 5.0),
            Point::new(c.x + 5.0, c.y - 5.0),
            Point::new(c.x + 5.0, c.y + 5.0),
            Point::new(c.x - 5.0, c.y + 5.0),
        ]));
    }
}

#[test]
fn front_most_scene_is_the_last_added() {
    let window = overlapping();
    let a = window.find_scene_by_name("A").unwrap();
    let b = window.find_scene_by_name("B").unwrap();
    assert_eq!(window.find_scene(75.0, 75.0), Some(b));
    assert_eq!(window.find_scene(25.0, 25.0), Some(a));
    assert_eq!(window.find_scene(140.0, 140.0), Some(b));
    assert_eq!(window.find_scene(190.0, 10.0), None);
}

#[test]
fn replacing_an_interaction_aborts_the_old_one_once() {
    let mut window = overlapping();
    let first = recorder(&mut window);
    let second = recorder(&mut window);
    assert_eq!(
        *first.borrow(),
        vec![(None, InteractionEvent::Abort, 0, 0)]
    );
    assert!(second.borrow().is_empty());

    window.pointer_moved(10, 10);
    assert_eq!(first.borrow().len(), 1);
    assert_eq!(second.borrow().len(), 1);

    window.stop_interaction();
    window.stop_interaction();
    assert_eq!(
        second.borrow().last(),
        Some(&(None, InteractionEvent::Abort, 0, 0))
    );
    assert_eq!(second.borrow().len(), 2);
    assert!(!window.has_interaction());
}

#[test]
fn drags_stay_with_the_scene_where_the_button_went_down() {
    let mut window = overlapping();
    let log = recorder(&mut window);
    let a = Some(String::from("A"));
    let b = Some(String::from("B"));

    window.handle_event(DeviceEvent::ButtonPressed {
        button: Button::One,
        x: 20,
        y: 20,
    });
    window.handle_event(DeviceEvent::PointerDragged {
        button: Button::One,
        x: 140,
        y: 140,
    });
    window.handle_event(DeviceEvent::ButtonReleased {
        button: Button::One,
        x: 140,
        y: 140,
    });
    window.handle_event(DeviceEvent::PointerMoved { x: 140, y: 140 });
    window.handle_event(DeviceEvent::PointerMoved { x: 20, y: 20 });

    assert_eq!(
        *log.borrow(),
        vec![
            (a.clone(), InteractionEvent::ButtonDown(Button::One), 20, 20),
            (a.clone(), InteractionEvent::ButtonDrag(Button::One), 140, 140),
            (a.clone(), InteractionEvent::ButtonUp(Button::One), 140, 140),
            (b, InteractionEvent::Motion, 140, 140),
            (a, InteractionEvent::Motion, 20, 20),
        ]
    );
    assert_eq!(window.interaction_scene(), None);
}

#[test]
fn focus_events_are_scoped_to_the_scene_under_the_pointer() {
    let mut window = overlapping();
    let log = recorder(&mut window);
    window.pointer_entered(60, 60);
    window.pointer_exited(199, 0);
    assert_eq!(
        *log.borrow(),
        vec![
            (Some(String::from("B")), InteractionEvent::FocusIn, 60, 60),
            (None, InteractionEvent::FocusOut, 199, 0),
        ]
    );
}

#[test]
fn resize_to_same_or_zero_size_is_ignored() {
    let mut window = overlapping();
    window.refresh();
    window.process_pending();
    window.backend_mut().clear_events();

    window.resize(200, 200);
    window.resize(0, 50);
    window.resize(50, 0);
    assert_eq!((window.width(), window.height()), (200, 200));
    assert!(window.damage().is_empty());
    assert!(window.backend().events().is_empty());
    let a = window.find_scene_by_name("A").unwrap();
    assert_eq!(window.scene(a).unwrap().viewport(), Viewport::new(0, 0, 100, 100));
}

#[test]
fn resize_scales_scenes_and_refreshes() {
    let mut window = Window::new(RefBackend::new(100, 100));
    let fixed = window.add_scene(named("fixed", Viewport::new(0, 0, 100, 100)));
    let mut zooming = named("zooming", Viewport::new(0, 0, 100, 100));
    zooming.set_config(SceneConfig {
        zoom_on_resize: true,
        ..SceneConfig::default()
    });
    let zooming = window.add_scene(zooming);
    window.refresh();
    window.process_pending();

    window.handle_event(DeviceEvent::Resized {
        width: 200,
        height: 100,
    });
    assert_eq!(window.backend().size(), (200, 100));
    assert!(window.has_pending_present());

    // The fixed extent stretches with the viewport.
    let scene = window.scene(fixed).unwrap();
    assert_eq!(scene.viewport(), Viewport::new(0, 0, 200, 100));
    let p = scene.world_to_device(Point3::new(50.0, 50.0, 0.0));
    assert!((p.x - 100.0).abs() < 1e-9 && (p.y - 50.0).abs() < 1e-9);

    // The zooming extent keeps features at their device size.
    let scene = window.scene(zooming).unwrap();
    let p = scene.world_to_device(Point3::new(50.0, 50.0, 0.0));
    assert!((p.x - 50.0).abs() < 1e-9 && (p.y - 50.0).abs() < 1e-9);
}

#[test]
fn fitted_extent_survives_resize_round_trips() {
    for zoom_on_resize in [false, true] {
        let mut window = Window::new(RefBackend::new(100, 100));
        let mut scene = Scene::new(Viewport::new(0, 0, 100, 100)).unwrap();
        scene.set_config(SceneConfig {
            zoom_on_resize,
            world_extent_fits_viewport: true,
        });
        let id = window.add_scene(scene);
        let before = window.scene(id).unwrap().world_extent();

        for _ in 0..3 {
            window.resize(200, 100);
            let wide = window.scene(id).unwrap().world_extent();
            assert_eq!(wide.x_edge(), Point3::new(200.0, 0.0, 0.0));
            assert_eq!(wide.y_edge(), Point3::new(0.0, 100.0, 0.0));
            window.resize(100, 100);
        }
        assert_eq!(window.scene(id).unwrap().world_extent(), before);
    }
}

#[test]
fn resize_draws_each_object_once() {
    let draws = Rc::new(Cell::new(0));
    let counter = Rc::clone(&draws);
    let mut window = Window::new(RefBackend::new(100, 100));
    let mut scene = Scene::new(Viewport::new(0, 0, 100, 100)).unwrap();
    scene
        .add_object(None, move |cx: &mut DrawContext<'_>| {
            counter.set(counter.get() + 1);
            cx.clear();
        })
        .unwrap();
    window.add_scene(scene);
    window.refresh();
    assert_eq!(draws.get(), 1);

    window.resize(200, 150);
    assert_eq!(draws.get(), 2);
}

#[test]
fn refresh_with_clean_state_draws_nothing() {
    let mut window = Window::new(RefBackend::new(100, 100));
    let mut scene = Scene::new(Viewport::new(0, 0, 100, 100)).unwrap();
    scene
        .add_object(None, |cx: &mut DrawContext<'_>| {
            cx.clear();
            let at = cx.to_device(Point3::new(30.0, 30.0, 0.0));
            cx.polyline([Point3::ZERO, Point3::new(30.0, 30.0, 0.0)], None)
                .add_text(Text::new("label", at));
        })
        .unwrap();
    window.add_scene(scene);

    window.refresh();
    assert!(window.backend().draw_call_count() > 0);
    assert_eq!(window.backend().drawn_texts(), vec!["label"]);
    window.process_pending();

    window.backend_mut().clear_events();
    window.refresh();
    window.refresh();
    assert!(window.backend().events().is_empty());
    assert!(!window.has_pending_present());
}

#[test]
fn refresh_posts_one_present_that_process_pending_delivers() {
    let mut window = overlapping();
    window.refresh();
    assert_eq!(window.backend().present_count(), 0);
    assert!(window.has_pending_present());
    assert_eq!(window.process_pending(), 1);
    assert_eq!(window.process_pending(), 0);
    assert_eq!(window.backend().present_count(), 1);
}

#[test]
fn removing_an_object_damages_its_former_region() {
    let mut window = Window::new(RefBackend::new(100, 100));
    let mut scene = Scene::new(Viewport::new(0, 0, 100, 100)).unwrap();
    let dot = scene
        .add_object(
            None,
            Dot {
                at: Point3::new(15.0, 15.0, 0.0),
            },
        )
        .unwrap();
    let id = window.add_scene(scene);
    window.refresh();
    window.process_pending();
    window.backend_mut().clear_events();

    window.scene_mut(id).unwrap().remove_object(dot).unwrap();
    window.refresh();
    assert_eq!(
        window.backend().cleared_rects(),
        vec![Rect::new(9.0, 9.0, 21.0, 21.0)]
    );
    assert_eq!(window.backend().draw_call_count(), 0);
}

#[test]
fn moving_an_object_damages_old_and_new_positions() {
    let mut window = Window::new(RefBackend::new(100, 100));
    let mut scene = Scene::new(Viewport::new(0, 0, 100, 100)).unwrap();
    let dot = scene
        .add_object(
            None,
            Dot {
                at: Point3::new(10.0, 10.0, 0.0),
            },
        )
        .unwrap();
    let id = window.add_scene(scene);
    window.refresh();
    window.process_pending();
    window.backend_mut().clear_events();

    let scene = window.scene_mut(id).unwrap();
    scene.objects_mut().object_mut::<Dot>(dot).unwrap().at = Point3::new(60.0, 60.0, 0.0);
    scene.redraw_object(dot).unwrap();
    window.refresh();

    let cleared: Region = window.backend().cleared_rects().into_iter().collect();
    assert!(cleared.contains(Point::new(10.0, 10.0)));
    assert!(cleared.contains(Point::new(60.0, 60.0)));
    assert!(!cleared.contains(Point::new(35.0, 35.0)));
    assert_eq!(window.backend().draw_call_count(), 1);
}

#[test]
fn damage_outside_every_scene_is_dropped() {
    let mut window = Window::new(RefBackend::new(200, 100));
    window.add_scene(Scene::new(Viewport::new(0, 0, 100, 100)).unwrap());
    window.refresh();
    window.process_pending();
    window.backend_mut().clear_events();

    window.update_damage_area(Rect::new(150.0, 10.0, 160.0, 20.0));
    window.refresh();
    assert!(window.backend().events().is_empty());
    assert!(window.damage().is_empty());
}

#[test]
fn passes_draw_data_then_annotation_then_components() {
    let mut backend = RefBackend::new(100, 100);
    let image = backend.create_image(ImageDesc::rgba8(1, 1), &[0, 0, 0, 255]);
    let mut window = Window::new(backend);
    let mut scene = Scene::new(Viewport::new(0, 0, 100, 100)).unwrap();
    scene
        .add_object(None, move |cx: &mut DrawContext<'_>| {
            cx.clear();
            let seg = cx.polyline(
                [Point3::new(10.0, 10.0, 0.0), Point3::new(90.0, 90.0, 0.0)],
                None,
            );
            seg.add_component(Component::new(
                ComponentId(7),
                Size::new(20.0, 10.0),
                Point::new(50.0, 80.0),
            ));
            seg.add_symbol(Symbol::new(image, Size::new(4.0, 4.0), Point::new(10.0, 10.0)));
            seg.add_text(Text::new("x", Point::new(90.0, 90.0)));
        })
        .unwrap();
    window.add_scene(scene);
    window.refresh();

    let kinds: Vec<&str> = window
        .backend()
        .events()
        .iter()
        .filter(|e| e.is_draw())
        .map(|e| match e {
            Event::Polyline { .. } => "data",
            Event::Text { .. } | Event::Image { .. } => "annotation",
            Event::Component { rect, .. } => {
                assert_eq!(*rect, Rect::new(40.0, 75.0, 60.0, 85.0));
                "component"
            }
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["data", "annotation", "annotation", "component"]);
}

#[test]
fn visibility_mask_filters_passes() {
    let mut window = Window::new(RefBackend::new(100, 100));
    let mut scene = Scene::new(Viewport::new(0, 0, 100, 100)).unwrap();
    scene
        .add_object(None, |cx: &mut DrawContext<'_>| {
            cx.clear();
            cx.polyline([Point3::ZERO, Point3::new(50.0, 50.0, 0.0)], None)
                .add_text(Text::new("hidden", Point::new(50.0, 50.0)));
        })
        .unwrap();
    window.add_scene(scene);
    window.set_visibility(tableau_scene::Visibility::DATA);
    window.refresh();
    assert_eq!(window.backend().draw_call_count(), 1);
    assert!(window.backend().drawn_texts().is_empty());
}

#[test]
fn crowded_labels_are_dropped() {
    let mut window = Window::new(RefBackend::new(400, 400));
    let mut scene = Scene::new(Viewport::new(0, 0, 400, 400)).unwrap();
    scene
        .add_object(None, |cx: &mut DrawContext<'_>| {
            cx.clear();
            let seg = cx.push(tableau_scene::Segment::default());
            for _ in 0..12 {
                seg.add_text(Text::new("station", Point::new(200.0, 200.0)));
            }
            seg.add_text(Text::new("on top", Point::new(200.0, 200.0)).overlapping());
        })
        .unwrap();
    window.add_scene(scene);
    window.refresh();
    let texts = window.backend().drawn_texts();
    // Nine candidate positions around the anchor, plus the overlapping label.
    assert_eq!(texts.len(), 10);
    assert_eq!(texts.last(), Some(&"on top"));

    // The placed labels do not overlap each other.
    let rects: Vec<Rect> = window
        .backend()
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::Text { text, rect, .. } if text == "station" => Some(*rect),
            _ => None,
        })
        .collect();
    assert_eq!(rects.len(), 9);
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            assert!(a.intersect(*b).area() == 0.0, "{a:?} overlaps {b:?}");
        }
    }
}

#[test]
fn removing_a_scene_damages_its_viewport() {
    let mut window = overlapping();
    window.refresh();
    window.process_pending();
    let b = window.find_scene_by_name("B").unwrap();
    let scene = window.remove_scene(b).unwrap();
    assert_eq!(scene.name(), Some("B"));
    assert_eq!(window.damage().extent(), Some(Rect::new(50.0, 50.0, 150.0, 150.0)));
    assert!(window.remove_scene(b).is_err());
    assert_eq!(window.scene_count(), 1);
}

#[test]
fn print_and_save_pass_through_to_the_backend() {
    let mut window = overlapping();
    window.print().unwrap();
    assert!(matches!(window.backend().events().last(), Some(Event::Print)));

    let dir = std::env::temp_dir().join("tableau_scene_save_test.png");
    let err = window.save(&dir, tableau_render::SnapshotFormat::Png);
    assert!(matches!(err, Err(tableau_scene::WindowError::Backend(_))));
}
