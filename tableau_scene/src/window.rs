// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The window: scene stack, damage accumulation, multi-pass refresh and
//! interaction routing over one render backend.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;
use tableau_region::{COLLAPSE_THRESHOLD, Region};
use tableau_render::{BackendError, RenderBackend};

#[cfg(feature = "std")]
use tableau_render::SnapshotFormat;

use crate::interaction::{Button, DeviceEvent, Interaction, InteractionEvent};
use crate::object::Visibility;
use crate::present::{Task, TaskQueue};
use crate::scene::{Scene, SceneError};

/// Identifier of a scene within its [`Window`].
///
/// Ids are never reused by the window that issued them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneId(u32);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene#{}", self.0)
    }
}

/// Errors from window operations.
#[derive(Debug)]
pub enum WindowError {
    /// The scene id does not belong to this window.
    UnknownScene(SceneId),
    /// A scene operation failed.
    Scene(SceneError),
    /// The backend could not encode or print.
    Backend(BackendError),
    /// Writing a snapshot failed.
    #[cfg(feature = "std")]
    Io(std::io::Error),
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownScene(id) => write!(f, "unknown {id}"),
            Self::Scene(e) => write!(f, "scene error: {e}"),
            Self::Backend(e) => write!(f, "backend error: {e}"),
            #[cfg(feature = "std")]
            Self::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl core::error::Error for WindowError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::UnknownScene(_) => None,
            Self::Scene(e) => Some(e),
            Self::Backend(e) => Some(e),
            #[cfg(feature = "std")]
            Self::Io(e) => Some(e),
        }
    }
}

impl From<SceneError> for WindowError {
    fn from(e: SceneError) -> Self {
        Self::Scene(e)
    }
}

impl From<BackendError> for WindowError {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for WindowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[derive(Copy, Clone, Debug)]
enum Pass {
    Data,
    Annotation,
    Components,
}

/// A drawing surface holding a stack of scenes.
///
/// Scenes are stacked in insertion order: the first added is the background
/// and the last added is front-most. Damage from scene operations and from
/// [`Window::update_damage_area`] accumulates until [`Window::refresh`]
/// redraws exactly the damaged area and posts a present task, which the host
/// delivers with [`Window::process_pending`].
///
/// ```
/// use kurbo::Point;
/// use tableau_render_ref::RefBackend;
/// use tableau_scene::{DrawContext, Scene, Viewport, Window};
/// use tableau_transform::Point3;
///
/// let mut window = Window::new(RefBackend::new(200, 100));
/// let mut scene = Scene::new(Viewport::new(0, 0, 200, 100)).unwrap();
/// scene
///     .add_object(None, |cx: &mut DrawContext<'_>| {
///         cx.clear();
///         cx.polyline([Point3::new(10.0, 10.0, 0.0), Point3::new(90.0, 50.0, 0.0)], None);
///     })
///     .unwrap();
/// let id = window.add_scene(scene);
///
/// window.refresh();
/// assert_eq!(window.backend().draw_call_count(), 1);
/// assert_eq!(window.process_pending(), 1);
/// assert_eq!(window.backend().present_count(), 1);
///
/// // Nothing changed: a second refresh draws nothing.
/// window.backend_mut().clear_events();
/// window.refresh();
/// assert_eq!(window.backend().draw_call_count(), 0);
///
/// let scene = window.scene(id).unwrap();
/// assert_eq!(scene.world_to_device(Point3::new(10.0, 10.0, 0.0)), Point::new(10.0, 10.0));
/// ```
pub struct Window<B> {
    backend: B,
    width: u32,
    height: u32,
    scenes: Vec<(SceneId, Scene)>,
    next_scene: u32,
    damage: Region,
    visibility: Visibility,
    tasks: TaskQueue,
    interaction: Option<Box<dyn Interaction>>,
    interaction_scene: Option<SceneId>,
}

impl<B: fmt::Debug> fmt::Debug for Window<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("backend", &self.backend)
            .field("size", &(self.width, self.height))
            .field("scenes", &self.scenes.len())
            .field("damage", &self.damage)
            .field("visibility", &self.visibility)
            .field("tasks", &self.tasks)
            .field("interaction", &self.interaction.is_some())
            .field("interaction_scene", &self.interaction_scene)
            .finish_non_exhaustive()
    }
}

impl<B: RenderBackend> Window<B> {
    /// Creates a window over `backend`, sized to the backend's surface.
    ///
    /// The whole window starts damaged so the first refresh paints it.
    pub fn new(backend: B) -> Self {
        let (width, height) = backend.size();
        let mut window = Self {
            backend,
            width,
            height,
            scenes: Vec::new(),
            next_scene: 0,
            damage: Region::new(),
            visibility: Visibility::all(),
            tasks: TaskQueue::default(),
            interaction: None,
            interaction_scene: None,
        };
        window.damage.union_rect(window.rect());
        window
    }

    /// Window width in device pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Window height in device pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The window's device rectangle.
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably. Drawing through it bypasses damage tracking.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Kinds of content drawn by refreshes.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Changes the kinds of content drawn and damages the whole window.
    pub fn set_visibility(&mut self, mask: Visibility) {
        if mask == self.visibility {
            return;
        }
        self.visibility = mask;
        for (_, scene) in &mut self.scenes {
            scene.invalidate_annotation();
        }
        self.damage.union_rect(self.rect());
    }

    /// Accumulated damage not yet refreshed. Scene damage joins it during
    /// [`Window::refresh`].
    pub fn damage(&self) -> &Region {
        &self.damage
    }

    /// Adds a device rectangle to the damage.
    pub fn update_damage_area(&mut self, rect: Rect) {
        self.damage.union_rect(rect.expand());
        self.collapse_damage();
    }

    /// Adds a device region to the damage.
    pub fn update_damage_region(&mut self, region: &Region) {
        self.damage.union(region);
        self.collapse_damage();
    }

    fn collapse_damage(&mut self) {
        if self.damage.rectangle_count() > COLLAPSE_THRESHOLD {
            self.damage.collapse();
        }
    }

    /// Adds `scene` on top of the stack and damages its viewport.
    pub fn add_scene(&mut self, scene: Scene) -> SceneId {
        let id = SceneId(self.next_scene);
        self.next_scene += 1;
        self.damage.union_rect(scene.viewport().rect());
        log::debug!("add {id} at {:?}", scene.viewport());
        self.scenes.push((id, scene));
        id
    }

    /// Removes a scene, damaging the area it covered.
    pub fn remove_scene(&mut self, id: SceneId) -> Result<Scene, WindowError> {
        let pos = self
            .scenes
            .iter()
            .position(|(s, _)| *s == id)
            .ok_or(WindowError::UnknownScene(id))?;
        let (_, scene) = self.scenes.remove(pos);
        self.damage.union_rect(scene.viewport().rect());
        if self.interaction_scene == Some(id) {
            self.interaction_scene = None;
        }
        Ok(scene)
    }

    /// The scene with the given id.
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|(s, _)| *s == id).map(|(_, s)| s)
    }

    /// The scene with the given id, mutably.
    pub fn scene_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes
            .iter_mut()
            .find(|(s, _)| *s == id)
            .map(|(_, s)| s)
    }

    /// Scenes from back to front.
    pub fn scenes(&self) -> impl Iterator<Item = (SceneId, &Scene)> + '_ {
        self.scenes.iter().map(|(id, s)| (*id, s))
    }

    /// Number of scenes.
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// The front-most scene whose transformed extent contains the device
    /// point.
    pub fn find_scene(&self, x: f64, y: f64) -> Option<SceneId> {
        self.scenes
            .iter()
            .rev()
            .find(|(_, s)| s.contains_device_point(x, y))
            .map(|(id, _)| *id)
    }

    /// The first scene with the given name.
    pub fn find_scene_by_name(&self, name: &str) -> Option<SceneId> {
        self.scenes
            .iter()
            .find(|(_, s)| s.name() == Some(name))
            .map(|(id, _)| *id)
    }

    /// Recomputes the geometry of every scene and damages the whole window.
    pub fn redraw(&mut self) {
        log::debug!("redraw {} scenes", self.scenes.len());
        for (_, scene) in &mut self.scenes {
            scene.redraw(self.visibility);
        }
        self.damage.union_rect(self.rect());
    }

    /// Redraws the damaged area.
    ///
    /// Does nothing when there is no damage and every scene's annotation is
    /// laid out. Otherwise, lays out annotation and components, clears the
    /// damaged rectangles, runs the data, annotation and components passes
    /// over all scenes with each scene clipped to its share of the damage,
    /// and posts a [`Task::Present`].
    ///
    /// A present still pending from the previous refresh is delivered first.
    pub fn refresh(&mut self) {
        if self.tasks.take(Task::Present) {
            self.backend.present();
        }

        let scene_damage = self.scenes.iter().any(|(_, s)| s.has_damage());
        let annotation_valid = self.scenes.iter().all(|(_, s)| s.annotation_valid());
        if self.damage.is_empty() && !scene_damage && annotation_valid {
            log::trace!("refresh: nothing to do");
            return;
        }

        let mask = self.visibility;
        for (_, scene) in &mut self.scenes {
            if !scene.annotation_valid() {
                scene.layout_annotation(&self.backend, mask);
            }
            scene.layout_components(mask);
        }

        let mut damage = self.damage.clone();
        for (_, scene) in &mut self.scenes {
            damage.union(&scene.take_damage());
        }
        if damage.rectangle_count() > COLLAPSE_THRESHOLD {
            damage.collapse();
        }

        let mut visible = Region::new();
        for (_, scene) in &mut self.scenes {
            scene.compute_region(mask);
            visible.union(&scene.region());
        }
        let damage = Region::intersect(&damage, &visible);

        if damage.is_empty() {
            log::trace!("refresh: damage outside every scene");
        } else {
            log::debug!(
                "refresh: {} damaged rects, extent {:?}",
                damage.rectangle_count(),
                damage.extent()
            );
            self.backend.set_clip_region(Some(&damage));
            for rect in &damage {
                self.backend.clear(*rect);
            }
            for pass in [Pass::Data, Pass::Annotation, Pass::Components] {
                for (id, scene) in &self.scenes {
                    let clip = damage.intersect_rect(scene.viewport().rect());
                    if clip.is_empty() {
                        continue;
                    }
                    log::trace!("{pass:?} pass for {id}");
                    self.backend.set_clip_region(Some(&clip));
                    match pass {
                        Pass::Data => scene.refresh_data(mask, &clip, &mut self.backend),
                        Pass::Annotation => {
                            scene.refresh_annotation(mask, &clip, &mut self.backend);
                        }
                        Pass::Components => {
                            scene.refresh_components(mask, &clip, &mut self.backend);
                        }
                    }
                }
            }
            self.backend.set_clip_region(None);
            self.tasks.post(Task::Present);
        }
        self.damage.clear();
    }

    /// Runs queued tasks. Returns how many ran.
    pub fn process_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.tasks.pop() {
            match task {
                Task::Present => self.backend.present(),
            }
            ran += 1;
        }
        ran
    }

    /// Returns `true` if a refreshed frame has not been presented yet.
    pub fn has_pending_present(&self) -> bool {
        self.tasks.contains(Task::Present)
    }

    /// Resizes the window after the host surface changed size.
    ///
    /// Zero-sized and unchanged sizes are ignored. Otherwise the backend is
    /// resized, every scene is scaled by the width and height ratios, and the
    /// window is redrawn and refreshed.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("ignoring resize to {width}x{height}");
            return;
        }
        if (width, height) == (self.width, self.height) {
            return;
        }
        let ratio = |new: u32, old: u32| {
            if old == 0 {
                1.0
            } else {
                f64::from(new) / f64::from(old)
            }
        };
        let dx = ratio(width, self.width);
        let dy = ratio(height, self.height);
        log::debug!(
            "resize {}x{} -> {width}x{height}",
            self.width,
            self.height
        );
        self.width = width;
        self.height = height;
        self.backend.resize(width, height);
        self.damage.union_rect(self.rect());
        for (id, scene) in &mut self.scenes {
            if let Err(e) = scene.rescale(dx, dy) {
                log::debug!("{id} kept its viewport: {e}");
            }
        }
        self.redraw();
        self.refresh();
    }

    /// Installs an interaction, aborting the current one first.
    pub fn start_interaction(&mut self, interaction: impl Interaction + 'static) {
        self.stop_interaction();
        self.interaction = Some(Box::new(interaction));
    }

    /// Aborts and removes the current interaction, if any.
    pub fn stop_interaction(&mut self) {
        if let Some(mut old) = self.interaction.take() {
            old.event(None, InteractionEvent::Abort, 0, 0);
        }
        self.interaction_scene = None;
    }

    /// Returns `true` if an interaction is installed.
    pub fn has_interaction(&self) -> bool {
        self.interaction.is_some()
    }

    /// Scene where the current button gesture started.
    pub fn interaction_scene(&self) -> Option<SceneId> {
        self.interaction_scene
    }

    fn dispatch(&mut self, scene: Option<SceneId>, event: InteractionEvent, x: i32, y: i32) {
        let Some(handler) = self.interaction.as_mut() else {
            return;
        };
        let scene = scene.and_then(|id| {
            self.scenes
                .iter_mut()
                .find(|(s, _)| *s == id)
                .map(|(_, s)| s)
        });
        handler.event(scene, event, x, y);
    }

    fn hit(&self, x: i32, y: i32) -> Option<SceneId> {
        self.find_scene(f64::from(x), f64::from(y))
    }

    /// The pointer entered the window.
    pub fn pointer_entered(&mut self, x: i32, y: i32) {
        let scene = self.hit(x, y);
        self.dispatch(scene, InteractionEvent::FocusIn, x, y);
    }

    /// The pointer left the window.
    pub fn pointer_exited(&mut self, x: i32, y: i32) {
        let scene = self.hit(x, y);
        self.dispatch(scene, InteractionEvent::FocusOut, x, y);
    }

    /// The pointer moved with no button held.
    pub fn pointer_moved(&mut self, x: i32, y: i32) {
        let scene = self.hit(x, y);
        self.dispatch(scene, InteractionEvent::Motion, x, y);
    }

    /// A button went down; the scene under the pointer receives the rest of
    /// the gesture.
    pub fn button_pressed(&mut self, button: Button, x: i32, y: i32) {
        let scene = self.hit(x, y);
        self.interaction_scene = scene;
        self.dispatch(scene, InteractionEvent::ButtonDown(button), x, y);
    }

    /// The pointer moved with a button held.
    pub fn pointer_dragged(&mut self, button: Button, x: i32, y: i32) {
        let scene = self.interaction_scene;
        self.dispatch(scene, InteractionEvent::ButtonDrag(button), x, y);
    }

    /// A button was released, ending the gesture.
    pub fn button_released(&mut self, button: Button, x: i32, y: i32) {
        let scene = self.interaction_scene.take();
        self.dispatch(scene, InteractionEvent::ButtonUp(button), x, y);
    }

    /// Routes a host event to the matching entry point.
    pub fn handle_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::PointerEntered { x, y } => self.pointer_entered(x, y),
            DeviceEvent::PointerExited { x, y } => self.pointer_exited(x, y),
            DeviceEvent::PointerMoved { x, y } => self.pointer_moved(x, y),
            DeviceEvent::ButtonPressed { button, x, y } => self.button_pressed(button, x, y),
            DeviceEvent::PointerDragged { button, x, y } => self.pointer_dragged(button, x, y),
            DeviceEvent::ButtonReleased { button, x, y } => self.button_released(button, x, y),
            DeviceEvent::Resized { width, height } => self.resize(width, height),
        }
    }

    /// Encodes the current frame and writes it to `path`.
    #[cfg(feature = "std")]
    pub fn save(
        &mut self,
        path: impl AsRef<std::path::Path>,
        format: SnapshotFormat,
    ) -> Result<(), WindowError> {
        let bytes = self.backend.encode(format)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Sends the current frame to the backend's printer.
    pub fn print(&mut self) -> Result<(), WindowError> {
        self.backend.print()?;
        Ok(())
    }
}
