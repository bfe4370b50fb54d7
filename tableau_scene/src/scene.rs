// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scenes: a world extent mapped onto a device viewport, plus an object tree.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect};
use tableau_region::Region;
use tableau_render::{RenderBackend, Style};
use tableau_transform::{Matrix4, Point3, TransformError};

use crate::annotation;
use crate::object::{SceneObject, Visibility};
use crate::tree::{ObjectId, ObjectTree};

/// Errors from scene operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneError {
    /// The world extent or viewport does not produce an invertible transform.
    Transform(TransformError),
    /// The viewport has zero width or height.
    InvalidViewport,
    /// The object id is stale or belongs to another scene.
    UnknownObject(ObjectId),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform(e) => write!(f, "invalid scene transform: {e}"),
            Self::InvalidViewport => f.write_str("viewport has zero width or height"),
            Self::UnknownObject(id) => write!(f, "unknown scene object {id}"),
        }
    }
}

impl core::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Transform(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransformError> for SceneError {
    fn from(e: TransformError) -> Self {
        Self::Transform(e)
    }
}

/// Three world points defining a scene's coordinate frame.
///
/// `w2` maps to the viewport's top-left corner, `w0` to its bottom-left and
/// `w1` to its bottom-right. The fourth corner is implied. The frame may be
/// rotated, sheared or tilted out of the xy plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldExtent {
    /// Origin, at the bottom-left of the viewport.
    pub w0: Point3,
    /// End of the x axis, at the bottom-right.
    pub w1: Point3,
    /// End of the y axis, at the top-left.
    pub w2: Point3,
}

impl WorldExtent {
    /// Creates an extent from its three reference points.
    pub const fn new(w0: Point3, w1: Point3, w2: Point3) -> Self {
        Self { w0, w1, w2 }
    }

    /// Axis-aligned extent over a world rectangle with y growing upwards.
    pub fn from_world_rect(rect: Rect) -> Self {
        Self {
            w0: Point3::new(rect.x0, rect.y0, 0.0),
            w1: Point3::new(rect.x1, rect.y0, 0.0),
            w2: Point3::new(rect.x0, rect.y1, 0.0),
        }
    }

    /// Extent whose world coordinates equal device pixels of a viewport of
    /// the given size (y growing downwards).
    pub fn device_aligned(width: f64, height: f64) -> Self {
        Self {
            w0: Point3::new(0.0, height, 0.0),
            w1: Point3::new(width, height, 0.0),
            w2: Point3::ZERO,
        }
    }

    /// Horizontal edge vector, `w1 - w0`.
    pub fn x_edge(&self) -> Point3 {
        self.w1 - self.w0
    }

    /// Vertical edge vector, `w0 - w2`, pointing down the viewport.
    pub fn y_edge(&self) -> Point3 {
        self.w0 - self.w2
    }

    /// Center of the parallelogram.
    pub fn center(&self) -> Point3 {
        self.w1.midpoint(self.w2)
    }

    /// Scales every reference point about `anchor` by `1 / factor`.
    #[must_use]
    pub fn zoomed_about(&self, anchor: Point3, factor: f64) -> Self {
        let f = |p: Point3| anchor + (p - anchor) * (1.0 / factor);
        Self::new(f(self.w0), f(self.w1), f(self.w2))
    }

    /// Translates every reference point by `delta`.
    #[must_use]
    pub fn translated(&self, delta: Point3) -> Self {
        Self::new(self.w0 + delta, self.w1 + delta, self.w2 + delta)
    }

    /// Rebuilds the extent from new edge vectors, keeping `w2` fixed.
    fn with_edges_from_top_left(&self, x_edge: Point3, y_edge: Point3) -> Self {
        let w0 = self.w2 + y_edge;
        Self::new(w0, w0 + x_edge, self.w2)
    }

    /// Rebuilds the extent from new edge vectors about its center.
    fn with_edges_about_center(&self, x_edge: Point3, y_edge: Point3) -> Self {
        let w2 = self.center() - x_edge * 0.5 - y_edge * 0.5;
        let w0 = w2 + y_edge;
        Self::new(w0, w0 + x_edge, w2)
    }

    /// Grows the shorter edge about the center so the edge-length ratio
    /// matches `aspect` (width over height).
    #[must_use]
    pub fn fitted_to_aspect(&self, aspect: f64) -> Self {
        let (ex, ey) = (self.x_edge(), self.y_edge());
        let (lx, ly) = (ex.length(), ey.length());
        if lx == 0.0 || ly == 0.0 || !aspect.is_finite() || aspect <= 0.0 {
            return *self;
        }
        let current = lx / ly;
        if current < aspect {
            self.with_edges_about_center(ex * (aspect / current), ey)
        } else if current > aspect {
            self.with_edges_about_center(ex, ey * (current / aspect))
        } else {
            *self
        }
    }
}

/// Device rectangle a scene occupies in its window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Viewport {
    /// Left edge in device pixels.
    pub x: i32,
    /// Top edge in device pixels.
    pub y: i32,
    /// Width in device pixels.
    pub width: u32,
    /// Height in device pixels.
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The viewport as a rectangle.
    pub fn rect(&self) -> Rect {
        let x = f64::from(self.x);
        let y = f64::from(self.y);
        Rect::new(
            x,
            y,
            x + f64::from(self.width),
            y + f64::from(self.height),
        )
    }

    /// Returns `true` if either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Aspect ratio, width over height.
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Scales position and size by the given ratios, rounding to pixels.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "float to int casts saturate and sizes are clamped to one pixel"
    )]
    pub fn scaled(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: (f64::from(self.x) * dx).round() as i32,
            y: (f64::from(self.y) * dy).round() as i32,
            width: (f64::from(self.width) * dx).round().max(1.0) as u32,
            height: (f64::from(self.height) * dy).round().max(1.0) as u32,
        }
    }
}

/// Per-scene behavior switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SceneConfig {
    /// On resize, rescale the world extent with the device-size ratios so
    /// features keep their apparent size. When `false`, the extent stays
    /// fixed and features stretch with the viewport.
    pub zoom_on_resize: bool,
    /// Force the extent's aspect ratio to the viewport's whenever either
    /// changes, by growing the shorter extent edge about its center.
    pub world_extent_fits_viewport: bool,
}

/// A world extent mapped onto a device viewport, holding a tree of objects.
///
/// Scenes do not reference their window. Damage produced by scene
/// operations accumulates in an outbox that the window drains on
/// [`refresh`](crate::Window::refresh).
#[derive(Debug)]
pub struct Scene {
    name: Option<String>,
    /// Extent as last set, zoomed or panned, before aspect fitting.
    requested: WorldExtent,
    /// Extent actually mapped onto the viewport.
    extent: WorldExtent,
    initial_extent: WorldExtent,
    viewport: Viewport,
    transform: Matrix4,
    inverse: Matrix4,
    config: SceneConfig,
    background: Option<Arc<Style>>,
    objects: ObjectTree,
    damage: Region,
    annotation_valid: bool,
}

impl Scene {
    /// Creates a scene covering `viewport` with a device-aligned extent.
    pub fn new(viewport: Viewport) -> Result<Self, SceneError> {
        if viewport.is_empty() {
            return Err(SceneError::InvalidViewport);
        }
        let extent =
            WorldExtent::device_aligned(f64::from(viewport.width), f64::from(viewport.height));
        let (transform, inverse) = Self::derive(&extent, &viewport)?;
        Ok(Self {
            name: None,
            requested: extent,
            extent,
            initial_extent: extent,
            viewport,
            transform,
            inverse,
            config: SceneConfig::default(),
            background: None,
            objects: ObjectTree::new(),
            damage: Region::from_rect(viewport.rect()),
            annotation_valid: false,
        })
    }

    /// Creates a scene over `viewport` showing `extent`.
    pub fn with_extent(viewport: Viewport, extent: WorldExtent) -> Result<Self, SceneError> {
        let mut scene = Self::new(viewport)?;
        scene.set_world_extent(extent)?;
        Ok(scene)
    }

    fn derive(extent: &WorldExtent, vp: &Viewport) -> Result<(Matrix4, Matrix4), SceneError> {
        let r = vp.rect();
        let m = Matrix4::world_to_device(
            extent.w0,
            extent.w1,
            extent.w2,
            r.x0,
            r.y0,
            r.width(),
            r.height(),
        )?;
        let inv = m.inverse()?;
        Ok((m, inv))
    }

    fn fit(&self, extent: WorldExtent, viewport: &Viewport) -> WorldExtent {
        if self.config.world_extent_fits_viewport {
            extent.fitted_to_aspect(viewport.aspect())
        } else {
            extent
        }
    }

    /// Validates and installs a requested extent and viewport, then redraws.
    fn apply(&mut self, requested: WorldExtent, viewport: Viewport) -> Result<(), SceneError> {
        self.install(requested, viewport)?;
        self.redraw(Visibility::all());
        Ok(())
    }

    /// Validates and installs a requested extent and viewport. The displayed
    /// extent is always fitted from `requested`, never from a previous fit.
    fn install(&mut self, requested: WorldExtent, viewport: Viewport) -> Result<(), SceneError> {
        if viewport.is_empty() {
            return Err(SceneError::InvalidViewport);
        }
        let extent = self.fit(requested, &viewport);
        let (transform, inverse) = Self::derive(&extent, &viewport)?;
        self.damage.union_rect(self.viewport.rect());
        self.requested = requested;
        self.extent = extent;
        self.viewport = viewport;
        self.transform = transform;
        self.inverse = inverse;
        log::trace!("scene {:?}: extent {:?} on {:?}", self.name, extent, viewport);
        Ok(())
    }

    /// Scene name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the scene name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Behavior switches.
    pub fn config(&self) -> SceneConfig {
        self.config
    }

    /// Replaces the behavior switches. Takes effect on the next extent,
    /// zoom or resize change.
    pub fn set_config(&mut self, config: SceneConfig) {
        self.config = config;
    }

    /// Background style; its `background` color fills the viewport in the
    /// data pass.
    pub fn background(&self) -> Option<&Arc<Style>> {
        self.background.as_ref()
    }

    /// Sets the background style and damages the viewport.
    pub fn set_background(&mut self, style: Option<Arc<Style>>) {
        self.background = style;
        self.damage.union_rect(self.viewport.rect());
    }

    /// Current device viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Moves or resizes the viewport, keeping the extent.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), SceneError> {
        self.apply(self.requested, viewport)
    }

    /// World extent mapped onto the viewport. With
    /// [`SceneConfig::world_extent_fits_viewport`] this is the requested
    /// extent grown to the viewport's aspect ratio.
    pub fn world_extent(&self) -> WorldExtent {
        self.extent
    }

    /// World extent as last set, zoomed or panned, before aspect fitting.
    pub fn requested_extent(&self) -> WorldExtent {
        self.requested
    }

    /// Extent restored by [`Scene::unzoom`].
    pub fn initial_extent(&self) -> WorldExtent {
        self.initial_extent
    }

    /// Sets the world extent and records it as the initial extent.
    ///
    /// Collinear reference points are rejected before anything changes.
    pub fn set_world_extent(&mut self, extent: WorldExtent) -> Result<(), SceneError> {
        self.apply(extent, self.viewport)?;
        self.initial_extent = extent;
        Ok(())
    }

    /// World-to-device transform.
    pub fn transform(&self) -> &Matrix4 {
        &self.transform
    }

    /// Device-to-world transform.
    pub fn inverse_transform(&self) -> &Matrix4 {
        &self.inverse
    }

    /// Maps a device point into the world.
    pub fn device_to_world(&self, x: f64, y: f64) -> Point3 {
        self.inverse.transform_point(Point3::new(x, y, 0.0))
    }

    /// Maps a world point onto the device.
    pub fn world_to_device(&self, p: Point3) -> Point {
        self.transform.transform_point(p).to_point()
    }

    /// Replaces the extent without recording it as initial.
    pub fn zoom(&mut self, w0: Point3, w1: Point3, w2: Point3) -> Result<(), SceneError> {
        self.apply(WorldExtent::new(w0, w1, w2), self.viewport)
    }

    /// Zooms about the extent's center. Factors above one magnify.
    pub fn zoom_factor(&mut self, factor: f64) -> Result<(), SceneError> {
        let extent = self.requested.zoomed_about(self.requested.center(), factor);
        self.apply(extent, self.viewport)
    }

    /// Zooms about a device point, which keeps its world position.
    pub fn zoom_at(&mut self, x: f64, y: f64, factor: f64) -> Result<(), SceneError> {
        let anchor = self.device_to_world(x, y);
        let extent = self.requested.zoomed_about(anchor, factor);
        self.apply(extent, self.viewport)
    }

    /// Zooms so that the device rectangle `rect` fills the viewport.
    pub fn zoom_to_device_rect(&mut self, rect: Rect) -> Result<(), SceneError> {
        let extent = WorldExtent::new(
            self.device_to_world(rect.x0, rect.y1),
            self.device_to_world(rect.x1, rect.y1),
            self.device_to_world(rect.x0, rect.y0),
        );
        self.apply(extent, self.viewport)
    }

    /// Scrolls the content by a device offset.
    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<(), SceneError> {
        let origin = self.device_to_world(0.0, 0.0);
        let moved = self.device_to_world(dx, dy);
        let extent = self.requested.translated(origin - moved);
        self.apply(extent, self.viewport)
    }

    /// Restores the initial extent.
    pub fn unzoom(&mut self) -> Result<(), SceneError> {
        self.apply(self.initial_extent, self.viewport)
    }

    /// Rescales the scene after its window changed size by `dx` horizontally
    /// and `dy` vertically, then redraws it.
    ///
    /// The viewport always scales. With
    /// [`SceneConfig::zoom_on_resize`] the extent's edges scale too, anchored
    /// at the top-left reference point, so world units per pixel stay
    /// constant. Otherwise the requested extent is kept and only its fit to
    /// the new viewport changes.
    pub fn resize(&mut self, dx: f64, dy: f64) -> Result<(), SceneError> {
        self.rescale(dx, dy)?;
        self.redraw(Visibility::all());
        Ok(())
    }

    /// [`Scene::resize`] without the redraw, for callers that redraw anyway.
    pub(crate) fn rescale(&mut self, dx: f64, dy: f64) -> Result<(), SceneError> {
        let viewport = self.viewport.scaled(dx, dy);
        let requested = if self.config.zoom_on_resize {
            let sx = f64::from(viewport.width) / f64::from(self.viewport.width);
            let sy = f64::from(viewport.height) / f64::from(self.viewport.height);
            let r = &self.requested;
            r.with_edges_from_top_left(r.x_edge() * sx, r.y_edge() * sy)
        } else {
            self.requested
        };
        self.install(requested, viewport)
    }

    /// Object tree.
    pub fn objects(&self) -> &ObjectTree {
        &self.objects
    }

    /// Mutable object tree.
    ///
    /// Changes made through it produce no damage by themselves; follow them
    /// with [`Scene::redraw_object`] or [`Scene::damage_area`].
    pub fn objects_mut(&mut self) -> &mut ObjectTree {
        &mut self.objects
    }

    /// Inserts an object, draws it and damages what it covers.
    pub fn add_object(
        &mut self,
        parent: Option<ObjectId>,
        object: impl SceneObject,
    ) -> Result<ObjectId, SceneError> {
        let id = self.objects.insert(parent, object)?;
        self.redraw_object(id)?;
        Ok(id)
    }

    /// Removes an object and its subtree, damaging what they covered.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let damage = self.objects.remove(id)?;
        self.damage.union(&damage);
        self.annotation_valid = false;
        Ok(())
    }

    /// Depth-first, first-match search by name.
    pub fn find_by_name(&self, name: Option<&str>) -> Option<ObjectId> {
        self.objects.find_by_name(name)
    }

    /// Depth-first, first-match search by user tag.
    pub fn find_by_user_data(&self, data: Option<u64>) -> Option<ObjectId> {
        self.objects.find_by_user_data(data)
    }

    /// Redraws every object visible under `mask` and damages the viewport.
    pub fn redraw(&mut self, mask: Visibility) {
        let viewport = self.viewport.rect();
        for id in self.objects.visible_ids(mask) {
            self.objects.draw(id, &self.transform, viewport);
        }
        self.damage.union_rect(viewport);
        self.annotation_valid = false;
    }

    /// Redraws a single object, damaging its old and new regions.
    pub fn redraw_object(&mut self, id: ObjectId) -> Result<(), SceneError> {
        if !self.objects.contains(id) {
            return Err(SceneError::UnknownObject(id));
        }
        let before = self.objects.compute_region(id, Visibility::all());
        self.objects.draw(id, &self.transform, self.viewport.rect());
        let after = self.objects.compute_region(id, Visibility::all());
        self.damage.union(&before);
        self.damage.union(&after);
        self.annotation_valid = false;
        Ok(())
    }

    /// Adds a device rectangle to the pending damage.
    pub fn damage_area(&mut self, rect: Rect) {
        self.damage.union_rect(rect.expand());
    }

    /// Returns `true` if damage is waiting for the window.
    pub fn has_damage(&self) -> bool {
        !self.damage.is_empty()
    }

    /// Takes the pending damage.
    pub fn take_damage(&mut self) -> Region {
        core::mem::take(&mut self.damage)
    }

    /// Whether label positions are current.
    pub fn annotation_valid(&self) -> bool {
        self.annotation_valid
    }

    /// Forces label layout on the next refresh.
    pub fn invalidate_annotation(&mut self) {
        self.annotation_valid = false;
    }

    /// The device region the scene owns: its viewport.
    pub fn region(&self) -> Region {
        Region::from_rect(self.viewport.rect())
    }

    /// Union of the regions of all roots visible under `mask`, recomputing
    /// only invalid subtrees.
    pub fn compute_region(&mut self, mask: Visibility) -> Region {
        let mut region = Region::new();
        let roots = self.objects.roots().to_vec();
        for root in roots {
            let r = self.objects.compute_region(root, mask);
            region.union(&r);
        }
        region
    }

    /// Returns `true` if the device point lies inside the polygon formed by
    /// the four corners of the extent mapped onto the device.
    pub fn contains_device_point(&self, x: f64, y: f64) -> bool {
        let e = &self.extent;
        let corners = [
            self.world_to_device(e.w2),
            self.world_to_device(e.w0),
            self.world_to_device(e.w1),
            self.world_to_device(e.w1 + e.w2 - e.w0),
        ];
        point_in_polygon(Point::new(x, y), &corners)
    }

    /// Lays out labels and symbols for objects visible under `mask`.
    pub fn layout_annotation<B: RenderBackend + ?Sized>(&mut self, backend: &B, mask: Visibility) {
        let moved = annotation::layout_annotation(&mut self.objects, backend, mask);
        self.damage.union(&moved);
        self.annotation_valid = true;
    }

    /// Positions embedded components for objects visible under `mask`.
    pub fn layout_components(&mut self, mask: Visibility) {
        let moved = annotation::layout_components(&mut self.objects, mask);
        self.damage.union(&moved);
    }

    /// Data pass: the background and every polyline and polygon of objects
    /// intersecting `clip`.
    pub fn refresh_data<B: RenderBackend + ?Sized>(
        &self,
        mask: Visibility,
        clip: &Region,
        backend: &mut B,
    ) {
        if let Some(fill) = self.background.as_deref().filter(|s| s.background.is_some()) {
            let r = self.viewport.rect();
            let corners = [
                Point::new(r.x0, r.y0),
                Point::new(r.x1, r.y0),
                Point::new(r.x1, r.y1),
                Point::new(r.x0, r.y1),
            ];
            let style = fill.clone().with_line_width(0.0);
            backend.fill_polygon(&corners, &style);
        }
        let pass = mask & Visibility::DATA;
        for id in self.visible_in(pass, clip) {
            let Some(segments) = self.objects.segments(id) else {
                continue;
            };
            for (i, seg) in segments.iter().enumerate() {
                if !seg.has_geometry() {
                    continue;
                }
                let style = self.objects.effective_style(id, Some(i));
                if seg.closed {
                    backend.fill_polygon(&seg.points, style);
                } else {
                    backend.draw_polyline(&seg.points, style);
                }
            }
        }
    }

    /// Annotation pass: laid-out labels and symbols.
    pub fn refresh_annotation<B: RenderBackend + ?Sized>(
        &self,
        mask: Visibility,
        clip: &Region,
        backend: &mut B,
    ) {
        let pass = mask & Visibility::ANNOTATION_PASS;
        for id in self.visible_in(pass, clip) {
            let kinds = self.objects.visibility(id).unwrap_or_default() & pass;
            let Some(segments) = self.objects.segments(id) else {
                continue;
            };
            for (i, seg) in segments.iter().enumerate() {
                if kinds.contains(Visibility::ANNOTATION) {
                    for text in &seg.texts {
                        let Some(rect) = text.rect else { continue };
                        let style = match text.style.as_deref() {
                            Some(s) => s,
                            None => self.objects.effective_style(id, Some(i)),
                        };
                        backend.draw_text(&text.string, rect, style);
                    }
                }
                if kinds.contains(Visibility::SYMBOLS) {
                    for sym in &seg.symbols {
                        if let Some(rect) = sym.rect {
                            backend.draw_image(sym.image, rect);
                        }
                    }
                }
            }
        }
    }

    /// Components pass: reports component rectangles to the backend.
    pub fn refresh_components<B: RenderBackend + ?Sized>(
        &self,
        mask: Visibility,
        clip: &Region,
        backend: &mut B,
    ) {
        let pass = mask & Visibility::WIDGETS;
        for id in self.visible_in(pass, clip) {
            let Some(segments) = self.objects.segments(id) else {
                continue;
            };
            for comp in segments.iter().flat_map(|s| s.components.iter()) {
                if let Some(rect) = comp.rect {
                    backend.place_component(comp.id, rect);
                }
            }
        }
    }

    /// Nodes visible under `pass` whose last computed region touches `clip`.
    fn visible_in(&self, pass: Visibility, clip: &Region) -> Vec<ObjectId> {
        let mut ids = self.objects.visible_ids(pass);
        ids.retain(|id| {
            self.objects
                .cached_region(*id)
                .is_some_and(|r| clip.iter().any(|c| r.intersects_rect(*c)))
        });
        ids
    }
}

fn point_in_polygon(p: Point, poly: &[Point]) -> bool {
    let mut inside = false;
    let mut j = poly.len().wrapping_sub(1);
    for (i, a) in poly.iter().enumerate() {
        let b = poly[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}
