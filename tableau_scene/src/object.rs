// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawable-object contract and the context objects draw into.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;

use kurbo::{Point, Rect};
use tableau_render::Style;
use tableau_transform::{Matrix4, Point3};

use crate::segment::Segment;
use crate::tree::ObjectId;

bitflags::bitflags! {
    /// Kinds of content a node contributes, and the mask of kinds a pass or
    /// window wants to see.
    ///
    /// A node whose flags do not intersect the supplied mask is skipped,
    /// together with its subtree.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Visibility: u8 {
        /// Polylines and polygons, drawn in the data pass.
        const DATA       = 0b0000_0001;
        /// Text labels, drawn in the annotation pass.
        const ANNOTATION = 0b0000_0010;
        /// Symbol images, drawn in the annotation pass.
        const SYMBOLS    = 0b0000_0100;
        /// Embedded components, placed in the components pass.
        const WIDGETS    = 0b0000_1000;
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::all()
    }
}

impl Visibility {
    /// Kinds drawn by the annotation pass.
    pub const ANNOTATION_PASS: Self = Self::ANNOTATION.union(Self::SYMBOLS);
}

/// A drawable node in a scene.
///
/// Implementations regenerate their device-space [`Segment`]s whenever the
/// scene asks them to: after insertion, after the scene's transform changes
/// and on explicit redraws. Segments are not retained across transform
/// changes, so `draw` should rebuild them from the object's own world-space
/// data.
///
/// Closures taking a [`DrawContext`] implement this trait.
pub trait SceneObject: Any {
    /// Rebuilds this object's segments.
    fn draw(&mut self, cx: &mut DrawContext<'_>);
}

impl<F> SceneObject for F
where
    F: FnMut(&mut DrawContext<'_>) + 'static,
{
    fn draw(&mut self, cx: &mut DrawContext<'_>) {
        self(cx);
    }
}

/// What a [`SceneObject`] sees while drawing.
#[derive(Debug)]
pub struct DrawContext<'a> {
    id: ObjectId,
    transform: &'a Matrix4,
    viewport: Rect,
    segments: &'a mut Vec<Segment>,
}

impl<'a> DrawContext<'a> {
    pub(crate) fn new(
        id: ObjectId,
        transform: &'a Matrix4,
        viewport: Rect,
        segments: &'a mut Vec<Segment>,
    ) -> Self {
        Self {
            id,
            transform,
            viewport,
            segments,
        }
    }

    /// The node being drawn.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The scene's world-to-device transform.
    pub fn transform(&self) -> &Matrix4 {
        self.transform
    }

    /// The scene's viewport in device pixels.
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Maps a world point to device space.
    pub fn to_device(&self, p: Point3) -> Point {
        self.transform.transform_point(p).to_point()
    }

    /// Maps a sequence of world points to device space.
    pub fn to_device_points(&self, points: impl IntoIterator<Item = Point3>) -> Vec<Point> {
        points.into_iter().map(|p| self.to_device(p)).collect()
    }

    /// The segments produced by the previous draw.
    pub fn segments(&self) -> &[Segment] {
        self.segments
    }

    /// Mutable access to the segment list.
    pub fn segments_mut(&mut self) -> &mut Vec<Segment> {
        self.segments
    }

    /// Drops all segments.
    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Appends a segment and returns it for further decoration.
    pub fn push(&mut self, segment: Segment) -> &mut Segment {
        self.segments.push(segment);
        let last = self.segments.len() - 1;
        &mut self.segments[last]
    }

    /// Appends an open polyline through the given world points.
    pub fn polyline(
        &mut self,
        points: impl IntoIterator<Item = Point3>,
        style: Option<Arc<Style>>,
    ) -> &mut Segment {
        let pts = self.to_device_points(points);
        self.push(Segment::polyline(pts).with_style_opt(style))
    }

    /// Appends a closed polygon through the given world points.
    pub fn polygon(
        &mut self,
        points: impl IntoIterator<Item = Point3>,
        style: Option<Arc<Style>>,
    ) -> &mut Segment {
        let pts = self.to_device_points(points);
        self.push(Segment::polygon(pts).with_style_opt(style))
    }
}
