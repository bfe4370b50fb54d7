// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=tableau_render_ref --heading-base-level=0

//! Tableau Render Reference Backend.
//!
//! This crate provides a small, stateful implementation of [`RenderBackend`]
//! that **records** every call it receives instead of producing pixels.
//!
//! It is intended for tests and debugging that want to assert on what a
//! refresh emitted: which rectangles were cleared, which clip was active, in
//! which order the passes drew, and when the frame was presented.
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use tableau_render::{RenderBackend, Style};
//! use tableau_render_ref::{Event, RefBackend};
//!
//! let mut backend = RefBackend::new(64, 64);
//! backend.clear(Rect::new(0.0, 0.0, 64.0, 64.0));
//! backend.draw_polyline(&[Point::new(0.0, 0.0), Point::new(10.0, 10.0)], &Style::default());
//! backend.present();
//!
//! assert_eq!(backend.draw_call_count(), 1);
//! assert!(matches!(backend.events().last(), Some(Event::Present)));
//! ```

#![no_std]

extern crate alloc;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};
use tableau_region::Region;
use tableau_render::{
    BackendError, ComponentId, ImageDesc, ImageId, RenderBackend, SnapshotFormat, Style,
    estimate_text_extent,
};

/// Event recorded by the reference backend.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The surface was resized.
    Resize {
        /// New width.
        width: u32,
        /// New height.
        height: u32,
    },
    /// The clip region was replaced.
    SetClip {
        /// New clip, `None` when the clip was lifted.
        clip: Option<Region>,
    },
    /// A rectangle was reset to the background.
    Clear {
        /// Cleared rectangle.
        rect: Rect,
    },
    /// An open polyline was stroked.
    Polyline {
        /// Device points.
        points: Vec<Point>,
        /// Style used.
        style: Style,
    },
    /// A closed polygon was filled and outlined.
    Polygon {
        /// Device points.
        points: Vec<Point>,
        /// Style used.
        style: Style,
    },
    /// A text label was drawn.
    Text {
        /// The label.
        text: String,
        /// Device rectangle the label was laid out into.
        rect: Rect,
        /// Style used.
        style: Style,
    },
    /// An image was drawn.
    Image {
        /// Image handle.
        image: ImageId,
        /// Destination rectangle.
        rect: Rect,
    },
    /// An embedded component was positioned.
    Component {
        /// Component handle.
        component: ComponentId,
        /// Assigned device rectangle.
        rect: Rect,
    },
    /// The frame was presented.
    Present,
    /// The frame was sent to the printer.
    Print,
}

impl Event {
    /// Returns `true` for events that put content on the surface.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::Polyline { .. }
                | Self::Polygon { .. }
                | Self::Text { .. }
                | Self::Image { .. }
                | Self::Component { .. }
        )
    }
}

/// Recording implementation of [`RenderBackend`].
///
/// This backend:
/// - Tracks the surface size and current clip,
/// - Stores registered images keyed by their IDs,
/// - Records an [`Event`] per call in the order calls were made.
#[derive(Clone, Debug, Default)]
pub struct RefBackend {
    width: u32,
    height: u32,
    images: Vec<(ImageDesc, Vec<u8>)>,
    clip: Option<Region>,
    events: Vec<Event>,
    presents: usize,
}

impl RefBackend {
    /// Creates a backend with a surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Returns the recorded events.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Clears recorded events but keeps images, size and clip.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Takes the recorded events, leaving the log empty.
    pub fn take_events(&mut self) -> Vec<Event> {
        core::mem::take(&mut self.events)
    }

    /// Number of recorded events that drew content.
    pub fn draw_call_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_draw()).count()
    }

    /// Rectangles cleared since the log was last cleared.
    pub fn cleared_rects(&self) -> Vec<Rect> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Clear { rect } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// Labels drawn since the log was last cleared.
    pub fn drawn_texts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Total number of presents over the backend's lifetime.
    pub fn present_count(&self) -> usize {
        self.presents
    }

    /// The clip currently in effect.
    pub fn clip(&self) -> Option<&Region> {
        self.clip.as_ref()
    }

    /// Looks up a registered image.
    pub fn image(&self, id: ImageId) -> Option<(&ImageDesc, &[u8])> {
        self.images
            .get(id.0 as usize)
            .map(|(desc, pixels)| (desc, pixels.as_slice()))
    }
}

impl RenderBackend for RefBackend {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.events.push(Event::Resize { width, height });
    }

    fn create_image(&mut self, desc: ImageDesc, pixels: &[u8]) -> ImageId {
        let id = u32::try_from(self.images.len()).unwrap_or(u32::MAX);
        self.images.push((desc, pixels.to_vec()));
        ImageId(id)
    }

    fn set_clip_region(&mut self, clip: Option<&Region>) {
        self.clip = clip.cloned();
        self.events.push(Event::SetClip {
            clip: self.clip.clone(),
        });
    }

    fn clear(&mut self, rect: Rect) {
        self.events.push(Event::Clear { rect });
    }

    fn draw_polyline(&mut self, points: &[Point], style: &Style) {
        self.events.push(Event::Polyline {
            points: points.to_vec(),
            style: style.clone(),
        });
    }

    fn fill_polygon(&mut self, points: &[Point], style: &Style) {
        self.events.push(Event::Polygon {
            points: points.to_vec(),
            style: style.clone(),
        });
    }

    fn draw_text(&mut self, text: &str, rect: Rect, style: &Style) {
        self.events.push(Event::Text {
            text: String::from(text),
            rect,
            style: style.clone(),
        });
    }

    fn text_extent(&self, text: &str, style: &Style) -> Size {
        estimate_text_extent(text, style)
    }

    fn draw_image(&mut self, image: ImageId, rect: Rect) {
        self.events.push(Event::Image { image, rect });
    }

    fn place_component(&mut self, component: ComponentId, rect: Rect) {
        self.events.push(Event::Component { component, rect });
    }

    fn present(&mut self) {
        self.presents += 1;
        self.events.push(Event::Present);
    }

    /// Only [`SnapshotFormat::Rgba8`] is supported and yields a fully
    /// transparent frame of the current size, since nothing is rasterized.
    fn encode(&mut self, format: SnapshotFormat) -> Result<Vec<u8>, BackendError> {
        match format {
            SnapshotFormat::Rgba8 => Ok(vec![0; self.width as usize * self.height as usize * 4]),
            SnapshotFormat::Png => Err(BackendError::Unsupported),
        }
    }

    fn print(&mut self) -> Result<(), BackendError> {
        self.events.push(Event::Print);
        Ok(())
    }
}
