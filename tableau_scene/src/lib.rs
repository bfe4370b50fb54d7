// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=tableau_scene --heading-base-level=0

//! Tableau Scene: a retained-mode 2D scene graph with damage tracking.
//!
//! A [`Window`] owns a [`RenderBackend`](tableau_render::RenderBackend) and a
//! stack of [`Scene`]s. Each scene maps a [`WorldExtent`] (three world points,
//! not necessarily axis-aligned) onto a device [`Viewport`] and holds an
//! [`ObjectTree`] of client-supplied [`SceneObject`]s. Objects turn their
//! world data into device-space [`Segment`]s when asked to draw, and the tree
//! caches each node's device region so that refreshes redraw only what
//! changed.
//!
//! - Mutations (adding, removing or redrawing objects, zooming, resizing)
//!   record damage.
//! - [`Window::refresh`] lays out labels and components, clips the damage to
//!   the visible scenes and redraws it in three ordered passes (data,
//!   annotation, components), each scene clipped to its share of the damage.
//! - Presenting the frame is a [`present::Task`] the host runs with
//!   [`Window::process_pending`].
//! - Pointer input is routed to at most one installed [`Interaction`], scoped
//!   to the scene under the pointer or, during a button gesture, to the scene
//!   where the gesture began.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Rect;
//! use tableau_render_ref::RefBackend;
//! use tableau_scene::{DrawContext, Scene, Viewport, Window, WorldExtent};
//! use tableau_transform::Point3;
//!
//! let mut window = Window::new(RefBackend::new(100, 100));
//!
//! // A unit square world, y up, shown on the whole window.
//! let extent = WorldExtent::from_world_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
//! let mut scene = Scene::with_extent(Viewport::new(0, 0, 100, 100), extent).unwrap();
//! let diagonal = scene
//!     .add_object(None, |cx: &mut DrawContext<'_>| {
//!         cx.clear();
//!         cx.polyline([Point3::ZERO, Point3::new(1.0, 1.0, 0.0)], None);
//!     })
//!     .unwrap();
//! let id = window.add_scene(scene);
//! window.refresh();
//!
//! // World (0, 0) is the bottom-left device corner.
//! let points = &window.scene(id).unwrap().objects().segments(diagonal).unwrap()[0].points;
//! assert_eq!((points[0].x, points[0].y), (0.0, 100.0));
//! assert_eq!((points[1].x, points[1].y), (100.0, 0.0));
//! assert_eq!(window.backend().draw_call_count(), 1);
//! ```
//!
//! This crate is `no_std` and uses `alloc`. The `std` feature (on by default)
//! adds [`Window::save`].

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod annotation;
mod dirty;
pub mod interaction;
mod object;
pub mod present;
mod scene;
mod segment;
mod tree;
mod window;

pub use interaction::{Button, DeviceEvent, Interaction, InteractionEvent};
pub use object::{DrawContext, SceneObject, Visibility};
pub use scene::{Scene, SceneConfig, SceneError, Viewport, WorldExtent};
pub use segment::{Component, PositionHint, Segment, Symbol, Text};
pub use tree::{ObjectId, ObjectTree};
pub use window::{SceneId, Window, WindowError};
