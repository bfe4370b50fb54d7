// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=tableau_render --heading-base-level=0

//! Tableau Render: the backend contract driven by the Tableau scene engine.
//!
//! The scene engine never rasterizes. Everything it wants on screen goes
//! through [`RenderBackend`], a small immediate-mode interface over a
//! resizable pixel surface:
//!
//! - [`RenderBackend::clear`] and [`RenderBackend::set_clip_region`] bound the
//!   work of one refresh to the damaged area.
//! - [`RenderBackend::draw_polyline`], [`RenderBackend::fill_polygon`],
//!   [`RenderBackend::draw_text`] and [`RenderBackend::draw_image`] produce
//!   pixels in device coordinates, styled by a [`Style`].
//! - [`RenderBackend::place_component`] positions host-owned embedded
//!   components identified by [`ComponentId`].
//! - [`RenderBackend::present`] makes the finished frame visible.
//! - [`RenderBackend::encode`] and [`RenderBackend::print`] are optional
//!   pass-through capabilities that default to [`BackendError::Unsupported`].
//!
//! # Position in the stack
//!
//! - **Scene engine** (`tableau_scene`): windows, scenes, object trees,
//!   damage tracking and interaction routing.
//! - **Backend contract (this crate)**: styles, resource handles and the
//!   backend trait.
//! - **Backends**: `tableau_render_ref` records calls for tests;
//!   `tableau_render_vello_cpu` rasterizes with Vello CPU.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod backend;
mod style;

pub use backend::{
    BackendError, ComponentId, ImageDesc, ImageId, RenderBackend, SnapshotFormat,
    estimate_text_extent,
};
pub use peniko::{Color, Fill as FillRule};
pub use style::{Font, Style};
