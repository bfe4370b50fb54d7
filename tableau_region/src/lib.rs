// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=tableau_region --heading-base-level=0

//! Tableau Region: rectangle-set algebra for damage tracking.
//!
//! A [`Region`] is a set of axis-aligned rectangles in device space. It is the
//! currency of the Tableau damage pipeline: objects and scenes report the
//! areas they touched, the window accumulates them, clips them against the
//! visible scenes and hands the result to a render backend as a clip.
//!
//! - [`Region::union_rect`] / [`Region::union`] grow the covered area. The
//!   stored rectangles never overlap, so [`Region::area`] is exact.
//! - [`Region::intersect`] computes the geometric intersection of two regions.
//! - [`Region::subtract_rect`] removes coverage.
//! - [`Region::collapse`] trades precision for bounded complexity by replacing
//!   the set with its bounding box. Accumulators typically call it once
//!   [`Region::rectangle_count`] exceeds [`COLLAPSE_THRESHOLD`].
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Rect;
//! use tableau_region::Region;
//!
//! let mut damage = Region::new();
//! damage.union_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
//! damage.union_rect(Rect::new(5.0, 5.0, 15.0, 15.0));
//! assert_eq!(damage.area(), 175.0);
//!
//! let visible = Region::from_rect(Rect::new(0.0, 0.0, 8.0, 8.0));
//! let clipped = Region::intersect(&damage, &visible);
//! assert_eq!(clipped.area(), 64.0);
//!
//! damage.collapse();
//! assert_eq!(damage.rectangle_count(), 1);
//! assert_eq!(damage.extent(), Some(Rect::new(0.0, 0.0, 15.0, 15.0)));
//! ```
//!
//! Empty and inverted rectangles are treated as covering nothing; every
//! operation accepts empty inputs.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod region;

pub use region::{COLLAPSE_THRESHOLD, Region, RegionError};
