// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=tableau_transform --heading-base-level=0

//! Tableau Transform: 4x4 transforms and world-to-device mapping.
//!
//! Scenes in Tableau describe their logical coordinate system with three
//! world-space reference points rather than an axis-aligned rectangle, so the
//! frame may be rotated or sheared, and may live in a plane embedded in 3D.
//! This crate provides the matrix machinery for that:
//!
//! - [`Point3`]: a small 3D point/vector type.
//! - [`Matrix4`]: a row-major 4x4 matrix using the column-vector convention
//!   (`p' = M · p`), with translation, scaling, rotation, composition and
//!   inversion.
//! - [`Matrix4::world_to_device`]: derives the matrix that pins three world
//!   points onto three corners of a device rectangle.
//!
//! Intermediate math is done in `f64`; the `*_rounded` point-array helpers
//! produce integer pixel positions for rasterization.
//!
//! ## Minimal example
//!
//! ```rust
//! use tableau_transform::{Matrix4, Point3};
//!
//! // World x-axis from w0 to w1, world y-axis from w0 to w2.
//! let w0 = Point3::new(0.0, 0.0, 0.0);
//! let w1 = Point3::new(1.0, 0.0, 0.0);
//! let w2 = Point3::new(0.0, 1.0, 0.0);
//! let m = Matrix4::world_to_device(w0, w1, w2, 0.0, 0.0, 100.0, 50.0).unwrap();
//!
//! // w2 lands on the top-left device corner, w0 on the bottom-left one.
//! let p = m.transform_point(w2);
//! assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9);
//! let p = m.transform_point(w0);
//! assert!((p.y - 50.0).abs() < 1e-9);
//! ```
//!
//! ## Degenerate frames
//!
//! Three collinear reference points do not span a plane. Instead of producing
//! a numerically meaningless matrix, [`Matrix4::world_to_device`] returns
//! [`TransformError::DegenerateExtent`]. Likewise [`Matrix4::inverse`] returns
//! [`TransformError::Singular`] for non-invertible matrices.
//!
//! This crate is `no_std`.

#![no_std]

extern crate alloc;

mod matrix;
mod point;

pub use matrix::{Matrix4, TransformError};
pub use point::Point3;
