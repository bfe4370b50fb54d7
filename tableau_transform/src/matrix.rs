// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use core::fmt;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point};

use crate::Point3;

/// Relative tolerance below which two world edge vectors count as collinear.
const COLLINEAR_EPSILON: f64 = 1e-12;

/// Errors produced by matrix construction and point transforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformError {
    /// The matrix has a zero determinant and cannot be inverted.
    Singular,
    /// The world reference points are collinear (or coincident), so they do
    /// not define a 2D frame.
    DegenerateExtent,
    /// The rotation axis has zero length.
    ZeroAxis,
    /// A flat coordinate array does not hold a whole number of points.
    InvalidLength {
        /// Length of the supplied array.
        len: usize,
        /// Number of coordinates per point (2 or 3).
        stride: usize,
    },
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singular => f.write_str("matrix is singular"),
            Self::DegenerateExtent => {
                f.write_str("world extent reference points are collinear")
            }
            Self::ZeroAxis => f.write_str("rotation axis has zero length"),
            Self::InvalidLength { len, stride } => write!(
                f,
                "coordinate array of length {len} is not a multiple of {stride}"
            ),
        }
    }
}

impl core::error::Error for TransformError {}

/// A 4x4 transform matrix.
///
/// Elements are stored row-major and points are treated as column vectors, so
/// the translation lives in the last column. `a * b` (or
/// [`a.multiply(&b)`](Matrix4::multiply)) applies `b` first, matching
/// [`kurbo::Affine`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix4 {
    m: [f64; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Creates a matrix from 16 row-major elements.
    #[inline]
    pub const fn new(m: [f64; 16]) -> Self {
        Self { m }
    }

    /// Returns the 16 row-major elements.
    #[inline]
    pub const fn as_array(&self) -> &[f64; 16] {
        &self.m
    }

    /// Returns the element at `row`, `col`.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is not below 4.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < 4 && col < 4, "matrix index ({row}, {col}) out of range");
        self.m[row * 4 + col]
    }

    /// A translation by `(dx, dy, dz)`.
    #[must_use]
    pub const fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self::new([
            1.0, 0.0, 0.0, dx, //
            0.0, 1.0, 0.0, dy, //
            0.0, 0.0, 1.0, dz, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// A scale by `(sx, sy, sz)` about the origin.
    #[must_use]
    pub const fn scaling(sx: f64, sy: f64, sz: f64) -> Self {
        Self::new([
            sx, 0.0, 0.0, 0.0, //
            0.0, sy, 0.0, 0.0, //
            0.0, 0.0, sz, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// A rotation of `angle` radians about the x axis.
    #[must_use]
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = (angle.sin(), angle.cos());
        Self::new([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, -s, 0.0, //
            0.0, s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// A rotation of `angle` radians about the y axis.
    #[must_use]
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = (angle.sin(), angle.cos());
        Self::new([
            c, 0.0, s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            -s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// A rotation of `angle` radians about the z axis.
    #[must_use]
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = (angle.sin(), angle.cos());
        Self::new([
            c, -s, 0.0, 0.0, //
            s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// A rotation of `angle` radians about the line through `p0` and `p1`.
    ///
    /// The rotation is counter-clockwise when looking from `p1` towards `p0`.
    pub fn rotation_about_axis(angle: f64, p0: Point3, p1: Point3) -> Result<Self, TransformError> {
        let axis = p1 - p0;
        let len = axis.length();
        if len == 0.0 || !len.is_finite() {
            return Err(TransformError::ZeroAxis);
        }
        let Point3 { x, y, z } = axis * (1.0 / len);
        let (s, c) = (angle.sin(), angle.cos());
        let t = 1.0 - c;
        let rotation = Self::new([
            c + x * x * t,
            x * y * t - z * s,
            x * z * t + y * s,
            0.0,
            y * x * t + z * s,
            c + y * y * t,
            y * z * t - x * s,
            0.0,
            z * x * t - y * s,
            z * y * t + x * s,
            c + z * z * t,
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        ]);
        Ok(Self::translation(p0.x, p0.y, p0.z)
            * rotation
            * Self::translation(-p0.x, -p0.y, -p0.z))
    }

    /// Returns `self * other`: the transform that applies `other` first.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let a = &self.m;
        let b = &other.m;
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[row * 4 + col] = a[row * 4] * b[col]
                    + a[row * 4 + 1] * b[4 + col]
                    + a[row * 4 + 2] * b[8 + col]
                    + a[row * 4 + 3] * b[12 + col];
            }
        }
        Self::new(out)
    }

    /// Applies a translation after this transform.
    #[must_use]
    pub fn then_translate(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::translation(dx, dy, dz) * self
    }

    /// Applies a scale about the origin after this transform.
    #[must_use]
    pub fn then_scale(self, sx: f64, sy: f64, sz: f64) -> Self {
        Self::scaling(sx, sy, sz) * self
    }

    /// Applies a z-axis rotation after this transform.
    #[must_use]
    pub fn then_rotate_z(self, angle: f64) -> Self {
        Self::rotation_z(angle) * self
    }

    /// 2x2 sub-determinants of the top two and bottom two rows.
    fn sub_factors(&self) -> ([f64; 6], [f64; 6]) {
        let a = &self.m;
        let s = [
            a[0] * a[5] - a[4] * a[1],
            a[0] * a[6] - a[4] * a[2],
            a[0] * a[7] - a[4] * a[3],
            a[1] * a[6] - a[5] * a[2],
            a[1] * a[7] - a[5] * a[3],
            a[2] * a[7] - a[6] * a[3],
        ];
        let c = [
            a[8] * a[13] - a[12] * a[9],
            a[8] * a[14] - a[12] * a[10],
            a[8] * a[15] - a[12] * a[11],
            a[9] * a[14] - a[13] * a[10],
            a[9] * a[15] - a[13] * a[11],
            a[10] * a[15] - a[14] * a[11],
        ];
        (s, c)
    }

    /// Returns the determinant.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        let (s, c) = self.sub_factors();
        s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1] + s[5] * c[0]
    }

    /// Returns the inverse transform.
    ///
    /// Fails with [`TransformError::Singular`] when the determinant is zero or
    /// not finite.
    pub fn inverse(&self) -> Result<Self, TransformError> {
        let (s, c) = self.sub_factors();
        let det =
            s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1] + s[5] * c[0];
        if !det.is_finite() || det.abs() < f64::MIN_POSITIVE {
            return Err(TransformError::Singular);
        }
        let inv = 1.0 / det;
        let a = &self.m;
        Ok(Self::new([
            (a[5] * c[5] - a[6] * c[4] + a[7] * c[3]) * inv,
            (-a[1] * c[5] + a[2] * c[4] - a[3] * c[3]) * inv,
            (a[13] * s[5] - a[14] * s[4] + a[15] * s[3]) * inv,
            (-a[9] * s[5] + a[10] * s[4] - a[11] * s[3]) * inv,
            (-a[4] * c[5] + a[6] * c[2] - a[7] * c[1]) * inv,
            (a[0] * c[5] - a[2] * c[2] + a[3] * c[1]) * inv,
            (-a[12] * s[5] + a[14] * s[2] - a[15] * s[1]) * inv,
            (a[8] * s[5] - a[10] * s[2] + a[11] * s[1]) * inv,
            (a[4] * c[4] - a[5] * c[2] + a[7] * c[0]) * inv,
            (-a[0] * c[4] + a[1] * c[2] - a[3] * c[0]) * inv,
            (a[12] * s[4] - a[13] * s[2] + a[15] * s[0]) * inv,
            (-a[8] * s[4] + a[9] * s[2] - a[11] * s[0]) * inv,
            (-a[4] * c[3] + a[5] * c[1] - a[6] * c[0]) * inv,
            (a[0] * c[3] - a[1] * c[1] + a[2] * c[0]) * inv,
            (-a[12] * s[3] + a[13] * s[1] - a[14] * s[0]) * inv,
            (a[8] * s[3] - a[9] * s[1] + a[10] * s[0]) * inv,
        ]))
    }

    /// Returns `true` if every element is within `eps` of the identity.
    #[must_use]
    pub fn is_identity_within(&self, eps: f64) -> bool {
        self.m
            .iter()
            .zip(Self::IDENTITY.m.iter())
            .all(|(a, b)| (a - b).abs() <= eps)
    }

    /// Transforms a 3D point, dividing by the homogeneous coordinate when it
    /// is neither zero nor one.
    #[must_use]
    pub fn transform_point(&self, p: Point3) -> Point3 {
        let m = &self.m;
        let x = m[0] * p.x + m[1] * p.y + m[2] * p.z + m[3];
        let y = m[4] * p.x + m[5] * p.y + m[6] * p.z + m[7];
        let z = m[8] * p.x + m[9] * p.y + m[10] * p.z + m[11];
        let w = m[12] * p.x + m[13] * p.y + m[14] * p.z + m[15];
        if w != 1.0 && w != 0.0 {
            Point3::new(x / w, y / w, z / w)
        } else {
            Point3::new(x, y, z)
        }
    }

    /// Transforms the 2D point `(x, y, 0)` and drops the resulting z.
    #[must_use]
    pub fn transform_xy(&self, x: f64, y: f64) -> Point {
        self.transform_point(Point3::new(x, y, 0.0)).to_point()
    }

    /// Transforms a flat `[x0, y0, x1, y1, ...]` array of 2D points.
    pub fn transform_points_2d(&self, coords: &[f64]) -> Result<Vec<f64>, TransformError> {
        check_stride(coords, 2)?;
        let mut out = Vec::with_capacity(coords.len());
        for xy in coords.chunks_exact(2) {
            let p = self.transform_xy(xy[0], xy[1]);
            out.push(p.x);
            out.push(p.y);
        }
        Ok(out)
    }

    /// Transforms a flat `[x0, y0, z0, x1, ...]` array of 3D points.
    pub fn transform_points_3d(&self, coords: &[f64]) -> Result<Vec<f64>, TransformError> {
        check_stride(coords, 3)?;
        let mut out = Vec::with_capacity(coords.len());
        for xyz in coords.chunks_exact(3) {
            let p = self.transform_point(Point3::new(xyz[0], xyz[1], xyz[2]));
            out.extend_from_slice(&[p.x, p.y, p.z]);
        }
        Ok(out)
    }

    /// Like [`Matrix4::transform_points_2d`], rounding to integer pixels.
    pub fn transform_points_2d_rounded(&self, coords: &[f64]) -> Result<Vec<i32>, TransformError> {
        Ok(self
            .transform_points_2d(coords)?
            .into_iter()
            .map(round_to_pixel)
            .collect())
    }

    /// Like [`Matrix4::transform_points_3d`], rounding to integer pixels.
    pub fn transform_points_3d_rounded(&self, coords: &[f64]) -> Result<Vec<i32>, TransformError> {
        Ok(self
            .transform_points_3d(coords)?
            .into_iter()
            .map(round_to_pixel)
            .collect())
    }

    /// Projects the xy part of this transform onto a [`kurbo::Affine`].
    ///
    /// Z input is assumed to be zero and z output is dropped.
    #[must_use]
    pub fn to_affine(&self) -> Affine {
        let m = &self.m;
        Affine::new([m[0], m[4], m[1], m[5], m[3], m[7]])
    }

    /// Embeds a 2D affine transform in the xy plane.
    #[must_use]
    pub fn from_affine(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self::new([
            a, c, 0.0, e, //
            b, d, 0.0, f, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Derives the transform that maps a three-point world frame onto a
    /// device rectangle.
    ///
    /// `w0` is the world origin, `w1` the end of the world x axis and `w2` the
    /// end of the world y axis. Device y grows downwards, so:
    ///
    /// - `w2` maps to the top-left corner `(x0, y0)`,
    /// - `w0` maps to the bottom-left corner `(x0, y0 + height)`,
    /// - `w1` maps to the bottom-right corner `(x0 + width, y0 + height)`.
    ///
    /// The frame may be rotated, sheared or tilted out of the xy plane; world
    /// points off the frame's plane map to a non-zero device z proportional to
    /// their distance from it.
    ///
    /// Returns [`TransformError::DegenerateExtent`] if the edge vectors
    /// `w1 - w0` and `w0 - w2` are collinear or any point is not finite.
    pub fn world_to_device(
        w0: Point3,
        w1: Point3,
        w2: Point3,
        x0: f64,
        y0: f64,
        width: f64,
        height: f64,
    ) -> Result<Self, TransformError> {
        if !(w0.is_finite() && w1.is_finite() && w2.is_finite()) {
            return Err(TransformError::DegenerateExtent);
        }
        let e1 = w1 - w0;
        let e2 = w0 - w2;
        let normal = e1.cross(e2);
        let area = normal.length();
        if area == 0.0 || area <= COLLINEAR_EPSILON * e1.length() * e2.length() {
            return Err(TransformError::DegenerateExtent);
        }
        let e3 = normal * (1.0 / area);

        // Inverse of the basis [e1 e2 e3]: rows are the reciprocal basis.
        // Its determinant is (e1 x e2) . e3 = area.
        let r1 = e2.cross(e3) * (1.0 / area);
        let r2 = e3.cross(e1) * (1.0 / area);
        let r3 = e3;
        let basis_inverse = Self::new([
            r1.x, r1.y, r1.z, 0.0, //
            r2.x, r2.y, r2.z, 0.0, //
            r3.x, r3.y, r3.z, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]);

        Ok(Self::translation(x0, y0, 0.0)
            * Self::scaling(width, height, 1.0)
            * basis_inverse
            * Self::translation(-w2.x, -w2.y, -w2.z))
    }
}

fn check_stride(coords: &[f64], stride: usize) -> Result<(), TransformError> {
    if coords.len() % stride != 0 {
        return Err(TransformError::InvalidLength {
            len: coords.len(),
            stride,
        });
    }
    Ok(())
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "device coordinates are clamped to the i32 range before casting"
)]
fn round_to_pixel(v: f64) -> i32 {
    v.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

impl core::ops::Mul for Matrix4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.multiply(&rhs)
    }
}

impl core::ops::Mul<Point3> for Matrix4 {
    type Output = Point3;

    fn mul(self, rhs: Point3) -> Point3 {
        self.transform_point(rhs)
    }
}
