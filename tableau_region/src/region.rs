// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Region`] type and its set operations.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect, Vec2};

/// Rectangle count above which damage accumulators should [`Region::collapse`].
pub const COLLAPSE_THRESHOLD: usize = 100;

/// Tolerance used when comparing areas in [`Region::same_coverage`].
const AREA_EPSILON: f64 = 1e-9;

/// Error returned by the checked region entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionError {
    /// A rectangle coordinate was NaN or infinite.
    NonFinite,
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite => f.write_str("rectangle has a non-finite coordinate"),
        }
    }
}

impl core::error::Error for RegionError {}

/// A set of non-overlapping axis-aligned rectangles.
///
/// The decomposition into rectangles is an implementation detail: two regions
/// covering the same area may hold different rectangles. Use
/// [`Region::same_coverage`] to compare regions geometrically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    rects: Vec<Rect>,
}

fn has_area(rect: &Rect) -> bool {
    rect.width() > 0.0 && rect.height() > 0.0
}

fn is_finite(rect: &Rect) -> bool {
    rect.x0.is_finite() && rect.y0.is_finite() && rect.x1.is_finite() && rect.y1.is_finite()
}

fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

fn covers(outer: &Rect, inner: &Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

/// Pushes the parts of `piece` not covered by `hole` onto `out`.
///
/// Produces at most four rectangles: full-width bands above and below the
/// hole, and the left/right remainders of the middle band.
fn cut(piece: Rect, hole: &Rect, out: &mut Vec<Rect>) {
    if !overlaps(&piece, hole) {
        out.push(piece);
        return;
    }
    if piece.y0 < hole.y0 {
        out.push(Rect::new(piece.x0, piece.y0, piece.x1, hole.y0));
    }
    if piece.y1 > hole.y1 {
        out.push(Rect::new(piece.x0, hole.y1, piece.x1, piece.y1));
    }
    let y0 = piece.y0.max(hole.y0);
    let y1 = piece.y1.min(hole.y1);
    if piece.x0 < hole.x0 {
        out.push(Rect::new(piece.x0, y0, hole.x0, y1));
    }
    if piece.x1 > hole.x1 {
        out.push(Rect::new(hole.x1, y0, piece.x1, y1));
    }
}

impl Region {
    /// Creates an empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Creates a region covering a single rectangle.
    ///
    /// An empty (or inverted) rectangle produces an empty region.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        let mut region = Self::new();
        region.union_rect(rect);
        region
    }

    /// Returns `true` if the region covers no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Returns the number of rectangles in the current decomposition.
    #[must_use]
    pub fn rectangle_count(&self) -> usize {
        self.rects.len()
    }

    /// Returns the rectangles of the current decomposition.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Iterates over the rectangles of the current decomposition.
    pub fn iter(&self) -> core::slice::Iter<'_, Rect> {
        self.rects.iter()
    }

    /// Returns the bounding box of the region, or `None` if it is empty.
    #[must_use]
    pub fn extent(&self) -> Option<Rect> {
        let mut it = self.rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }

    /// Returns the covered area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.rects.iter().map(Rect::area).sum()
    }

    /// Removes all rectangles.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Returns `true` if `point` lies inside the region.
    ///
    /// Rectangles are half-open: the right and bottom edges are excluded.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.rects.iter().any(|r| r.contains(point))
    }

    /// Returns `true` if the region shares a non-empty area with `rect`.
    #[must_use]
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        let rect = rect.abs();
        has_area(&rect) && self.rects.iter().any(|r| overlaps(r, &rect))
    }

    /// Adds `rect` to the region.
    ///
    /// Empty rectangles are ignored. Non-finite rectangles are a caller error:
    /// they trip a debug assertion and are otherwise dropped. Use
    /// [`Region::try_union_rect`] to get an error instead.
    pub fn union_rect(&mut self, rect: Rect) {
        debug_assert!(is_finite(&rect), "non-finite rectangle {rect:?}");
        if is_finite(&rect) {
            self.union_finite(rect.abs());
        }
    }

    /// Adds `rect` to the region, rejecting non-finite coordinates.
    pub fn try_union_rect(&mut self, rect: Rect) -> Result<(), RegionError> {
        if !is_finite(&rect) {
            return Err(RegionError::NonFinite);
        }
        self.union_finite(rect.abs());
        Ok(())
    }

    fn union_finite(&mut self, rect: Rect) {
        if !has_area(&rect) {
            return;
        }
        if self.rects.iter().any(|r| covers(r, &rect)) {
            return;
        }
        // Existing rectangles swallowed by the new one are dropped outright;
        // the remainder of the new rectangle is fragmented around the rest.
        self.rects.retain(|r| !covers(&rect, r));
        let mut pieces = vec![rect];
        let mut scratch = Vec::new();
        for existing in &self.rects {
            scratch.clear();
            for piece in pieces.drain(..) {
                cut(piece, existing, &mut scratch);
            }
            core::mem::swap(&mut pieces, &mut scratch);
            if pieces.is_empty() {
                return;
            }
        }
        self.rects.extend(pieces.into_iter().filter(has_area));
    }

    /// Adds every rectangle of `other` to the region.
    pub fn union(&mut self, other: &Self) {
        for rect in &other.rects {
            self.union_finite(*rect);
        }
    }

    /// Removes the area covered by `rect` from the region.
    pub fn subtract_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        if !has_area(&rect) || !is_finite(&rect) {
            return;
        }
        let mut out = Vec::with_capacity(self.rects.len());
        for piece in self.rects.drain(..) {
            cut(piece, &rect, &mut out);
        }
        out.retain(has_area);
        self.rects = out;
    }

    /// Removes the area covered by `other` from the region.
    pub fn subtract(&mut self, other: &Self) {
        for rect in &other.rects {
            self.subtract_rect(*rect);
        }
    }

    /// Returns the geometric intersection of two regions.
    ///
    /// The result is empty when either input is empty or they do not overlap.
    #[must_use]
    pub fn intersect(a: &Self, b: &Self) -> Self {
        let mut rects = Vec::new();
        for ra in &a.rects {
            for rb in &b.rects {
                if overlaps(ra, rb) {
                    rects.push(ra.intersect(*rb));
                }
            }
        }
        Self { rects }
    }

    /// Returns the intersection of this region with a single rectangle.
    #[must_use]
    pub fn intersect_rect(&self, rect: Rect) -> Self {
        Self::intersect(self, &Self::from_rect(rect))
    }

    /// Replaces the rectangle set with its single bounding rectangle.
    ///
    /// An empty region stays empty.
    pub fn collapse(&mut self) {
        if self.rects.len() > 1 {
            if let Some(bounds) = self.extent() {
                self.rects.clear();
                self.rects.push(bounds);
            }
        }
    }

    /// Translates every rectangle by `offset`.
    pub fn translate(&mut self, offset: Vec2) {
        for rect in &mut self.rects {
            *rect = *rect + offset;
        }
    }

    /// Returns `true` if both regions cover the same area, regardless of how
    /// that area is decomposed into rectangles.
    #[must_use]
    pub fn same_coverage(&self, other: &Self) -> bool {
        let a = self.area();
        let b = other.area();
        if (a - b).abs() > AREA_EPSILON {
            return false;
        }
        let common = Self::intersect(self, other).area();
        (common - a).abs() <= AREA_EPSILON
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}

impl Extend<Rect> for Region {
    fn extend<I: IntoIterator<Item = Rect>>(&mut self, iter: I) {
        for rect in iter {
            self.union_rect(rect);
        }
    }
}

impl FromIterator<Rect> for Region {
    fn from_iter<I: IntoIterator<Item = Rect>>(iter: I) -> Self {
        let mut region = Self::new();
        region.extend(iter);
        region
    }
}

impl<'a> IntoIterator for &'a Region {
    type Item = &'a Rect;
    type IntoIter = core::slice::Iter<'a, Rect>;

    fn into_iter(self) -> Self::IntoIter {
        self.rects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        Rect::new(x0, y0, x1, y1)
    }

    #[test]
    fn empty_rect_is_ignored() {
        let mut region = Region::new();
        region.union_rect(rect(5.0, 5.0, 5.0, 20.0));
        assert!(region.is_empty());
        assert_eq!(region.extent(), None);
    }

    #[test]
    fn inverted_rect_is_normalized() {
        let region = Region::from_rect(rect(10.0, 10.0, 0.0, 0.0));
        assert_eq!(region.extent(), Some(rect(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn overlapping_union_does_not_double_count() {
        let mut region = Region::new();
        region.union_rect(rect(0.0, 0.0, 10.0, 10.0));
        region.union_rect(rect(5.0, 5.0, 15.0, 15.0));
        assert_eq!(region.area(), 175.0);
        for (i, a) in region.rects().iter().enumerate() {
            for b in &region.rects()[i + 1..] {
                assert!(!overlaps(a, b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn covered_rect_is_noop() {
        let mut region = Region::from_rect(rect(0.0, 0.0, 100.0, 100.0));
        region.union_rect(rect(10.0, 10.0, 20.0, 20.0));
        assert_eq!(region.rectangle_count(), 1);
    }

    #[test]
    fn covering_rect_replaces_contents() {
        let mut region = Region::new();
        region.union_rect(rect(10.0, 10.0, 20.0, 20.0));
        region.union_rect(rect(30.0, 30.0, 40.0, 40.0));
        region.union_rect(rect(0.0, 0.0, 100.0, 100.0));
        assert_eq!(region.rects(), &[rect(0.0, 0.0, 100.0, 100.0)]);
    }

    #[test]
    fn subtract_punches_hole() {
        let mut region = Region::from_rect(rect(0.0, 0.0, 30.0, 30.0));
        region.subtract_rect(rect(10.0, 10.0, 20.0, 20.0));
        assert_eq!(region.area(), 800.0);
        assert!(!region.contains(Point::new(15.0, 15.0)));
        assert!(region.contains(Point::new(5.0, 15.0)));
        assert_eq!(region.rectangle_count(), 4);
    }

    #[test]
    fn intersect_with_empty_is_empty() {
        let a = Region::from_rect(rect(0.0, 0.0, 10.0, 10.0));
        assert!(Region::intersect(&a, &Region::new()).is_empty());
        assert!(Region::intersect(&Region::new(), &a).is_empty());
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Region::from_rect(rect(0.0, 0.0, 10.0, 10.0));
        let b = Region::from_rect(rect(10.0, 0.0, 20.0, 10.0));
        assert!(Region::intersect(&a, &b).is_empty());
        assert!(!a.intersects_rect(rect(10.0, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn collapse_of_empty_stays_empty() {
        let mut region = Region::new();
        region.collapse();
        assert!(region.is_empty());
    }

    #[test]
    fn try_union_rejects_nan() {
        let mut region = Region::new();
        assert_eq!(
            region.try_union_rect(rect(f64::NAN, 0.0, 1.0, 1.0)),
            Err(RegionError::NonFinite)
        );
        assert!(region.is_empty());
    }

    #[test]
    fn translate_moves_extent() {
        let mut region = Region::from_rect(rect(0.0, 0.0, 10.0, 10.0));
        region.translate(Vec2::new(5.0, -5.0));
        assert_eq!(region.extent(), Some(rect(5.0, -5.0, 15.0, 5.0)));
    }
}
