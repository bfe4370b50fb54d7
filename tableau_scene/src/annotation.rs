// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement of labels, symbols and embedded components around their
//! anchors.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};
use tableau_region::Region;
use tableau_render::RenderBackend;

use crate::object::Visibility;
use crate::segment::PositionHint;
use crate::tree::ObjectTree;

/// Gap between a box placed beside its anchor and the box centered on it,
/// in device pixels.
pub const ANCHOR_GAP: f64 = 2.0;

/// Order in which alternative positions are tried when a label would
/// overlap one placed earlier.
const FALLBACK_ORDER: [PositionHint; 9] = [
    PositionHint::NorthEast,
    PositionHint::SouthEast,
    PositionHint::NorthWest,
    PositionHint::SouthWest,
    PositionHint::North,
    PositionHint::South,
    PositionHint::East,
    PositionHint::West,
    PositionHint::Center,
];

/// Places a box of `size` around `anchor` according to `hint`.
///
/// The nine positions tile a three by three grid around the box centered on
/// the anchor, each neighbor one box plus [`ANCHOR_GAP`] away, so boxes of
/// one size placed at different hints never overlap.
pub fn place(anchor: Point, size: Size, hint: PositionHint) -> Rect {
    let (w, h) = (size.width, size.height);
    let (col, row) = match hint {
        PositionHint::Center => (0.0, 0.0),
        PositionHint::North => (0.0, -1.0),
        PositionHint::South => (0.0, 1.0),
        PositionHint::East => (1.0, 0.0),
        PositionHint::West => (-1.0, 0.0),
        PositionHint::NorthEast => (1.0, -1.0),
        PositionHint::NorthWest => (-1.0, -1.0),
        PositionHint::SouthEast => (1.0, 1.0),
        PositionHint::SouthWest => (-1.0, 1.0),
    };
    let x0 = anchor.x - w * 0.5 + col * (w + ANCHOR_GAP);
    let y0 = anchor.y - h * 0.5 + row * (h + ANCHOR_GAP);
    Rect::new(x0, y0, x0 + w, y0 + h)
}

fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Greedy label placement: first fit among the preferred hint and the
/// fallback positions, or nothing.
#[derive(Clone, Debug, Default)]
pub struct LabelPlacer {
    placed: Vec<Rect>,
}

impl LabelPlacer {
    /// Places a label, returning `None` if every candidate position overlaps
    /// an earlier label and overlap is not allowed.
    pub fn place(
        &mut self,
        anchor: Point,
        size: Size,
        hint: PositionHint,
        allow_overlap: bool,
    ) -> Option<Rect> {
        if allow_overlap {
            let r = place(anchor, size, hint);
            self.placed.push(r);
            return Some(r);
        }
        let candidates =
            core::iter::once(hint).chain(FALLBACK_ORDER.iter().copied().filter(|h| *h != hint));
        for h in candidates {
            let r = place(anchor, size, h);
            if !self.placed.iter().any(|p| overlaps(p, &r)) {
                self.placed.push(r);
                return Some(r);
            }
        }
        None
    }
}

fn damage_change(damage: &mut Region, old: Option<Rect>, new: Option<Rect>) -> bool {
    if old == new {
        return false;
    }
    for r in [old, new].into_iter().flatten() {
        damage.union_rect(r.expand());
    }
    true
}

/// Lays out labels and symbols of every node visible under `mask`.
///
/// Label sizes come from the backend. Returns the union of old and new
/// positions of everything that moved.
pub(crate) fn layout_annotation<B: RenderBackend + ?Sized>(
    tree: &mut ObjectTree,
    backend: &B,
    mask: Visibility,
) -> Region {
    let mut placer = LabelPlacer::default();
    let mut damage = Region::new();
    for id in tree.visible_ids(mask & Visibility::ANNOTATION_PASS) {
        let sizes: Vec<Vec<Size>> = tree
            .segments(id)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, seg)| {
                seg.texts
                    .iter()
                    .map(|t| {
                        let style = match t.style.as_deref() {
                            Some(s) => s,
                            None => tree.effective_style(id, Some(i)),
                        };
                        backend.text_extent(&t.string, style)
                    })
                    .collect()
            })
            .collect();

        let Some((vis, segments)) = tree.parts_mut(id) else {
            continue;
        };
        let kinds = vis & mask;
        let mut changed = false;
        for (seg, seg_sizes) in segments.iter_mut().zip(sizes) {
            for (text, size) in seg.texts.iter_mut().zip(seg_sizes) {
                let new = if kinds.contains(Visibility::ANNOTATION) {
                    placer.place(text.anchor, size, text.hint, text.allow_overlap)
                } else {
                    None
                };
                changed |= damage_change(&mut damage, text.rect, new);
                text.rect = new;
            }
            for sym in &mut seg.symbols {
                let new = kinds
                    .contains(Visibility::SYMBOLS)
                    .then(|| place(sym.anchor, sym.size, sym.hint));
                changed |= damage_change(&mut damage, sym.rect, new);
                sym.rect = new;
            }
        }
        if changed {
            tree.invalidate(id);
        }
    }
    damage
}

/// Positions embedded components of every node visible under `mask`.
/// Returns the union of old and new rectangles of components that moved.
pub(crate) fn layout_components(tree: &mut ObjectTree, mask: Visibility) -> Region {
    let mut damage = Region::new();
    for id in tree.visible_ids(mask & Visibility::WIDGETS) {
        let Some((_, segments)) = tree.parts_mut(id) else {
            continue;
        };
        let mut changed = false;
        for comp in segments.iter_mut().flat_map(|s| s.components.iter_mut()) {
            let new = Some(place(comp.anchor, comp.size, comp.hint));
            changed |= damage_change(&mut damage, comp.rect, new);
            comp.rect = new;
        }
        if changed {
            tree.invalidate(id);
        }
    }
    damage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compass_placement_tiles_around_the_center() {
        let a = Point::new(50.0, 50.0);
        let s = Size::new(10.0, 4.0);
        assert_eq!(place(a, s, PositionHint::Center), Rect::new(45.0, 48.0, 55.0, 52.0));
        assert_eq!(place(a, s, PositionHint::NorthEast), Rect::new(57.0, 42.0, 67.0, 46.0));
        assert_eq!(place(a, s, PositionHint::West), Rect::new(33.0, 48.0, 43.0, 52.0));
        assert_eq!(place(a, s, PositionHint::South), Rect::new(45.0, 54.0, 55.0, 58.0));
    }

    #[test]
    fn candidate_positions_are_disjoint() {
        let a = Point::new(200.0, 120.0);
        let s = Size::new(43.2, 14.4);
        let boxes: Vec<Rect> = FALLBACK_ORDER.iter().map(|h| place(a, s, *h)).collect();
        for (i, p) in boxes.iter().enumerate() {
            for q in &boxes[i + 1..] {
                assert!(!overlaps(p, q), "{p:?} overlaps {q:?}");
            }
        }
    }

    #[test]
    fn overlapping_labels_fall_back_then_drop() {
        let mut placer = LabelPlacer::default();
        let a = Point::new(100.0, 100.0);
        let s = Size::new(36.0, 14.4);
        let first = placer.place(a, s, PositionHint::Center, false);
        assert_eq!(first, Some(place(a, s, PositionHint::Center)));
        // Same spot is taken; the first fallback is free.
        let second = placer.place(a, s, PositionHint::Center, false);
        assert_eq!(second, Some(place(a, s, PositionHint::NorthEast)));
        // A label preferring a free spot gets it.
        let west = placer.place(a, s, PositionHint::West, false);
        assert_eq!(west, Some(place(a, s, PositionHint::West)));

        // Fill all remaining candidates, then the next label is dropped.
        for _ in 0..6 {
            assert!(placer.place(a, s, PositionHint::Center, false).is_some());
        }
        assert_eq!(placer.place(a, s, PositionHint::Center, false), None);
        // Overlap-tolerant labels always land on their hint.
        assert_eq!(
            placer.place(a, s, PositionHint::Center, true),
            Some(place(a, s, PositionHint::Center))
        );
    }
}
