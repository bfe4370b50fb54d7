// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf geometry owned by scene objects.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};
use tableau_render::{ComponentId, ImageId, Style};

/// Where an annotation sits relative to its anchor point.
///
/// [`PositionHint::Center`] centers the annotation's box on the anchor.
/// Compass hints place it on that side of the centered box, separated by a
/// small gap.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PositionHint {
    /// Centered on the anchor.
    #[default]
    Center,
    /// Above the anchor.
    North,
    /// Below the anchor.
    South,
    /// Right of the anchor.
    East,
    /// Left of the anchor.
    West,
    /// Above and right.
    NorthEast,
    /// Above and left.
    NorthWest,
    /// Below and right.
    SouthEast,
    /// Below and left.
    SouthWest,
}

/// A text label attached to a segment.
#[derive(Clone, Debug, PartialEq)]
pub struct Text {
    /// The label.
    pub string: String,
    /// Device point the label is positioned against.
    pub anchor: Point,
    /// Preferred placement around the anchor.
    pub hint: PositionHint,
    /// Label style; falls back to the segment's effective style.
    pub style: Option<Arc<Style>>,
    /// Whether the label may overlap labels placed before it.
    pub allow_overlap: bool,
    /// Device rectangle chosen by annotation layout, `None` until laid out
    /// or when the label was dropped to avoid overlap.
    pub rect: Option<Rect>,
}

impl Text {
    /// Creates a label centered on `anchor`.
    pub fn new(string: impl Into<String>, anchor: Point) -> Self {
        Self {
            string: string.into(),
            anchor,
            hint: PositionHint::Center,
            style: None,
            allow_overlap: false,
            rect: None,
        }
    }

    /// Sets the placement hint.
    #[must_use]
    pub fn with_hint(mut self, hint: PositionHint) -> Self {
        self.hint = hint;
        self
    }

    /// Sets the label style.
    #[must_use]
    pub fn with_style(mut self, style: Arc<Style>) -> Self {
        self.style = Some(style);
        self
    }

    /// Lets this label overlap earlier ones.
    #[must_use]
    pub fn overlapping(mut self) -> Self {
        self.allow_overlap = true;
        self
    }
}

/// A fixed-size image attached to a segment.
#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    /// Backend image handle.
    pub image: ImageId,
    /// Size in device pixels.
    pub size: Size,
    /// Device anchor point.
    pub anchor: Point,
    /// Placement around the anchor.
    pub hint: PositionHint,
    /// Device rectangle chosen by annotation layout.
    pub rect: Option<Rect>,
}

impl Symbol {
    /// Creates a symbol centered on `anchor`.
    pub fn new(image: ImageId, size: Size, anchor: Point) -> Self {
        Self {
            image,
            size,
            anchor,
            hint: PositionHint::Center,
            rect: None,
        }
    }

    /// Sets the placement hint.
    #[must_use]
    pub fn with_hint(mut self, hint: PositionHint) -> Self {
        self.hint = hint;
        self
    }
}

/// A host-owned component embedded at a point of a segment.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    /// Host identifier.
    pub id: ComponentId,
    /// Requested size in device pixels.
    pub size: Size,
    /// Device anchor point.
    pub anchor: Point,
    /// Placement around the anchor.
    pub hint: PositionHint,
    /// Device rectangle chosen by component layout.
    pub rect: Option<Rect>,
}

impl Component {
    /// Creates a component centered on `anchor`.
    pub fn new(id: ComponentId, size: Size, anchor: Point) -> Self {
        Self {
            id,
            size,
            anchor,
            hint: PositionHint::Center,
            rect: None,
        }
    }

    /// Sets the placement hint.
    #[must_use]
    pub fn with_hint(mut self, hint: PositionHint) -> Self {
        self.hint = hint;
        self
    }
}

/// Device-space geometry plus its annotations.
///
/// The polyline may be empty for segments that only carry labels, symbols or
/// components.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Segment {
    /// Device points.
    pub points: Vec<Point>,
    /// Whether the points form a closed polygon.
    pub closed: bool,
    /// Segment style; falls back to the owning node's effective style.
    pub style: Option<Arc<Style>>,
    /// Text labels.
    pub texts: Vec<Text>,
    /// Symbol images.
    pub symbols: Vec<Symbol>,
    /// Embedded components.
    pub components: Vec<Component>,
}

impl Segment {
    /// An open polyline.
    pub fn polyline(points: Vec<Point>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// A closed polygon.
    pub fn polygon(points: Vec<Point>) -> Self {
        Self {
            points,
            closed: true,
            ..Self::default()
        }
    }

    /// Sets the segment style.
    #[must_use]
    pub fn with_style(mut self, style: Arc<Style>) -> Self {
        self.style = Some(style);
        self
    }

    pub(crate) fn with_style_opt(mut self, style: Option<Arc<Style>>) -> Self {
        self.style = style;
        self
    }

    /// Attaches a label.
    pub fn add_text(&mut self, text: Text) -> &mut Self {
        self.texts.push(text);
        self
    }

    /// Attaches a symbol.
    pub fn add_symbol(&mut self, symbol: Symbol) -> &mut Self {
        self.symbols.push(symbol);
        self
    }

    /// Attaches a component.
    pub fn add_component(&mut self, component: Component) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Bounding box of the points, inflated by `outset` and snapped outwards
    /// to whole pixels. `None` without points.
    pub fn bounds(&self, outset: f64) -> Option<Rect> {
        let mut iter = self.points.iter();
        let first = iter.next()?;
        let bbox = iter.fold(Rect::from_points(*first, *first), |acc, p| {
            acc.union_pt(*p)
        });
        Some(bbox.inflate(outset, outset).expand())
    }

    /// Whether there is anything to stroke or fill.
    pub fn has_geometry(&self) -> bool {
        if self.closed {
            self.points.len() >= 3
        } else {
            self.points.len() >= 2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn bounds_include_stroke_and_snap_outwards() {
        let seg = Segment::polyline(vec![Point::new(1.2, 2.0), Point::new(5.0, 3.7)]);
        assert_eq!(seg.bounds(0.5), Some(Rect::new(0.0, 1.0, 6.0, 5.0)));
        assert_eq!(Segment::default().bounds(1.0), None);
    }

    #[test]
    fn geometry_needs_enough_points() {
        assert!(!Segment::polyline(vec![Point::ZERO]).has_geometry());
        assert!(Segment::polyline(vec![Point::ZERO, Point::new(1.0, 0.0)]).has_geometry());
        assert!(!Segment::polygon(vec![Point::ZERO, Point::new(1.0, 0.0)]).has_geometry());
    }
}
