// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing styles.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Stroke;
use peniko::{Color, Fill};

/// Font selection for text labels.
///
/// Backends map the family name onto whatever font source they have; the
/// engine only needs the size for layout estimates.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    /// Family name, for example `"sans-serif"`.
    pub family: String,
    /// Em size in device pixels.
    pub size: f64,
    /// Bold weight.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: String::from("sans-serif"),
            size: 12.0,
            bold: false,
            italic: false,
        }
    }
}

impl Font {
    /// Creates a regular font of the given family and size.
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
            bold: false,
            italic: false,
        }
    }
}

/// Visual attributes of a segment, text label or scene background.
///
/// Styles are immutable once assigned and shared by reference
/// (`Arc<Style>`): many segments may point at one instance. To change the
/// look of everything sharing a style, assign a new `Arc` to the owners.
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    /// Line and text color.
    pub foreground: Color,
    /// Fill color for closed geometry and scene backgrounds. `None` leaves
    /// polygons unfilled.
    pub background: Option<Color>,
    /// Stroke width in device pixels.
    pub line_width: f64,
    /// Dash pattern in device pixels; empty draws solid lines.
    pub dash_pattern: Vec<f64>,
    /// Fill rule used for self-intersecting polygons.
    pub fill_rule: Fill,
    /// Font for text labels.
    pub font: Font,
    /// Whether the backend should antialias geometry drawn with this style.
    pub antialiased: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            foreground: Color::BLACK,
            background: None,
            line_width: 1.0,
            dash_pattern: Vec::new(),
            fill_rule: Fill::NonZero,
            font: Font::default(),
            antialiased: true,
        }
    }
}

impl Style {
    /// Returns a copy with the given foreground color.
    #[must_use]
    pub fn with_foreground(mut self, color: Color) -> Self {
        self.foreground = color;
        self
    }

    /// Returns a copy with the given fill color.
    #[must_use]
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Returns a copy with the given stroke width.
    #[must_use]
    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }

    /// Returns a copy with the given dash pattern.
    #[must_use]
    pub fn with_dash_pattern(mut self, pattern: impl Into<Vec<f64>>) -> Self {
        self.dash_pattern = pattern.into();
        self
    }

    /// Returns a copy with the given font.
    #[must_use]
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    /// Returns a copy with antialiasing switched on or off.
    #[must_use]
    pub fn with_antialiasing(mut self, antialiased: bool) -> Self {
        self.antialiased = antialiased;
        self
    }

    /// Builds the equivalent [`kurbo::Stroke`].
    #[must_use]
    pub fn stroke(&self) -> Stroke {
        let stroke = Stroke::new(self.line_width);
        if self.dash_pattern.is_empty() {
            stroke
        } else {
            stroke.with_dashes(0.0, self.dash_pattern.iter().copied())
        }
    }

    /// Distance by which stroked geometry extends past its centerline.
    #[must_use]
    pub fn stroke_outset(&self) -> f64 {
        self.line_width.max(0.0) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_stroke_has_no_dashes() {
        let style = Style::default().with_line_width(3.0);
        let stroke = style.stroke();
        assert_eq!(stroke.width, 3.0);
        assert!(stroke.dash_pattern.is_empty());
        assert_eq!(style.stroke_outset(), 1.5);
    }

    #[test]
    fn dash_pattern_carries_over() {
        let style = Style::default().with_dash_pattern([4.0, 2.0]);
        assert_eq!(style.stroke().dash_pattern.as_slice(), &[4.0, 2.0]);
    }
}
