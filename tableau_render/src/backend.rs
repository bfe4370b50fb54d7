// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The backend trait and its resource handles.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect, Size};
use peniko::{ImageAlphaType, ImageFormat};
use tableau_region::Region;

use crate::Style;

/// Identifier for an image resource registered with a backend.
///
/// Handles are only meaningful for the backend that created them.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub u32);

/// Identifier for a host-owned embedded component.
///
/// The engine lays components out and reports their device rectangles via
/// [`RenderBackend::place_component`]; it never looks inside them.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentId(pub u64);

/// Description of an image resource.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageDesc {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Pixel format of the image buffer.
    pub format: ImageFormat,
    /// Alpha encoding of the pixels (straight vs premultiplied).
    pub alpha_type: ImageAlphaType,
}

impl ImageDesc {
    /// Straight-alpha RGBA8 image of the given size.
    pub const fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: ImageFormat::Rgba8,
            alpha_type: ImageAlphaType::Alpha,
        }
    }

    /// Natural size in device pixels.
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Encoding used by [`RenderBackend::encode`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SnapshotFormat {
    /// PNG, 8 bits per channel, straight alpha.
    Png,
    /// Raw RGBA8 rows, straight alpha, no header.
    Rgba8,
}

/// Failure of an optional backend capability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendError {
    /// The backend does not implement the requested capability.
    Unsupported,
    /// Encoding the frame failed.
    Encode(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => f.write_str("operation not supported by this backend"),
            Self::Encode(msg) => write!(f, "failed to encode frame: {msg}"),
        }
    }
}

impl core::error::Error for BackendError {}

/// A rasterizing surface driven by the scene engine.
///
/// All coordinates are device pixels with y growing downwards. Calls arrive
/// from a single thread in the order a refresh produces them:
/// `set_clip_region`, `clear`, then draw calls grouped by pass, and finally
/// `present` once the window's present task runs.
pub trait RenderBackend {
    /// Current surface size in device pixels.
    fn size(&self) -> (u32, u32);

    /// Resizes the surface. Contents after a resize are unspecified until the
    /// next refresh repaints them.
    fn resize(&mut self, width: u32, height: u32);

    /// Registers an image and returns its handle.
    fn create_image(&mut self, desc: ImageDesc, pixels: &[u8]) -> ImageId;

    /// Restricts subsequent drawing to `clip`, or lifts the restriction when
    /// `None`.
    fn set_clip_region(&mut self, clip: Option<&Region>);

    /// Resets `rect` to the surface background.
    fn clear(&mut self, rect: Rect);

    /// Strokes the open polyline through `points`.
    fn draw_polyline(&mut self, points: &[Point], style: &Style);

    /// Fills the closed polygon through `points` with `style.background`,
    /// then strokes its outline with `style.foreground`.
    fn fill_polygon(&mut self, points: &[Point], style: &Style);

    /// Draws `text` inside `rect`.
    fn draw_text(&mut self, text: &str, rect: Rect, style: &Style);

    /// Measures `text` as [`RenderBackend::draw_text`] would lay it out.
    fn text_extent(&self, text: &str, style: &Style) -> Size {
        estimate_text_extent(text, style)
    }

    /// Draws a registered image scaled into `rect`.
    fn draw_image(&mut self, image: ImageId, rect: Rect);

    /// Positions an embedded component. The default ignores components.
    fn place_component(&mut self, component: ComponentId, rect: Rect) {
        let _ = (component, rect);
    }

    /// Makes the frame drawn since the previous present visible.
    fn present(&mut self);

    /// Encodes the current frame.
    fn encode(&mut self, format: SnapshotFormat) -> Result<Vec<u8>, BackendError> {
        let _ = format;
        Err(BackendError::Unsupported)
    }

    /// Sends the current frame to a printer.
    fn print(&mut self) -> Result<(), BackendError> {
        Err(BackendError::Unsupported)
    }
}

/// Approximate extent of a single line of `text` in `style.font`.
///
/// Uses a fixed average advance of 0.6 em and a line height of 1.2 em. This
/// is what backends without a shaping engine report from
/// [`RenderBackend::text_extent`].
pub fn estimate_text_extent(text: &str, style: &Style) -> Size {
    let size = style.font.size.max(0.0);
    let chars = text.chars().count();
    #[allow(
        clippy::cast_precision_loss,
        reason = "label lengths are far below the f64 mantissa range"
    )]
    let width = chars as f64 * size * 0.6;
    Size::new(width, size * 1.2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Font;

    #[test]
    fn estimate_scales_with_font_size() {
        let style = Style {
            font: Font::new("mono", 10.0),
            ..Style::default()
        };
        assert_eq!(estimate_text_extent("abcd", &style), Size::new(24.0, 12.0));
        assert_eq!(estimate_text_extent("", &style).width, 0.0);
    }
}
