// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=tableau_render_vello_cpu --heading-base-level=0

//! Vello CPU–backed implementation of the Tableau render backend.
//!
//! [`VelloCpuBackend`] rasterizes the calls of a [`RenderBackend`] with the
//! sparse-strips [`vello_cpu::RenderContext`] and keeps the result in a
//! retained frame buffer. A refresh only repaints the damaged area, so each
//! [`present`](RenderBackend::present) first resets the cleared rectangles of
//! the retained frame to the background, then composites the freshly rendered
//! pixels over it inside the clip that was active while drawing. Everything
//! else is left untouched.
//!
//! Text is measured with [`estimate_text_extent`] but not rasterized; hosts
//! that need glyphs layer a text-capable backend on top.
//!
//! With the `std` feature, [`RenderBackend::encode`] produces PNG snapshots
//! through the `png` crate.

#![deny(unsafe_code)]
#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

use alloc::vec::Vec;
use core::fmt;

use peniko::{Color, ImageData, ImageSampler};
use tableau_region::Region;
use tableau_render::{
    BackendError, ImageDesc, ImageId, RenderBackend, SnapshotFormat, Style, estimate_text_extent,
};
use vello_cpu::kurbo::{Affine as CpuAffine, BezPath, Rect as CpuRect, Stroke as CpuStroke};
use vello_cpu::{Image as CpuImage, ImageSource, Pixmap, RenderContext};

/// Construction options for [`VelloCpuBackend`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CpuBackendOptions {
    /// Color written by [`RenderBackend::clear`] and used for a fresh frame.
    pub background: Color,
}

impl Default for CpuBackendOptions {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
        }
    }
}

/// Area of the surface touched since the last present.
#[derive(Clone, Debug)]
enum Touched {
    Nothing,
    Some(Region),
    All,
}

/// CPU-backed implementation of [`RenderBackend`] using `vello_cpu`.
pub struct VelloCpuBackend {
    ctx: RenderContext,
    width: u16,
    height: u16,
    options: CpuBackendOptions,
    /// Retained frame, premultiplied RGBA8, row-major.
    frame: Vec<[u8; 4]>,
    images: Vec<(ImageDesc, Vec<u8>)>,
    clip: Option<Region>,
    clip_pushed: bool,
    touched: Touched,
    pending_clears: Region,
}

impl fmt::Debug for VelloCpuBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VelloCpuBackend")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("options", &self.options)
            .field("images", &self.images.len())
            .finish_non_exhaustive()
    }
}

fn clamp_dim(v: u32) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}

fn premultiply(color: Color) -> [u8; 4] {
    let c = color.premultiply().to_rgba8();
    [c.r, c.g, c.b, c.a]
}

fn unpremultiply(px: [u8; 4]) -> [u8; 4] {
    let a = u16::from(px[3]);
    if a == 0 {
        return [0; 4];
    }
    let un = |c: u8| {
        let v = (u16::from(c) * 255 + a / 2) / a;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "premultiplied channels never exceed alpha, so v <= 255"
        )]
        let v = v.min(255) as u8;
        v
    };
    [un(px[0]), un(px[1]), un(px[2]), px[3]]
}

/// Premultiplied source-over.
fn source_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let inv = 255 - u16::from(src[3]);
    let blend = |s: u8, d: u8| {
        let v = u16::from(s) + (u16::from(d) * inv + 127) / 255;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "premultiplied source-over stays within 0..=255"
        )]
        let v = v.min(255) as u8;
        v
    };
    [
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        blend(src[3], dst[3]),
    ]
}

fn polyline_path(points: &[kurbo::Point], close: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        path.move_to((first.x, first.y));
        for p in iter {
            path.line_to((p.x, p.y));
        }
        if close {
            path.close_path();
        }
    }
    path
}

fn region_path(region: &Region) -> BezPath {
    let mut path = BezPath::new();
    for r in region.rects() {
        path.move_to((r.x0, r.y0));
        path.line_to((r.x1, r.y0));
        path.line_to((r.x1, r.y1));
        path.line_to((r.x0, r.y1));
        path.close_path();
    }
    path
}

fn cpu_stroke(style: &Style) -> CpuStroke {
    let stroke = CpuStroke::new(style.line_width);
    if style.dash_pattern.is_empty() {
        stroke
    } else {
        stroke.with_dashes(0.0, style.dash_pattern.iter().copied())
    }
}

impl VelloCpuBackend {
    /// Creates a backend with a surface of the given size.
    pub fn new(width: u32, height: u32, options: CpuBackendOptions) -> Self {
        let (w, h) = (clamp_dim(width), clamp_dim(height));
        Self {
            ctx: RenderContext::new(w, h),
            width: w,
            height: h,
            options,
            frame: alloc::vec![premultiply(options.background); usize::from(w) * usize::from(h)],
            images: Vec::new(),
            clip: None,
            clip_pushed: false,
            touched: Touched::Nothing,
            pending_clears: Region::new(),
        }
    }

    /// The retained frame as premultiplied RGBA8 pixels, row-major.
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.frame
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= u32::from(self.width) || y >= u32::from(self.height) {
            return None;
        }
        self.frame
            .get(y as usize * usize::from(self.width) + x as usize)
            .copied()
    }

    /// The frame as straight-alpha RGBA8 bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.frame.len() * 4);
        for px in &self.frame {
            out.extend_from_slice(&unpremultiply(*px));
        }
        out
    }

    fn touch(&mut self) {
        self.touched = match (core::mem::replace(&mut self.touched, Touched::All), &self.clip) {
            (Touched::All, _) | (_, None) => Touched::All,
            (Touched::Nothing, Some(clip)) => Touched::Some(clip.clone()),
            (Touched::Some(mut acc), Some(clip)) => {
                acc.union(clip);
                Touched::Some(acc)
            }
        };
    }

    fn pop_clip(&mut self) {
        if self.clip_pushed {
            self.ctx.pop_layer();
            self.clip_pushed = false;
        }
    }

    fn push_clip(&mut self) {
        if let Some(clip) = &self.clip {
            self.ctx.push_clip_layer(&region_path(clip));
            self.clip_pushed = true;
        }
    }

    /// Pixel bounds of `rect` snapped outwards and clamped to the surface.
    fn pixel_bounds(&self, rect: kurbo::Rect) -> (usize, usize, usize, usize) {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let r = rect.expand();
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "bounds are clamped to the u16 surface size first"
        )]
        let bounds = (
            r.x0.clamp(0.0, w) as usize,
            r.y0.clamp(0.0, h) as usize,
            r.x1.clamp(0.0, w) as usize,
            r.y1.clamp(0.0, h) as usize,
        );
        bounds
    }

    fn fill_frame(&mut self, rect: kurbo::Rect, px: [u8; 4]) {
        let (x0, y0, x1, y1) = self.pixel_bounds(rect);
        let stride = usize::from(self.width);
        for y in y0..y1 {
            if let Some(row) = self.frame.get_mut(y * stride + x0..y * stride + x1) {
                row.fill(px);
            }
        }
    }

    /// Composites `src` over the retained frame within `rect`.
    fn compose_rect(&mut self, src: &Pixmap, rect: kurbo::Rect) {
        let (x0, y0, x1, y1) = self.pixel_bounds(rect);
        let stride = usize::from(self.width);
        let data = src.data();
        for y in y0..y1 {
            for x in x0..x1 {
                let i = y * stride + x;
                if let (Some(dst), Some(p)) = (self.frame.get_mut(i), data.get(i)) {
                    *dst = source_over([p.r, p.g, p.b, p.a], *dst);
                }
            }
        }
    }

    #[cfg(feature = "std")]
    fn encode_png(&self) -> Result<Vec<u8>, BackendError> {
        use std::string::ToString;

        let data = self.to_rgba8();
        let mut out = Vec::new();
        let mut encoder = png::Encoder::new(&mut out, u32::from(self.width), u32::from(self.height));
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        writer
            .write_image_data(&data)
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        Ok(out)
    }

    #[cfg(not(feature = "std"))]
    fn encode_png(&self) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Unsupported)
    }
}

impl RenderBackend for VelloCpuBackend {
    fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (w, h) = (clamp_dim(width), clamp_dim(height));
        self.width = w;
        self.height = h;
        self.ctx = RenderContext::new(w, h);
        self.clip_pushed = false;
        self.frame = alloc::vec![premultiply(self.options.background); usize::from(w) * usize::from(h)];
        self.touched = Touched::Nothing;
        self.pending_clears.clear();
        self.push_clip();
    }

    fn create_image(&mut self, desc: ImageDesc, pixels: &[u8]) -> ImageId {
        let id = u32::try_from(self.images.len()).unwrap_or(u32::MAX);
        self.images.push((desc, pixels.to_vec()));
        ImageId(id)
    }

    fn set_clip_region(&mut self, clip: Option<&Region>) {
        self.pop_clip();
        self.clip = clip.cloned();
        self.push_clip();
    }

    fn clear(&mut self, rect: kurbo::Rect) {
        match &self.clip {
            Some(clip) => self.pending_clears.union(&clip.intersect_rect(rect)),
            None => self.pending_clears.union_rect(rect),
        }
    }

    fn draw_polyline(&mut self, points: &[kurbo::Point], style: &Style) {
        if points.len() < 2 {
            return;
        }
        self.touch();
        self.ctx.set_paint(style.foreground);
        self.ctx.set_stroke(cpu_stroke(style));
        self.ctx.stroke_path(&polyline_path(points, false));
    }

    fn fill_polygon(&mut self, points: &[kurbo::Point], style: &Style) {
        if points.len() < 3 {
            return;
        }
        self.touch();
        let path = polyline_path(points, true);
        if let Some(fill) = style.background {
            self.ctx.set_fill_rule(style.fill_rule);
            self.ctx.set_paint(fill);
            self.ctx.fill_path(&path);
        }
        if style.line_width > 0.0 {
            self.ctx.set_paint(style.foreground);
            self.ctx.set_stroke(cpu_stroke(style));
            self.ctx.stroke_path(&path);
        }
    }

    fn draw_text(&mut self, _text: &str, _rect: kurbo::Rect, _style: &Style) {}

    fn text_extent(&self, text: &str, style: &Style) -> kurbo::Size {
        estimate_text_extent(text, style)
    }

    fn draw_image(&mut self, image: ImageId, rect: kurbo::Rect) {
        let Some((desc, pixels)) = self.images.get(image.0 as usize) else {
            return;
        };
        if desc.width == 0 || desc.height == 0 || rect.width() <= 0.0 || rect.height() <= 0.0 {
            return;
        }
        let image_data = ImageData {
            data: peniko::Blob::from(pixels.clone()),
            format: desc.format,
            alpha_type: desc.alpha_type,
            width: desc.width,
            height: desc.height,
        };
        let paint = CpuImage {
            image: ImageSource::from_peniko_image_data(&image_data),
            sampler: ImageSampler::default(),
        };
        let (w, h) = (f64::from(desc.width), f64::from(desc.height));
        let local = CpuAffine::translate((rect.x0, rect.y0))
            * CpuAffine::scale_non_uniform(rect.width() / w, rect.height() / h);

        self.touch();
        self.ctx.set_paint(paint);
        self.ctx.set_transform(local);
        self.ctx.fill_rect(&CpuRect::new(0.0, 0.0, w, h));
        self.ctx.set_transform(CpuAffine::IDENTITY);
    }

    fn present(&mut self) {
        let background = premultiply(self.options.background);
        let clears = core::mem::take(&mut self.pending_clears);
        for r in clears.rects() {
            self.fill_frame(*r, background);
        }
        let touched = core::mem::replace(&mut self.touched, Touched::Nothing);
        if matches!(touched, Touched::Nothing) {
            return;
        }
        self.pop_clip();
        let mut pixmap = Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        match touched {
            Touched::All => {
                let full = kurbo::Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height));
                self.compose_rect(&pixmap, full);
            }
            Touched::Some(region) => {
                for r in region.rects() {
                    self.compose_rect(&pixmap, *r);
                }
            }
            Touched::Nothing => {}
        }
        self.ctx.reset();
        self.push_clip();
    }

    fn encode(&mut self, format: SnapshotFormat) -> Result<Vec<u8>, BackendError> {
        match format {
            SnapshotFormat::Rgba8 => Ok(self.to_rgba8()),
            SnapshotFormat::Png => self.encode_png(),
        }
    }
}
