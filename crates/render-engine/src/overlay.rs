//! Motion overlay: mask, boxes, centres, links and labels.
//!
//! The raster variant paints straight onto the scaled display image. The
//! GPU variant paints a transparent layer the size of the viewport, laid
//! out with the same letterbox as the video texture, and caches it until
//! something that affects its pixels changes.

use std::sync::Arc;

use glance_frame_model::{letterbox, BlobBox, Color, OverlayStyle, Placement};
use glance_processing_core::MotionResult;
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::font;
use crate::links::link_pairs;
use crate::paint::blend_pixel;

/// Maps analysed-frame coordinates onto a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl OverlayTransform {
    /// Scale factor = displayed size / analysed frame size, no offset.
    pub fn for_raster(display: (u32, u32), frame: (u32, u32)) -> Self {
        Self {
            scale_x: display.0 as f64 / frame.0.max(1) as f64,
            scale_y: display.1 as f64 / frame.1.max(1) as f64,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Frame drawn into a letterboxed placement.
    pub fn for_placement(placement: &Placement, frame: (u32, u32)) -> Self {
        Self {
            scale_x: placement.width as f64 / frame.0.max(1) as f64,
            scale_y: placement.height as f64 / frame.1.max(1) as f64,
            offset_x: placement.x as f64,
            offset_y: placement.y as f64,
        }
    }

    pub fn point(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale_x + self.offset_x, y * self.scale_y + self.offset_y)
    }

    /// Box corners on the canvas as `(x, y, w, h)`, at least 1x1.
    pub fn rect(&self, b: &BlobBox) -> (i64, i64, u32, u32) {
        let (x0, y0) = self.point(b.x as f64, b.y as f64);
        let (x1, y1) = self.point((b.x + b.w) as f64, (b.y + b.h) as f64);
        let (x0, y0) = (x0.round() as i64, y0.round() as i64);
        let w = ((x1.round() as i64 - x0).max(1)) as u32;
        let h = ((y1.round() as i64 - y0).max(1)) as u32;
        (x0, y0, w, h)
    }
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba(color.0)
}

/// Paint every enabled element of `style` for `result` onto `canvas`, in
/// order: mask, boxes, centres, links, labels.
pub fn paint_overlay(canvas: &mut RgbaImage, result: &MotionResult, style: &OverlayStyle, t: &OverlayTransform) {
    let frame = (result.frame_width, result.frame_height);

    if style.show_mask {
        if let Some(mask) = &result.mask {
            paint_mask(canvas, mask, frame, style.mask_color, t);
        }
    }

    let thickness = style.line_thickness.max(1);
    if style.show_boxes {
        for b in &result.boxes {
            let (x, y, w, h) = t.rect(b);
            for i in 0..thickness {
                let inset = i as i64;
                let (iw, ih) = (w as i64 - 2 * inset, h as i64 - 2 * inset);
                if iw <= 0 || ih <= 0 {
                    break;
                }
                let r = Rect::at((x + inset) as i32, (y + inset) as i32).of_size(iw as u32, ih as u32);
                draw_hollow_rect_mut(canvas, r, rgba(style.box_color));
            }
        }
    }

    let centers: Vec<(f32, f32)> = result
        .boxes
        .iter()
        .map(|b| {
            let (cx, cy) = b.center();
            let (x, y) = t.point(cx as f64, cy as f64);
            (x as f32, y as f32)
        })
        .collect();

    if style.show_centers {
        for &(x, y) in &centers {
            draw_filled_circle_mut(
                canvas,
                (x.round() as i32, y.round() as i32),
                style.center_radius as i32,
                rgba(style.center_color),
            );
        }
    }

    if style.show_links {
        for (a, b) in link_pairs(&centers, style.link_max, style.link_distance) {
            draw_thick_line(canvas, centers[a], centers[b], thickness, style.link_color);
        }
    }

    if style.show_labels {
        for (i, b) in result.boxes.iter().enumerate() {
            let (x, y, _, _) = t.rect(b);
            let text = format!("#{} {}x{}", i + 1, b.w, b.h);
            let above = y - font::HEIGHT as i64 - 2;
            let ty = if above >= 0 { above } else { y + thickness as i64 + 1 };
            font::draw_text(canvas, x, ty, &text, style.label_color, 1);
        }
    }
}

fn draw_thick_line(canvas: &mut RgbaImage, a: (f32, f32), b: (f32, f32), thickness: u32, color: Color) {
    let steep = (b.1 - a.1).abs() > (b.0 - a.0).abs();
    let half = (thickness as i32 - 1) / 2;
    for d in -half..=(thickness as i32 - 1 - half) {
        let d = d as f32;
        let (start, end) = if steep {
            ((a.0 + d, a.1), (b.0 + d, b.1))
        } else {
            ((a.0, a.1 + d), (b.0, b.1 + d))
        };
        draw_line_segment_mut(canvas, start, end, rgba(color));
    }
}

/// Tint canvas pixels whose mask pixel is set. The mask covers the whole
/// analysed frame at its own resolution.
fn paint_mask(canvas: &mut RgbaImage, mask: &GrayImage, frame: (u32, u32), color: Color, t: &OverlayTransform) {
    let (mw, mh) = mask.dimensions();
    if mw == 0 || mh == 0 || frame.0 == 0 || frame.1 == 0 {
        return;
    }
    let (x0, y0) = t.point(0.0, 0.0);
    let (x1, y1) = t.point(frame.0 as f64, frame.1 as f64);
    let px0 = x0.floor().max(0.0) as i64;
    let py0 = y0.floor().max(0.0) as i64;
    let px1 = (x1.ceil() as i64).min(canvas.width() as i64);
    let py1 = (y1.ceil() as i64).min(canvas.height() as i64);

    for py in py0..py1 {
        let fy = (py as f64 + 0.5 - t.offset_y) / t.scale_y;
        let my = ((fy * mh as f64 / frame.1 as f64) as i64).clamp(0, mh as i64 - 1) as u32;
        for px in px0..px1 {
            let fx = (px as f64 + 0.5 - t.offset_x) / t.scale_x;
            let mx = ((fx * mw as f64 / frame.0 as f64) as i64).clamp(0, mw as i64 - 1) as u32;
            if mask.get_pixel(mx, my).0[0] != 0 {
                blend_pixel(canvas, px, py, color);
            }
        }
    }
}

/// Raster overlay on an already scaled display image.
pub fn draw_raster_overlay(image: &mut RgbaImage, result: &MotionResult, style: &OverlayStyle) {
    let t = OverlayTransform::for_raster(image.dimensions(), (result.frame_width, result.frame_height));
    paint_overlay(image, result, style, &t);
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LayerKey {
    viewport: (u32, u32),
    source: (u32, u32),
    style: OverlayStyle,
    version: u64,
}

/// Cached transparent overlay layer for the GPU path.
#[derive(Debug, Default)]
pub struct GpuOverlayCache {
    key: Option<LayerKey>,
    layer: Option<Arc<RgbaImage>>,
    builds: u64,
}

impl GpuOverlayCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer for a `source`-sized texture letterboxed into `viewport`.
    /// Regenerated only when the viewport, source size, style or result
    /// version changes. `None` when there is nothing to draw.
    pub fn layer(
        &mut self,
        viewport: (u32, u32),
        source: (u32, u32),
        result: Option<&MotionResult>,
        version: u64,
        style: &OverlayStyle,
    ) -> Option<Arc<RgbaImage>> {
        let Some(result) = result else {
            self.clear();
            return None;
        };
        if viewport.0 == 0 || viewport.1 == 0 {
            self.clear();
            return None;
        }

        let key = LayerKey {
            viewport,
            source,
            style: style.clone(),
            version,
        };
        if self.key.as_ref() == Some(&key) {
            return self.layer.clone();
        }

        let mut canvas = RgbaImage::new(viewport.0, viewport.1);
        let placement = letterbox(source.0, source.1, viewport.0, viewport.1);
        let t = OverlayTransform::for_placement(&placement, (result.frame_width, result.frame_height));
        paint_overlay(&mut canvas, result, style, &t);

        let layer = Arc::new(canvas);
        self.key = Some(key);
        self.layer = Some(layer.clone());
        self.builds += 1;
        tracing::trace!(?viewport, ?source, version, "Overlay layer rebuilt");
        Some(layer)
    }

    pub fn clear(&mut self) {
        self.key = None;
        self.layer = None;
    }

    /// How many times a layer was painted.
    pub fn builds(&self) -> u64 {
        self.builds
    }
}
