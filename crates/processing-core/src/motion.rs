//! Motion-blob analysis.
//!
//! One cycle turns a frame plus the cross-frame [`TrackerState`] into the
//! bounding boxes of regions that changed: grey conversion, differencing
//! against the previous frame or a running background, blur, threshold,
//! erode/dilate and connected-region extraction.

use glance_common::error::GlanceResult;
use glance_frame_model::{scaled_size, BlobBox, BlobParams, FrameBuffer};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;

use crate::convert;

/// Running background average, one `f32` per analysed pixel.
pub type Background = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Cross-frame state. Only the analysis worker mutates it.
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    pub previous_gray: Option<GrayImage>,
    pub background: Option<Background>,
    pub skip_counter: u32,
}

impl TrackerState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True once a reference frame exists.
    pub fn is_seeded(&self) -> bool {
        self.previous_gray.is_some() || self.background.is_some()
    }
}

/// Output of one completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionResult {
    /// Largest first, in source-frame pixels.
    pub boxes: Vec<BlobBox>,
    /// Binary mask at analysis resolution, kept only when the overlay shows it.
    pub mask: Option<GrayImage>,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl MotionResult {
    pub fn empty(frame_width: u32, frame_height: u32) -> Self {
        Self {
            boxes: Vec::new(),
            mask: None,
            frame_width,
            frame_height,
        }
    }
}

/// Run one analysis cycle.
///
/// Returns `Ok(None)` when the frame is skipped and the state is left as
/// it was apart from the skip counter. The first frame after a reset only
/// seeds the state and yields no boxes.
pub fn analyze(
    state: &mut TrackerState,
    frame: &FrameBuffer,
    params: &BlobParams,
    vision: bool,
) -> GlanceResult<Option<MotionResult>> {
    let params = params.sanitized();
    if params.skip_frames > 0 && state.skip_counter < params.skip_frames {
        state.skip_counter += 1;
        return Ok(None);
    }
    state.skip_counter = 0;

    let (frame_w, frame_h) = (frame.width(), frame.height());
    let (an_w, an_h) = scaled_size(frame_w, frame_h, params.analysis_scale_percent);
    let gray = convert::to_gray(frame, an_w, an_h)?;

    let Some(diff) = difference(state, gray, params.smoothing) else {
        return Ok(Some(MotionResult::empty(frame_w, frame_h)));
    };

    let blurred = blur(diff, params.blur_kernel, vision);
    let mut mask = threshold(&blurred, params.threshold);
    if vision {
        if params.erode_iterations > 0 {
            imageproc::morphology::erode_mut(&mut mask, Norm::LInf, iterations(params.erode_iterations));
        }
        if params.dilate_iterations > 0 {
            imageproc::morphology::dilate_mut(&mut mask, Norm::LInf, iterations(params.dilate_iterations));
        }
    } else {
        for _ in 0..params.erode_iterations {
            mask = morph3x3(&mask, u8::min);
        }
        for _ in 0..params.dilate_iterations {
            mask = morph3x3(&mask, u8::max);
        }
    }

    let candidates = if vision {
        contour_boxes(&mask)
    } else {
        nonzero_bounds(&mask).into_iter().collect()
    };
    let mut boxes: Vec<BlobBox> = candidates
        .into_iter()
        .filter(|b| params.accepts(b.w, b.h))
        .collect();
    boxes.sort_by(|a, b| b.area().cmp(&a.area()));
    boxes.truncate(params.max_blobs);

    if (an_w, an_h) != (frame_w, frame_h) {
        let fx = frame_w as f64 / an_w as f64;
        let fy = frame_h as f64 / an_h as f64;
        for b in boxes.iter_mut() {
            *b = b.scaled(fx, fy);
        }
    }

    Ok(Some(MotionResult {
        boxes,
        mask: params.style.show_mask.then_some(mask),
        frame_width: frame_w,
        frame_height: frame_h,
    }))
}

fn iterations(n: u32) -> u8 {
    n.min(u8::MAX as u32) as u8
}

/// Absolute difference against the reference, updating the reference.
/// `None` when this frame only seeded it (first frame or size change).
fn difference(state: &mut TrackerState, gray: GrayImage, alpha: f32) -> Option<GrayImage> {
    let (w, h) = gray.dimensions();
    if alpha > 0.0 {
        let seeded = matches!(&state.background, Some(bg) if bg.dimensions() == (w, h));
        if !seeded {
            state.background = Some(Background::from_fn(w, h, |x, y| {
                Luma([gray.get_pixel(x, y).0[0] as f32])
            }));
            return None;
        }
        let bg = state.background.as_mut()?;
        for (b, g) in bg.pixels_mut().zip(gray.pixels()) {
            b.0[0] = (1.0 - alpha) * b.0[0] + alpha * g.0[0] as f32;
        }
        let bg = &*bg;
        return Some(GrayImage::from_fn(w, h, |x, y| {
            let d = (gray.get_pixel(x, y).0[0] as f32 - bg.get_pixel(x, y).0[0]).abs();
            Luma([d.round().min(255.0) as u8])
        }));
    }

    let diff = match &state.previous_gray {
        Some(prev) if prev.dimensions() == (w, h) => Some(GrayImage::from_fn(w, h, |x, y| {
            Luma([prev.get_pixel(x, y).0[0].abs_diff(gray.get_pixel(x, y).0[0])])
        })),
        _ => None,
    };
    state.previous_gray = Some(gray);
    diff
}

/// Gaussian sigma the usual way for an odd kernel size.
fn kernel_sigma(k: u32) -> f32 {
    0.3 * ((k as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn blur(image: GrayImage, kernel: u32, vision: bool) -> GrayImage {
    if kernel == 0 {
        return image;
    }
    let sigma = kernel_sigma(kernel);
    if vision {
        imageproc::filter::gaussian_blur_f32(&image, sigma)
    } else {
        image::imageops::blur(&image, sigma)
    }
}

fn threshold(image: &GrayImage, level: u8) -> GrayImage {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        px.0[0] = if px.0[0] > level { 255 } else { 0 };
    }
    out
}

/// 3x3 min (erode) or max (dilate) with the border left out of the window.
fn morph3x3(mask: &GrayImage, pick: fn(u8, u8) -> u8) -> GrayImage {
    let (w, h) = mask.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        let mut v = mask.get_pixel(x, y).0[0];
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                v = pick(v, mask.get_pixel(nx, ny).0[0]);
            }
        }
        Luma([v])
    })
}

/// Bounding boxes of the outermost connected regions.
fn contour_boxes(mask: &GrayImage) -> Vec<BlobBox> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let min_x = c.points.iter().map(|p| p.x).min()?;
            let max_x = c.points.iter().map(|p| p.x).max()?;
            let min_y = c.points.iter().map(|p| p.y).min()?;
            let max_y = c.points.iter().map(|p| p.y).max()?;
            Some(BlobBox::new(
                min_x as u32,
                min_y as u32,
                (max_x - min_x + 1) as u32,
                (max_y - min_y + 1) as u32,
            ))
        })
        .collect()
}

/// One box around every set pixel.
fn nonzero_bounds(mask: &GrayImage) -> Option<BlobBox> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, px) in mask.enumerate_pixels() {
        if px.0[0] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds.map(|(x0, y0, x1, y1)| BlobBox::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}
