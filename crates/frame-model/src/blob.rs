//! Motion-blob analysis parameters, overlay styling and results.

use serde::{Deserialize, Serialize};

/// An 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const GREEN: Color = Color([0, 255, 0, 255]);
    pub const RED: Color = Color([255, 0, 0, 255]);
    pub const YELLOW: Color = Color([255, 255, 0, 255]);
    pub const MAGENTA: Color = Color([255, 0, 255, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const BLACK: Color = Color([0, 0, 0, 255]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color([r, g, b, 255])
    }

    pub const fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Color([r, g, b, alpha])
    }

    pub fn alpha(&self) -> u8 {
        self.0[3]
    }
}

/// What the overlay draws and how. Everything here is part of the
/// overlay cache key, so it is `Eq + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub show_boxes: bool,
    pub show_centers: bool,
    pub show_mask: bool,
    pub show_labels: bool,
    pub show_links: bool,
    /// Maximum links drawn from each center.
    pub link_max: u32,
    /// Maximum link length in display pixels (0 = unbounded).
    pub link_distance: u32,
    pub box_color: Color,
    pub center_color: Color,
    pub link_color: Color,
    /// Mask tint; its alpha sets the mask opacity.
    pub mask_color: Color,
    pub label_color: Color,
    pub line_thickness: u32,
    pub center_radius: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            show_boxes: true,
            show_centers: true,
            show_mask: false,
            show_labels: true,
            show_links: false,
            link_max: 2,
            link_distance: 200,
            box_color: Color::GREEN,
            center_color: Color::RED,
            link_color: Color::YELLOW,
            mask_color: Color::MAGENTA.with_alpha(89),
            label_color: Color::WHITE,
            line_thickness: 2,
            center_radius: 3,
        }
    }
}

/// Motion-analysis configuration. Replacing it resets tracker state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobParams {
    pub enabled: bool,
    /// Difference threshold (0..=255) for the binary mask.
    pub threshold: u8,
    /// Box area bounds in analysed pixels (0 = unbounded).
    pub min_area: u32,
    pub max_area: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// Blur kernel size applied to the difference image (forced odd, <= 1 disables).
    pub blur_kernel: u32,
    pub erode_iterations: u32,
    pub dilate_iterations: u32,
    /// Downscale before analysis (10..=100).
    pub analysis_scale_percent: u32,
    pub max_blobs: usize,
    /// Frames skipped between analysis runs.
    pub skip_frames: u32,
    /// Maximum analysis submissions per second (0 = unbounded).
    pub max_rate_hz: u32,
    /// Background smoothing factor; 0 selects frame differencing.
    pub smoothing: f32,
    pub style: OverlayStyle,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 25,
            min_area: 50,
            max_area: 0,
            min_width: 0,
            min_height: 0,
            max_width: 0,
            max_height: 0,
            blur_kernel: 5,
            erode_iterations: 1,
            dilate_iterations: 2,
            analysis_scale_percent: 50,
            max_blobs: 20,
            skip_frames: 0,
            max_rate_hz: 15,
            smoothing: 0.0,
            style: OverlayStyle::default(),
        }
    }
}

impl BlobParams {
    /// Copy with every field forced into its legal range.
    pub fn sanitized(&self) -> Self {
        let smoothing = if self.smoothing.is_finite() {
            self.smoothing.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut style = self.style.clone();
        style.line_thickness = style.line_thickness.clamp(1, 16);
        style.center_radius = style.center_radius.min(64);
        style.link_max = style.link_max.min(16);
        Self {
            blur_kernel: effective_kernel(self.blur_kernel),
            analysis_scale_percent: self.analysis_scale_percent.clamp(10, 100),
            smoothing,
            style,
            ..self.clone()
        }
    }

    /// Whether a box of the given size passes the area and extent filters.
    pub fn accepts(&self, w: u32, h: u32) -> bool {
        let area = w as u64 * h as u64;
        let within = |v: u64, min: u32, max: u32| v >= min as u64 && (max == 0 || v <= max as u64);
        within(area, self.min_area, self.max_area)
            && within(w as u64, self.min_width, self.max_width)
            && within(h as u64, self.min_height, self.max_height)
    }
}

/// Blur kernels must be odd; `k <= 1` means no blur.
pub fn effective_kernel(k: u32) -> u32 {
    if k <= 1 {
        0
    } else if k % 2 == 0 {
        k + 1
    } else {
        k
    }
}

/// A detected moving region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BlobBox {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Center in floating-point pixel coordinates.
    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.w as f32 / 2.0,
            self.y as f32 + self.h as f32 / 2.0,
        )
    }

    /// Rescale from an analysed frame to another resolution.
    pub fn scaled(&self, fx: f64, fy: f64) -> Self {
        Self {
            x: (self.x as f64 * fx).round() as u32,
            y: (self.y as f64 * fy).round() as u32,
            w: ((self.w as f64 * fx).round() as u32).max(1),
            h: ((self.h as f64 * fy).round() as u32).max(1),
        }
    }
}
