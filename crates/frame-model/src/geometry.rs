//! Rectangles, crop margins and the scaling math shared by capture,
//! processing and presentation.

use serde::{Deserialize, Serialize};

/// A screen-space rectangle. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CaptureRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CaptureRect {
    /// An always-invalid rectangle, returned for windows that vanished.
    pub const INVALID: CaptureRect = CaptureRect {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from an origin and a size.
    pub fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            left: x,
            top: y,
            right: x.saturating_add(clamp_to_i32(width)),
            bottom: y.saturating_add(clamp_to_i32(height)),
        }
    }

    pub fn width(&self) -> i64 {
        self.right as i64 - self.left as i64
    }

    pub fn height(&self) -> i64 {
        self.bottom as i64 - self.top as i64
    }

    /// A rect is capturable only when it has positive area.
    pub fn is_valid(&self) -> bool {
        self.right > self.left && self.bottom > self.top
    }

    /// Pixel dimensions, or `None` for an invalid rect.
    pub fn size(&self) -> Option<(u32, u32)> {
        if !self.is_valid() {
            return None;
        }
        Some((self.width() as u32, self.height() as u32))
    }

    /// Shrink each edge by the matching margin. No clamping: an
    /// over-cropped rect simply becomes invalid.
    pub fn cropped(&self, crop: &CropMargins) -> Self {
        Self {
            left: self.left.saturating_add(clamp_to_i32(crop.left)),
            top: self.top.saturating_add(clamp_to_i32(crop.top)),
            right: self.right.saturating_sub(clamp_to_i32(crop.right)),
            bottom: self.bottom.saturating_sub(clamp_to_i32(crop.bottom)),
        }
    }

    /// Center point, rounded toward negative infinity.
    pub fn center(&self) -> (i32, i32) {
        (
            ((self.left as i64 + self.right as i64).div_euclid(2)) as i32,
            ((self.top as i64 + self.bottom as i64).div_euclid(2)) as i32,
        )
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Whether `other` lies entirely inside this rect.
    pub fn contains(&self, other: &CaptureRect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left.saturating_add(dx),
            top: self.top.saturating_add(dy),
            right: self.right.saturating_add(dx),
            bottom: self.bottom.saturating_add(dy),
        }
    }

    /// Express this rect relative to `outer`'s origin, if it is fully
    /// contained in `outer`.
    pub fn relative_to(&self, outer: &CaptureRect) -> Option<CaptureRect> {
        if !self.is_valid() || !outer.contains(self) {
            return None;
        }
        Some(self.translate(-outer.left, -outer.top))
    }

    /// Overlap of two rects, or `None` when they are disjoint.
    pub fn intersection(&self, other: &CaptureRect) -> Option<CaptureRect> {
        let rect = CaptureRect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        rect.is_valid().then_some(rect)
    }
}

impl std::fmt::Display for CaptureRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Pixels removed from each edge of the resolved window rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CropMargins {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropMargins {
    pub const NONE: CropMargins = CropMargins {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from signed input, treating negatives as zero.
    pub fn from_signed(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        let clamp = |v: i64| v.clamp(0, u32::MAX as i64) as u32;
        Self::new(clamp(left), clamp(top), clamp(right), clamp(bottom))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// A placed rectangle inside a viewport (pixels, top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Output size for a `percent` downscale. Each side is at least 1 px;
/// percent is clamped to `10..=100`.
pub fn scaled_size(width: u32, height: u32, percent: u32) -> (u32, u32) {
    let percent = percent.clamp(10, 100) as u64;
    let scale = |v: u32| ((v as u64 * percent) / 100).max(1) as u32;
    (scale(width), scale(height))
}

/// Largest size with the source aspect ratio that fits inside the bounds.
pub fn fit_size(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 || max_w == 0 || max_h == 0 {
        return (0, 0);
    }
    let (sw, sh, mw, mh) = (src_w as u64, src_h as u64, max_w as u64, max_h as u64);
    let width_at_full_height = mh * sw / sh;
    if width_at_full_height <= mw {
        (width_at_full_height.max(1) as u32, max_h)
    } else {
        (max_w, (mw * sh / sw).max(1) as u32)
    }
}

/// Uniformly scale a frame into a viewport and center it.
pub fn letterbox(frame_w: u32, frame_h: u32, view_w: u32, view_h: u32) -> Placement {
    if frame_w == 0 || frame_h == 0 || view_w == 0 || view_h == 0 {
        return Placement {
            x: 0,
            y: 0,
            width: view_w,
            height: view_h,
        };
    }
    let (fw, fh, vw, vh) = (frame_w as u64, frame_h as u64, view_w as u64, view_h as u64);
    // Compare aspect ratios without dividing.
    let (width, height) = if vw * fh > vh * fw {
        ((vh * fw / fh) as u32, view_h)
    } else {
        (view_w, (vw * fh / fw) as u32)
    };
    Placement {
        x: (view_w - width) / 2,
        y: (view_h - height) / 2,
        width,
        height,
    }
}

/// Evenly spaced source indices for nearest-neighbour resampling:
/// `linspace(0, src - 1, out)` truncated to integers.
pub fn nearest_indices(src: u32, out: u32) -> Vec<u32> {
    match (src, out) {
        (0, _) | (_, 0) => Vec::new(),
        (_, 1) => vec![0],
        _ => {
            let span = (src - 1) as u64;
            let steps = (out - 1) as u64;
            (0..out as u64).map(|i| (i * span / steps) as u32).collect()
        }
    }
}

fn clamp_to_i32(v: u32) -> i32 {
    v.min(i32::MAX as u32) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_shrinks_every_edge() {
        let rect = CaptureRect::new(0, 0, 800, 600);
        let cropped = rect.cropped(&CropMargins::new(10, 5, 10, 5));
        assert_eq!(cropped, CaptureRect::new(10, 5, 790, 595));
        assert!(cropped.is_valid());
    }

    #[test]
    fn test_over_crop_is_invalid() {
        let rect = CaptureRect::new(100, 100, 120, 200);
        let cropped = rect.cropped(&CropMargins::new(15, 0, 15, 0));
        assert!(!cropped.is_valid());
        assert_eq!(cropped.size(), None);
    }

    #[test]
    fn test_relative_to_monitor() {
        let monitor = CaptureRect::new(1920, 0, 3840, 1080);
        let window = CaptureRect::new(2000, 100, 2400, 400);
        assert_eq!(
            window.relative_to(&monitor),
            Some(CaptureRect::new(80, 100, 480, 400))
        );

        let straddling = CaptureRect::new(1800, 100, 2400, 400);
        assert_eq!(straddling.relative_to(&monitor), None);
    }

    #[test]
    fn test_center_and_contains_point() {
        let rect = CaptureRect::new(-100, -50, 100, 50);
        assert_eq!(rect.center(), (0, 0));
        assert!(rect.contains_point(-100, -50));
        assert!(!rect.contains_point(100, 0));
    }

    #[test]
    fn test_intersection() {
        let a = CaptureRect::new(0, 0, 100, 100);
        let b = CaptureRect::new(50, 50, 150, 150);
        assert_eq!(a.intersection(&b), Some(CaptureRect::new(50, 50, 100, 100)));
        assert_eq!(a.intersection(&CaptureRect::new(200, 0, 300, 10)), None);
    }

    #[test]
    fn test_scaled_size_min_one_pixel() {
        assert_eq!(scaled_size(1920, 1080, 50), (960, 540));
        assert_eq!(scaled_size(5, 5, 10), (1, 1));
        // Out-of-range percentages are clamped.
        assert_eq!(scaled_size(100, 100, 500), (100, 100));
        assert_eq!(scaled_size(100, 100, 0), (10, 10));
    }

    #[test]
    fn test_fit_size_keeps_aspect() {
        assert_eq!(fit_size(1920, 1080, 960, 960), (960, 540));
        assert_eq!(fit_size(1080, 1920, 960, 960), (540, 960));
        assert_eq!(fit_size(0, 10, 100, 100), (0, 0));
    }

    #[test]
    fn test_letterbox_centers_frame() {
        let wide = letterbox(1600, 900, 800, 800);
        assert_eq!(
            wide,
            Placement {
                x: 0,
                y: 175,
                width: 800,
                height: 450
            }
        );

        let tall = letterbox(900, 1600, 800, 800);
        assert_eq!(tall.width, 450);
        assert_eq!(tall.x, 175);
        assert_eq!(tall.height, 800);
    }

    #[test]
    fn test_nearest_indices_match_linspace() {
        assert_eq!(nearest_indices(10, 4), vec![0, 3, 6, 9]);
        assert_eq!(nearest_indices(10, 1), vec![0]);
        assert_eq!(nearest_indices(4, 4), vec![0, 1, 2, 3]);
        assert!(nearest_indices(0, 4).is_empty());
    }
}
