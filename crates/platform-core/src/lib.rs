//! Glance platform core contracts.
//!
//! This crate contains the display and window contracts used by the
//! capture and render crates without coupling to a concrete OS backend:
//! monitors, target windows, the screen grabber seam and the capability
//! flags resolved once at startup. A fully synthetic desktop implementing
//! both seams lives in [`synthetic`].

use glance_frame_model::CaptureRect;
use serde::{Deserialize, Serialize};

pub mod capabilities;
pub mod grabber;
pub mod synthetic;
pub mod window;

pub use capabilities::Capabilities;
pub use grabber::ScreenGrabber;
pub use window::{capturable_windows, WindowId, WindowInfo, WindowProvider};

/// Information about a connected monitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorInfo {
    /// Monitor name/identifier.
    pub name: String,
    /// Resolution in physical pixels.
    pub width: u32,
    pub height: u32,
    /// Position in the virtual desktop (pixels).
    pub x: i32,
    pub y: i32,
    /// Scale factor (for example 1.0, 1.25, 2.0).
    pub scale_factor: f64,
    /// Whether this monitor is primary.
    pub primary: bool,
}

impl MonitorInfo {
    /// Monitor bounds in virtual-desktop coordinates.
    pub fn rect(&self) -> CaptureRect {
        CaptureRect::from_origin_size(self.x, self.y, self.width, self.height)
    }
}

/// Index of the monitor a capture session should bind to: the one
/// containing the center of `rect`, else the first monitor.
pub fn monitor_for_rect(monitors: &[MonitorInfo], rect: &CaptureRect) -> Option<usize> {
    if monitors.is_empty() {
        return None;
    }
    let (cx, cy) = rect.center();
    let index = monitors
        .iter()
        .position(|m| m.rect().contains_point(cx, cy))
        .unwrap_or(0);
    Some(index)
}

/// Compute virtual desktop bounds that include all connected monitors.
pub fn virtual_desktop_bounds(monitors: &[MonitorInfo]) -> CaptureRect {
    if monitors.is_empty() {
        return CaptureRect::new(0, 0, 1920, 1080);
    }

    let min_x = monitors.iter().map(|m| m.x).min().unwrap_or(0);
    let min_y = monitors.iter().map(|m| m.y).min().unwrap_or(0);
    let max_x = monitors
        .iter()
        .map(|m| m.rect().right)
        .max()
        .unwrap_or(1920);
    let max_y = monitors
        .iter()
        .map(|m| m.rect().bottom)
        .max()
        .unwrap_or(1080);

    CaptureRect::new(min_x, min_y, max_x, max_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dual_layout() -> Vec<MonitorInfo> {
        vec![
            MonitorInfo {
                name: "left".to_string(),
                width: 1920,
                height: 1080,
                x: -1920,
                y: 0,
                scale_factor: 1.0,
                primary: false,
            },
            MonitorInfo {
                name: "main".to_string(),
                width: 2560,
                height: 1440,
                x: 0,
                y: 0,
                scale_factor: 1.0,
                primary: true,
            },
        ]
    }

    #[test]
    fn virtual_bounds_cover_negative_origin_layout() {
        let bounds = virtual_desktop_bounds(&dual_layout());
        assert_eq!(bounds, CaptureRect::new(-1920, 0, 2560, 1440));
        assert_eq!(bounds.width(), 4480);
    }

    #[test]
    fn monitor_selection_uses_window_center() {
        let monitors = dual_layout();
        // Mostly on the left monitor.
        let rect = CaptureRect::new(-1000, 100, 200, 500);
        assert_eq!(monitor_for_rect(&monitors, &rect), Some(0));

        let rect = CaptureRect::new(100, 100, 500, 500);
        assert_eq!(monitor_for_rect(&monitors, &rect), Some(1));
    }

    #[test]
    fn monitor_selection_falls_back_to_first() {
        let monitors = dual_layout();
        let offscreen = CaptureRect::new(9000, 9000, 9100, 9100);
        assert_eq!(monitor_for_rect(&monitors, &offscreen), Some(0));
        assert_eq!(monitor_for_rect(&[], &offscreen), None);
    }
}
