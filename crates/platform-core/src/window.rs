//! Target-window contracts.

use glance_common::GlanceResult;
use glance_frame_model::CaptureRect;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque, platform-assigned window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Snapshot of one top-level window, taken once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    pub app_name: String,
    /// Outer bounds in screen coordinates.
    pub rect: CaptureRect,
    /// Client-area bounds in screen coordinates.
    pub client_rect: CaptureRect,
    pub visible: bool,
    pub minimized: bool,
    /// Whether this is the foreground window.
    pub focused: bool,
}

/// Source of target-window state.
pub trait WindowProvider {
    /// Current state of a window, or `None` once it no longer exists.
    fn query(&self, id: WindowId) -> GlanceResult<Option<WindowInfo>>;

    /// All top-level windows, unfiltered.
    fn list(&self) -> GlanceResult<Vec<WindowInfo>>;

    /// Whether `id` is the foreground window.
    fn is_foreground(&self, id: WindowId) -> bool {
        matches!(self.query(id), Ok(Some(info)) if info.focused)
    }
}

/// Windows worth offering as capture targets: titled, visible, with a
/// non-empty rect, each handle once.
pub fn capturable_windows(windows: Vec<WindowInfo>) -> Vec<WindowInfo> {
    let mut seen = HashSet::new();
    windows
        .into_iter()
        .filter(|w| !w.title.trim().is_empty())
        .filter(|w| w.visible && w.rect.is_valid())
        .filter(|w| seen.insert(w.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: u64, title: &str, rect: CaptureRect, visible: bool) -> WindowInfo {
        WindowInfo {
            id: WindowId(id),
            title: title.to_string(),
            app_name: "app".to_string(),
            rect,
            client_rect: rect,
            visible,
            minimized: false,
            focused: false,
        }
    }

    #[test]
    fn test_capturable_windows_filters() {
        let rect = CaptureRect::new(0, 0, 100, 100);
        let windows = vec![
            info(1, "Editor", rect, true),
            info(2, "  ", rect, true),
            info(3, "Hidden", rect, false),
            info(4, "Collapsed", CaptureRect::new(10, 10, 10, 50), true),
            info(1, "Editor (dup)", rect, true),
            info(5, "Terminal", rect, true),
        ];
        let ids: Vec<u64> = capturable_windows(windows).iter().map(|w| w.id.0).collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[test]
    fn test_window_id_display() {
        assert_eq!(WindowId(0xBEEF).to_string(), "0x0000BEEF");
    }
}
