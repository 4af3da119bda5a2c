//! Window enumeration through `xcap`.

use glance_common::{GlanceError, GlanceResult};
use glance_frame_model::CaptureRect;
use glance_platform_core::{WindowId, WindowInfo, WindowProvider};
use xcap::Window;

/// Window provider for the local desktop.
///
/// `xcap` does not expose window decorations, so the client rect is
/// reported equal to the outer rect.
#[derive(Debug, Clone, Default)]
pub struct DesktopWindows;

impl DesktopWindows {
    pub fn new() -> Self {
        Self
    }
}

fn window_info(window: &Window) -> Result<WindowInfo, xcap::XCapError> {
    let rect = CaptureRect::from_origin_size(
        window.x()?,
        window.y()?,
        window.width()?,
        window.height()?,
    );
    let minimized = window.is_minimized()?;
    Ok(WindowInfo {
        id: WindowId(window.id()? as u64),
        title: window.title()?,
        app_name: window.app_name()?,
        rect,
        client_rect: rect,
        visible: !minimized,
        minimized,
        focused: window.is_focused()?,
    })
}

impl WindowProvider for DesktopWindows {
    fn query(&self, id: WindowId) -> GlanceResult<Option<WindowInfo>> {
        Ok(self.list()?.into_iter().find(|w| w.id == id))
    }

    fn list(&self) -> GlanceResult<Vec<WindowInfo>> {
        let windows = Window::all()
            .map_err(|e| GlanceError::window(format!("window enumeration failed: {e}")))?;
        let mut infos = Vec::with_capacity(windows.len());
        for window in &windows {
            match window_info(window) {
                Ok(info) => infos.push(info),
                // Windows can vanish between enumeration and query.
                Err(e) => tracing::trace!("Skipping window: {}", e),
            }
        }
        Ok(infos)
    }
}
