//! Capture-rectangle resolution for the target window.

use glance_common::GlanceResult;
use glance_frame_model::{CaptureRect, CropMargins, FrameBuffer};
use glance_platform_core::{WindowId, WindowInfo, WindowProvider};

/// Absolute capture rect for a window snapshot: outer or client bounds,
/// shrunk by the crop margins. Monitor clipping is left to the backends.
///
/// Missing or minimized windows resolve to [`CaptureRect::INVALID`].
pub fn resolve_capture_rect(
    window: Option<&WindowInfo>,
    client_area_only: bool,
    crop: &CropMargins,
) -> CaptureRect {
    let Some(window) = window else {
        return CaptureRect::INVALID;
    };
    if window.minimized {
        return CaptureRect::INVALID;
    }
    let bounds = if client_area_only {
        window.client_rect
    } else {
        window.rect
    };
    bounds.cropped(crop)
}

/// Query the provider and resolve in one step.
pub fn resolve_for(
    provider: &dyn WindowProvider,
    id: WindowId,
    client_area_only: bool,
    crop: &CropMargins,
) -> GlanceResult<CaptureRect> {
    let window = provider.query(id)?;
    Ok(resolve_capture_rect(window.as_ref(), client_area_only, crop))
}

/// When a backend hands back a frame the size of the whole window while
/// only the client area was asked for, cut the client region out of it.
/// Frames of any other size are returned untouched.
pub fn crop_client_area(frame: FrameBuffer, window: &WindowInfo) -> FrameBuffer {
    let Some((win_w, win_h)) = window.rect.size() else {
        return frame;
    };
    if frame.width() != win_w || frame.height() != win_h {
        return frame;
    }
    let client = window.client_rect;
    let off_x = client.left - window.rect.left;
    let off_y = client.top - window.rect.top;
    let Some((client_w, client_h)) = client.size() else {
        return frame;
    };
    if off_x < 0 || off_y < 0 || (client_w, client_h) == (win_w, win_h) {
        return frame;
    }
    match frame.crop(off_x as u32, off_y as u32, client_w, client_h) {
        Ok(cropped) => cropped,
        Err(e) => {
            tracing::debug!("Client-area crop skipped: {}", e);
            frame
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_frame_model::PixelLayout;

    fn window(rect: CaptureRect, client: CaptureRect) -> WindowInfo {
        WindowInfo {
            id: WindowId(1),
            title: "w".to_string(),
            app_name: "app".to_string(),
            rect,
            client_rect: client,
            visible: true,
            minimized: false,
            focused: false,
        }
    }

    #[test]
    fn test_crop_applied_to_window_rect() {
        let w = window(CaptureRect::new(0, 0, 800, 600), CaptureRect::new(8, 31, 792, 592));
        let rect = resolve_capture_rect(Some(&w), false, &CropMargins::new(10, 5, 10, 5));
        assert_eq!(rect, CaptureRect::new(10, 5, 790, 595));
    }

    #[test]
    fn test_client_area_selected() {
        let w = window(CaptureRect::new(0, 0, 800, 600), CaptureRect::new(8, 31, 792, 592));
        let rect = resolve_capture_rect(Some(&w), true, &CropMargins::NONE);
        assert_eq!(rect, CaptureRect::new(8, 31, 792, 592));
    }

    #[test]
    fn test_missing_or_minimized_window_is_invalid() {
        assert!(!resolve_capture_rect(None, false, &CropMargins::NONE).is_valid());

        let mut w = window(CaptureRect::new(0, 0, 10, 10), CaptureRect::new(0, 0, 10, 10));
        w.minimized = true;
        assert!(!resolve_capture_rect(Some(&w), false, &CropMargins::NONE).is_valid());
    }

    #[test]
    fn test_no_monitor_clamping() {
        let w = window(
            CaptureRect::new(-50, -20, 300, 200),
            CaptureRect::new(-50, -20, 300, 200),
        );
        let rect = resolve_capture_rect(Some(&w), false, &CropMargins::NONE);
        assert_eq!(rect.left, -50);
    }

    #[test]
    fn test_client_crop_from_window_sized_frame() {
        let w = window(CaptureRect::new(100, 100, 140, 130), CaptureRect::new(102, 110, 138, 128));
        let frame = FrameBuffer::solid(40, 30, PixelLayout::Bgra, [1, 2, 3, 255]).unwrap();
        let cropped = crop_client_area(frame, &w);
        assert_eq!((cropped.width(), cropped.height()), (36, 18));

        let other = FrameBuffer::solid(36, 18, PixelLayout::Bgra, [1, 2, 3, 255]).unwrap();
        let untouched = crop_client_area(other.clone(), &w);
        assert_eq!(untouched, other);
    }
}
