//! Screen grabbing through `xcap`.

use glance_common::{GlanceError, GlanceResult};
use glance_frame_model::{CaptureBackendKind, CaptureRect, FrameBuffer, PixelLayout};
use glance_platform_core::{monitor_for_rect, MonitorInfo, ScreenGrabber};
use image::RgbaImage;
use xcap::Monitor;

use crate::display::{detect_display_server, DisplayServer};

/// Screen grabber for the local desktop.
///
/// `xcap` monitor handles are re-enumerated on every call so the grabber
/// can be shared with backend worker threads.
#[derive(Debug, Clone)]
pub struct DesktopGrabber {
    display_server: DisplayServer,
}

impl DesktopGrabber {
    pub fn new() -> Self {
        let display_server = detect_display_server();
        tracing::debug!(%display_server, "Desktop grabber created");
        Self { display_server }
    }

    pub fn display_server(&self) -> DisplayServer {
        self.display_server
    }
}

impl Default for DesktopGrabber {
    fn default() -> Self {
        Self::new()
    }
}

fn platform_err(context: &'static str) -> impl Fn(xcap::XCapError) -> GlanceError {
    move |e| GlanceError::platform(format!("{context}: {e}"))
}

fn monitor_info(monitor: &Monitor) -> GlanceResult<MonitorInfo> {
    let err = platform_err("monitor query failed");
    Ok(MonitorInfo {
        name: monitor.name().map_err(&err)?,
        width: monitor.width().map_err(&err)?,
        height: monitor.height().map_err(&err)?,
        x: monitor.x().map_err(&err)?,
        y: monitor.y().map_err(&err)?,
        scale_factor: monitor.scale_factor().map_err(&err)? as f64,
        primary: monitor.is_primary().map_err(&err)?,
    })
}

fn rgba_frame(image: RgbaImage) -> GlanceResult<FrameBuffer> {
    let (width, height) = image.dimensions();
    Ok(FrameBuffer::new(
        image.into_raw(),
        width,
        height,
        PixelLayout::Rgba,
    )?)
}

/// Map a monitor-local logical rect onto the captured image, which may
/// be in physical pixels on scaled displays.
fn to_image_rect(local: &CaptureRect, info: &MonitorInfo, image: &RgbaImage) -> Option<CaptureRect> {
    let sx = image.width() as f64 / info.width.max(1) as f64;
    let sy = image.height() as f64 / info.height.max(1) as f64;
    let scaled = CaptureRect::new(
        (local.left as f64 * sx).round() as i32,
        (local.top as f64 * sy).round() as i32,
        (local.right as f64 * sx).round() as i32,
        (local.bottom as f64 * sy).round() as i32,
    );
    let bounds = CaptureRect::from_origin_size(0, 0, image.width(), image.height());
    scaled.intersection(&bounds)
}

impl ScreenGrabber for DesktopGrabber {
    fn name(&self) -> &str {
        "xcap"
    }

    fn monitors(&self) -> GlanceResult<Vec<MonitorInfo>> {
        let monitors = Monitor::all().map_err(platform_err("monitor enumeration failed"))?;
        monitors.iter().map(monitor_info).collect()
    }

    fn grab_region(&self, rect: &CaptureRect) -> GlanceResult<FrameBuffer> {
        let monitors = Monitor::all().map_err(platform_err("monitor enumeration failed"))?;
        let infos = monitors
            .iter()
            .map(monitor_info)
            .collect::<GlanceResult<Vec<_>>>()?;
        let index = monitor_for_rect(&infos, rect)
            .ok_or_else(|| GlanceError::capture("no monitors connected"))?;
        let info = &infos[index];
        let bounds = info.rect();
        let visible = rect.intersection(&bounds).ok_or_else(|| {
            GlanceError::capture(format!("{rect} does not overlap monitor '{}'", info.name))
        })?;

        let image = monitors[index]
            .capture_image()
            .map_err(platform_err("monitor capture failed"))?;
        let local = visible.translate(-bounds.left, -bounds.top);
        let region = to_image_rect(&local, info, &image)
            .ok_or_else(|| GlanceError::capture(format!("{rect} maps outside the captured image")))?;
        let (width, height) = region
            .size()
            .ok_or_else(|| GlanceError::capture("empty capture region"))?;
        let cropped =
            image::imageops::crop_imm(&image, region.left as u32, region.top as u32, width, height)
                .to_image();
        rgba_frame(cropped)
    }

    fn grab_monitor(&self, index: usize) -> GlanceResult<FrameBuffer> {
        let monitors = Monitor::all().map_err(platform_err("monitor enumeration failed"))?;
        let monitor = monitors
            .get(index)
            .ok_or_else(|| GlanceError::capture(format!("no monitor at index {index}")))?;
        let image = monitor
            .capture_image()
            .map_err(platform_err("monitor capture failed"))?;
        rgba_frame(image)
    }

    fn supports(&self, kind: CaptureBackendKind) -> bool {
        match kind {
            CaptureBackendKind::Software => true,
            CaptureBackendKind::Pooled | CaptureBackendKind::LowLatency => {
                self.display_server.supports_monitor_sessions()
            }
        }
    }
}
