use std::sync::Arc;
use std::time::Instant;

use glance_common::error::{GlanceError, GlanceResult};
use glance_frame_model::{CaptureBackendKind, CaptureRect, FrameBuffer};
use glance_platform_core::{monitor_for_rect, MonitorInfo, ScreenGrabber};

/// One capture variant.
///
/// Sessions are opened lazily by [`ensure_session`](Self::ensure_session)
/// and must be fully released by [`stop`](Self::stop); the dispatcher
/// relies on this to keep at most one session open.
pub trait CaptureBackend: Send {
    fn kind(&self) -> CaptureBackendKind;

    /// Open (or rebind) a session able to serve `rect`. Errors mean the
    /// backend cannot start in this environment.
    fn ensure_session(&mut self, rect: &CaptureRect) -> GlanceResult<()>;

    /// Latest frame for `rect`. `Ok(None)` means nothing is ready yet.
    fn grab(&mut self, rect: &CaptureRect) -> GlanceResult<Option<FrameBuffer>>;

    /// Single capture that leaves no session behind.
    fn capture_once(&self, rect: &CaptureRect) -> GlanceResult<Option<FrameBuffer>>;

    /// Change the rate of fixed-interval producers.
    fn set_target_rate(&mut self, fps: u32);

    /// Toggle frame-pump operation where supported.
    fn set_async_mode(&mut self, _enabled: bool) {}

    /// Release the session and any worker thread.
    fn stop(&mut self);

    fn is_open(&self) -> bool;

    /// When the open session last made progress (started or delivered a
    /// frame). `None` when no session is open.
    fn last_progress(&self) -> Option<Instant>;
}

pub mod low_latency;
pub mod pooled;
pub mod pump;
pub mod software;

pub use low_latency::LowLatencyBackend;
pub use pooled::PooledBackend;
pub use software::SoftwareBackend;

/// Monitor binding recorded when a session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorBinding {
    pub index: usize,
    pub rect: CaptureRect,
    pub started_at: Instant,
}

impl MonitorBinding {
    /// Bind to the monitor containing the center of `rect`, else the first.
    pub fn for_rect(grabber: &dyn ScreenGrabber, rect: &CaptureRect) -> GlanceResult<Self> {
        let monitors = grabber.monitors()?;
        let index = monitor_for_rect(&monitors, rect)
            .ok_or_else(|| GlanceError::capture("no monitors available"))?;
        Ok(Self {
            index,
            rect: monitors[index].rect(),
            started_at: Instant::now(),
        })
    }

    /// A session stays valid while the requested rect lies inside its monitor.
    pub fn serves(&self, rect: &CaptureRect) -> bool {
        self.rect.contains(rect)
    }

    /// Whether rebinding could not do better: the rect fits, or it
    /// straddles monitors but its center is already on this one.
    pub fn is_best_for(&self, rect: &CaptureRect) -> bool {
        let (cx, cy) = rect.center();
        self.serves(rect) || self.rect.contains_point(cx, cy)
    }
}

/// Cut `rect` (absolute) out of a full-monitor frame. Frames captured at
/// a different resolution than the monitor's logical size are scaled.
pub fn crop_monitor_frame(
    frame: &FrameBuffer,
    monitor: &CaptureRect,
    rect: &CaptureRect,
) -> GlanceResult<FrameBuffer> {
    let local = rect.relative_to(monitor).ok_or_else(|| {
        GlanceError::capture(format!("{rect} is not inside monitor {monitor}"))
    })?;
    let (mon_w, mon_h) = monitor
        .size()
        .ok_or_else(|| GlanceError::capture("monitor has no area"))?;
    let sx = frame.width() as f64 / mon_w as f64;
    let sy = frame.height() as f64 / mon_h as f64;
    let x = (local.left as f64 * sx).round() as u32;
    let y = (local.top as f64 * sy).round() as u32;
    let right = ((local.right as f64 * sx).round() as u32).min(frame.width());
    let bottom = ((local.bottom as f64 * sy).round() as u32).min(frame.height());
    if right <= x || bottom <= y {
        return Err(GlanceError::capture(format!("{rect} maps to an empty region")));
    }
    Ok(frame.crop(x, y, right - x, bottom - y)?)
}

/// Stateless single capture through a full-monitor grab.
pub(crate) fn capture_from_monitor(
    grabber: &dyn ScreenGrabber,
    rect: &CaptureRect,
) -> GlanceResult<Option<FrameBuffer>> {
    let monitors: Vec<MonitorInfo> = grabber.monitors()?;
    let index = monitor_for_rect(&monitors, rect)
        .ok_or_else(|| GlanceError::capture("no monitors available"))?;
    let monitor = monitors[index].rect();
    if !monitor.contains(rect) {
        return Ok(None);
    }
    let frame = grabber.grab_monitor(index)?;
    crop_monitor_frame(&frame, &monitor, rect).map(Some)
}

/// Build all three backends over one grabber.
pub fn build_backends(
    grabber: Arc<dyn ScreenGrabber>,
    fps: u32,
) -> (SoftwareBackend, PooledBackend, LowLatencyBackend) {
    (
        SoftwareBackend::new(grabber.clone()),
        PooledBackend::new(grabber.clone(), fps),
        LowLatencyBackend::new(grabber, fps),
    )
}
