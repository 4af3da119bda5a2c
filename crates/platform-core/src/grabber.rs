//! The pixel source behind every capture backend.

use glance_common::GlanceResult;
use glance_frame_model::{CaptureBackendKind, CaptureRect, FrameBuffer};

use crate::MonitorInfo;

/// Platform pixel source.
///
/// Implementations are shared with backend worker threads, so they must
/// be `Send + Sync` and must not cache thread-affine OS handles.
pub trait ScreenGrabber: Send + Sync {
    /// Human-readable name for logs and reports.
    fn name(&self) -> &str;

    /// Connected monitors, in a stable order.
    fn monitors(&self) -> GlanceResult<Vec<MonitorInfo>>;

    /// One-shot snapshot of an absolute screen region.
    fn grab_region(&self, rect: &CaptureRect) -> GlanceResult<FrameBuffer>;

    /// Full frame of one monitor, used by monitor-bound sessions.
    fn grab_monitor(&self, index: usize) -> GlanceResult<FrameBuffer>;

    /// Whether this platform can back the given capture variant.
    fn supports(&self, kind: CaptureBackendKind) -> bool {
        kind == CaptureBackendKind::Software
    }
}
