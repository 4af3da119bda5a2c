//! Capture dispatcher: backend selection, foreground fast path and
//! fallback to software capture.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glance_common::error::{GlanceError, GlanceResult};
use glance_frame_model::{CaptureBackendKind, CaptureRect, FrameBuffer};
use glance_platform_core::{Capabilities, ScreenGrabber};

use crate::backend::{
    build_backends, CaptureBackend, LowLatencyBackend, PooledBackend, SoftwareBackend,
};

/// How long an open session may go without frames before it is abandoned.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// One-shot notice emitted when a backend is abandoned for software capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackNotice {
    pub from: CaptureBackendKind,
    pub reason: String,
}

impl std::fmt::Display for FallbackNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} capture unavailable ({}), switched to software capture",
            self.from, self.reason
        )
    }
}

/// Runtime statistics from the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Frames handed to the caller.
    pub frames_captured: u64,
    /// Grabs that produced nothing (not warmed up, occluded, failed).
    pub frames_missed: u64,
    /// Frames served by the foreground fast path.
    pub fast_path_frames: u64,
    /// Backend errors swallowed by `grab`.
    pub errors: u64,
    /// Times a backend was abandoned for software capture.
    pub fallbacks: u64,
}

impl CaptureStats {
    /// Miss rate as a percentage.
    pub fn miss_rate(&self) -> f64 {
        let total = self.frames_captured + self.frames_missed;
        if total == 0 {
            return 0.0;
        }
        self.frames_missed as f64 / total as f64 * 100.0
    }
}

/// Owns one backend per variant and routes grabs to the active one.
pub struct CaptureSource {
    caps: Capabilities,
    active: CaptureBackendKind,
    software: SoftwareBackend,
    pooled: PooledBackend,
    low_latency: LowLatencyBackend,
    foreground_fast_path: bool,
    stall_timeout: Duration,
    consecutive_errors: u32,
    failing_since: Option<Instant>,
    notice: Option<FallbackNotice>,
    stats: CaptureStats,
}

impl CaptureSource {
    pub fn new(grabber: Arc<dyn ScreenGrabber>, caps: Capabilities, fps: u32) -> Self {
        let (software, pooled, low_latency) = build_backends(grabber, fps);
        Self {
            caps,
            active: CaptureBackendKind::Software,
            software,
            pooled,
            low_latency,
            foreground_fast_path: true,
            stall_timeout: DEFAULT_STALL_TIMEOUT,
            consecutive_errors: 0,
            failing_since: None,
            notice: None,
            stats: CaptureStats::default(),
        }
    }

    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    pub fn set_stall_timeout(&mut self, timeout: Duration) {
        self.stall_timeout = timeout;
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn active_backend(&self) -> CaptureBackendKind {
        self.active
    }

    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }

    pub fn set_foreground_fast_path(&mut self, enabled: bool) {
        self.foreground_fast_path = enabled;
    }

    fn backend(&self, kind: CaptureBackendKind) -> &dyn CaptureBackend {
        match kind {
            CaptureBackendKind::Software => &self.software,
            CaptureBackendKind::Pooled => &self.pooled,
            CaptureBackendKind::LowLatency => &self.low_latency,
        }
    }

    fn backend_mut(&mut self, kind: CaptureBackendKind) -> &mut dyn CaptureBackend {
        match kind {
            CaptureBackendKind::Software => &mut self.software,
            CaptureBackendKind::Pooled => &mut self.pooled,
            CaptureBackendKind::LowLatency => &mut self.low_latency,
        }
    }

    /// Switch capture variant. The previous session is stopped first and
    /// the new one opens lazily on the next grab.
    pub fn select_backend(&mut self, kind: CaptureBackendKind) -> GlanceResult<()> {
        if kind == self.active {
            return Ok(());
        }
        if !self.caps.supports_backend(kind) {
            return Err(GlanceError::unsupported(format!(
                "{kind} capture is not available in this environment"
            )));
        }
        let previous = self.active;
        self.backend_mut(previous).stop();
        self.active = kind;
        self.consecutive_errors = 0;
        self.failing_since = None;
        tracing::info!(from = %previous, to = %kind, "Capture backend selected");
        Ok(())
    }

    /// Fixed-rate producers restart at the new rate; snapshot grabbers
    /// ignore it.
    pub fn set_target_rate(&mut self, fps: u32) {
        let fps = fps.max(1);
        for kind in CaptureBackendKind::ALL {
            self.backend_mut(kind).set_target_rate(fps);
        }
    }

    /// Toggle the pooled backend's frame pump.
    pub fn set_async_mode(&mut self, enabled: bool) {
        self.pooled.set_async_mode(enabled);
    }

    /// Latest frame for `rect`, or `None`. Never fails: errors are logged
    /// and may trigger a fallback to software capture.
    pub fn grab(&mut self, rect: &CaptureRect, foreground: bool) -> Option<FrameBuffer> {
        if !rect.is_valid() {
            return None;
        }

        if self.foreground_fast_path && foreground && self.active == CaptureBackendKind::Software {
            if let Some(frame) = self.fast_path(rect) {
                self.stats.fast_path_frames += 1;
                self.stats.frames_captured += 1;
                return Some(frame);
            }
        }

        let kind = self.active;
        if let Err(e) = self.backend_mut(kind).ensure_session(rect) {
            self.fall_back(kind, format!("failed to start: {e}"));
        }

        let kind = self.active;
        match self.backend_mut(kind).grab(rect) {
            Ok(Some(frame)) => {
                self.consecutive_errors = 0;
                self.failing_since = None;
                self.stats.frames_captured += 1;
                Some(frame)
            }
            Ok(None) => {
                self.stats.frames_missed += 1;
                self.check_stall(kind);
                None
            }
            Err(e) => {
                self.consecutive_errors += 1;
                self.stats.errors += 1;
                self.stats.frames_missed += 1;
                if self.consecutive_errors == 1 {
                    tracing::warn!(backend = %kind, %rect, "Capture failed: {}", e);
                } else {
                    tracing::debug!(backend = %kind, failures = self.consecutive_errors, "Capture failed: {}", e);
                }
                // A live producer does not help if every grab from it fails.
                let since = *self.failing_since.get_or_insert_with(Instant::now);
                let failing = since.elapsed();
                if kind != CaptureBackendKind::Software && failing >= self.stall_timeout {
                    self.fall_back(
                        kind,
                        format!("capture failing for {:.1}s: {e}", failing.as_secs_f64()),
                    );
                    return None;
                }
                self.check_stall(kind);
                None
            }
        }
    }

    /// Stateless single captures through the faster variants. Each is
    /// tried at most once and nothing is kept on failure.
    fn fast_path(&self, rect: &CaptureRect) -> Option<FrameBuffer> {
        for kind in [CaptureBackendKind::Pooled, CaptureBackendKind::LowLatency] {
            if !self.caps.supports_backend(kind) {
                continue;
            }
            match self.backend(kind).capture_once(rect) {
                Ok(Some(frame)) => return Some(frame),
                Ok(None) => {}
                Err(e) => tracing::trace!(backend = %kind, "Fast-path capture failed: {}", e),
            }
        }
        None
    }

    fn check_stall(&mut self, kind: CaptureBackendKind) {
        if kind == CaptureBackendKind::Software {
            return;
        }
        let Some(progress) = self.backend(kind).last_progress() else {
            return;
        };
        let idle = progress.elapsed();
        if idle >= self.stall_timeout {
            self.fall_back(kind, format!("no frames for {:.1}s", idle.as_secs_f64()));
        }
    }

    fn fall_back(&mut self, from: CaptureBackendKind, reason: String) {
        if from == CaptureBackendKind::Software {
            return;
        }
        self.backend_mut(from).stop();
        self.active = CaptureBackendKind::Software;
        self.consecutive_errors = 0;
        self.failing_since = None;
        self.stats.fallbacks += 1;
        let notice = FallbackNotice { from, reason };
        tracing::warn!("{}", notice);
        self.notice = Some(notice);
    }

    /// The pending fallback notice, returned once.
    pub fn take_notice(&mut self) -> Option<FallbackNotice> {
        self.notice.take()
    }

    /// Number of backend sessions currently open.
    pub fn open_sessions(&self) -> usize {
        CaptureBackendKind::ALL
            .into_iter()
            .filter(|k| self.backend(*k).is_open())
            .count()
    }

    /// Close every session.
    pub fn stop(&mut self) {
        for kind in CaptureBackendKind::ALL {
            self.backend_mut(kind).stop();
        }
    }
}

impl Drop for CaptureSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_display() {
        let notice = FallbackNotice {
            from: CaptureBackendKind::LowLatency,
            reason: "failed to start".to_string(),
        };
        assert_eq!(
            notice.to_string(),
            "low_latency capture unavailable (failed to start), switched to software capture"
        );
    }

    #[test]
    fn test_miss_rate() {
        let stats = CaptureStats {
            frames_captured: 3,
            frames_missed: 1,
            ..Default::default()
        };
        assert!((stats.miss_rate() - 25.0).abs() < 1e-9);
        assert_eq!(CaptureStats::default().miss_rate(), 0.0);
    }
}
