//! Low-latency monitor stream.
//!
//! A producer thread watches the bound monitor and publishes a frame
//! whenever its pixels change, so the render thread always reads the
//! newest content without waiting on a grab.

use std::sync::Arc;
use std::time::Instant;

use glance_common::error::GlanceResult;
use glance_frame_model::{CaptureBackendKind, CaptureRect, FrameBuffer};
use glance_platform_core::ScreenGrabber;

use super::pump::{FramePump, PumpMode};
use super::{capture_from_monitor, crop_monitor_frame, CaptureBackend, MonitorBinding};

struct StreamSession {
    binding: MonitorBinding,
    pump: FramePump,
}

pub struct LowLatencyBackend {
    grabber: Arc<dyn ScreenGrabber>,
    fps: u32,
    session: Option<StreamSession>,
}

impl LowLatencyBackend {
    pub fn new(grabber: Arc<dyn ScreenGrabber>, fps: u32) -> Self {
        Self {
            grabber,
            fps: fps.max(1),
            session: None,
        }
    }

    pub fn bound_monitor(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.binding.index)
    }
}

impl CaptureBackend for LowLatencyBackend {
    fn kind(&self) -> CaptureBackendKind {
        CaptureBackendKind::LowLatency
    }

    fn ensure_session(&mut self, rect: &CaptureRect) -> GlanceResult<()> {
        if let Some(session) = &self.session {
            if session.binding.is_best_for(rect) {
                return Ok(());
            }
        }
        let binding = MonitorBinding::for_rect(self.grabber.as_ref(), rect)?;
        if let Some(session) = &self.session {
            if session.binding.index == binding.index {
                return Ok(());
            }
            tracing::debug!(%rect, monitor = session.binding.index, "Low-latency session stale, rebinding");
            self.stop();
        }

        let pump = FramePump::spawn(
            "low-latency",
            self.grabber.clone(),
            binding.index,
            self.fps,
            PumpMode::OnChange,
        )?;
        tracing::info!(monitor = binding.index, fps = self.fps, "Low-latency capture session started");
        self.session = Some(StreamSession { binding, pump });
        Ok(())
    }

    fn grab(&mut self, rect: &CaptureRect) -> GlanceResult<Option<FrameBuffer>> {
        self.ensure_session(rect)?;
        let Some(session) = self.session.as_ref() else {
            return Ok(None);
        };
        // Not warmed up yet.
        let Some(frame) = session.pump.latest() else {
            return Ok(None);
        };
        crop_monitor_frame(&frame, &session.binding.rect, rect).map(Some)
    }

    fn capture_once(&self, rect: &CaptureRect) -> GlanceResult<Option<FrameBuffer>> {
        capture_from_monitor(self.grabber.as_ref(), rect)
    }

    fn set_target_rate(&mut self, fps: u32) {
        let fps = fps.max(1);
        if fps == self.fps {
            return;
        }
        self.fps = fps;
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.pump.stop();
            tracing::info!(monitor = session.binding.index, "Low-latency capture session stopped");
        }
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn last_progress(&self) -> Option<Instant> {
        let session = self.session.as_ref()?;
        Some(session.pump.last_progress().max(session.binding.started_at))
    }
}

impl Drop for LowLatencyBackend {
    fn drop(&mut self) {
        self.stop();
    }
}
