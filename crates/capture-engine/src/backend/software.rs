//! Software snapshot backend: one region grab per tick, no session.

use std::sync::Arc;
use std::time::Instant;

use glance_common::error::GlanceResult;
use glance_frame_model::{CaptureBackendKind, CaptureRect, FrameBuffer};
use glance_platform_core::ScreenGrabber;

use super::CaptureBackend;

pub struct SoftwareBackend {
    grabber: Arc<dyn ScreenGrabber>,
}

impl SoftwareBackend {
    pub fn new(grabber: Arc<dyn ScreenGrabber>) -> Self {
        Self { grabber }
    }
}

impl CaptureBackend for SoftwareBackend {
    fn kind(&self) -> CaptureBackendKind {
        CaptureBackendKind::Software
    }

    fn ensure_session(&mut self, _rect: &CaptureRect) -> GlanceResult<()> {
        Ok(())
    }

    fn grab(&mut self, rect: &CaptureRect) -> GlanceResult<Option<FrameBuffer>> {
        self.capture_once(rect)
    }

    fn capture_once(&self, rect: &CaptureRect) -> GlanceResult<Option<FrameBuffer>> {
        self.grabber.grab_region(rect).map(Some)
    }

    fn set_target_rate(&mut self, _fps: u32) {}

    fn stop(&mut self) {}

    fn is_open(&self) -> bool {
        false
    }

    fn last_progress(&self) -> Option<Instant> {
        None
    }
}
