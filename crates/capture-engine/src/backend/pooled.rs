//! Pooled monitor backend.
//!
//! A session is bound to the monitor that contains the requested rect.
//! In synchronous mode every tick grabs the monitor once and crops; in
//! async mode a frame pump refreshes a single slot at the target rate and
//! ticks crop the newest frame.

use std::sync::Arc;
use std::time::Instant;

use glance_common::error::GlanceResult;
use glance_frame_model::{CaptureBackendKind, CaptureRect, FrameBuffer};
use glance_platform_core::ScreenGrabber;

use super::pump::{FramePump, PumpMode};
use super::{capture_from_monitor, crop_monitor_frame, CaptureBackend, MonitorBinding};

struct PooledSession {
    binding: MonitorBinding,
    pump: Option<FramePump>,
    last_frame_at: Option<Instant>,
}

pub struct PooledBackend {
    grabber: Arc<dyn ScreenGrabber>,
    fps: u32,
    async_mode: bool,
    session: Option<PooledSession>,
}

impl PooledBackend {
    pub fn new(grabber: Arc<dyn ScreenGrabber>, fps: u32) -> Self {
        Self {
            grabber,
            fps: fps.max(1),
            async_mode: false,
            session: None,
        }
    }

    pub fn async_mode(&self) -> bool {
        self.async_mode
    }

    /// Monitor the open session is bound to.
    pub fn bound_monitor(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.binding.index)
    }
}

impl CaptureBackend for PooledBackend {
    fn kind(&self) -> CaptureBackendKind {
        CaptureBackendKind::Pooled
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
            tracing::debug!(%rect, monitor = session.binding.index, "Pooled session stale, rebinding");
            self.stop();
        }

        let pump = if self.async_mode {
            Some(FramePump::spawn(
                "pooled-pump",
                self.grabber.clone(),
                binding.index,
                self.fps,
                PumpMode::EveryFrame,
            )?)
        } else {
            None
        };
        tracing::info!(
            monitor = binding.index,
            async_mode = self.async_mode,
            fps = self.fps,
            "Pooled capture session started"
        );
        self.session = Some(PooledSession {
            binding,
            pump,
            last_frame_at: None,
        });
        Ok(())
    }

    fn grab(&mut self, rect: &CaptureRect) -> GlanceResult<Option<FrameBuffer>> {
        self.ensure_session(rect)?;
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };

        let frame = match &session.pump {
            Some(pump) => match pump.latest() {
                Some(frame) => crop_monitor_frame(&frame, &session.binding.rect, rect)?,
                None => return Ok(None),
            },
            None => {
                let full = self.grabber.grab_monitor(session.binding.index)?;
                crop_monitor_frame(&full, &session.binding.rect, rect)?
            }
        };
        session.last_frame_at = Some(Instant::now());
        Ok(Some(frame))
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
        // Only the pump runs at a fixed rate; it restarts on the next grab.
        if self.async_mode && self.session.is_some() {
            self.stop();
        }
    }

    fn set_async_mode(&mut self, enabled: bool) {
        if enabled == self.async_mode {
            return;
        }
        self.async_mode = enabled;
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Some(pump) = session.pump.as_mut() {
                pump.stop();
            }
            tracing::info!(monitor = session.binding.index, "Pooled capture session stopped");
        }
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn last_progress(&self) -> Option<Instant> {
        let session = self.session.as_ref()?;
        let started = session.binding.started_at;
        let progress = match &session.pump {
            Some(pump) => pump.last_progress(),
            None => session.last_frame_at.unwrap_or(started),
        };
        Some(progress.max(started))
    }
}

impl Drop for PooledBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_platform_core::synthetic::{Fill, SyntheticDesktop};
    use glance_platform_core::MonitorInfo;
    use std::time::Duration;

    fn dual_desktop() -> SyntheticDesktop {
        let monitor = |name: &str, x: i32| MonitorInfo {
            name: name.to_string(),
            width: 200,
            height: 100,
            x,
            y: 0,
            scale_factor: 1.0,
            primary: x == 0,
        };
        SyntheticDesktop::new(vec![monitor("a", 0), monitor("b", 200)])
    }

    #[test]
    fn test_sync_grab_crops_monitor_frame() {
        let desktop = SyntheticDesktop::single_monitor(200, 100);
        desktop.add_window("w", CaptureRect::new(0, 0, 200, 100), Fill::Gradient);
        let mut backend = PooledBackend::new(Arc::new(desktop.clone()), 30);

        let rect = CaptureRect::new(10, 20, 60, 50);
        let frame = backend.grab(&rect).unwrap().unwrap();
        assert_eq!(frame, desktop.grab_region(&rect).unwrap());
        assert!(backend.is_open());
        assert_eq!(desktop.monitor_grab_count(), 1);
    }

    #[test]
    fn test_session_rebinds_when_rect_moves_monitor() {
        let desktop = dual_desktop();
        let mut backend = PooledBackend::new(Arc::new(desktop), 30);

        backend.grab(&CaptureRect::new(10, 10, 50, 50)).unwrap();
        assert_eq!(backend.bound_monitor(), Some(0));

        backend.grab(&CaptureRect::new(250, 10, 300, 50)).unwrap();
        assert_eq!(backend.bound_monitor(), Some(1));
    }

    #[test]
    fn test_rect_spanning_monitors_yields_error() {
        let desktop = dual_desktop();
        let mut backend = PooledBackend::new(Arc::new(desktop), 30);
        assert!(backend.grab(&CaptureRect::new(150, 10, 260, 50)).is_err());
    }

    #[test]
    fn test_async_mode_uses_pump() {
        let desktop = SyntheticDesktop::single_monitor(64, 64);
        let mut backend = PooledBackend::new(Arc::new(desktop), 200);
        backend.set_async_mode(true);

        let rect = CaptureRect::new(0, 0, 32, 32);
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut frame = None;
        while frame.is_none() && Instant::now() < deadline {
            frame = backend.grab(&rect).unwrap();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(frame.map(|f| f.width()), Some(32));

        backend.set_async_mode(false);
        assert!(!backend.is_open());
    }

    #[test]
    fn test_rate_change_restarts_only_async_session() {
        let desktop = SyntheticDesktop::single_monitor(64, 64);
        let mut backend = PooledBackend::new(Arc::new(desktop), 30);
        let rect = CaptureRect::new(0, 0, 8, 8);

        backend.grab(&rect).unwrap();
        backend.set_target_rate(60);
        assert!(backend.is_open());

        backend.set_async_mode(true);
        backend.ensure_session(&rect).unwrap();
        backend.set_target_rate(15);
        assert!(!backend.is_open());
    }
}
