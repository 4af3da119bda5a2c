//! Background producer that grabs one monitor at a fixed rate into a
//! [`LatestFrame`] slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use glance_common::clock::frame_interval_ms;
use glance_common::error::GlanceResult;
use glance_frame_model::FrameBuffer;
use glance_platform_core::ScreenGrabber;

use crate::latest::LatestFrame;

/// How a pump publishes frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpMode {
    /// Every grabbed frame replaces the slot.
    EveryFrame,
    /// Only frames whose pixels changed are published; unchanged grabs
    /// just mark the producer alive.
    OnChange,
}

/// A running producer thread.
#[derive(Debug)]
pub struct FramePump {
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    slot: LatestFrame,
    started_at: Instant,
}

impl FramePump {
    /// Spawn a producer for `monitor_index` at `fps`.
    pub fn spawn(
        name: &str,
        grabber: Arc<dyn ScreenGrabber>,
        monitor_index: usize,
        fps: u32,
        mode: PumpMode,
    ) -> GlanceResult<Self> {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let slot = LatestFrame::new();
        let interval = Duration::from_millis(frame_interval_ms(fps));

        let thread_stop = stop_flag.clone();
        let thread_slot = slot.clone();
        let handle = std::thread::Builder::new()
            .name(format!("glance-{name}"))
            .spawn(move || {
                run_pump(grabber, monitor_index, interval, mode, thread_slot, thread_stop)
            })?;

        tracing::debug!(name, monitor_index, fps, ?mode, "Frame pump started");
        Ok(Self {
            stop_flag,
            handle: Some(handle),
            slot,
            started_at: Instant::now(),
        })
    }

    pub fn latest(&self) -> Option<Arc<FrameBuffer>> {
        self.slot.latest()
    }

    /// Session start or the producer's last sign of life, whichever is later.
    pub fn last_progress(&self) -> Instant {
        self.slot
            .last_activity()
            .map_or(self.started_at, |t| t.max(self.started_at))
    }

    pub fn frames_published(&self) -> u64 {
        self.slot.sequence()
    }

    /// Signal the thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                tracing::warn!("Frame pump thread panicked");
            }
        }
        self.slot.clear();
    }
}

impl Drop for FramePump {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_pump(
    grabber: Arc<dyn ScreenGrabber>,
    monitor_index: usize,
    interval: Duration,
    mode: PumpMode,
    slot: LatestFrame,
    stop: Arc<AtomicBool>,
) {
    let mut failures: u64 = 0;
    while !stop.load(Ordering::SeqCst) {
        let started = Instant::now();
        match grabber.grab_monitor(monitor_index) {
            Ok(frame) => {
                failures = 0;
                if mode == PumpMode::OnChange && slot.matches(&frame) {
                    slot.touch();
                } else {
                    slot.publish(frame);
                }
            }
            Err(e) => {
                failures += 1;
                if failures == 1 {
                    tracing::warn!(monitor_index, "Frame pump grab failed: {}", e);
                } else {
                    tracing::trace!(monitor_index, failures, "Frame pump grab failed: {}", e);
                }
            }
        }
        if let Some(remaining) = interval.checked_sub(started.elapsed()) {
            std::thread::park_timeout(remaining);
        }
    }
    tracing::debug!(monitor_index, "Frame pump stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_frame_model::CaptureRect;
    use glance_platform_core::synthetic::{Fill, Sprite, SyntheticDesktop};

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_pump_publishes_frames() {
        let desktop = SyntheticDesktop::single_monitor(64, 48);
        desktop.add_window("w", CaptureRect::new(0, 0, 32, 32), Fill::Gradient);
        let mut pump =
            FramePump::spawn("test", Arc::new(desktop), 0, 200, PumpMode::EveryFrame).unwrap();

        assert!(wait_for(|| pump.frames_published() >= 3));
        assert_eq!(pump.latest().unwrap().width(), 64);
        pump.stop();
        assert!(pump.latest().is_none());
    }

    #[test]
    fn test_on_change_pump_skips_identical_frames() {
        let desktop = SyntheticDesktop::single_monitor(32, 32);
        let mut pump = FramePump::spawn(
            "test",
            Arc::new(desktop.clone()),
            0,
            200,
            PumpMode::OnChange,
        )
        .unwrap();

        assert!(wait_for(|| desktop.monitor_grab_count() >= 5));
        assert_eq!(pump.frames_published(), 1);

        desktop.add_sprite(Sprite {
            x: 4,
            y: 4,
            size: 4,
            color: [255; 4],
            vx: 0,
            vy: 0,
            bounds: None,
        });
        assert!(wait_for(|| pump.frames_published() == 2));
        pump.stop();
    }
}
