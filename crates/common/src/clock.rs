//! Clock and timing utilities for the render loop.
//!
//! Everything here works on nanosecond timestamps taken from a
//! [`SessionClock`], so the pacing logic can be driven with synthetic
//! time in tests.

use std::time::{Duration, Instant};

const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MS: u64 = 1_000_000;

/// A monotonic clock anchored to the moment a stream started.
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant streaming started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Nanoseconds elapsed since the session started.
    pub fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    pub fn ns_to_secs(ns: u64) -> f64 {
        ns as f64 / NANOS_PER_SEC as f64
    }
}

/// Render-loop interval for a target frame rate, in milliseconds:
/// `max(1, 1000 / fps)`, with fps clamped to at least 1.
pub fn frame_interval_ms(fps: u32) -> u64 {
    (1000 / fps.max(1) as u64).max(1)
}

/// Fixed-period tick gate for the render loop.
#[derive(Debug)]
pub struct TickTimer {
    interval_ms: u64,
    last_tick_ns: Option<u64>,
}

impl TickTimer {
    pub fn new(target_fps: u32) -> Self {
        Self {
            interval_ms: frame_interval_ms(target_fps),
            last_tick_ns: None,
        }
    }

    /// Change the target rate. The next check measures from the last tick.
    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.interval_ms = frame_interval_ms(target_fps);
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_ns: u64) -> bool {
        let interval_ns = self.interval_ms * NANOS_PER_MS;
        match self.last_tick_ns {
            None => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            Some(last) if current_ns >= last + interval_ns => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            _ => false,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Measures presented frames per second over windows of at least one second.
#[derive(Debug)]
pub struct FpsMeter {
    frames: u32,
    window_start_ns: u64,
}

impl FpsMeter {
    pub fn new(start_ns: u64) -> Self {
        Self {
            frames: 0,
            window_start_ns: start_ns,
        }
    }

    /// Count one presented frame. Returns the measured rate when the
    /// current window has lasted at least a second, then starts a new one.
    pub fn record_frame(&mut self, now_ns: u64) -> Option<f64> {
        self.frames += 1;
        let elapsed_ns = now_ns.saturating_sub(self.window_start_ns);
        if elapsed_ns < NANOS_PER_SEC {
            return None;
        }
        let fps = self.frames as f64 / SessionClock::ns_to_secs(elapsed_ns);
        self.frames = 0;
        self.window_start_ns = now_ns;
        Some(fps)
    }

    /// Drop the current window, e.g. after the stream was paused.
    pub fn reset(&mut self, now_ns: u64) {
        self.frames = 0;
        self.window_start_ns = now_ns;
    }
}

/// Enforces a minimum spacing between events (0 Hz = unbounded).
#[derive(Debug)]
pub struct RateLimiter {
    min_interval_ns: u64,
    last_ns: Option<u64>,
}

impl RateLimiter {
    pub fn new(max_hz: u32) -> Self {
        Self {
            min_interval_ns: if max_hz == 0 {
                0
            } else {
                NANOS_PER_SEC / max_hz as u64
            },
            last_ns: None,
        }
    }

    /// Returns true and records the event if it is allowed now.
    pub fn allow(&mut self, now_ns: u64) -> bool {
        match self.last_ns {
            Some(last) if now_ns < last + self.min_interval_ns => false,
            _ => {
                self.last_ns = Some(now_ns);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_ns = None;
    }
}
