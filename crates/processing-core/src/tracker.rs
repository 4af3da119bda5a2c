//! Background motion tracker.
//!
//! A single worker thread runs [`motion::analyze`](crate::motion::analyze)
//! on owned frame copies. The render side never waits on it: at most one
//! job is in flight, newer frames submitted meanwhile replace each other in
//! a one-deep pending slot, and completed results are picked up with
//! [`MotionTracker::poll`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use glance_common::clock::{RateLimiter, SessionClock};
use glance_common::error::GlanceResult;
use glance_frame_model::{BlobParams, FrameBuffer};

use crate::motion::{self, MotionResult, TrackerState};

struct Job {
    frame: FrameBuffer,
    params: BlobParams,
    generation: u64,
}

struct Completed {
    generation: u64,
    /// `None` for skipped or failed cycles.
    result: Option<MotionResult>,
}

/// State handed between the worker and configuration setters.
#[derive(Default)]
struct Shared {
    state: TrackerState,
    reset_pending: bool,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub submitted: u64,
    pub coalesced: u64,
    pub rate_limited: u64,
    pub completed: u64,
}

pub struct MotionTracker {
    params: BlobParams,
    shared: Arc<Mutex<Shared>>,
    jobs: Option<Sender<Job>>,
    results: Receiver<Completed>,
    handle: Option<JoinHandle<()>>,
    in_flight: bool,
    pending: Option<Job>,
    generation: u64,
    latest: Option<Arc<MotionResult>>,
    version: u64,
    limiter: RateLimiter,
    clock: SessionClock,
    stats: TrackerStats,
}

impl MotionTracker {
    /// Spawn the worker. `vision` selects the vision-library analysis path.
    pub fn new(params: BlobParams, vision: bool) -> GlanceResult<Self> {
        let params = params.sanitized();
        let shared = Arc::new(Mutex::new(Shared::default()));
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (result_tx, result_rx) = mpsc::channel::<Completed>();

        let worker_shared = shared.clone();
        let handle = std::thread::Builder::new()
            .name("glance-motion".to_string())
            .spawn(move || run_worker(job_rx, result_tx, worker_shared, vision))?;

        tracing::debug!(vision, enabled = params.enabled, "Motion tracker started");
        Ok(Self {
            limiter: RateLimiter::new(params.max_rate_hz),
            params,
            shared,
            jobs: Some(job_tx),
            results: result_rx,
            handle: Some(handle),
            in_flight: false,
            pending: None,
            generation: 0,
            latest: None,
            version: 0,
            clock: SessionClock::start(),
            stats: TrackerStats::default(),
        })
    }

    fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn params(&self) -> &BlobParams {
        &self.params
    }

    pub fn is_enabled(&self) -> bool {
        self.params.enabled
    }

    /// Replace the parameters. Tracker state is reset before the worker's
    /// next cycle; a running cycle finishes undisturbed. Disabling clears
    /// everything immediately.
    pub fn set_params(&mut self, params: BlobParams) {
        let params = params.sanitized();
        if params == self.params {
            return;
        }
        if params.max_rate_hz != self.params.max_rate_hz {
            self.limiter = RateLimiter::new(params.max_rate_hz);
        }
        let enabled = params.enabled;
        self.params = params;
        self.lock_shared().reset_pending = true;
        if !enabled {
            self.clear();
        }
        tracing::debug!(enabled, "Motion parameters replaced");
    }

    /// Drop cached results and any pending submission. Results of the
    /// cycle currently running are discarded when they arrive.
    pub fn clear(&mut self) {
        self.pending = None;
        self.generation += 1;
        if self.latest.take().is_some() {
            self.version += 1;
        }
        self.lock_shared().reset_pending = true;
    }

    /// Queue a copy of `frame` for analysis. Never blocks.
    pub fn submit(&mut self, frame: &FrameBuffer) {
        if !self.params.enabled || self.jobs.is_none() {
            return;
        }
        if !self.limiter.allow(self.clock.elapsed_ns()) {
            self.stats.rate_limited += 1;
            return;
        }
        let job = Job {
            frame: frame.clone(),
            params: self.params.clone(),
            generation: self.generation,
        };
        self.stats.submitted += 1;
        if self.in_flight {
            if self.pending.replace(job).is_some() {
                self.stats.coalesced += 1;
            }
            return;
        }
        self.dispatch(job);
    }

    fn dispatch(&mut self, job: Job) {
        let Some(jobs) = &self.jobs else {
            return;
        };
        if jobs.send(job).is_err() {
            tracing::warn!("Motion worker is gone, disabling analysis");
            self.jobs = None;
            self.in_flight = false;
            return;
        }
        self.in_flight = true;
    }

    /// Collect finished cycles and hand the pending frame to the worker.
    /// Returns true when the published result changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.results.try_recv() {
                Ok(done) => {
                    self.in_flight = false;
                    self.stats.completed += 1;
                    if done.generation != self.generation || !self.params.enabled {
                        continue;
                    }
                    if let Some(result) = done.result {
                        self.latest = Some(Arc::new(result));
                        self.version += 1;
                        changed = true;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.jobs.take().is_some() {
                        tracing::warn!("Motion worker exited");
                    }
                    self.in_flight = false;
                    break;
                }
            }
        }

        if !self.in_flight {
            if let Some(mut job) = self.pending.take() {
                job.generation = self.generation;
                self.dispatch(job);
            }
        }
        changed
    }

    /// Most recently completed analysis.
    pub fn latest(&self) -> Option<Arc<MotionResult>> {
        self.latest.clone()
    }

    /// Bumped whenever [`latest`](Self::latest) changes.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    /// Stop accepting work. In-flight and pending analysis is discarded
    /// without waiting for the worker.
    pub fn shutdown(&mut self) {
        self.pending = None;
        self.jobs = None;
        self.in_flight = false;
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() && handle.join().is_err() {
                tracing::warn!("Motion worker panicked");
            }
        }
    }
}

impl Drop for MotionTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn run_worker(jobs: Receiver<Job>, results: Sender<Completed>, shared: Arc<Mutex<Shared>>, vision: bool) {
    while let Ok(job) = jobs.recv() {
        // Take the state out so setters never wait on a running cycle.
        let mut state = {
            let mut guard = lock(&shared);
            if guard.reset_pending {
                guard.reset_pending = false;
                guard.state.reset();
            }
            std::mem::take(&mut guard.state)
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            motion::analyze(&mut state, &job.frame, &job.params, vision)
        }));
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!("Motion analysis failed: {}", e);
                None
            }
            Err(_) => {
                tracing::error!("Motion analysis panicked, resetting tracker state");
                state.reset();
                None
            }
        };

        {
            let mut guard = lock(&shared);
            // A reset requested mid-cycle wins over the state we computed.
            if !guard.reset_pending {
                guard.state = state;
            }
        }

        let completed = Completed {
            generation: job.generation,
            result,
        };
        if results.send(completed).is_err() {
            break;
        }
    }
    tracing::debug!("Motion worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_frame_model::{BlobBox, PixelLayout};
    use std::time::{Duration, Instant};

    fn square_frame(x0: u32) -> FrameBuffer {
        let (w, h) = (160u32, 120u32);
        let mut data = vec![0u8; (w * h * 4) as usize];
        for (i, px) in data.chunks_exact_mut(4).enumerate() {
            let (x, y) = (i as u32 % w, i as u32 / w);
            let v = if (x0..x0 + 40).contains(&x) && (30..70).contains(&y) {
                200
            } else {
                0
            };
            px.copy_from_slice(&[v, v, v, 255]);
        }
        FrameBuffer::new(data, w, h, PixelLayout::Bgra).unwrap()
    }

    fn params() -> BlobParams {
        BlobParams {
            enabled: true,
            blur_kernel: 0,
            erode_iterations: 0,
            dilate_iterations: 0,
            analysis_scale_percent: 100,
            max_rate_hz: 0,
            ..Default::default()
        }
    }

    fn wait_idle(tracker: &mut MotionTracker) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            tracker.poll();
            if !tracker.is_busy() && !tracker.has_pending() {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("tracker did not go idle");
    }

    #[test]
    fn test_moving_square_published() {
        let mut tracker = MotionTracker::new(params(), true).unwrap();
        tracker.submit(&square_frame(20));
        wait_idle(&mut tracker);
        assert!(tracker.latest().unwrap().boxes.is_empty());

        tracker.submit(&square_frame(30));
        wait_idle(&mut tracker);
        let latest = tracker.latest().unwrap();
        assert_eq!(latest.boxes, vec![BlobBox::new(20, 30, 50, 40)]);
        assert_eq!((latest.frame_width, latest.frame_height), (160, 120));
    }

    #[test]
    fn test_submissions_coalesce_while_busy() {
        let mut tracker = MotionTracker::new(params(), true).unwrap();
        for i in 0..10 {
            tracker.submit(&square_frame(i * 5));
        }
        assert!(tracker.is_busy());
        assert!(tracker.has_pending());
        wait_idle(&mut tracker);

        let stats = tracker.stats();
        assert_eq!(stats.submitted, 10);
        assert_eq!(stats.coalesced, 8);
        assert_eq!(stats.completed, 2);
    }

    #[test]
    fn test_disable_clears_immediately() {
        let mut tracker = MotionTracker::new(params(), true).unwrap();
        tracker.submit(&square_frame(0));
        wait_idle(&mut tracker);
        tracker.submit(&square_frame(10));
        tracker.submit(&square_frame(20));
        let version = tracker.version();

        tracker.set_params(BlobParams {
            enabled: false,
            ..params()
        });
        assert!(tracker.latest().is_none());
        assert!(!tracker.has_pending());
        assert!(tracker.version() > version);

        tracker.submit(&square_frame(30));
        assert!(!tracker.has_pending());
        wait_idle(&mut tracker);
        assert!(tracker.latest().is_none());
    }

    #[test]
    fn test_param_change_resets_state() {
        let mut tracker = MotionTracker::new(params(), true).unwrap();
        tracker.submit(&square_frame(20));
        wait_idle(&mut tracker);

        tracker.set_params(BlobParams {
            threshold: 30,
            ..params()
        });
        // Would be a moving square without the reset; now it only seeds.
        tracker.submit(&square_frame(40));
        wait_idle(&mut tracker);
        assert!(tracker.latest().unwrap().boxes.is_empty());
    }

    #[test]
    fn test_rate_limit_drops_submissions() {
        let mut tracker = MotionTracker::new(
            BlobParams {
                max_rate_hz: 1,
                ..params()
            },
            true,
        )
        .unwrap();
        tracker.submit(&square_frame(0));
        tracker.submit(&square_frame(5));
        tracker.submit(&square_frame(10));
        assert_eq!(tracker.stats().submitted, 1);
        assert_eq!(tracker.stats().rate_limited, 2);
    }

    #[test]
    fn test_shutdown_discards_work() {
        let mut tracker = MotionTracker::new(params(), false).unwrap();
        tracker.submit(&square_frame(0));
        tracker.submit(&square_frame(5));
        tracker.shutdown();
        assert!(!tracker.has_pending());
        tracker.submit(&square_frame(10));
        assert_eq!(tracker.stats().submitted, 2);
    }
}
