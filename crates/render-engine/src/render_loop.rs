//! Fixed-interval driver tying capture, processing, analysis and display
//! together.
//!
//! Each tick resolves the target window's region, grabs a frame, hands a
//! copy to the motion tracker, processes the frame for display, applies
//! the overlay and presents. Anything that goes wrong becomes diagnostic
//! text on the surface; the next tick simply tries again.

use std::sync::Arc;
use std::time::Duration;

use glance_capture_engine::{crop_client_area, resolve_capture_rect, CaptureSource, FallbackNotice};
use glance_common::clock::{FpsMeter, SessionClock, TickTimer};
use glance_common::config::StreamConfig;
use glance_common::error::GlanceResult;
use glance_frame_model::{
    BlobParams, CaptureBackendKind, CropMargins, EffectSettings, EffectsBackendKind, MAX_SCALE_PERCENT,
    MIN_SCALE_PERCENT,
};
use glance_platform_core::{Capabilities, ScreenGrabber, WindowId, WindowProvider};
use glance_processing_core::{FrameProcessor, MotionTracker};

use crate::gpu::Shading;
use crate::overlay::{draw_raster_overlay, GpuOverlayCache};
use crate::surface::{fit_to_viewport, DisplaySurface};

/// What a tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A new picture reached the surface.
    Presented { width: u32, height: u32, gpu: bool },
    /// Every processing stage failed; the previous picture stays up.
    KeptPrevious,
    /// Nothing to show this tick; the text went to the surface.
    Diagnostic(String),
}

/// Result of one [`RenderLoop::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// Set on the tick a capture backend was abandoned.
    pub notice: Option<FallbackNotice>,
    /// Measured rate, at most once per second.
    pub fps: Option<f64>,
}

type FpsObserver = Box<dyn FnMut(f64)>;

pub struct RenderLoop {
    windows: Arc<dyn WindowProvider>,
    caps: Capabilities,
    target: Option<WindowId>,
    settings: EffectSettings,
    source: CaptureSource,
    processor: FrameProcessor,
    tracker: MotionTracker,
    overlay: GpuOverlayCache,
    timer: TickTimer,
    fps: FpsMeter,
    clock: SessionClock,
    observers: Vec<FpsObserver>,
    target_fps: u32,
}

impl RenderLoop {
    pub fn new(
        config: &StreamConfig,
        grabber: Arc<dyn ScreenGrabber>,
        windows: Arc<dyn WindowProvider>,
        caps: Capabilities,
    ) -> GlanceResult<Self> {
        let config = config.sanitized();
        let mut settings = config.effects.clone();

        let mut source = CaptureSource::new(grabber, caps, config.target_fps);
        source.set_foreground_fast_path(config.foreground_fast_path);
        source.set_async_mode(settings.async_mode);
        if let Err(e) = source.select_backend(settings.capture_backend) {
            tracing::warn!("{}, using software capture", e);
            settings.capture_backend = CaptureBackendKind::Software;
        }

        let tracker = MotionTracker::new(config.blob.clone(), caps.vision)?;
        let clock = SessionClock::start();

        tracing::info!(
            fps = config.target_fps,
            backend = %settings.capture_backend,
            effects = %settings.effects_backend,
            blobs = config.blob.enabled,
            "Render loop ready"
        );

        Ok(Self {
            windows,
            caps,
            target: None,
            settings,
            processor: FrameProcessor::new(&caps),
            source,
            tracker,
            overlay: GpuOverlayCache::new(),
            timer: TickTimer::new(config.target_fps),
            fps: FpsMeter::new(clock.elapsed_ns()),
            clock,
            observers: Vec::new(),
            target_fps: config.target_fps,
        })
    }

    /// Use a shorter stall timeout for capture sessions.
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.source.set_stall_timeout(timeout);
        self
    }

    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    pub fn blob_params(&self) -> &BlobParams {
        self.tracker.params()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn target(&self) -> Option<WindowId> {
        self.target
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Timer interval, `max(1, 1000 / fps)` ms.
    pub fn interval(&self) -> Duration {
        self.timer.interval()
    }

    pub fn source(&self) -> &CaptureSource {
        &self.source
    }

    pub fn tracker(&self) -> &MotionTracker {
        &self.tracker
    }

    /// Register a callback for measured frame rates.
    pub fn on_fps(&mut self, observer: impl FnMut(f64) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn set_target_window(&mut self, id: Option<WindowId>) {
        if self.target != id {
            tracing::info!(window = ?id.map(|w| w.to_string()), "Target window changed");
            self.target = id;
        }
    }

    /// Switch capture backend. Unavailable backends are rejected and the
    /// current one stays active.
    pub fn set_capture_backend(&mut self, kind: CaptureBackendKind) -> GlanceResult<()> {
        self.source.select_backend(kind)?;
        self.settings.capture_backend = kind;
        Ok(())
    }

    pub fn set_effects_backend(&mut self, kind: EffectsBackendKind) {
        self.settings.effects_backend = kind;
    }

    pub fn set_brightness(&mut self, brightness: f32) {
        self.settings.brightness = brightness;
        self.settings = self.settings.sanitized();
    }

    pub fn set_contrast(&mut self, contrast: f32) {
        self.settings.contrast = contrast;
        self.settings = self.settings.sanitized();
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        let fps = fps.max(1);
        if fps == self.target_fps {
            return;
        }
        self.target_fps = fps;
        self.timer.set_target_fps(fps);
        self.source.set_target_rate(fps);
        self.fps.reset(self.clock.elapsed_ns());
    }

    pub fn set_scale_percent(&mut self, percent: u32) {
        self.settings.scale_percent = percent.clamp(MIN_SCALE_PERCENT, MAX_SCALE_PERCENT);
    }

    pub fn set_fast_mode(&mut self, enabled: bool) {
        self.settings.fast_mode = enabled;
    }

    /// Has no effect on presentation when the GPU path is unavailable.
    pub fn set_gpu_mode(&mut self, enabled: bool) {
        if enabled && !self.caps.gpu {
            tracing::debug!("GPU mode requested but unavailable");
        }
        self.settings.gpu_mode = enabled;
        if !enabled {
            self.overlay.clear();
        }
    }

    pub fn set_client_area_only(&mut self, enabled: bool) {
        self.settings.client_area_only = enabled;
    }

    pub fn set_async_mode(&mut self, enabled: bool) {
        self.settings.async_mode = enabled;
        self.source.set_async_mode(enabled);
    }

    pub fn set_crop(&mut self, crop: CropMargins) {
        self.settings.crop = crop;
    }

    pub fn set_foreground_fast_path(&mut self, enabled: bool) {
        self.source.set_foreground_fast_path(enabled);
    }

    /// Replace the motion parameters. Disabling clears the overlay at once.
    pub fn set_blob_params(&mut self, params: BlobParams) {
        let enabled = params.enabled;
        self.tracker.set_params(params);
        if !enabled {
            self.overlay.clear();
        }
    }

    /// Apply a whole stream configuration, e.g. a saved profile.
    pub fn apply_config(&mut self, config: &StreamConfig) {
        let config = config.sanitized();
        let effects = config.effects;
        if let Err(e) = self.set_capture_backend(effects.capture_backend) {
            tracing::warn!("{}", e);
        }
        self.set_async_mode(effects.async_mode);
        self.set_target_fps(config.target_fps);
        self.set_foreground_fast_path(config.foreground_fast_path);
        self.settings = EffectSettings {
            capture_backend: self.settings.capture_backend,
            ..effects
        };
        self.set_blob_params(config.blob);
    }

    /// Gate for callers driving the loop from a free-running timer.
    pub fn should_tick(&mut self) -> bool {
        let now = self.clock.elapsed_ns();
        self.timer.should_tick(now)
    }

    pub fn tick(&mut self, surface: &mut dyn DisplaySurface) -> TickReport {
        let now = self.clock.elapsed_ns();
        self.tick_at(surface, now)
    }

    /// One tick with an explicit monotonic timestamp for FPS measurement.
    pub fn tick_at(&mut self, surface: &mut dyn DisplaySurface, now_ns: u64) -> TickReport {
        let mut notice = None;
        let outcome = self.run_tick(surface, &mut notice);
        if let TickOutcome::Diagnostic(text) = &outcome {
            surface.show_message(text);
        }

        let fps = match outcome {
            TickOutcome::Presented { .. } => self.fps.record_frame(now_ns),
            _ => None,
        };
        if let Some(rate) = fps {
            tracing::debug!(fps = rate, "Measured frame rate");
            for observer in self.observers.iter_mut() {
                observer(rate);
            }
        }

        TickReport { outcome, notice, fps }
    }

    fn run_tick(&mut self, surface: &mut dyn DisplaySurface, notice: &mut Option<FallbackNotice>) -> TickOutcome {
        let settings = self.settings.clone();
        let Some(id) = self.target else {
            return TickOutcome::Diagnostic("No window selected".to_string());
        };

        let window = match self.windows.query(id) {
            Ok(Some(window)) => window,
            Ok(None) => return TickOutcome::Diagnostic(format!("Window {id} is gone")),
            Err(e) => return TickOutcome::Diagnostic(format!("Window {id} unavailable: {e}")),
        };
        if window.minimized {
            return TickOutcome::Diagnostic(format!("Window {id} is minimized"));
        }

        let rect = resolve_capture_rect(Some(&window), settings.client_area_only, &settings.crop);
        if !rect.is_valid() {
            return TickOutcome::Diagnostic(format!("Invalid capture region {rect}"));
        }

        let foreground = self.windows.is_foreground(id);
        let frame = self.source.grab(&rect, foreground);
        if let Some(n) = self.source.take_notice() {
            self.settings.capture_backend = CaptureBackendKind::Software;
            *notice = Some(n);
        }
        let Some(frame) = frame else {
            return TickOutcome::Diagnostic(format!(
                "No frame from {} capture",
                self.source.active_backend()
            ));
        };
        let frame = if settings.client_area_only {
            crop_client_area(frame, &window)
        } else {
            frame
        };

        if self.tracker.is_enabled() {
            self.tracker.submit(&frame);
        }
        self.tracker.poll();
        let motion = self.tracker.latest();
        let style = &self.tracker.params().style;

        let viewport = surface.viewport_size();
        if settings.gpu_mode && self.caps.gpu && surface.gpu_available() {
            let gpu = self.processor.gpu_frame(&frame, &settings);
            let (width, height) = (gpu.width, gpu.height);
            let layer = self.overlay.layer(
                viewport,
                (width, height),
                motion.as_deref(),
                self.tracker.version(),
                style,
            );
            surface.present_gpu(gpu, Shading::from_settings(&settings), layer);
            return TickOutcome::Presented {
                width,
                height,
                gpu: true,
            };
        }

        let Some(mut image) = self.processor.process(&frame, &settings) else {
            return TickOutcome::KeptPrevious;
        };
        if let Some(result) = motion.as_deref() {
            draw_raster_overlay(&mut image, result, style);
        }
        let image = fit_to_viewport(image, viewport, settings.fast_mode);
        let (width, height) = image.dimensions();
        surface.present_raster(image);
        TickOutcome::Presented {
            width,
            height,
            gpu: false,
        }
    }

    /// Close capture sessions and drop pending analysis.
    pub fn shutdown(&mut self) {
        self.source.stop();
        self.tracker.shutdown();
        self.overlay.clear();
        tracing::info!("Render loop stopped");
    }
}
