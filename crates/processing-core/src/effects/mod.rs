//! Raw frame to displayable image.
//!
//! A processor walks a ladder of numeric stages and returns the first
//! success. Every stage produces an opaque RGBA image sized
//! `scale_percent%` of the source.

use glance_common::error::GlanceResult;
use glance_frame_model::{scaled_size, EffectSettings, EffectsBackendKind, FrameBuffer};
use glance_platform_core::Capabilities;
use image::RgbaImage;

use crate::convert;

pub mod portable;
pub mod vectorized;
pub mod vision;

/// One rung of the degrade ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reinterpret the buffer; only for identity settings.
    ZeroCopy,
    /// Index-table downscale plus lookup-table colour adjustment.
    Vectorized,
    /// Vision-library resize and per-pixel colour mapping.
    Vision,
    /// Image-library resample and enhancement. Always available.
    Portable,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroCopy => "zero_copy",
            Self::Vectorized => "vectorized",
            Self::Vision => "vision",
            Self::Portable => "portable",
        }
    }

    fn run(&self, frame: &FrameBuffer, settings: &EffectSettings, out: (u32, u32)) -> GlanceResult<RgbaImage> {
        match self {
            Self::ZeroCopy => convert::to_rgba_image(frame),
            Self::Vectorized => vectorized::process(frame, settings, out),
            Self::Vision => vision::process(frame, settings, out),
            Self::Portable => portable::process(frame, settings, out),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Brightness/contrast transfer shared by the vectorized and vision
/// stages: `clamp((v - 128) * contrast + 128) * brightness`, clamped again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorAdjust {
    pub brightness: f32,
    pub contrast: f32,
}

impl ColorAdjust {
    pub fn from_settings(settings: &EffectSettings) -> Self {
        Self {
            brightness: settings.brightness,
            contrast: settings.contrast,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0 && self.contrast == 1.0
    }

    #[inline]
    pub fn apply(&self, v: u8) -> u8 {
        let mut x = v as f32;
        if self.contrast != 1.0 {
            x = ((x - 128.0) * self.contrast + 128.0).clamp(0.0, 255.0);
        }
        if self.brightness != 1.0 {
            x *= self.brightness;
        }
        x.clamp(0.0, 255.0) as u8
    }

    pub fn lut(&self) -> [u8; 256] {
        let mut table = [0u8; 256];
        for (v, slot) in table.iter_mut().enumerate() {
            *slot = self.apply(v as u8);
        }
        table
    }
}

/// BGRA pixels for the GPU path. Brightness and contrast are left to the
/// shading stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Runs the degrade ladder for each tick.
#[derive(Debug)]
pub struct FrameProcessor {
    vision: bool,
    last_stage: Option<Stage>,
    failures: u64,
}

impl FrameProcessor {
    pub fn new(caps: &Capabilities) -> Self {
        Self {
            vision: caps.vision,
            last_stage: None,
            failures: 0,
        }
    }

    /// Stages tried for `settings`, in order.
    pub fn ladder(&self, settings: &EffectSettings) -> Vec<Stage> {
        let mut stages = Vec::with_capacity(4);
        if settings.is_identity() {
            stages.push(Stage::ZeroCopy);
        }
        match settings.effects_backend {
            EffectsBackendKind::Auto => {
                stages.push(Stage::Vectorized);
                if self.vision {
                    stages.push(Stage::Vision);
                }
            }
            EffectsBackendKind::Vectorized => stages.push(Stage::Vectorized),
            EffectsBackendKind::Vision if self.vision => stages.push(Stage::Vision),
            EffectsBackendKind::Vision | EffectsBackendKind::Portable => {}
        }
        stages.push(Stage::Portable);
        stages
    }

    /// Displayable image for one frame, or `None` when every stage failed.
    pub fn process(&mut self, frame: &FrameBuffer, settings: &EffectSettings) -> Option<RgbaImage> {
        let settings = settings.sanitized();
        let out = scaled_size(frame.width(), frame.height(), settings.scale_percent);

        for stage in self.ladder(&settings) {
            match stage.run(frame, &settings, out) {
                Ok(image) => {
                    if self.last_stage != Some(stage) {
                        tracing::debug!(%stage, width = out.0, height = out.1, "Effects stage active");
                        self.last_stage = Some(stage);
                    }
                    return Some(image);
                }
                Err(e) => {
                    tracing::debug!(%stage, "Effects stage failed: {}", e);
                }
            }
        }

        self.failures += 1;
        tracing::warn!(failures = self.failures, "Every effects stage failed, keeping previous frame");
        None
    }

    /// Raw BGRA bytes for the GPU path, nearest-downscaled when
    /// `scale_percent < 100`.
    pub fn gpu_frame(&self, frame: &FrameBuffer, settings: &EffectSettings) -> GpuFrame {
        let settings = settings.sanitized();
        let (width, height) = scaled_size(frame.width(), frame.height(), settings.scale_percent);
        GpuFrame {
            data: convert::to_bgra_bytes(frame, width, height),
            width,
            height,
        }
    }

    /// Stage that produced the last image.
    pub fn last_stage(&self) -> Option<Stage> {
        self.last_stage
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}
