//! Live-tunable stream settings.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::geometry::CropMargins;

pub const MIN_SCALE_PERCENT: u32 = 10;
pub const MAX_SCALE_PERCENT: u32 = 100;

/// Capture backend variants, in increasing order of latency advantage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureBackendKind {
    /// One-shot region snapshot per tick. Always available.
    #[default]
    Software,
    /// Monitor-bound session, optionally fed by a frame pump.
    Pooled,
    /// Event-driven monitor stream into a single-slot buffer.
    LowLatency,
}

impl CaptureBackendKind {
    pub const ALL: [CaptureBackendKind; 3] = [Self::Software, Self::Pooled, Self::LowLatency];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Software => "software",
            Self::Pooled => "pooled",
            Self::LowLatency => "low_latency",
        }
    }
}

impl std::fmt::Display for CaptureBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "software" | "snapshot" => Ok(Self::Software),
            "pooled" | "pool" => Ok(Self::Pooled),
            "low_latency" | "low-latency" | "lowlatency" => Ok(Self::LowLatency),
            other => Err(format!("unknown capture backend: {other}")),
        }
    }
}

/// Preferred numeric backend for frame conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectsBackendKind {
    /// Vision library when available, otherwise vectorized.
    #[default]
    Auto,
    Vectorized,
    Vision,
    /// Only the always-available image-library path.
    Portable,
}

impl EffectsBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Vectorized => "vectorized",
            Self::Vision => "vision",
            Self::Portable => "portable",
        }
    }
}

impl std::fmt::Display for EffectsBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectsBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "vectorized" | "lut" => Ok(Self::Vectorized),
            "vision" => Ok(Self::Vision),
            "portable" | "image" => Ok(Self::Portable),
            other => Err(format!("unknown effects backend: {other}")),
        }
    }
}

/// Per-stream display settings, read once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    /// Multiplier applied after contrast (1.0 = unchanged).
    pub brightness: f32,
    /// Contrast around mid-grey (1.0 = unchanged).
    pub contrast: f32,
    /// Output size as a percentage of the captured frame (10..=100).
    pub scale_percent: u32,
    /// Prefer nearest-neighbour filtering everywhere.
    pub fast_mode: bool,
    /// Present through the GPU shading path.
    pub gpu_mode: bool,
    /// Capture the client area instead of the whole window.
    pub client_area_only: bool,
    /// Run the pooled backend with a frame-pump thread.
    pub async_mode: bool,
    pub capture_backend: CaptureBackendKind,
    pub effects_backend: EffectsBackendKind,
    pub crop: CropMargins,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            scale_percent: 100,
            fast_mode: false,
            gpu_mode: false,
            client_area_only: false,
            async_mode: false,
            capture_backend: CaptureBackendKind::Software,
            effects_backend: EffectsBackendKind::Auto,
            crop: CropMargins::NONE,
        }
    }
}

impl EffectSettings {
    /// Copy with every field forced into its legal range.
    pub fn sanitized(&self) -> Self {
        let finite_or_one = |v: f32| if v.is_finite() { v.max(0.0) } else { 1.0 };
        Self {
            brightness: finite_or_one(self.brightness),
            contrast: finite_or_one(self.contrast),
            scale_percent: self.scale_percent.clamp(MIN_SCALE_PERCENT, MAX_SCALE_PERCENT),
            ..self.clone()
        }
    }

    /// True when brightness, contrast and scale leave pixels untouched.
    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0 && self.contrast == 1.0 && self.scale_percent == 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names_round_trip() {
        for kind in CaptureBackendKind::ALL {
            assert_eq!(kind.as_str().parse::<CaptureBackendKind>(), Ok(kind));
        }
        assert_eq!("Low-Latency".parse(), Ok(CaptureBackendKind::LowLatency));
        assert!("dxgi".parse::<CaptureBackendKind>().is_err());
    }

    #[test]
    fn test_sanitized_clamps() {
        let settings = EffectSettings {
            brightness: f32::NAN,
            contrast: -2.0,
            scale_percent: 400,
            ..Default::default()
        };
        let clean = settings.sanitized();
        assert_eq!(clean.brightness, 1.0);
        assert_eq!(clean.contrast, 0.0);
        assert_eq!(clean.scale_percent, 100);
    }

    #[test]
    fn test_identity() {
        assert!(EffectSettings::default().is_identity());
        let dimmed = EffectSettings {
            brightness: 0.8,
            ..Default::default()
        };
        assert!(!dimmed.is_identity());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: EffectSettings =
            serde_json::from_str(r#"{"brightness": 1.5, "capture_backend": "low_latency"}"#).unwrap();
        assert_eq!(settings.brightness, 1.5);
        assert_eq!(settings.capture_backend, CaptureBackendKind::LowLatency);
        assert_eq!(settings.scale_percent, 100);
    }
}
