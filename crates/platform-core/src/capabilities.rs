//! Capability flags resolved once at startup.

use glance_frame_model::CaptureBackendKind;
use serde::{Deserialize, Serialize};

use crate::ScreenGrabber;

/// Optional features available in this environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Pooled monitor capture.
    pub pooled: bool,
    /// Event-driven low-latency capture.
    pub low_latency: bool,
    /// Vision-library image operations (resize, morphology, contours).
    pub vision: bool,
    /// GPU presentation path.
    pub gpu: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::software_only()
    }
}

impl Capabilities {
    /// Only the always-available paths.
    pub const fn software_only() -> Self {
        Self {
            pooled: false,
            low_latency: false,
            vision: false,
            gpu: false,
        }
    }

    /// Probe capture support from the grabber; vision and GPU support
    /// come from the caller, which knows what it was built with.
    pub fn probe(grabber: &dyn ScreenGrabber, vision: bool, gpu: bool) -> Self {
        let caps = Self {
            pooled: grabber.supports(CaptureBackendKind::Pooled),
            low_latency: grabber.supports(CaptureBackendKind::LowLatency),
            vision,
            gpu,
        };
        tracing::debug!(grabber = grabber.name(), ?caps, "Capabilities probed");
        caps
    }

    pub fn supports_backend(&self, kind: CaptureBackendKind) -> bool {
        match kind {
            CaptureBackendKind::Software => true,
            CaptureBackendKind::Pooled => self.pooled,
            CaptureBackendKind::LowLatency => self.low_latency,
        }
    }

    /// Capture variants usable here, Software first.
    pub fn available_backends(&self) -> Vec<CaptureBackendKind> {
        CaptureBackendKind::ALL
            .into_iter()
            .filter(|k| self.supports_backend(*k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_software_always_supported() {
        let caps = Capabilities::software_only();
        assert!(caps.supports_backend(CaptureBackendKind::Software));
        assert!(!caps.supports_backend(CaptureBackendKind::LowLatency));
        assert_eq!(caps.available_backends(), vec![CaptureBackendKind::Software]);
    }

    #[test]
    fn test_available_backends_order() {
        let caps = Capabilities {
            pooled: true,
            low_latency: true,
            vision: true,
            gpu: false,
        };
        assert_eq!(caps.available_backends(), CaptureBackendKind::ALL.to_vec());
    }
}
