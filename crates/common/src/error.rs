//! Error types shared across Glance crates.

use std::path::PathBuf;

/// Top-level error type for Glance operations.
#[derive(Debug, thiserror::Error)]
pub enum GlanceError {
    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Window error: {message}")]
    Window { message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("Analysis error: {message}")]
    Analysis { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Platform error: {message}")]
    Platform { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error("Frame error: {0}")]
    Frame(#[from] glance_frame_model::FrameError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using GlanceError.
pub type GlanceResult<T> = Result<T, GlanceError>;

impl GlanceError {
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn window(msg: impl Into<String>) -> Self {
        Self::Window {
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether the error describes a missing or unusable target window
    /// rather than a broken backend.
    pub fn is_window_error(&self) -> bool {
        matches!(self, Self::Window { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_concern() {
        let err = GlanceError::capture("pool exhausted");
        assert_eq!(err.to_string(), "Capture error: pool exhausted");

        let err = GlanceError::unsupported("low-latency capture");
        assert_eq!(err.to_string(), "Unsupported operation: low-latency capture");
    }

    #[test]
    fn test_window_error_classification() {
        assert!(GlanceError::window("closed").is_window_error());
        assert!(!GlanceError::processing("layout").is_window_error());
    }
}
