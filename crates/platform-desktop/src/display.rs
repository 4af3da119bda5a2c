//! Display server detection.

/// Display server / platform family used for capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayServer {
    Wayland,
    X11,
    Windows,
    MacOS,
    #[default]
    Unknown,
}

impl DisplayServer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wayland => "wayland",
            Self::X11 => "x11",
            Self::Windows => "windows",
            Self::MacOS => "macos",
            Self::Unknown => "unknown",
        }
    }

    /// Whether repeated monitor grabs are cheap enough to back a
    /// streaming session. Wayland routes every grab through the
    /// screenshot portal, so only one-shot snapshots are offered there.
    pub fn supports_monitor_sessions(&self) -> bool {
        matches!(self, Self::X11 | Self::Windows | Self::MacOS)
    }
}

impl std::fmt::Display for DisplayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the current display server.
pub fn detect_display_server() -> DisplayServer {
    if cfg!(target_os = "windows") {
        DisplayServer::Windows
    } else if cfg!(target_os = "macos") {
        DisplayServer::MacOS
    } else if std::env::var("WAYLAND_DISPLAY").is_ok() {
        DisplayServer::Wayland
    } else if std::env::var("DISPLAY").is_ok() {
        DisplayServer::X11
    } else {
        DisplayServer::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_session_support() {
        assert!(DisplayServer::X11.supports_monitor_sessions());
        assert!(!DisplayServer::Wayland.supports_monitor_sessions());
        assert!(!DisplayServer::Unknown.supports_monitor_sessions());
    }
}
