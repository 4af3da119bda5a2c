//! Environment checks for desktop capture.

use glance_platform_core::ScreenGrabber;

use crate::display::{detect_display_server, DisplayServer};

/// A system capability that Glance may need.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

/// Check all capabilities and report status.
pub fn check_capabilities(grabber: &dyn ScreenGrabber) -> Vec<Capability> {
    let server = detect_display_server();
    vec![
        check_display_session(server),
        check_monitor_access(grabber),
        check_monitor_sessions(server),
    ]
}

fn check_display_session(server: DisplayServer) -> Capability {
    let available = server != DisplayServer::Unknown;
    Capability {
        name: "Display Session".to_string(),
        description: format!("Graphical session ({server})"),
        available,
        required: true,
        fix_instructions: (!available).then(|| {
            "Run Glance inside a graphical desktop session (DISPLAY or WAYLAND_DISPLAY must be set)"
                .to_string()
        }),
    }
}

fn check_monitor_access(grabber: &dyn ScreenGrabber) -> Capability {
    let (available, description) = match grabber.monitors() {
        Ok(monitors) if !monitors.is_empty() => (true, format!("{} monitor(s) detected", monitors.len())),
        Ok(_) => (false, "No monitors reported".to_string()),
        Err(e) => (false, format!("Monitor enumeration failed: {e}")),
    };
    Capability {
        name: "Screen Capture".to_string(),
        description,
        available,
        required: true,
        fix_instructions: (!available).then(|| {
            "Grant screen-recording permission to the terminal or Glance binary".to_string()
        }),
    }
}

fn check_monitor_sessions(server: DisplayServer) -> Capability {
    let available = server.supports_monitor_sessions();
    Capability {
        name: "Monitor Sessions".to_string(),
        description: "Pooled and low-latency capture backends".to_string(),
        available,
        required: false,
        fix_instructions: (!available).then(|| {
            "Use an X11 session for pooled/low-latency capture; software capture still works".to_string()
        }),
    }
}

/// Print a human-readable capability report.
pub fn print_capability_report(caps: &[Capability]) {
    println!("=== Glance Capability Report ===\n");
    for cap in caps {
        let status = if cap.available { "OK" } else { "MISSING" };
        let req = if cap.required { "(required)" } else { "(optional)" };
        println!("[{status}] {}: {} {req}", cap.name, cap.description);
        if let Some(fix) = &cap.fix_instructions {
            println!("       Fix: {fix}");
        }
    }

    let missing_required: Vec<_> = caps.iter().filter(|c| c.required && !c.available).collect();
    if missing_required.is_empty() {
        println!("\nAll required capabilities available.");
    } else {
        println!(
            "\n{} required capabilities missing. Glance may not work correctly.",
            missing_required.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_platform_core::synthetic::SyntheticDesktop;

    #[test]
    fn test_monitor_access_reported() {
        let desktop = SyntheticDesktop::single_monitor(640, 480);
        let cap = check_monitor_access(&desktop);
        assert!(cap.available);
        assert!(cap.fix_instructions.is_none());

        let empty = SyntheticDesktop::new(Vec::new());
        assert!(!check_monitor_access(&empty).available);
    }

    #[test]
    fn test_unknown_session_has_fix() {
        let cap = check_display_session(DisplayServer::Unknown);
        assert!(!cap.available);
        assert!(cap.fix_instructions.is_some());
    }
}
