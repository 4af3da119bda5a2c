//! List windows that can be mirrored.

use glance_platform_core::{capturable_windows, WindowProvider};
use glance_platform_desktop::DesktopWindows;

pub fn run(all: bool, json: bool) -> anyhow::Result<()> {
    let windows = DesktopWindows::new()
        .list()
        .map_err(|e| anyhow::anyhow!("Failed to list windows: {e}"))?;
    let windows = if all { windows } else { capturable_windows(windows) };

    if json {
        println!("{}", serde_json::to_string_pretty(&windows)?);
        return Ok(());
    }

    if windows.is_empty() {
        println!("No windows found.");
        return Ok(());
    }

    println!("{:<12} {:<20} {:<24} TITLE", "HANDLE", "APP", "BOUNDS");
    for w in &windows {
        let mut flags = String::new();
        if w.focused {
            flags.push_str(" [focused]");
        }
        if w.minimized {
            flags.push_str(" [minimized]");
        }
        println!(
            "{:<12} {:<20} {:<24} {}{}",
            w.id.0,
            truncate(&w.app_name, 20),
            w.rect.to_string(),
            w.title,
            flags
        );
    }
    println!();
    println!("{} window(s). Mirror one with `glance run --window <HANDLE>`.", windows.len());

    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('~');
    out
}
