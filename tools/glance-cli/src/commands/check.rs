//! Check system capabilities.

use glance_platform_core::{Capabilities, ScreenGrabber};
use glance_platform_desktop::permissions::{check_capabilities, print_capability_report};
use glance_platform_desktop::DesktopGrabber;

pub fn run() -> anyhow::Result<()> {
    println!("Glance System Check");
    println!("{}", "=".repeat(50));

    let grabber = DesktopGrabber::new();
    println!("[OK] Display server: {}", grabber.display_server());

    match grabber.monitors() {
        Ok(monitors) => {
            println!("[OK] Monitors detected: {}", monitors.len());
            for m in &monitors {
                println!(
                    "     {} {}x{} at ({}, {}) (scale: {}x) {}",
                    m.name,
                    m.width,
                    m.height,
                    m.x,
                    m.y,
                    m.scale_factor,
                    if m.primary { "(primary)" } else { "" }
                );
            }
        }
        Err(e) => println!("[WARN] Monitors unavailable: {e}"),
    }

    // The CLI has no GPU surface; the viewer probes its own.
    let caps = Capabilities::probe(&grabber, true, false);
    println!();
    println!("Capture backends:");
    for kind in caps.available_backends() {
        println!("     {kind}");
    }
    println!("Vision library: {}", if caps.vision { "yes" } else { "no" });
    println!("GPU path: viewer only (OpenGL)");

    println!();
    print_capability_report(&check_capabilities(&grabber));

    Ok(())
}
