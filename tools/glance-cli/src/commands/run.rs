//! Mirror a window into a headless surface.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glance_common::config::{AppConfig, StreamConfig};
use glance_platform_core::synthetic::SyntheticDesktop;
use glance_platform_core::{capturable_windows, Capabilities, ScreenGrabber, WindowId, WindowProvider};
use glance_platform_desktop::{DesktopGrabber, DesktopWindows};
use glance_render_engine::{HeadlessSurface, Presented, RenderLoop, TickOutcome};
use tokio::time::MissedTickBehavior;

use crate::RunArgs;

/// Command-line overrides on top of the configured stream settings.
fn stream_config(mut stream: StreamConfig, args: &RunArgs) -> StreamConfig {
    if let Some(fps) = args.fps {
        stream.target_fps = fps;
    }
    let effects = &mut stream.effects;
    if let Some(backend) = args.backend {
        effects.capture_backend = backend;
    }
    if let Some(backend) = args.effects {
        effects.effects_backend = backend;
    }
    if let Some(brightness) = args.brightness {
        effects.brightness = brightness;
    }
    if let Some(contrast) = args.contrast {
        effects.contrast = contrast;
    }
    if let Some(scale) = args.scale {
        effects.scale_percent = scale;
    }
    effects.fast_mode |= args.fast;
    effects.client_area_only |= args.client_area;
    effects.async_mode |= args.async_mode;
    stream.blob.enabled |= args.blobs;
    stream.sanitized()
}

fn find_target(windows: &dyn WindowProvider, args: &RunArgs) -> anyhow::Result<WindowId> {
    if let Some(handle) = args.window {
        return Ok(WindowId(handle));
    }
    let title = args
        .title
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("Pass --window, --title or --demo"))?;
    let needle = title.to_lowercase();
    let candidates = capturable_windows(
        windows
            .list()
            .map_err(|e| anyhow::anyhow!("Failed to list windows: {e}"))?,
    );
    candidates
        .iter()
        .find(|w| w.title.to_lowercase().contains(&needle))
        .map(|w| w.id)
        .ok_or_else(|| anyhow::anyhow!("No window title contains '{title}'"))
}

pub async fn run(mut config: AppConfig, args: RunArgs) -> anyhow::Result<()> {
    if let Some(name) = &args.profile {
        config
            .apply_profile(name)
            .map_err(|e| anyhow::anyhow!("Failed to apply profile: {e}"))?;
    }
    let stream = stream_config(config.stream.clone(), &args);

    let (grabber, windows, target, demo): (Arc<dyn ScreenGrabber>, Arc<dyn WindowProvider>, WindowId, _) =
        if args.demo {
            let (desktop, id) = SyntheticDesktop::demo();
            (
                Arc::new(desktop.clone()),
                Arc::new(desktop.clone()),
                id,
                Some(desktop),
            )
        } else {
            let windows = DesktopWindows::new();
            let target = find_target(&windows, &args)?;
            (Arc::new(DesktopGrabber::new()), Arc::new(windows), target, None)
        };

    let caps = Capabilities::probe(grabber.as_ref(), true, false);
    let mut render_loop = RenderLoop::new(&stream, grabber, windows, caps)
        .map_err(|e| anyhow::anyhow!("Failed to start render loop: {e}"))?;
    render_loop.set_target_window(Some(target));
    render_loop.on_fps(|fps| tracing::info!("Frame rate: {:.1} fps", fps));

    let mut surface = HeadlessSurface::new(args.width, args.height);

    println!("Mirroring window {target} at {} fps", render_loop.target_fps());
    println!("  Capture backend: {}", render_loop.settings().capture_backend);
    println!("  Effects backend: {}", render_loop.settings().effects_backend);
    println!("  Motion highlighting: {}", render_loop.blob_params().enabled);
    println!();
    println!("Press Ctrl+C to stop...");

    let mut interval = tokio::time::interval(render_loop.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline = args.duration.map(|secs| Instant::now() + Duration::from_secs_f64(secs.max(0.0)));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last_message: Option<String> = None;
    let mut last_version = 0;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = interval.tick() => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    break;
                }
                if let Some(desktop) = &demo {
                    desktop.step();
                }

                let report = render_loop.tick(&mut surface);
                if let Some(notice) = &report.notice {
                    println!("{notice}");
                }
                match report.outcome {
                    TickOutcome::Diagnostic(text) => {
                        if last_message.as_deref() != Some(text.as_str()) {
                            tracing::warn!("{}", text);
                            last_message = Some(text);
                        }
                    }
                    _ => last_message = None,
                }

                let version = render_loop.tracker().version();
                if version != last_version {
                    last_version = version;
                    if let Some(result) = render_loop.tracker().latest() {
                        tracing::debug!(
                            blobs = result.boxes.len(),
                            largest = ?result.boxes.first(),
                            "Motion updated"
                        );
                    }
                }
            }
        }
    }

    render_loop.shutdown();

    let capture = render_loop.source().stats();
    let tracker = render_loop.tracker().stats();
    println!();
    println!("Frames presented: {}", surface.frames());
    println!(
        "Capture: {} captured, {} missed ({:.1}%), {} fast path, {} fallbacks",
        capture.frames_captured,
        capture.frames_missed,
        capture.miss_rate(),
        capture.fast_path_frames,
        capture.fallbacks
    );
    println!(
        "Motion: {} submitted, {} coalesced, {} rate limited, {} completed",
        tracker.submitted, tracker.coalesced, tracker.rate_limited, tracker.completed
    );

    if let Some(path) = &args.snapshot {
        match surface.last() {
            Some(Presented::Raster(image)) => {
                image.save(path)?;
                println!("Snapshot saved to: {}", path.display());
            }
            _ => println!("No frame to save."),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_frame_model::CaptureBackendKind;

    fn args() -> RunArgs {
        RunArgs {
            window: None,
            title: None,
            demo: true,
            profile: None,
            fps: None,
            backend: None,
            effects: None,
            brightness: None,
            contrast: None,
            scale: None,
            fast: false,
            client_area: false,
            async_mode: false,
            blobs: false,
            duration: None,
            width: 640,
            height: 480,
            snapshot: None,
        }
    }

    #[test]
    fn test_overrides_apply_and_sanitize() {
        let mut a = args();
        a.fps = Some(0);
        a.scale = Some(500);
        a.backend = Some(CaptureBackendKind::Pooled);
        a.blobs = true;
        let stream = stream_config(StreamConfig::default(), &a);
        assert_eq!(stream.target_fps, 1);
        assert_eq!(stream.effects.scale_percent, 100);
        assert_eq!(stream.effects.capture_backend, CaptureBackendKind::Pooled);
        assert!(stream.blob.enabled);
    }

    #[test]
    fn test_unset_overrides_keep_config() {
        let mut base = StreamConfig::default();
        base.target_fps = 12;
        base.effects.fast_mode = true;
        let stream = stream_config(base, &args());
        assert_eq!(stream.target_fps, 12);
        assert!(stream.effects.fast_mode);
    }

    #[test]
    fn test_find_target_by_title() {
        let (desktop, id) = SyntheticDesktop::demo();
        let mut a = args();
        a.title = Some("DEMO".to_string());
        assert_eq!(find_target(&desktop, &a).unwrap(), id);

        a.title = Some("missing".to_string());
        assert!(find_target(&desktop, &a).is_err());

        a.title = None;
        a.window = Some(7);
        assert_eq!(find_target(&desktop, &a).unwrap(), WindowId(7));
    }
}
