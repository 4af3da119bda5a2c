//! Render loop ticks against the synthetic desktop and a headless surface.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glance_common::config::StreamConfig;
use glance_frame_model::{BlobParams, CaptureBackendKind, CaptureRect, CropMargins};
use glance_platform_core::synthetic::{Fill, Sprite, SyntheticDesktop};
use glance_platform_core::{Capabilities, WindowId};
use glance_render_engine::{HeadlessSurface, Presented, RenderLoop, TickOutcome};

fn caps(gpu: bool) -> Capabilities {
    Capabilities {
        pooled: true,
        low_latency: true,
        vision: false,
        gpu,
    }
}

fn desktop() -> (SyntheticDesktop, WindowId) {
    let desktop = SyntheticDesktop::single_monitor(400, 300);
    let id = desktop.add_window("target", CaptureRect::new(10, 10, 210, 150), Fill::Gradient);
    (desktop, id)
}

fn render_loop(desktop: &SyntheticDesktop, config: &StreamConfig, caps: Capabilities) -> RenderLoop {
    RenderLoop::new(config, Arc::new(desktop.clone()), Arc::new(desktop.clone()), caps).unwrap()
}

fn motion_config() -> StreamConfig {
    StreamConfig {
        blob: BlobParams {
            enabled: true,
            max_rate_hz: 0,
            analysis_scale_percent: 100,
            min_area: 1,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_no_window_selected() {
    let (desktop, _) = desktop();
    let mut rl = render_loop(&desktop, &StreamConfig::default(), Capabilities::software_only());
    let mut surface = HeadlessSurface::new(320, 240);

    let report = rl.tick(&mut surface);
    assert_eq!(report.outcome, TickOutcome::Diagnostic("No window selected".to_string()));
    assert_eq!(surface.last_message(), Some("No window selected"));
    assert_eq!(surface.frames(), 0);
    assert_eq!(desktop.region_grab_count(), 0);
}

#[test]
fn test_closed_and_minimized_windows_show_diagnostics() {
    let (desktop, id) = desktop();
    let mut rl = render_loop(&desktop, &StreamConfig::default(), Capabilities::software_only());
    let mut surface = HeadlessSurface::new(320, 240);
    rl.set_target_window(Some(id));

    desktop.set_minimized(id, true);
    rl.tick(&mut surface);
    assert!(surface.last_message().unwrap().contains("minimized"));

    desktop.set_minimized(id, false);
    assert!(matches!(rl.tick(&mut surface).outcome, TickOutcome::Presented { .. }));

    desktop.close_window(id);
    rl.tick(&mut surface);
    assert!(surface.last_message().unwrap().contains("gone"));
    assert_eq!(surface.frames(), 1);
}

#[test]
fn test_raster_fits_viewport() {
    let (desktop, id) = desktop();
    let mut rl = render_loop(&desktop, &StreamConfig::default(), Capabilities::software_only());
    let mut surface = HeadlessSurface::new(100, 100);
    rl.set_target_window(Some(id));

    let report = rl.tick(&mut surface);
    assert_eq!(
        report.outcome,
        TickOutcome::Presented {
            width: 100,
            height: 70,
            gpu: false
        }
    );
    match surface.last() {
        Some(Presented::Raster(image)) => {
            assert_eq!(image.dimensions(), (100, 70));
            assert!(image.pixels().all(|p| p.0[3] == 255));
        }
        other => panic!("expected raster, got {other:?}"),
    }
}

#[test]
fn test_crop_and_scale_apply_next_tick() {
    let (desktop, id) = desktop();
    let mut rl = render_loop(&desktop, &StreamConfig::default(), Capabilities::software_only());
    let mut surface = HeadlessSurface::new(1000, 1000);
    rl.set_target_window(Some(id));

    rl.set_crop(CropMargins {
        left: 10,
        top: 10,
        right: 10,
        bottom: 10,
    });
    rl.set_scale_percent(50);
    rl.set_fast_mode(true);
    rl.tick(&mut surface);

    // 180x120 after the crop, 90x60 after scaling, then fit to 1000x1000.
    match surface.last() {
        Some(Presented::Raster(image)) => assert_eq!(image.dimensions(), (1000, 666)),
        other => panic!("expected raster, got {other:?}"),
    }
}

#[test]
fn test_fallback_updates_settings() {
    let desktop = SyntheticDesktop::new(Vec::new());
    let id = desktop.add_window("target", CaptureRect::new(0, 0, 120, 80), Fill::Solid([50, 60, 70, 255]));
    let mut config = StreamConfig::default();
    config.effects.capture_backend = CaptureBackendKind::Pooled;
    let mut rl = render_loop(&desktop, &config, caps(false));
    assert_eq!(rl.settings().capture_backend, CaptureBackendKind::Pooled);

    let mut surface = HeadlessSurface::new(120, 80);
    rl.set_target_window(Some(id));
    let report = rl.tick(&mut surface);

    assert!(matches!(report.outcome, TickOutcome::Presented { .. }));
    let notice = report.notice.unwrap();
    assert_eq!(notice.from, CaptureBackendKind::Pooled);
    assert_eq!(rl.settings().capture_backend, CaptureBackendKind::Software);
    assert!(rl.tick(&mut surface).notice.is_none());
}

#[test]
fn test_unsupported_configured_backend_starts_on_software() {
    let (desktop, _) = desktop();
    let mut config = StreamConfig::default();
    config.effects.capture_backend = CaptureBackendKind::LowLatency;
    let mut rl = render_loop(&desktop, &config, Capabilities::software_only());
    assert_eq!(rl.settings().capture_backend, CaptureBackendKind::Software);

    assert!(rl.set_capture_backend(CaptureBackendKind::Pooled).is_err());
    assert_eq!(rl.settings().capture_backend, CaptureBackendKind::Software);
}

#[test]
fn test_gpu_path_needs_capability_and_surface() {
    let (desktop, id) = desktop();
    let mut surface = HeadlessSurface::new(200, 140).with_gpu(true);

    let mut rl = render_loop(&desktop, &StreamConfig::default(), caps(false));
    rl.set_target_window(Some(id));
    rl.set_gpu_mode(true);
    assert!(matches!(
        rl.tick(&mut surface).outcome,
        TickOutcome::Presented { gpu: false, .. }
    ));

    let mut rl = render_loop(&desktop, &StreamConfig::default(), caps(true));
    rl.set_target_window(Some(id));
    rl.set_gpu_mode(true);
    rl.set_brightness(1.5);
    rl.set_scale_percent(50);
    let report = rl.tick(&mut surface);
    assert_eq!(
        report.outcome,
        TickOutcome::Presented {
            width: 100,
            height: 70,
            gpu: true
        }
    );
    match surface.last() {
        Some(Presented::Gpu { frame, shading, overlay }) => {
            assert_eq!(frame.data.len(), 100 * 70 * 4);
            assert_eq!(shading.brightness, 1.5);
            assert!(overlay.is_none());
        }
        other => panic!("expected gpu frame, got {other:?}"),
    }
}

fn tick_until_overlay(rl: &mut RenderLoop, desktop: &SyntheticDesktop, surface: &mut HeadlessSurface) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        desktop.step();
        rl.tick(surface);
        if let Some(Presented::Gpu { overlay: Some(_), .. }) = surface.last() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn test_gpu_overlay_layer_and_disable() {
    let (desktop, id) = desktop();
    desktop.add_sprite(Sprite {
        x: 40,
        y: 40,
        size: 20,
        color: [255, 255, 255, 255],
        vx: 4,
        vy: 0,
        bounds: Some(CaptureRect::new(20, 20, 200, 140)),
    });
    let mut rl = render_loop(&desktop, &motion_config(), caps(true));
    let mut surface = HeadlessSurface::new(300, 300).with_gpu(true);
    rl.set_target_window(Some(id));
    rl.set_gpu_mode(true);

    assert!(tick_until_overlay(&mut rl, &desktop, &mut surface));
    match surface.last() {
        Some(Presented::Gpu { overlay: Some(layer), .. }) => assert_eq!(layer.dimensions(), (300, 300)),
        other => panic!("expected overlay layer, got {other:?}"),
    }

    let mut params = rl.blob_params().clone();
    params.enabled = false;
    rl.set_blob_params(params);
    rl.tick(&mut surface);
    match surface.last() {
        Some(Presented::Gpu { overlay, .. }) => assert!(overlay.is_none()),
        other => panic!("expected gpu frame, got {other:?}"),
    }
    assert!(rl.tracker().latest().is_none());
}

#[test]
fn test_fps_reported_to_observers() {
    let (desktop, id) = desktop();
    let mut rl = render_loop(&desktop, &StreamConfig::default(), Capabilities::software_only());
    let mut surface = HeadlessSurface::new(200, 140);
    rl.set_target_window(Some(id));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    rl.on_fps(move |fps| sink.borrow_mut().push(fps));

    let mut reported = None;
    for i in 1..=10u64 {
        let report = rl.tick_at(&mut surface, i * 110_000_000);
        if report.fps.is_some() {
            reported = report.fps;
        }
    }

    let fps = reported.unwrap();
    assert!((fps - 10.0 / 1.1).abs() < 0.1, "fps = {fps}");
    assert_eq!(seen.borrow().as_slice(), &[fps]);
}

#[test]
fn test_diagnostics_do_not_count_as_frames() {
    let (desktop, _) = desktop();
    let mut rl = render_loop(&desktop, &StreamConfig::default(), Capabilities::software_only());
    let mut surface = HeadlessSurface::new(200, 140);

    for i in 1..=20u64 {
        assert!(rl.tick_at(&mut surface, i * 100_000_000).fps.is_none());
    }
    assert_eq!(surface.messages(), 20);
}

#[test]
fn test_target_fps_sets_interval() {
    let (desktop, _) = desktop();
    let mut rl = render_loop(&desktop, &StreamConfig::default(), Capabilities::software_only());
    assert_eq!(rl.interval(), Duration::from_millis(33));

    rl.set_target_fps(0);
    assert_eq!(rl.target_fps(), 1);
    assert_eq!(rl.interval(), Duration::from_millis(1000));

    rl.set_target_fps(2000);
    assert_eq!(rl.interval(), Duration::from_millis(1));
}

#[test]
fn test_apply_config_switches_everything() {
    let (desktop, _) = desktop();
    let mut rl = render_loop(&desktop, &StreamConfig::default(), caps(false));

    let mut config = motion_config();
    config.target_fps = 10;
    config.effects.capture_backend = CaptureBackendKind::LowLatency;
    config.effects.contrast = 1.4;
    rl.apply_config(&config);

    assert_eq!(rl.target_fps(), 10);
    assert_eq!(rl.settings().capture_backend, CaptureBackendKind::LowLatency);
    assert_eq!(rl.settings().contrast, 1.4);
    assert!(rl.blob_params().enabled);
    rl.shutdown();
    assert_eq!(rl.source().open_sessions(), 0);
}
