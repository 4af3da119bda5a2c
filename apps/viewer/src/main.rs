//! Glance viewer: mirrors one window into a native window.
//!
//! F, Enter or a double-click toggle fullscreen, Escape leaves it.
//! G toggles GPU presentation and M toggles motion highlighting.

use std::sync::{Arc, Mutex, PoisonError};

use clap::Parser;
use eframe::egui::{self, Color32, ColorImage, TextureHandle, TextureOptions};
use eframe::egui_glow;
use glance_common::config::AppConfig;
use glance_platform_core::synthetic::SyntheticDesktop;
use glance_platform_core::{capturable_windows, Capabilities, ScreenGrabber, WindowId, WindowProvider};
use glance_platform_desktop::{DesktopGrabber, DesktopWindows};
use glance_render_engine::{Presented, RenderLoop, TickOutcome};
use image::RgbaImage;

mod gl_view;
mod surface;

use gl_view::GlView;
use surface::ViewerSurface;

#[derive(Parser)]
#[command(name = "glance-viewer", about = "Mirror a window with Glance", version)]
struct Args {
    /// Window handle to mirror (see `glance windows`)
    #[arg(long, conflicts_with_all = ["title", "demo"])]
    window: Option<u64>,

    /// Mirror the first window whose title contains this text
    #[arg(long, conflicts_with = "demo")]
    title: Option<String>,

    /// Mirror a window on an in-memory demo desktop
    #[arg(long)]
    demo: bool,

    /// Start from a saved profile
    #[arg(long)]
    profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load();
    if args.verbose {
        config.logging.level = "debug".to_string();
    }
    glance_common::logging::init_logging(&config.logging);
    if let Some(name) = &args.profile {
        config
            .apply_profile(name)
            .map_err(|e| anyhow::anyhow!("Failed to apply profile: {e}"))?;
    }

    let (grabber, windows, target, demo): (Arc<dyn ScreenGrabber>, Arc<dyn WindowProvider>, Option<WindowId>, _) =
        if args.demo {
            let (desktop, id) = SyntheticDesktop::demo();
            (
                Arc::new(desktop.clone()),
                Arc::new(desktop.clone()),
                Some(id),
                Some(desktop),
            )
        } else {
            let windows = DesktopWindows::new();
            let target = match (args.window, args.title.as_deref()) {
                (Some(handle), _) => Some(WindowId(handle)),
                (None, Some(title)) => find_by_title(&windows, title)?,
                (None, None) => None,
            };
            (Arc::new(DesktopGrabber::new()), Arc::new(windows), target, None)
        };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Glance")
            .with_inner_size([960.0, 600.0]),
        ..Default::default()
    };

    let stream = config.stream.clone();
    eframe::run_native(
        "Glance",
        options,
        Box::new(move |cc| {
            let gl_view = cc.gl.as_ref().and_then(|gl| match GlView::new(gl) {
                Ok(view) => Some(Arc::new(Mutex::new(view))),
                Err(e) => {
                    tracing::warn!("GPU presentation unavailable: {}", e);
                    None
                }
            });
            let caps = Capabilities::probe(grabber.as_ref(), true, gl_view.is_some());
            // Construction only fails when the analysis worker cannot spawn.
            let app = match RenderLoop::new(&stream, grabber, windows, caps) {
                Ok(mut render_loop) => {
                    render_loop.set_target_window(target);
                    ViewerApp::new(render_loop, gl_view, demo)
                }
                Err(e) => ViewerApp::failed(format!("Failed to start: {e}")),
            };
            Box::new(app) as Box<dyn eframe::App>
        }),
    )
    .map_err(|e| anyhow::anyhow!("viewer launch failed: {e}"))
}

fn find_by_title(windows: &dyn WindowProvider, title: &str) -> anyhow::Result<Option<WindowId>> {
    let needle = title.to_lowercase();
    let all = windows
        .list()
        .map_err(|e| anyhow::anyhow!("Failed to list windows: {e}"))?;
    let found = capturable_windows(all)
        .into_iter()
        .find(|w| w.title.to_lowercase().contains(&needle))
        .map(|w| w.id);
    if found.is_none() {
        anyhow::bail!("No window title contains '{title}'");
    }
    Ok(found)
}

struct ViewerApp {
    render_loop: Option<RenderLoop>,
    surface: ViewerSurface,
    gl_view: Option<Arc<Mutex<GlView>>>,
    demo: Option<SyntheticDesktop>,
    frame_texture: Option<TextureHandle>,
    overlay_texture: Option<TextureHandle>,
    overlay_source: Option<Arc<RgbaImage>>,
    uploaded: u64,
    fps: Arc<Mutex<Option<f64>>>,
    status: String,
}

impl ViewerApp {
    fn new(mut render_loop: RenderLoop, gl_view: Option<Arc<Mutex<GlView>>>, demo: Option<SyntheticDesktop>) -> Self {
        let fps = Arc::new(Mutex::new(None));
        let sink = fps.clone();
        render_loop.on_fps(move |rate| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(rate);
        });
        let status = format!(
            "{} capture, {} effects",
            render_loop.settings().capture_backend,
            render_loop.settings().effects_backend
        );
        Self {
            render_loop: Some(render_loop),
            surface: ViewerSurface::new(gl_view.is_some()),
            gl_view,
            demo,
            frame_texture: None,
            overlay_texture: None,
            overlay_source: None,
            uploaded: 0,
            fps,
            status,
        }
    }

    fn failed(message: String) -> Self {
        let mut surface = ViewerSurface::new(false);
        surface.set_message(message);
        Self {
            render_loop: None,
            surface,
            gl_view: None,
            demo: None,
            frame_texture: None,
            overlay_texture: None,
            overlay_source: None,
            uploaded: 0,
            fps: Arc::new(Mutex::new(None)),
            status: String::new(),
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context, double_clicked: bool) {
        let (toggle, escape, gpu, motion) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::F) || i.key_pressed(egui::Key::Enter),
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::G),
                i.key_pressed(egui::Key::M),
            )
        });
        let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
        if toggle || double_clicked {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!fullscreen));
        } else if escape && fullscreen {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(false));
        }

        let Some(render_loop) = self.render_loop.as_mut() else {
            return;
        };
        if gpu {
            let enabled = !render_loop.settings().gpu_mode;
            render_loop.set_gpu_mode(enabled);
        }
        if motion {
            let mut params = render_loop.blob_params().clone();
            params.enabled = !params.enabled;
            render_loop.set_blob_params(params);
        }
    }

    fn tick(&mut self, frame: &eframe::Frame) {
        let Some(render_loop) = self.render_loop.as_mut() else {
            return;
        };
        if !render_loop.should_tick() {
            return;
        }
        if let Some(desktop) = &self.demo {
            desktop.step();
        }
        let report = render_loop.tick(&mut self.surface);
        if let Some(notice) = report.notice {
            self.status = notice.to_string();
        }
        if let TickOutcome::Presented { gpu: true, .. } = report.outcome {
            if let (Some(view), Some(gl), Some(Presented::Gpu { frame: gpu_frame, .. })) =
                (&self.gl_view, frame.gl(), self.surface.latest())
            {
                view.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .upload(gl, gpu_frame);
            }
        }
    }

    fn draw(&mut self, ui: &mut egui::Ui, rect: egui::Rect) {
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_rgb(12, 13, 16));
        let ppp = ui.ctx().pixels_per_point();
        let fast = self
            .render_loop
            .as_ref()
            .is_some_and(|r| r.settings().fast_mode);

        match self.surface.latest() {
            Some(Presented::Raster(image)) => {
                let generation = self.surface.generation();
                if self.frame_texture.is_none() || self.uploaded != generation {
                    let color = ColorImage::from_rgba_unmultiplied(
                        [image.width() as usize, image.height() as usize],
                        image.as_raw(),
                    );
                    let options = if fast {
                        TextureOptions::NEAREST
                    } else {
                        TextureOptions::LINEAR
                    };
                    match self.frame_texture.as_mut() {
                        Some(texture) => texture.set(color, options),
                        None => {
                            self.frame_texture = Some(ui.ctx().load_texture("glance-frame", color, options))
                        }
                    }
                    self.uploaded = generation;
                }
                let Some(texture) = &self.frame_texture else {
                    return;
                };
                let size = egui::vec2(image.width() as f32 / ppp, image.height() as f32 / ppp);
                let target = egui::Rect::from_center_size(rect.center(), size);
                painter.image(texture.id(), target, full_uv(), Color32::WHITE);
            }
            Some(Presented::Gpu { shading, overlay, .. }) => {
                if let Some(view) = &self.gl_view {
                    let view = view.clone();
                    let shading = *shading;
                    let callback = egui::PaintCallback {
                        rect,
                        callback: Arc::new(egui_glow::CallbackFn::new(move |info, painter| {
                            view.lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .paint(painter.gl(), &info, shading);
                        })),
                    };
                    painter.add(callback);
                }
                match overlay {
                    Some(layer) => {
                        let changed = !self
                            .overlay_source
                            .as_ref()
                            .is_some_and(|prev| Arc::ptr_eq(prev, layer));
                        if changed {
                            let color = ColorImage::from_rgba_unmultiplied(
                                [layer.width() as usize, layer.height() as usize],
                                layer.as_raw(),
                            );
                            match self.overlay_texture.as_mut() {
                                Some(texture) => texture.set(color, TextureOptions::LINEAR),
                                None => {
                                    self.overlay_texture = Some(ui.ctx().load_texture(
                                        "glance-overlay",
                                        color,
                                        TextureOptions::LINEAR,
                                    ))
                                }
                            }
                            self.overlay_source = Some(layer.clone());
                        }
                        if let Some(texture) = &self.overlay_texture {
                            painter.image(texture.id(), rect, full_uv(), Color32::WHITE);
                        }
                    }
                    None => self.overlay_source = None,
                }
            }
            Some(Presented::Message(text)) => {
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    text,
                    egui::FontId::proportional(18.0),
                    Color32::from_gray(200),
                );
            }
            None => {}
        }

        let fullscreen = ui.ctx().input(|i| i.viewport().fullscreen.unwrap_or(false));
        if !fullscreen {
            let fps = *self.fps.lock().unwrap_or_else(PoisonError::into_inner);
            let line = match fps {
                Some(fps) => format!("{fps:.1} fps  {}", self.status),
                None => self.status.clone(),
            };
            painter.text(
                rect.left_bottom() + egui::vec2(8.0, -8.0),
                egui::Align2::LEFT_BOTTOM,
                line,
                egui::FontId::monospace(12.0),
                Color32::from_gray(160),
            );
        }
    }
}

fn full_uv() -> egui::Rect {
    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0))
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let ppp = ctx.pixels_per_point();
                self.surface.set_viewport(
                    (rect.width() * ppp).round().max(0.0) as u32,
                    (rect.height() * ppp).round().max(0.0) as u32,
                );

                let response = ui.allocate_rect(rect, egui::Sense::click());
                self.handle_input(ctx, response.double_clicked());
                self.tick(frame);
                self.draw(ui, rect);
            });

        if let Some(render_loop) = &self.render_loop {
            ctx.request_repaint_after(render_loop.interval());
        }
    }

    fn on_exit(&mut self, gl: Option<&eframe::glow::Context>) {
        if let Some(render_loop) = self.render_loop.as_mut() {
            render_loop.shutdown();
        }
        if let (Some(view), Some(gl)) = (&self.gl_view, gl) {
            view.lock().unwrap_or_else(PoisonError::into_inner).destroy(gl);
        }
    }
}
