//! A fully in-memory desktop.
//!
//! [`SyntheticDesktop`] implements both [`ScreenGrabber`] and
//! [`WindowProvider`], so capture, processing and the render loop can be
//! exercised without a display server. Windows are flat rectangles with a
//! darker frame around their client area; sprites are squares drawn on
//! top of everything and can be stepped to simulate motion.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glance_common::{GlanceError, GlanceResult};
use glance_frame_model::{CaptureBackendKind, CaptureRect, CropMargins, FrameBuffer, PixelLayout};

use crate::{MonitorInfo, ScreenGrabber, WindowId, WindowInfo, WindowProvider};

const BACKGROUND: [u8; 4] = [20, 22, 26, 255];

/// How a window's client area is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Solid([u8; 4]),
    /// `r = x`, `g = y`, `b = x + y` (mod 256), in window-local pixels.
    Gradient,
}

/// A moving square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub x: i32,
    pub y: i32,
    pub size: u32,
    pub color: [u8; 4],
    /// Pixels moved per [`SyntheticDesktop::step`].
    pub vx: i32,
    pub vy: i32,
    /// Area the sprite bounces inside, if any.
    pub bounds: Option<CaptureRect>,
}

impl Sprite {
    fn rect(&self) -> CaptureRect {
        CaptureRect::from_origin_size(self.x, self.y, self.size, self.size)
    }

    fn advance(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        let Some(bounds) = self.bounds else {
            return;
        };
        let size = self.size as i32;
        if self.x < bounds.left || self.x + size > bounds.right {
            self.vx = -self.vx;
            self.x = self.x.clamp(bounds.left, (bounds.right - size).max(bounds.left));
        }
        if self.y < bounds.top || self.y + size > bounds.bottom {
            self.vy = -self.vy;
            self.y = self.y.clamp(bounds.top, (bounds.bottom - size).max(bounds.top));
        }
    }
}

#[derive(Debug, Clone)]
struct SyntheticWindow {
    id: WindowId,
    title: String,
    rect: CaptureRect,
    insets: CropMargins,
    fill: Fill,
    visible: bool,
    minimized: bool,
}

impl SyntheticWindow {
    fn client_rect(&self) -> CaptureRect {
        self.rect.cropped(&self.insets)
    }
}

#[derive(Debug)]
struct DesktopState {
    monitors: Vec<MonitorInfo>,
    windows: Vec<SyntheticWindow>,
    sprites: Vec<Sprite>,
    next_id: u64,
    foreground: Option<WindowId>,
    pooled: bool,
    low_latency: bool,
    fail_region_grabs: bool,
    fail_monitor_grabs: bool,
    region_grabs: u64,
    monitor_grabs: u64,
}

/// Shared handle to an in-memory desktop. Clones see the same state.
#[derive(Debug, Clone)]
pub struct SyntheticDesktop {
    state: Arc<Mutex<DesktopState>>,
}

impl SyntheticDesktop {
    /// A desktop with the given monitors and every capture variant enabled.
    pub fn new(monitors: Vec<MonitorInfo>) -> Self {
        Self {
            state: Arc::new(Mutex::new(DesktopState {
                monitors,
                windows: Vec::new(),
                sprites: Vec::new(),
                next_id: 0x1000,
                foreground: None,
                pooled: true,
                low_latency: true,
                fail_region_grabs: false,
                fail_monitor_grabs: false,
                region_grabs: 0,
                monitor_grabs: 0,
            })),
        }
    }

    /// One primary monitor at the origin.
    pub fn single_monitor(width: u32, height: u32) -> Self {
        Self::new(vec![MonitorInfo {
            name: "synthetic-0".to_string(),
            width,
            height,
            x: 0,
            y: 0,
            scale_factor: 1.0,
            primary: true,
        }])
    }

    /// A 1280x720 desktop with one focused window and two bouncing
    /// squares inside it, for demos.
    pub fn demo() -> (Self, WindowId) {
        let desktop = Self::single_monitor(1280, 720);
        let window = CaptureRect::new(100, 80, 740, 560);
        let id = desktop.add_window("Glance demo", window, Fill::Gradient);
        let bounds = Some(window);
        desktop.add_sprite(Sprite {
            x: 160,
            y: 140,
            size: 48,
            color: [250, 250, 250, 255],
            vx: 6,
            vy: 4,
            bounds,
        });
        desktop.add_sprite(Sprite {
            x: 520,
            y: 400,
            size: 32,
            color: [240, 60, 40, 255],
            vx: -5,
            vy: 3,
            bounds,
        });
        desktop.set_foreground(Some(id));
        (desktop, id)
    }

    fn state(&self) -> MutexGuard<'_, DesktopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a window on top of the stack and return its handle.
    pub fn add_window(&self, title: &str, rect: CaptureRect, fill: Fill) -> WindowId {
        let mut state = self.state();
        let id = WindowId(state.next_id);
        state.next_id += 1;
        state.windows.push(SyntheticWindow {
            id,
            title: title.to_string(),
            rect,
            insets: CropMargins::NONE,
            fill,
            visible: true,
            minimized: false,
        });
        id
    }

    /// Frame thickness around the client area.
    pub fn set_client_insets(&self, id: WindowId, insets: CropMargins) {
        self.with_window(id, |w| w.insets = insets);
    }

    pub fn move_window(&self, id: WindowId, rect: CaptureRect) {
        self.with_window(id, |w| w.rect = rect);
    }

    pub fn set_minimized(&self, id: WindowId, minimized: bool) {
        self.with_window(id, |w| w.minimized = minimized);
    }

    pub fn set_visible(&self, id: WindowId, visible: bool) {
        self.with_window(id, |w| w.visible = visible);
    }

    pub fn set_fill(&self, id: WindowId, fill: Fill) {
        self.with_window(id, |w| w.fill = fill);
    }

    pub fn close_window(&self, id: WindowId) {
        let mut state = self.state();
        state.windows.retain(|w| w.id != id);
        if state.foreground == Some(id) {
            state.foreground = None;
        }
    }

    pub fn set_foreground(&self, id: Option<WindowId>) {
        self.state().foreground = id;
    }

    fn with_window(&self, id: WindowId, f: impl FnOnce(&mut SyntheticWindow)) {
        let mut state = self.state();
        if let Some(window) = state.windows.iter_mut().find(|w| w.id == id) {
            f(window);
        }
    }

    pub fn add_sprite(&self, sprite: Sprite) {
        self.state().sprites.push(sprite);
    }

    pub fn clear_sprites(&self) {
        self.state().sprites.clear();
    }

    /// Move every sprite by its velocity.
    pub fn step(&self) {
        for sprite in self.state().sprites.iter_mut() {
            sprite.advance();
        }
    }

    /// Enable or disable a capture variant. Software cannot be disabled.
    pub fn set_supported(&self, kind: CaptureBackendKind, supported: bool) {
        let mut state = self.state();
        match kind {
            CaptureBackendKind::Software => {}
            CaptureBackendKind::Pooled => state.pooled = supported,
            CaptureBackendKind::LowLatency => state.low_latency = supported,
        }
    }

    /// Make region snapshots fail.
    pub fn fail_region_grabs(&self, fail: bool) {
        self.state().fail_region_grabs = fail;
    }

    /// Make monitor grabs fail (simulates a stalled or broken session).
    pub fn fail_monitor_grabs(&self, fail: bool) {
        self.state().fail_monitor_grabs = fail;
    }

    pub fn region_grab_count(&self) -> u64 {
        self.state().region_grabs
    }

    pub fn monitor_grab_count(&self) -> u64 {
        self.state().monitor_grabs
    }
}

impl DesktopState {
    fn render(&self, rect: &CaptureRect) -> GlanceResult<FrameBuffer> {
        let (width, height) = rect
            .size()
            .ok_or_else(|| GlanceError::capture(format!("invalid capture rect {rect}")))?;
        let mut canvas = Canvas::new(*rect, width, height);
        canvas.fill(rect, |_, _| BACKGROUND);

        for window in self.windows.iter().filter(|w| w.visible && !w.minimized) {
            let frame = window.rect;
            let shade = |c: u8| c / 2;
            let frame_color = match window.fill {
                Fill::Solid([r, g, b, a]) => [shade(r), shade(g), shade(b), a],
                Fill::Gradient => [40, 40, 40, 255],
            };
            canvas.fill(&frame, |_, _| frame_color);

            let client = window.client_rect();
            if client.is_valid() {
                match window.fill {
                    Fill::Solid(color) => canvas.fill(&client, |_, _| color),
                    Fill::Gradient => canvas.fill(&client, |x, y| {
                        let lx = (x - client.left) as u32;
                        let ly = (y - client.top) as u32;
                        [lx as u8, ly as u8, (lx + ly) as u8, 255]
                    }),
                }
            }
        }

        for sprite in &self.sprites {
            let color = sprite.color;
            canvas.fill(&sprite.rect(), |_, _| color);
        }

        canvas.into_frame()
    }
}

/// BGRA drawing target covering one screen rect.
struct Canvas {
    origin: CaptureRect,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Canvas {
    fn new(origin: CaptureRect, width: u32, height: u32) -> Self {
        Self {
            origin,
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    fn fill(&mut self, area: &CaptureRect, color_at: impl Fn(i32, i32) -> [u8; 4]) {
        let Some(clip) = area.intersection(&self.origin) else {
            return;
        };
        for y in clip.top..clip.bottom {
            let row = (y - self.origin.top) as usize * self.width as usize;
            for x in clip.left..clip.right {
                let [r, g, b, a] = color_at(x, y);
                let i = (row + (x - self.origin.left) as usize) * 4;
                self.data[i..i + 4].copy_from_slice(&[b, g, r, a]);
            }
        }
    }

    fn into_frame(self) -> GlanceResult<FrameBuffer> {
        Ok(FrameBuffer::new(self.data, self.width, self.height, PixelLayout::Bgra)?)
    }
}

impl ScreenGrabber for SyntheticDesktop {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn monitors(&self) -> GlanceResult<Vec<MonitorInfo>> {
        Ok(self.state().monitors.clone())
    }

    fn grab_region(&self, rect: &CaptureRect) -> GlanceResult<FrameBuffer> {
        let mut state = self.state();
        if state.fail_region_grabs {
            return Err(GlanceError::capture("synthetic region grab failure"));
        }
        state.region_grabs += 1;
        state.render(rect)
    }

    fn grab_monitor(&self, index: usize) -> GlanceResult<FrameBuffer> {
        let mut state = self.state();
        if state.fail_monitor_grabs {
            return Err(GlanceError::capture("synthetic monitor grab failure"));
        }
        let rect = state
            .monitors
            .get(index)
            .map(MonitorInfo::rect)
            .ok_or_else(|| GlanceError::capture(format!("no monitor at index {index}")))?;
        state.monitor_grabs += 1;
        state.render(&rect)
    }

    fn supports(&self, kind: CaptureBackendKind) -> bool {
        let state = self.state();
        match kind {
            CaptureBackendKind::Software => true,
            CaptureBackendKind::Pooled => state.pooled,
            CaptureBackendKind::LowLatency => state.low_latency,
        }
    }
}

impl WindowProvider for SyntheticDesktop {
    fn query(&self, id: WindowId) -> GlanceResult<Option<WindowInfo>> {
        let state = self.state();
        Ok(state
            .windows
            .iter()
            .find(|w| w.id == id)
            .map(|w| to_info(w, state.foreground)))
    }

    fn list(&self) -> GlanceResult<Vec<WindowInfo>> {
        let state = self.state();
        Ok(state
            .windows
            .iter()
            .map(|w| to_info(w, state.foreground))
            .collect())
    }
}

fn to_info(window: &SyntheticWindow, foreground: Option<WindowId>) -> WindowInfo {
    WindowInfo {
        id: window.id,
        title: window.title.clone(),
        app_name: "synthetic".to_string(),
        rect: window.rect,
        client_rect: window.client_rect(),
        visible: window.visible,
        minimized: window.minimized,
        focused: foreground == Some(window.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_grab_paints_window_and_sprite() {
        let desktop = SyntheticDesktop::single_monitor(200, 200);
        let id = desktop.add_window(
            "Target",
            CaptureRect::new(10, 10, 110, 110),
            Fill::Solid([200, 100, 50, 255]),
        );
        desktop.set_client_insets(id, CropMargins::new(2, 10, 2, 2));
        desktop.add_sprite(Sprite {
            x: 50,
            y: 50,
            size: 10,
            color: [255, 255, 255, 255],
            vx: 0,
            vy: 0,
            bounds: None,
        });

        let frame = desktop.grab_region(&CaptureRect::new(0, 0, 120, 120)).unwrap();
        assert_eq!(frame.layout(), PixelLayout::Bgra);
        assert_eq!(frame.rgba_at(0, 0), BACKGROUND);
        assert_eq!(frame.rgba_at(11, 11), [100, 50, 25, 255]); // frame
        assert_eq!(frame.rgba_at(30, 30), [200, 100, 50, 255]); // client
        assert_eq!(frame.rgba_at(55, 55), [255, 255, 255, 255]); // sprite
        assert_eq!(desktop.region_grab_count(), 1);
    }

    #[test]
    fn test_window_provider_reports_focus_and_client() {
        let desktop = SyntheticDesktop::single_monitor(800, 600);
        let id = desktop.add_window("A", CaptureRect::new(0, 0, 400, 300), Fill::Gradient);
        desktop.set_client_insets(id, CropMargins::new(1, 30, 1, 1));
        assert!(!desktop.is_foreground(id));

        desktop.set_foreground(Some(id));
        let info = desktop.query(id).unwrap().unwrap();
        assert!(info.focused);
        assert_eq!(info.client_rect, CaptureRect::new(1, 30, 399, 299));

        desktop.close_window(id);
        assert!(desktop.query(id).unwrap().is_none());
        assert!(!desktop.is_foreground(id));
    }

    #[test]
    fn test_sprite_bounces_inside_bounds() {
        let desktop = SyntheticDesktop::single_monitor(100, 100);
        desktop.add_sprite(Sprite {
            x: 85,
            y: 0,
            size: 10,
            color: [255; 4],
            vx: 10,
            vy: 0,
            bounds: Some(CaptureRect::new(0, 0, 100, 100)),
        });
        desktop.step();
        let frame = desktop.grab_monitor(0).unwrap();
        // Clamped against the right edge.
        assert_eq!(frame.rgba_at(95, 5), [255; 4]);
        assert_eq!(desktop.monitor_grab_count(), 1);
    }

    #[test]
    fn test_failure_switches() {
        let desktop = SyntheticDesktop::single_monitor(100, 100);
        desktop.fail_monitor_grabs(true);
        assert!(desktop.grab_monitor(0).is_err());
        assert!(desktop.grab_monitor(7).is_err());

        desktop.set_supported(CaptureBackendKind::Pooled, false);
        assert!(!desktop.supports(CaptureBackendKind::Pooled));
        assert!(desktop.supports(CaptureBackendKind::Software));
    }
}
