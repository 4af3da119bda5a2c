//! Display surface backed by the viewer window.

use std::sync::Arc;

use glance_processing_core::GpuFrame;
use glance_render_engine::{DisplaySurface, Presented, Shading};
use image::RgbaImage;

/// Holds whatever the render loop presented last until the next repaint.
pub struct ViewerSurface {
    viewport: (u32, u32),
    gpu: bool,
    latest: Option<Presented>,
    generation: u64,
}

impl ViewerSurface {
    pub fn new(gpu: bool) -> Self {
        Self {
            viewport: (0, 0),
            gpu,
            latest: None,
            generation: 0,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn set_message(&mut self, text: String) {
        self.latest = Some(Presented::Message(text));
    }

    pub fn latest(&self) -> Option<&Presented> {
        self.latest.as_ref()
    }

    /// Bumped on every presented frame.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl DisplaySurface for ViewerSurface {
    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    fn present_raster(&mut self, image: RgbaImage) {
        self.generation += 1;
        self.latest = Some(Presented::Raster(image));
    }

    fn present_gpu(&mut self, frame: GpuFrame, shading: Shading, overlay: Option<Arc<RgbaImage>>) {
        self.generation += 1;
        self.latest = Some(Presented::Gpu {
            frame,
            shading,
            overlay,
        });
    }

    fn show_message(&mut self, text: &str) {
        self.latest = Some(Presented::Message(text.to_string()));
    }

    fn gpu_available(&self) -> bool {
        self.gpu
    }
}
