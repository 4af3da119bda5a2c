//! Display surface seam and a headless implementation.

use std::sync::Arc;

use glance_frame_model::fit_size;
use glance_processing_core::GpuFrame;
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::gpu::Shading;

/// Where the render loop puts its output.
pub trait DisplaySurface {
    /// Current drawable size in pixels.
    fn viewport_size(&self) -> (u32, u32);

    /// Show a CPU-processed image, already fit to the viewport.
    fn present_raster(&mut self, image: RgbaImage);

    /// Show a BGRA texture with GPU shading and an optional overlay layer
    /// the size of the viewport.
    fn present_gpu(&mut self, frame: GpuFrame, shading: Shading, overlay: Option<Arc<RgbaImage>>);

    /// Replace the picture with diagnostic text.
    fn show_message(&mut self, text: &str);

    /// Whether [`present_gpu`](Self::present_gpu) is usable.
    fn gpu_available(&self) -> bool {
        false
    }
}

/// Fit `image` into the viewport keeping its aspect ratio: nearest in fast
/// mode, smooth otherwise. Returned unchanged when it already matches.
pub fn fit_to_viewport(image: RgbaImage, viewport: (u32, u32), fast: bool) -> RgbaImage {
    let (w, h) = fit_size(image.width(), image.height(), viewport.0, viewport.1);
    if w == 0 || h == 0 || (w, h) == image.dimensions() {
        return image;
    }
    let filter = if fast {
        FilterType::Nearest
    } else {
        FilterType::Triangle
    };
    imageops::resize(&image, w, h, filter)
}

/// What a [`HeadlessSurface`] last received.
#[derive(Debug, Clone)]
pub enum Presented {
    Raster(RgbaImage),
    Gpu {
        frame: GpuFrame,
        shading: Shading,
        overlay: Option<Arc<RgbaImage>>,
    },
    Message(String),
}

/// Surface without a window, for the CLI runner and tests.
#[derive(Debug)]
pub struct HeadlessSurface {
    viewport: (u32, u32),
    gpu: bool,
    last: Option<Presented>,
    frames: u64,
    messages: u64,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: (width, height),
            gpu: false,
            last: None,
            frames: 0,
            messages: 0,
        }
    }

    pub fn with_gpu(mut self, gpu: bool) -> Self {
        self.gpu = gpu;
        self
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn last(&self) -> Option<&Presented> {
        self.last.as_ref()
    }

    pub fn last_message(&self) -> Option<&str> {
        match &self.last {
            Some(Presented::Message(text)) => Some(text),
            _ => None,
        }
    }

    /// Frames presented, raster or GPU.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn messages(&self) -> u64 {
        self.messages
    }
}

impl DisplaySurface for HeadlessSurface {
    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    fn present_raster(&mut self, image: RgbaImage) {
        self.frames += 1;
        self.last = Some(Presented::Raster(image));
    }

    fn present_gpu(&mut self, frame: GpuFrame, shading: Shading, overlay: Option<Arc<RgbaImage>>) {
        self.frames += 1;
        self.last = Some(Presented::Gpu {
            frame,
            shading,
            overlay,
        });
    }

    fn show_message(&mut self, text: &str) {
        self.messages += 1;
        self.last = Some(Presented::Message(text.to_string()));
    }

    fn gpu_available(&self) -> bool {
        self.gpu
    }
}
