//! Always-available stage built on `image` alone.
//!
//! Brightness scales towards black. Contrast blends each channel with the
//! mean grey of the whole image, so a flat image is unaffected.

use glance_common::error::GlanceResult;
use glance_frame_model::{EffectSettings, FrameBuffer};
use image::imageops::{self, FilterType};
use image::{Pixel, RgbaImage};

use crate::convert;

pub fn process(frame: &FrameBuffer, settings: &EffectSettings, (out_w, out_h): (u32, u32)) -> GlanceResult<RgbaImage> {
    let mut image = convert::to_rgba_image(frame)?;
    if image.dimensions() != (out_w, out_h) {
        let filter = if settings.fast_mode {
            FilterType::Nearest
        } else {
            FilterType::Triangle
        };
        image = imageops::resize(&image, out_w, out_h, filter);
    }

    if settings.brightness != 1.0 {
        let factor = settings.brightness;
        for px in image.pixels_mut() {
            px.apply_without_alpha(|v| blend(0.0, v, factor));
        }
    }
    if settings.contrast != 1.0 {
        let mean = mean_grey(&image);
        let factor = settings.contrast;
        for px in image.pixels_mut() {
            px.apply_without_alpha(|v| blend(mean, v, factor));
        }
    }
    Ok(image)
}

/// `base + (v - base) * factor`, clamped to a byte.
fn blend(base: f32, v: u8, factor: f32) -> u8 {
    (base + (v as f32 - base) * factor).clamp(0.0, 255.0) as u8
}

/// Rounded mean of the ITU-R 601 grey of every pixel.
fn mean_grey(image: &RgbaImage) -> f32 {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = image
        .pixels()
        .map(|p| {
            let [r, g, b, _] = p.0;
            (r as u64 * 299 + g as u64 * 587 + b as u64 * 114) / 1000
        })
        .sum();
    (sum as f64 / count as f64 + 0.5).floor() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_frame_model::PixelLayout;

    #[test]
    fn test_contrast_on_flat_image_is_noop() {
        let frame = FrameBuffer::solid(8, 8, PixelLayout::Bgra, [90, 90, 90, 255]).unwrap();
        let settings = EffectSettings {
            contrast: 3.0,
            ..Default::default()
        };
        let image = process(&frame, &settings, (8, 8)).unwrap();
        assert!(image.pixels().all(|p| p.0 == [90, 90, 90, 255]));
    }

    #[test]
    fn test_zero_brightness_is_black() {
        let frame = FrameBuffer::solid(3, 3, PixelLayout::Rgba, [200, 100, 50, 255]).unwrap();
        let settings = EffectSettings {
            brightness: 0.0,
            ..Default::default()
        };
        let image = process(&frame, &settings, (3, 3)).unwrap();
        assert_eq!(image.get_pixel(1, 1).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_bilinear_resize_outside_fast_mode() {
        let frame = FrameBuffer::solid(10, 10, PixelLayout::Bgra, [5, 5, 5, 255]).unwrap();
        let settings = EffectSettings {
            scale_percent: 50,
            ..Default::default()
        };
        let image = process(&frame, &settings, (5, 5)).unwrap();
        assert_eq!(image.dimensions(), (5, 5));
        assert_eq!(image.get_pixel(2, 2).0, [5, 5, 5, 255]);
    }
}
