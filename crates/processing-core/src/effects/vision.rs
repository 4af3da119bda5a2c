//! Vision-library stage: `image` resize plus `imageproc` colour mapping.

use glance_common::error::GlanceResult;
use glance_frame_model::{EffectSettings, FrameBuffer};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::ColorAdjust;
use crate::convert;

pub fn process(frame: &FrameBuffer, settings: &EffectSettings, (out_w, out_h): (u32, u32)) -> GlanceResult<RgbaImage> {
    let mut image = convert::to_rgba_image(frame)?;
    if image.dimensions() != (out_w, out_h) {
        image = imageops::resize(&image, out_w, out_h, FilterType::Nearest);
    }

    let adjust = ColorAdjust::from_settings(settings);
    if adjust.is_identity() {
        return Ok(image);
    }
    Ok(imageproc::map::map_colors(&image, |p: Rgba<u8>| {
        let [r, g, b, a] = p.0;
        Rgba([adjust.apply(r), adjust.apply(g), adjust.apply(b), a])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_frame_model::PixelLayout;

    #[test]
    fn test_contrast_around_midpoint() {
        let frame = FrameBuffer::solid(4, 4, PixelLayout::Bgra, [28, 128, 228, 255]).unwrap();
        let settings = EffectSettings {
            contrast: 0.5,
            ..Default::default()
        };
        let image = process(&frame, &settings, (4, 4)).unwrap();
        assert_eq!(image.get_pixel(3, 3).0, [78, 128, 178, 255]);
    }
}
