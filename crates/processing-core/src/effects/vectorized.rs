//! Index-table downscale and lookup-table colour adjustment.

use glance_common::error::{GlanceError, GlanceResult};
use glance_frame_model::{nearest_indices, EffectSettings, FrameBuffer};
use image::RgbaImage;

use super::ColorAdjust;

pub fn process(frame: &FrameBuffer, settings: &EffectSettings, (out_w, out_h): (u32, u32)) -> GlanceResult<RgbaImage> {
    let xs = nearest_indices(frame.width(), out_w);
    let ys = nearest_indices(frame.height(), out_h);
    let lut = ColorAdjust::from_settings(settings).lut();

    let bpp = frame.bytes_per_pixel();
    let [ri, gi, bi] = frame.layout().rgb_offsets();
    let mut out = Vec::with_capacity(out_w as usize * out_h as usize * 4);
    for &sy in &ys {
        let row = frame.row(sy);
        for &sx in &xs {
            let px = &row[sx as usize * bpp..(sx as usize + 1) * bpp];
            out.extend_from_slice(&[
                lut[px[ri] as usize],
                lut[px[gi] as usize],
                lut[px[bi] as usize],
                255,
            ]);
        }
    }
    RgbaImage::from_raw(out_w, out_h, out)
        .ok_or_else(|| GlanceError::processing(format!("vectorized output {out_w}x{out_h} is inconsistent")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_frame_model::PixelLayout;

    #[test]
    fn test_nearest_downscale_picks_linspace_columns() {
        let mut data = Vec::new();
        for _y in 0..2 {
            for x in 0..5u8 {
                data.extend_from_slice(&[0, 0, x * 10, 255]);
            }
        }
        let frame = FrameBuffer::new(data, 5, 2, PixelLayout::Bgra).unwrap();
        let image = process(&frame, &EffectSettings::default(), (3, 1)).unwrap();
        // linspace(0, 4, 3) = [0, 2, 4]
        let reds: Vec<u8> = image.pixels().map(|p| p.0[0]).collect();
        assert_eq!(reds, vec![0, 20, 40]);
    }

    #[test]
    fn test_brightness_only() {
        let frame = FrameBuffer::solid(2, 2, PixelLayout::Rgba, [100, 200, 10, 255]).unwrap();
        let settings = EffectSettings {
            brightness: 1.5,
            ..Default::default()
        };
        let image = process(&frame, &settings, (2, 2)).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [150, 255, 15, 255]);
    }
}
