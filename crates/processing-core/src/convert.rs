//! Conversions from captured frames into image-library buffers and GPU
//! upload bytes.

use glance_common::error::{GlanceError, GlanceResult};
use glance_frame_model::{nearest_indices, FrameBuffer, PixelLayout};
use image::{GrayImage, RgbaImage};

/// Opaque RGBA copy of a frame. Rows are unpadded and channels reordered.
pub fn to_rgba_image(frame: &FrameBuffer) -> GlanceResult<RgbaImage> {
    let (width, height) = (frame.width(), frame.height());
    let bpp = frame.bytes_per_pixel();
    let [ri, gi, bi] = frame.layout().rgb_offsets();
    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for px in frame.row(y).chunks_exact(bpp) {
            out.extend_from_slice(&[px[ri], px[gi], px[bi], 255]);
        }
    }
    RgbaImage::from_raw(width, height, out)
        .ok_or_else(|| GlanceError::processing(format!("cannot wrap {width}x{height} frame")))
}

/// BGRA bytes for texture upload, nearest-downscaled to `out_w x out_h`.
pub fn to_bgra_bytes(frame: &FrameBuffer, out_w: u32, out_h: u32) -> Vec<u8> {
    let same_size = out_w == frame.width() && out_h == frame.height();
    if same_size && frame.layout() == PixelLayout::Bgra {
        return frame.packed().into_owned();
    }

    let bpp = frame.bytes_per_pixel();
    let [ri, gi, bi] = frame.layout().rgb_offsets();
    let has_alpha = frame.layout().has_alpha();
    let xs = nearest_indices(frame.width(), out_w);
    let ys = nearest_indices(frame.height(), out_h);
    let mut out = Vec::with_capacity(out_w as usize * out_h as usize * 4);
    for &sy in &ys {
        let row = frame.row(sy);
        for &sx in &xs {
            let px = &row[sx as usize * bpp..(sx as usize + 1) * bpp];
            let a = if has_alpha { px[3] } else { 255 };
            out.extend_from_slice(&[px[bi], px[gi], px[ri], a]);
        }
    }
    out
}

/// Luma of one pixel: `0.114*B + 0.587*G + 0.299*R`, rounded.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((114 * b as u32 + 587 * g as u32 + 299 * r as u32 + 500) / 1000) as u8
}

/// Grey image of the frame, nearest-sampled down to `out_w x out_h`.
pub fn to_gray(frame: &FrameBuffer, out_w: u32, out_h: u32) -> GlanceResult<GrayImage> {
    let bpp = frame.bytes_per_pixel();
    let [ri, gi, bi] = frame.layout().rgb_offsets();
    let xs = nearest_indices(frame.width(), out_w);
    let ys = nearest_indices(frame.height(), out_h);
    let mut out = Vec::with_capacity(out_w as usize * out_h as usize);
    for &sy in &ys {
        let row = frame.row(sy);
        for &sx in &xs {
            let px = &row[sx as usize * bpp..(sx as usize + 1) * bpp];
            out.push(luma(px[ri], px[gi], px[bi]));
        }
    }
    GrayImage::from_raw(out_w, out_h, out)
        .ok_or_else(|| GlanceError::processing(format!("cannot build {out_w}x{out_h} grey image")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_image_reorders_bgra() {
        let frame = FrameBuffer::solid(2, 2, PixelLayout::Bgra, [10, 20, 30, 255]).unwrap();
        let image = to_rgba_image(&frame).unwrap();
        assert_eq!(image.get_pixel(1, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_rgba_image_from_padded_bgr() {
        // Two BGR pixels per row plus two bytes of padding.
        let data = vec![3, 2, 1, 6, 5, 4, 0, 0, 9, 8, 7, 12, 11, 10, 0, 0];
        let frame = FrameBuffer::with_stride(data, 2, 2, PixelLayout::Bgr, 8).unwrap();
        let image = to_rgba_image(&frame).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [10, 11, 12, 255]);
    }

    #[test]
    fn test_bgra_bytes_passthrough_and_downscale() {
        let frame = FrameBuffer::solid(4, 4, PixelLayout::Rgba, [1, 2, 3, 4]).unwrap();
        assert_eq!(&to_bgra_bytes(&frame, 4, 4)[..4], &[3, 2, 1, 4]);
        assert_eq!(to_bgra_bytes(&frame, 2, 2).len(), 16);
    }

    #[test]
    fn test_luma_weights() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(100, 100, 100), 100);
        assert_eq!(luma(255, 0, 0), 76);
    }
}
