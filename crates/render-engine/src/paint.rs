//! Pixel-level drawing helpers that blend instead of overwrite.

use glance_frame_model::Color;
use image::RgbaImage;

/// Source-over blend of `color` at `(x, y)`; out-of-bounds is ignored.
#[inline]
pub fn blend_pixel(image: &mut RgbaImage, x: i64, y: i64, color: Color) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    let dst = image.get_pixel_mut(x as u32, y as u32);
    dst.0 = blend(dst.0, color.0);
}

/// Source-over compositing of straight-alpha RGBA.
pub fn blend(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as u32;
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let da = dst[3] as u32;
    // Alpha in 0..=255*255 to stay in integers.
    let out_a = sa * 255 + da * (255 - sa);
    if out_a == 0 {
        return [0, 0, 0, 0];
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = src[c] as u32 * sa * 255 + dst[c] as u32 * da * (255 - sa);
        out[c] = ((v + out_a / 2) / out_a) as u8;
    }
    out[3] = ((out_a + 127) / 255) as u8;
    out
}

/// Blend `color` over every pixel of the clipped rectangle.
pub fn fill_rect(image: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32, color: Color) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w as i64).min(image.width() as i64);
    let y1 = (y + h as i64).min(image.height() as i64);
    for py in y0..y1 {
        for px in x0..x1 {
            blend_pixel(image, px, py, color);
        }
    }
}
