//! Tiny 5x7 bitmap font for box labels.

use glance_frame_model::Color;
use image::RgbaImage;

use crate::paint::blend_pixel;

/// Glyph advance in pixels at scale 1 (5 px glyph + 1 px spacing).
pub const ADVANCE: u32 = 6;
/// Glyph height at scale 1.
pub const HEIGHT: u32 = 7;

/// 5x7 bitmap: one byte per row, bit 4 is the leftmost pixel.
fn glyph(ch: char) -> Option<[u8; 7]> {
    macro_rules! g {
        ($a:expr, $b:expr, $c:expr, $d:expr, $e:expr, $f:expr, $g:expr) => {
            Some([$a, $b, $c, $d, $e, $f, $g])
        };
    }

    match ch {
        '0' => g!(0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110),
        '1' => g!(0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110),
        '2' => g!(0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111),
        '3' => g!(0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110),
        '4' => g!(0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010),
        '5' => g!(0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110),
        '6' => g!(0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110),
        '7' => g!(0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000),
        '8' => g!(0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110),
        '9' => g!(0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100),
        '#' => g!(0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010),
        'x' => g!(0b00000, 0b00000, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001),
        ':' => g!(0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000),
        '.' => g!(0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00100, 0b00000),
        '-' => g!(0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000),
        ' ' => g!(0, 0, 0, 0, 0, 0, 0),
        _ => None,
    }
}

fn draw_glyph(image: &mut RgbaImage, x: i64, y: i64, rows: &[u8; 7], color: Color, scale: u32) {
    let s = scale.max(1) as i64;
    for (ry, bits) in rows.iter().enumerate() {
        for rx in 0..5i64 {
            if bits & (1 << (4 - rx)) == 0 {
                continue;
            }
            for dy in 0..s {
                for dx in 0..s {
                    blend_pixel(image, x + rx * s + dx, y + ry as i64 * s + dy, color);
                }
            }
        }
    }
}

/// Draw `text` with a one-pixel black shadow. Unknown characters advance
/// without drawing.
pub fn draw_text(image: &mut RgbaImage, x: i64, y: i64, text: &str, color: Color, scale: u32) {
    let s = scale.max(1) as i64;
    let shadow = Color::BLACK.with_alpha(color.alpha());
    let mut cx = x;
    for ch in text.chars() {
        if let Some(rows) = glyph(ch) {
            draw_glyph(image, cx + s, y + s, &rows, shadow, scale);
            draw_glyph(image, cx, y, &rows, color, scale);
        }
        cx += ADVANCE as i64 * s;
    }
}

/// Width of `text` in pixels.
pub fn text_width(text: &str, scale: u32) -> u32 {
    (text.chars().count() as u32 * ADVANCE).saturating_sub(1) * scale.max(1)
}
