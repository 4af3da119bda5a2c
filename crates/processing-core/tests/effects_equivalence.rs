use glance_frame_model::{EffectSettings, FrameBuffer, PixelLayout};
use glance_processing_core::effects::{portable, vectorized, vision};
use glance_processing_core::{FrameProcessor, Stage};
use glance_platform_core::Capabilities;
use proptest::prelude::*;

fn vision_caps() -> Capabilities {
    Capabilities {
        vision: true,
        ..Capabilities::software_only()
    }
}

fn noisy_frame(width: u32, height: u32, layout: PixelLayout, seed: u32) -> FrameBuffer {
    let bpp = layout.bytes_per_pixel();
    let mut data = Vec::with_capacity((width * height) as usize * bpp);
    let mut s = seed.wrapping_mul(2654435761).max(1);
    for _ in 0..width * height {
        for c in 0..bpp {
            s ^= s << 13;
            s ^= s >> 17;
            s ^= s << 5;
            data.push(if layout.has_alpha() && c == 3 { 255 } else { s as u8 });
        }
    }
    FrameBuffer::new(data, width, height, layout).unwrap()
}

fn expected_grey(brightness: f32, contrast: f32) -> i32 {
    let c = ((128.0 - 128.0) * contrast + 128.0f32).clamp(0.0, 255.0);
    (c * brightness).clamp(0.0, 255.0) as i32
}

#[test]
fn identity_settings_use_zero_copy() {
    let frame = noisy_frame(37, 21, PixelLayout::Bgra, 7);
    let mut processor = FrameProcessor::new(&vision_caps());
    let image = processor.process(&frame, &EffectSettings::default()).unwrap();

    assert_eq!(processor.last_stage(), Some(Stage::ZeroCopy));
    assert_eq!(image.dimensions(), (37, 21));
    for (x, y, px) in image.enumerate_pixels() {
        assert_eq!(px.0, frame.rgba_at(x, y));
    }
}

#[test]
fn constant_grey_matches_across_backends() {
    let frame = FrameBuffer::solid(64, 48, PixelLayout::Bgra, [128, 128, 128, 255]).unwrap();
    for (brightness, contrast) in [(1.0, 1.0), (1.5, 0.7), (0.5, 2.0), (2.0, 3.0), (0.0, 1.0)] {
        let settings = EffectSettings {
            brightness,
            contrast,
            scale_percent: 50,
            ..Default::default()
        };
        let expected = expected_grey(brightness, contrast);
        let outputs = [
            vectorized::process(&frame, &settings, (32, 24)).unwrap(),
            vision::process(&frame, &settings, (32, 24)).unwrap(),
            portable::process(&frame, &settings, (32, 24)).unwrap(),
        ];
        for image in outputs {
            assert_eq!(image.dimensions(), (32, 24));
            for px in image.pixels() {
                for c in &px.0[..3] {
                    assert!(
                        (*c as i32 - expected).abs() <= 1,
                        "b={brightness} c={contrast}: got {c}, expected {expected}"
                    );
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_identity_is_channel_reorder(
        width in 1u32..40,
        height in 1u32..40,
        seed in any::<u32>(),
        layout in prop::sample::select(vec![PixelLayout::Bgra, PixelLayout::Rgba, PixelLayout::Bgr]),
    ) {
        let frame = noisy_frame(width, height, layout, seed);
        let mut processor = FrameProcessor::new(&vision_caps());
        let image = processor.process(&frame, &EffectSettings::default()).unwrap();
        prop_assert_eq!(image.dimensions(), (width, height));
        for (x, y, px) in image.enumerate_pixels() {
            prop_assert_eq!(px.0, frame.rgba_at(x, y));
        }
    }

    #[test]
    fn prop_vectorized_and_vision_agree_at_full_scale(
        width in 1u32..24,
        height in 1u32..24,
        seed in any::<u32>(),
        brightness in 0.0f32..3.0,
        contrast in 0.0f32..3.0,
    ) {
        let frame = noisy_frame(width, height, PixelLayout::Bgra, seed);
        let settings = EffectSettings { brightness, contrast, ..Default::default() };
        let a = vectorized::process(&frame, &settings, (width, height)).unwrap();
        let b = vision::process(&frame, &settings, (width, height)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_output_size_follows_scale(
        width in 1u32..300,
        height in 1u32..300,
        scale in 0u32..150,
    ) {
        let frame = FrameBuffer::solid(width, height, PixelLayout::Bgra, [9, 9, 9, 255]).unwrap();
        let settings = EffectSettings { scale_percent: scale, contrast: 1.1, ..Default::default() };
        let mut processor = FrameProcessor::new(&vision_caps());
        let image = processor.process(&frame, &settings).unwrap();
        let expected = glance_frame_model::scaled_size(width, height, scale);
        prop_assert_eq!(image.dimensions(), expected);
    }
}
