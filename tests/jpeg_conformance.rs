//! JPEG conformance tests.
//!
//! Checks the marker layout of the baseline stream and validates decoding
//! through the `image` crate.

mod support;

use std::sync::atomic::AtomicBool;

use image::GenericImageView;
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rowenc::jpeg::{self, JpegOptions, Subsampling};
use rowenc::{ColorType, EncodeContext, Error, FloatImageRef, ImageRef};

use support::synthetic;

/// Byte offsets of every `0xFF xx` marker that is not a stuffed zero or fill.
fn markers(jpeg: &[u8]) -> Vec<u8> {
    jpeg.windows(2)
        .filter(|w| w[0] == 0xFF && w[1] != 0x00 && w[1] != 0xFF)
        .map(|w| w[1])
        .collect()
}

/// Test that JPEG output starts with SOI and ends with EOI.
#[test]
fn test_jpeg_markers() {
    let pixels = vec![128u8; 8 * 8 * 3];
    let result = jpeg::encode(&pixels, 8, 8, 85).unwrap();

    assert_eq!(&result[0..2], &[0xFF, 0xD8]);
    assert_eq!(&result[result.len() - 2..], &[0xFF, 0xD9]);
}

/// The header segments appear in a fixed order before the scan.
#[test]
fn test_segment_order() {
    let pixels = synthetic::gradient_rgb(8, 8);
    let result = jpeg::encode(&pixels, 8, 8, 90).unwrap();

    // SOI, APP0, DQT, SOF0, DHT, SOS come first in this order
    assert_eq!(&result[0..4], &[0xFF, 0xD8, 0xFF, 0xE0]);
    let app0_len = u16::from_be_bytes([result[4], result[5]]) as usize;
    assert_eq!(app0_len, 16);
    assert_eq!(&result[6..11], b"JFIF\0");

    let mut pos = 4 + app0_len;
    for (marker, len) in [(0xDB, 0x84), (0xC0, 17), (0xC4, 0x1A2), (0xDA, 12)] {
        assert_eq!(&result[pos..pos + 2], &[0xFF, marker]);
        assert_eq!(u16::from_be_bytes([result[pos + 2], result[pos + 3]]), len);
        pos += 2 + len as usize;
    }

    // Nothing but entropy data (with stuffing) until EOI
    let scan = &result[pos..result.len() - 2];
    assert!(markers(scan).is_empty());
}

/// SOF0 carries the dimensions and three components.
#[test]
fn test_sof0_fields() {
    let pixels = vec![0u8; 300 * 17 * 3];
    let result = jpeg::encode(&pixels, 300, 17, 75).unwrap();
    let sof = result
        .windows(2)
        .position(|w| w == [0xFF, 0xC0])
        .expect("SOF0");

    assert_eq!(result[sof + 4], 8); // precision
    assert_eq!(u16::from_be_bytes([result[sof + 5], result[sof + 6]]), 17);
    assert_eq!(u16::from_be_bytes([result[sof + 7], result[sof + 8]]), 300);
    assert_eq!(result[sof + 9], 3);
    assert_eq!(&result[sof + 10..sof + 19], &[1, 0x11, 0, 2, 0x11, 1, 3, 0x11, 1]);
}

/// A single transparent pixel gives a small, valid file.
#[test]
fn test_single_rgba_pixel() {
    let result = jpeg::encode_with_color(&[255, 0, 0, 0], 1, 1, 90, ColorType::Rgba).unwrap();
    assert!(result.len() < 700);

    let decoded = image::load_from_memory(&result).expect("decode").to_rgb8();
    let [r, g, b] = decoded.get_pixel(0, 0).0;
    assert!(r > 200 && g < 60 && b < 60, "got {r},{g},{b}");
}

/// Alpha is ignored.
#[test]
fn test_alpha_ignored() {
    let rgb = synthetic::gradient_rgb(12, 9);
    let rgba: Vec<u8> = rgb
        .chunks_exact(3)
        .enumerate()
        .flat_map(|(i, p)| [p[0], p[1], p[2], (i * 7) as u8])
        .collect();

    let a = jpeg::encode(&rgb, 12, 9, 80).unwrap();
    let b = jpeg::encode_with_color(&rgba, 12, 9, 80, ColorType::Rgba).unwrap();
    assert_eq!(a, b);
}

/// Gray input produces the same stream as the same values replicated to RGB.
#[test]
fn test_gray_matches_replicated_rgb() {
    let gray = synthetic::noise_gray(13, 11, 5);
    let rgb: Vec<u8> = gray.iter().flat_map(|&v| [v, v, v]).collect();

    let a = jpeg::encode_with_color(&gray, 13, 11, 70, ColorType::Gray).unwrap();
    let b = jpeg::encode(&rgb, 13, 11, 70).unwrap();
    assert_eq!(a, b);
}

/// Every 0xFF byte in the entropy-coded segment is followed by a stuffed zero.
#[test]
fn test_byte_stuffing() {
    let pixels = synthetic::noise(64, 64, 1234);
    let result = jpeg::encode(&pixels, 64, 64, 100).unwrap();

    let sos = result
        .windows(2)
        .position(|w| w == [0xFF, 0xDA])
        .expect("SOS");
    let scan = &result[sos + 14..result.len() - 2];
    assert!(scan.contains(&0xFF), "noise at q100 should produce 0xFF bytes");
    for (i, &byte) in scan.iter().enumerate() {
        if byte == 0xFF {
            assert_eq!(scan.get(i + 1), Some(&0x00), "unstuffed 0xFF at {i}");
        }
    }
}

/// Test different quality levels.
#[test]
fn test_quality_levels() {
    let pixels = synthetic::noise(32, 32, 77);

    let sizes: Vec<usize> = [10u8, 50, 90, 100]
        .iter()
        .map(|&q| jpeg::encode(&pixels, 32, 32, q).unwrap().len())
        .collect();

    assert!(sizes.windows(2).all(|w| w[0] < w[1]), "{sizes:?}");
}

/// Test that same input produces same output.
#[test]
fn test_deterministic() {
    let pixels = synthetic::gradient_rgb(30, 20);
    let options = JpegOptions::max(60);
    let a = jpeg::encode_with_options(&pixels, 30, 20, ColorType::Rgb, &options).unwrap();
    let b = jpeg::encode_with_options(&pixels, 30, 20, ColorType::Rgb, &options).unwrap();
    assert_eq!(a, b);
}

/// Test error handling for invalid input.
#[test]
fn test_error_handling() {
    let pixels = vec![0u8; 8 * 8 * 3];
    assert!(matches!(
        jpeg::encode(&pixels, 8, 8, 0),
        Err(Error::InvalidQuality(0))
    ));
    assert!(matches!(
        jpeg::encode(&pixels, 8, 8, 101),
        Err(Error::InvalidQuality(101))
    ));
    assert!(matches!(
        jpeg::encode(&[], 0, 8, 90),
        Err(Error::InvalidDimensions { .. })
    ));
    assert!(matches!(
        jpeg::encode(&pixels, 8, 7, 90),
        Err(Error::InvalidDataLength { .. })
    ));
}

/// Dimensions past the 16-bit SOF fields are rejected before any output.
#[test]
fn test_image_too_large() {
    let pixels = vec![0u8; 70_000 * 3];
    let mut out = Vec::new();
    let image = ImageRef::new(&pixels, 70_000, 1, ColorType::Rgb).unwrap();
    let err = jpeg::write_image(&image, &mut out, &JpegOptions::default()).unwrap_err();
    assert!(matches!(err, Error::ImageTooLarge { max: 65535, .. }));
    assert!(out.is_empty());
}

/// A stop signal raised before the call writes nothing.
#[test]
fn test_cancelled_writes_nothing() {
    let pixels = synthetic::gradient_rgb(16, 16);
    let image = ImageRef::new(&pixels, 16, 16, ColorType::Rgb).unwrap();
    let stop = AtomicBool::new(true);
    let mut out = Vec::new();
    let mut ctx = EncodeContext::new().with_stop(&stop);

    let err = jpeg::write_image_with_context(&image, &mut out, &JpegOptions::default(), &mut ctx)
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(out.is_empty());
}

/// Ensure encoded JPEGs decode via `image` and stay close to the input.
#[test]
fn test_jpeg_decode_via_image() {
    let pixels = synthetic::gradient_rgb(64, 48);
    for subsampling in [Subsampling::S444, Subsampling::S420] {
        let options = JpegOptions {
            quality: 90,
            subsampling,
            ..JpegOptions::default()
        };
        let encoded = jpeg::encode_with_options(&pixels, 64, 48, ColorType::Rgb, &options).unwrap();
        let decoded = image::load_from_memory(&encoded).expect("decode");
        assert_eq!(decoded.dimensions(), (64, 48));

        let error = synthetic::mean_abs_error(decoded.to_rgb8().as_raw(), &pixels);
        assert!(error < 4.0, "{subsampling:?}: mean error {error}");
    }
}

/// Randomized small-image decode across color types and sizes that do not
/// fill whole blocks.
#[test]
fn test_jpeg_decode_random_small() {
    let mut rng = StdRng::seed_from_u64(2025);
    let dims = [(1, 1), (2, 3), (5, 4), (8, 8), (16, 9), (17, 33)];

    for &(w, h) in &dims {
        for ct in [ColorType::Gray, ColorType::Rgb, ColorType::Rgba] {
            let mut pixels = vec![0u8; (w * h) as usize * ct.components()];
            rng.fill(pixels.as_mut_slice());
            for options in [JpegOptions::fast(85), JpegOptions::max(50)] {
                let encoded = jpeg::encode_with_options(&pixels, w, h, ct, &options).unwrap();
                let decoded = image::load_from_memory(&encoded).expect("decode");
                assert_eq!(decoded.dimensions(), (w, h));
            }
        }
    }
}

/// 4:2:0 declares 2x2 luma sampling and is smaller on smooth content.
#[test]
fn test_jpeg_subsampling_420() {
    let pixels = synthetic::gradient_rgb(64, 64);
    let full = jpeg::encode_with_options(&pixels, 64, 64, ColorType::Rgb, &JpegOptions::fast(85))
        .unwrap();
    let sub = jpeg::encode_with_options(&pixels, 64, 64, ColorType::Rgb, &JpegOptions::max(85))
        .unwrap();

    let sof = sub.windows(2).position(|w| w == [0xFF, 0xC0]).unwrap();
    assert_eq!(sub[sof + 11], 0x22);
    assert!(sub.len() < full.len());
}

/// Float rows are scaled by 255 and give the same stream as the byte rows.
#[test]
fn test_float_input_matches_bytes() {
    let bytes = synthetic::gradient_rgb(20, 12);
    let floats: Vec<f32> = bytes.iter().map(|&v| v as f32 / 255.0).collect();
    let image = FloatImageRef::new(&floats, 20, 12, ColorType::Rgb).unwrap();

    let options = JpegOptions {
        float_input: true,
        ..JpegOptions::default()
    };
    let mut from_floats = Vec::new();
    jpeg::write_image(&image, &mut from_floats, &options).unwrap();

    let from_bytes = jpeg::encode(&bytes, 20, 12, jpeg::DEFAULT_QUALITY).unwrap();
    let decoded_a = image::load_from_memory(&from_floats).unwrap().to_rgb8();
    let decoded_b = image::load_from_memory(&from_bytes).unwrap().to_rgb8();
    assert!(synthetic::mean_abs_error(decoded_a.as_raw(), decoded_b.as_raw()) < 1.0);
}

/// HDR-range floats saturate to the byte range instead of overflowing the
/// baseline Huffman categories.
#[test]
fn test_float_input_out_of_range_is_clamped() {
    let floats: Vec<f32> = (0..8 * 8 * 3)
        .map(|i| if (i / 3) % 2 == 0 { 40.0 } else { -3.0 })
        .collect();
    let bytes: Vec<u8> = floats.iter().map(|&v| if v > 1.0 { 255 } else { 0 }).collect();
    let image = FloatImageRef::new(&floats, 8, 8, ColorType::Rgb).unwrap();

    let options = JpegOptions {
        quality: 100,
        float_input: true,
        ..JpegOptions::default()
    };
    let mut from_floats = Vec::new();
    jpeg::write_image(&image, &mut from_floats, &options).unwrap();

    let mut from_bytes = Vec::new();
    let byte_options = JpegOptions {
        float_input: false,
        ..options
    };
    jpeg::encode_into(&mut from_bytes, &bytes, 8, 8, ColorType::Rgb, &byte_options).unwrap();
    assert_eq!(from_floats, from_bytes);

    let decoded = image::load_from_memory(&from_floats)
        .expect("decode jpeg")
        .to_rgb8();
    assert_eq!(decoded.dimensions(), (8, 8));
    assert!(synthetic::mean_abs_error(decoded.as_raw(), &bytes) < 16.0);
}

/// `encode_into` reuses and clears the caller's buffer.
#[test]
fn test_encode_into_clears_buffer() {
    let pixels = synthetic::gradient_rgb(8, 8);
    let mut out = vec![1, 2, 3];
    jpeg::encode_into(&mut out, &pixels, 8, 8, ColorType::Rgb, &JpegOptions::default()).unwrap();
    assert_eq!(&out[..2], &[0xFF, 0xD8]);
    assert_eq!(out, jpeg::encode(&pixels, 8, 8, 90).unwrap());
}

fn jpeg_case_strategy() -> impl Strategy<Value = (u32, u32, u8, ColorType, Subsampling, Vec<u8>)> {
    (1u32..40, 1u32..40, 1u8..=100).prop_flat_map(|(w, h, q)| {
        (
            prop_oneof![
                Just(ColorType::Gray),
                Just(ColorType::GrayAlpha),
                Just(ColorType::Rgb),
                Just(ColorType::Rgba),
            ],
            prop_oneof![Just(Subsampling::S444), Just(Subsampling::S420)],
        )
            .prop_flat_map(move |(color_type, subsampling)| {
                let len = (w * h) as usize * color_type.components();
                proptest::collection::vec(any::<u8>(), len)
                    .prop_map(move |data| (w, h, q, color_type, subsampling, data))
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]
    #[test]
    fn prop_jpeg_decode_randomized_options(
        (w, h, quality, color_type, subsampling, data) in jpeg_case_strategy()
    ) {
        let opts = JpegOptions {
            quality,
            subsampling,
            ..JpegOptions::default()
        };

        let encoded = jpeg::encode_with_options(&data, w, h, color_type, &opts).unwrap();
        prop_assert!(encoded.ends_with(&[0xFF, 0xD9]));

        let decoded = image::load_from_memory(&encoded).expect("decode");
        prop_assert_eq!(decoded.dimensions(), (w, h));
    }
}
