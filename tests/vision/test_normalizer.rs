// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Normalization tests
//!
//! Verify the canonical image guarantees:
//! - Exact target dimensions, 3 channels
//! - No cropping, aspect ratio preserved within rounding
//! - Padding is pure background
//! - Degenerate input produces a blank canvas and a warning

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use inkscribe::vision::normalizer::letterbox_region;
use inkscribe::vision::{ImageNormalizer, NormalizeWarning, NormalizerConfig, ResizePolicy};

/// Light paper with a brightness gradient and a few dark strokes
fn handwriting(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::from_fn(width, height, |x, _| {
        let v = 200 + (x * 40 / width.max(1)) as u8;
        Rgb([v, v, v.saturating_sub(10)])
    });
    for row in 0..3 {
        let y0 = height / 4 + row * height / 4;
        for x in width / 10..width * 9 / 10 {
            for y in y0..(y0 + (height / 100).max(2)).min(height) {
                img.put_pixel(x, y, Rgb([30, 30, 40]));
            }
        }
    }
    DynamicImage::ImageRgb8(img)
}

fn assert_padding_is_background(canonical: &inkscribe::CanonicalImage) {
    let content = canonical.content();
    for (x, y, px) in canonical.image().enumerate_pixels() {
        if !content.contains(x, y) {
            assert_eq!(*px, Rgb([255, 255, 255]), "padding pixel at ({}, {})", x, y);
        }
    }
}

#[test]
fn test_wide_photo_gets_vertical_padding() {
    let canonical = ImageNormalizer::default().normalize(&handwriting(1200, 800));

    assert_eq!(canonical.width(), 384);
    assert_eq!(canonical.height(), 384);
    assert_eq!(canonical.image().as_raw().len(), 384 * 384 * 3);

    let content = canonical.content();
    assert_eq!((content.x, content.y), (0, 64));
    assert_eq!((content.width, content.height), (384, 256));
    assert_padding_is_background(&canonical);
    assert!(!canonical.is_degenerate());
}

#[test]
fn test_output_dimensions_always_match_target() {
    let normalizer = ImageNormalizer::default();
    for (w, h) in [(50, 50), (640, 480), (300, 1000), (2000, 90), (384, 384)] {
        let canonical = normalizer.normalize(&handwriting(w, h));
        assert_eq!((canonical.width(), canonical.height()), (384, 384), "source {}x{}", w, h);
        assert_padding_is_background(&canonical);
    }
}

#[test]
fn test_aspect_ratio_preserved() {
    for (w, h) in [(1200, 800), (640, 480), (300, 1000), (2000, 90), (77, 131)] {
        let region = letterbox_region(w, h, 384, 384);
        let source_ratio = w as f64 / h as f64;

        // one pixel of rounding on the shorter scaled side
        let lo = (region.width as f64) / (region.height as f64 + 1.0);
        let hi = (region.width as f64 + 1.0) / (region.height as f64);
        assert!(
            lo <= source_ratio && source_ratio <= hi,
            "{}x{} -> {:?}",
            w,
            h,
            region
        );
        assert!(region.width == 384 || region.height == 384);
    }
}

#[test]
fn test_canonical_is_binary_ink_on_white() {
    let canonical = ImageNormalizer::default().normalize(&handwriting(768, 768));

    // 768 -> 384 is an exact 2x downscale; strokes stay dark, paper stays white
    let img = canonical.image();
    let dark = img.pixels().filter(|p| p[0] < 128).count();
    let light = img.pixels().filter(|p| p[0] >= 128).count();
    assert!(dark > 0);
    assert!(light > dark);
    assert!(img.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
}

#[test]
fn test_constant_image_yields_blank_canvas_and_warning() {
    let flat = DynamicImage::ImageLuma8(GrayImage::from_pixel(640, 200, Luma([180])));
    let canonical = ImageNormalizer::default().normalize(&flat);

    assert_eq!((canonical.width(), canonical.height()), (384, 384));
    assert!(canonical.image().pixels().all(|p| *p == Rgb([255, 255, 255])));
    assert!(canonical.is_degenerate());
    assert!(matches!(
        canonical.warnings()[0],
        NormalizeWarning::DegenerateImage { .. }
    ));
}

#[test]
fn test_normalization_is_deterministic() {
    let normalizer = ImageNormalizer::default();
    let source = handwriting(500, 300);
    let a = normalizer.normalize(&source);
    let b = normalizer.normalize(&source);
    assert_eq!(a.image().as_raw(), b.image().as_raw());
    assert_eq!(a.content(), b.content());
}

#[test]
fn test_custom_target_size() {
    let normalizer = ImageNormalizer::new(NormalizerConfig {
        target_width: 256,
        target_height: 64,
        ..Default::default()
    });
    let canonical = normalizer.normalize(&handwriting(1000, 500));

    assert_eq!((canonical.width(), canonical.height()), (256, 64));
    assert_eq!(canonical.content().width, 128);
    assert_eq!(canonical.content().x, 64);
    assert_padding_is_background(&canonical);
}

#[test]
fn test_native_policy_keeps_source_size() {
    let normalizer = ImageNormalizer::new(NormalizerConfig {
        resize_policy: ResizePolicy::Native,
        ..Default::default()
    });
    let canonical = normalizer.normalize(&handwriting(321, 123));
    assert_eq!((canonical.width(), canonical.height()), (321, 123));
    assert_eq!(canonical.source_dimensions(), (321, 123));
}
