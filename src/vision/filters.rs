// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Grayscale filters used by the normalization pipeline
//!
//! All functions take an image by reference and return a new image.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::contrast;
use imageproc::definitions::Image;
use imageproc::filter::{median_filter, separable_filter_equal};

/// Intensity value used for background (paper) after binarization
pub const BACKGROUND: u8 = 255;

/// Intensity value used for ink after binarization
pub const INK: u8 = 0;

/// Minimum and maximum intensity of a grayscale image
///
/// Returns `None` for an image with no pixels.
pub fn intensity_range(image: &GrayImage) -> Option<(u8, u8)> {
    let mut pixels = image.pixels().map(|p| p[0]);
    let first = pixels.next()?;
    Some(pixels.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

/// Returns true if every pixel has the same intensity (or there are none)
pub fn is_constant(image: &GrayImage) -> bool {
    match intensity_range(image) {
        Some((lo, hi)) => lo == hi,
        None => true,
    }
}

/// Min-max contrast stretch to the full 0..=255 range
///
/// A constant image has no range to stretch and is returned unchanged.
pub fn stretch_contrast(image: &GrayImage) -> GrayImage {
    match intensity_range(image) {
        Some((lo, hi)) if lo < hi => contrast::stretch_contrast(image, lo, hi, INK, BACKGROUND),
        _ => image.clone(),
    }
}

/// Median denoising with a square window of side `2 * radius + 1`
///
/// Removes isolated specks from paper grain and sensor noise while
/// keeping stroke edges sharp. A radius of 0 is the identity.
pub fn denoise(image: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    median_filter(image, radius, radius)
}

/// Standard deviation used for a Gaussian window of the given size
///
/// Same derivation OpenCV uses when sigma is left unspecified.
pub fn gaussian_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian kernel of `block_size` taps
pub fn gaussian_kernel(block_size: u32) -> Vec<f32> {
    let sigma = gaussian_sigma(block_size);
    let radius = (block_size / 2) as f32;
    let weights: Vec<f32> = (0..block_size)
        .map(|i| {
            let d = i as f32 - radius;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Adaptive Gaussian thresholding
///
/// Each pixel is compared against the Gaussian-weighted mean of its
/// `block_size` x `block_size` neighbourhood minus `bias`. Pixels brighter
/// than that local threshold become background, the rest become ink.
/// Borders are handled by replicating edge pixels.
///
/// `block_size` must be odd and at least 3.
pub fn adaptive_threshold(image: &GrayImage, block_size: u32, bias: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    // Blur at f32 so the local mean can be rounded rather than truncated
    let source: Image<Luma<f32>> = ImageBuffer::from_fn(width, height, |x, y| {
        Luma([image.get_pixel(x, y)[0] as f32])
    });
    let kernel = gaussian_kernel(block_size);
    let local_mean = separable_filter_equal(&source, kernel.as_slice());

    GrayImage::from_fn(width, height, |x, y| {
        let threshold = local_mean.get_pixel(x, y)[0].round() - bias;
        if source.get_pixel(x, y)[0] > threshold {
            Luma([BACKGROUND])
        } else {
            Luma([INK])
        }
    })
}
