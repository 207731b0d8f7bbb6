// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tensor conversion for the TrOCR vision encoder

use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;

/// Input size of the TrOCR ViT encoder
pub const TROCR_INPUT_SIZE: u32 = 384;

/// TrOCR normalizes every channel with mean 0.5
pub const MEAN: [f32; 3] = [0.5, 0.5, 0.5];

/// TrOCR normalizes every channel with std 0.5
pub const STD: [f32; 3] = [0.5, 0.5, 0.5];

/// Convert a canonical RGB image to an NCHW tensor [1, 3, 384, 384]
///
/// Canonical images are already 384x384 under the default letterbox policy;
/// anything else (native-size normalization) is stretched to fit, matching
/// what the reference image processor does.
pub fn preprocess_for_trocr(image: &RgbImage) -> Array4<f32> {
    let size = TROCR_INPUT_SIZE;
    let resized;
    let rgb = if image.dimensions() == (size, size) {
        image
    } else {
        resized = image::imageops::resize(image, size, size, FilterType::Triangle);
        &resized
    };

    let size = size as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));

    for y in 0..size {
        for x in 0..size {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
            }
        }
    }

    tensor
}
