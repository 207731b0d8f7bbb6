// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image normalization for the recognition model
//!
//! Converts an arbitrary photo of handwriting into the fixed-size, 3-channel
//! canonical image the recognizer expects:
//!
//! 1. Grayscale
//! 2. Min-max contrast stretch
//! 3. Median denoise
//! 4. Adaptive Gaussian threshold (ink/background)
//! 5. Aspect-preserving downscale/upscale to fit the target
//! 6. Centered paste onto a white canvas (letterbox)
//! 7. Gray to RGB channel replication

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::filters::{adaptive_threshold, denoise, is_constant, stretch_contrast, BACKGROUND};

/// Default canonical width expected by TrOCR-style encoders
pub const DEFAULT_TARGET_WIDTH: u32 = 384;

/// Default canonical height expected by TrOCR-style encoders
pub const DEFAULT_TARGET_HEIGHT: u32 = 384;

/// Default neighbourhood size for adaptive thresholding
pub const DEFAULT_THRESHOLD_BLOCK: u32 = 31;

/// Default bias subtracted from the local mean (favours background)
pub const DEFAULT_THRESHOLD_BIAS: f32 = 15.0;

/// Default median filter radius (3x3 window)
pub const DEFAULT_DENOISE_RADIUS: u32 = 1;

/// Whether the binarized image is letterboxed to the target size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResizePolicy {
    /// Scale to fit and pad to the exact target dimensions
    #[default]
    Letterbox,
    /// Keep the source dimensions (for recognizers without a fixed input size)
    Native,
}

/// Normalization parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub target_width: u32,
    pub target_height: u32,
    /// Odd window size (pixels) for the adaptive threshold
    pub threshold_block_size: u32,
    /// Constant subtracted from the local mean before comparison
    pub threshold_bias: f32,
    /// Median filter radius, 0 disables denoising
    pub denoise_radius: u32,
    pub resize_policy: ResizePolicy,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_WIDTH,
            target_height: DEFAULT_TARGET_HEIGHT,
            threshold_block_size: DEFAULT_THRESHOLD_BLOCK,
            threshold_bias: DEFAULT_THRESHOLD_BIAS,
            denoise_radius: DEFAULT_DENOISE_RADIUS,
            resize_policy: ResizePolicy::Letterbox,
        }
    }
}

impl NormalizerConfig {
    /// Check parameters that would otherwise produce nonsense output
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.target_width == 0 || self.target_height == 0 {
            anyhow::bail!(
                "Target dimensions must be non-zero, got {}x{}",
                self.target_width,
                self.target_height
            );
        }
        if self.threshold_block_size < 3 || self.threshold_block_size % 2 == 0 {
            anyhow::bail!(
                "Threshold block size must be odd and >= 3, got {}",
                self.threshold_block_size
            );
        }
        Ok(())
    }
}

/// Non-fatal conditions observed while normalizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizeWarning {
    /// Zero width/height or zero intensity variance; a blank canvas was produced
    DegenerateImage { reason: String },
}

/// Where the scaled source landed on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ContentRegion {
    /// Returns true if the pixel lies inside the pasted region
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }
}

/// Fixed-size, 3-channel image ready for the recognizer
#[derive(Debug, Clone)]
pub struct CanonicalImage {
    image: RgbImage,
    content: ContentRegion,
    source_width: u32,
    source_height: u32,
    warnings: Vec<NormalizeWarning>,
}

impl CanonicalImage {
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Region of the canvas holding source content (the rest is padding)
    pub fn content(&self) -> ContentRegion {
        self.content
    }

    pub fn source_dimensions(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    pub fn warnings(&self) -> &[NormalizeWarning] {
        &self.warnings
    }

    pub fn is_degenerate(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, NormalizeWarning::DegenerateImage { .. }))
    }
}

/// Compute the letterbox placement of a `width` x `height` source
///
/// The scale is `min(target_h / h, target_w / w)`; scaled dimensions are
/// truncated and kept at least one pixel. Offsets center the content with
/// the odd remainder on the trailing side.
pub fn letterbox_region(
    width: u32,
    height: u32,
    target_width: u32,
    target_height: u32,
) -> ContentRegion {
    if width == 0 || height == 0 {
        return ContentRegion {
            x: target_width / 2,
            y: target_height / 2,
            width: 0,
            height: 0,
        };
    }

    // s = min(th / h, tw / w), evaluated in integers so the constrained
    // axis lands exactly on the target and the other axis is floor(dim * s)
    let (w, h, tw, th) = (width as u64, height as u64, target_width as u64, target_height as u64);
    let (new_w, new_h) = if tw * h <= th * w {
        (tw, h * tw / w)
    } else {
        (w * th / h, th)
    };
    let new_w = (new_w as u32).clamp(1, target_width);
    let new_h = (new_h as u32).clamp(1, target_height);

    ContentRegion {
        x: (target_width - new_w) / 2,
        y: (target_height - new_h) / 2,
        width: new_w,
        height: new_h,
    }
}

/// Deterministic raster-to-canonical image transform
#[derive(Debug, Clone, Default)]
pub struct ImageNormalizer {
    config: NormalizerConfig,
}

impl ImageNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a decoded image
    ///
    /// Never fails: degenerate input yields a blank canvas and a warning.
    pub fn normalize(&self, image: &DynamicImage) -> CanonicalImage {
        let start = Instant::now();
        let (src_w, src_h) = image.dimensions();

        if src_w == 0 || src_h == 0 {
            return self.blank(src_w, src_h, format!("zero-sized image {}x{}", src_w, src_h));
        }

        let gray = image.to_luma8();
        if is_constant(&gray) {
            return self.blank(src_w, src_h, "image has zero intensity variance".to_string());
        }

        let binary = self.binarize(&gray);

        let canonical = match self.config.resize_policy {
            ResizePolicy::Letterbox => self.letterbox(&binary),
            ResizePolicy::Native => {
                let content = ContentRegion {
                    x: 0,
                    y: 0,
                    width: src_w,
                    height: src_h,
                };
                self.finish(binary, content, src_w, src_h, Vec::new())
            }
        };

        debug!(
            "Normalized {}x{} -> {}x{} (content {:?}) in {}ms",
            src_w,
            src_h,
            canonical.width(),
            canonical.height(),
            canonical.content,
            start.elapsed().as_millis()
        );

        canonical
    }

    /// Steps 2-4: stretch, denoise, threshold
    pub fn binarize(&self, gray: &GrayImage) -> GrayImage {
        let stretched = stretch_contrast(gray);
        let denoised = denoise(&stretched, self.config.denoise_radius);
        adaptive_threshold(
            &denoised,
            self.config.threshold_block_size,
            self.config.threshold_bias,
        )
    }

    /// Steps 5-6: scale to fit and paste centered onto a white canvas
    fn letterbox(&self, binary: &GrayImage) -> CanonicalImage {
        let (src_w, src_h) = binary.dimensions();
        let (target_w, target_h) = (self.config.target_width, self.config.target_height);
        let region = letterbox_region(src_w, src_h, target_w, target_h);

        let resized = imageops::resize(binary, region.width, region.height, FilterType::Triangle);

        let mut canvas = GrayImage::from_pixel(target_w, target_h, Luma([BACKGROUND]));
        imageops::replace(&mut canvas, &resized, region.x as i64, region.y as i64);

        self.finish(canvas, region, src_w, src_h, Vec::new())
    }

    fn blank(&self, src_w: u32, src_h: u32, reason: String) -> CanonicalImage {
        warn!("Degenerate image ({}), producing blank canvas", reason);

        let (width, height) = match self.config.resize_policy {
            ResizePolicy::Letterbox => (self.config.target_width, self.config.target_height),
            ResizePolicy::Native => (src_w, src_h),
        };
        let region = match self.config.resize_policy {
            ResizePolicy::Letterbox => letterbox_region(src_w, src_h, width, height),
            ResizePolicy::Native => ContentRegion {
                x: 0,
                y: 0,
                width,
                height,
            },
        };
        let canvas = GrayImage::from_pixel(width, height, Luma([BACKGROUND]));

        self.finish(
            canvas,
            region,
            src_w,
            src_h,
            vec![NormalizeWarning::DegenerateImage { reason }],
        )
    }

    /// Step 7: replicate the gray channel into RGB
    fn finish(
        &self,
        gray: GrayImage,
        content: ContentRegion,
        source_width: u32,
        source_height: u32,
        warnings: Vec<NormalizeWarning>,
    ) -> CanonicalImage {
        CanonicalImage {
            image: DynamicImage::ImageLuma8(gray).to_rgb8(),
            content,
            source_width,
            source_height,
            warnings,
        }
    }
}
