//! Image cleanup before recognition.
//!
//! Steps, in order:
//! 1. Decode
//! 2. Downscale so the longest edge fits `max_dimension` (never upscale)
//! 3. Convert to grayscale
//! 4. Stretch contrast between the clipped darkest and brightest percentiles
//! 5. Unsharp mask
//! 6. Encode as PNG
//!
//! The transform is deterministic. It never fails the job: any fault passes
//! the original bytes through untouched.

use crate::core::config::PreprocessingConfig;
use crate::{IngestError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat};
use std::io::Cursor;

/// Output of [`ImagePreprocessor::prepare`].
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Bytes to send to OCR: the processed PNG, or the original bytes on passthrough.
    pub bytes: Vec<u8>,
    pub applied: bool,
    pub original_size: usize,
    pub original_dimensions: Option<(u32, u32)>,
    pub processed_dimensions: Option<(u32, u32)>,
    /// Why preprocessing was skipped, if it was.
    pub passthrough_reason: Option<String>,
}

impl PreparedImage {
    fn passthrough(bytes: &[u8], reason: String) -> Self {
        Self {
            bytes: bytes.to_vec(),
            applied: false,
            original_size: bytes.len(),
            original_dimensions: None,
            processed_dimensions: None,
            passthrough_reason: Some(reason),
        }
    }

    pub fn processed_size(&self) -> usize {
        self.bytes.len()
    }
}

/// Deterministic grayscale cleanup pipeline.
#[derive(Debug, Clone, Default)]
pub struct ImagePreprocessor {
    config: PreprocessingConfig,
}

impl ImagePreprocessor {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Prepare `bytes` for recognition. Never fails.
    pub fn prepare(&self, bytes: &[u8]) -> PreparedImage {
        if !self.config.enabled {
            return PreparedImage::passthrough(bytes, "preprocessing disabled".to_string());
        }

        match self.try_prepare(bytes) {
            Ok(prepared) => {
                tracing::debug!(
                    original_size = prepared.original_size,
                    processed_size = prepared.processed_size(),
                    "Image preprocessed"
                );
                prepared
            }
            Err(e) => {
                tracing::warn!(error = %e, "Image preprocessing failed, forwarding original bytes");
                PreparedImage::passthrough(bytes, e.to_string())
            }
        }
    }

    /// Run the pipeline, reporting faults instead of passing through.
    pub fn try_prepare(&self, bytes: &[u8]) -> Result<PreparedImage> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| IngestError::image_processing_with_source("failed to decode image", e))?;
        let original_dimensions = (img.width(), img.height());

        let img = self.bound_dimensions(img);
        let mut gray = img.to_luma8();
        stretch_contrast(&mut gray, self.config.clip_percent);
        let sharpened = image::imageops::unsharpen(&gray, self.config.sharpen_sigma, self.config.sharpen_threshold);
        let processed_dimensions = sharpened.dimensions();

        let png = encode_png(sharpened)?;

        Ok(PreparedImage {
            bytes: png,
            applied: true,
            original_size: bytes.len(),
            original_dimensions: Some(original_dimensions),
            processed_dimensions: Some(processed_dimensions),
            passthrough_reason: None,
        })
    }

    fn bound_dimensions(&self, img: DynamicImage) -> DynamicImage {
        let max = self.config.max_dimension;
        if img.width() <= max && img.height() <= max {
            return img;
        }
        // resize keeps the aspect ratio and fits both edges within the bounds
        img.resize(max, max, FilterType::Lanczos3)
    }
}

/// Linearly map the `[low, high]` luminance range to `[0, 255]`.
///
/// `low` and `high` are the intensities below/above which `clip_percent`
/// percent of the pixels lie. A flat image is left alone.
pub fn stretch_contrast(img: &mut GrayImage, clip_percent: f32) {
    let total = img.pixels().len();
    if total == 0 {
        return;
    }

    let mut histogram = [0usize; 256];
    for pixel in img.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let clip = ((total as f64) * f64::from(clip_percent.max(0.0)) / 100.0) as usize;
    let low = percentile_bound(histogram.iter().enumerate(), clip);
    let high = percentile_bound(histogram.iter().enumerate().rev(), clip);

    if high <= low {
        return;
    }

    let range = f32::from(high - low);
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let scaled = (value as f32 - f32::from(low)) * 255.0 / range;
        *slot = scaled.round().clamp(0.0, 255.0) as u8;
    }

    for pixel in img.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
}

fn percentile_bound<'a>(bins: impl Iterator<Item = (usize, &'a usize)>, clip: usize) -> u8 {
    let mut seen = 0usize;
    let mut fallback = 0u8;
    for (value, count) in bins {
        if *count == 0 {
            continue;
        }
        fallback = value as u8;
        seen += count;
        if seen > clip {
            return value as u8;
        }
    }
    fallback
}

fn encode_png(img: GrayImage) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img)
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| IngestError::image_processing_with_source("PNG encoding failed", e))?;
    Ok(cursor.into_inner())
}
