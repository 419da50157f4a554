// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload compression. A pure function from encoded bytes to encoded bytes;
// the caller decides whether to upload the original or the compressed copy.

use scanwerk_core::AppConfig;
use scanwerk_core::error::Result;
use tracing::{info, instrument};

use crate::image::ImageProcessor;

/// Compression parameters, normally taken from [`AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    /// Payloads at or below this size are returned untouched.
    pub threshold_bytes: usize,
    /// Longest edge after downscaling.
    pub max_dimension: u32,
    /// JPEG quality (1-100).
    pub quality: u8,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for CompressionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            threshold_bytes: config.compression_threshold_bytes,
            max_dimension: config.compression_max_dimension,
            quality: config.compression_quality,
        }
    }
}

/// Result of [`compress_for_upload`].
#[derive(Debug, Clone)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub original_len: usize,
    /// `false` when the input was under the threshold and passed through.
    pub was_compressed: bool,
}

/// Downscale and re-encode an oversized image for upload.
///
/// Inputs at or under `threshold_bytes` pass through unchanged. Larger inputs
/// are decoded, shrunk so the longer edge is at most `max_dimension`
/// (aspect ratio preserved, never upscaled) and re-encoded as JPEG.
#[instrument(skip(bytes), fields(size = bytes.len()))]
pub fn compress_for_upload(bytes: &[u8], settings: &CompressionSettings) -> Result<Compressed> {
    if bytes.len() <= settings.threshold_bytes {
        return Ok(Compressed {
            bytes: bytes.to_vec(),
            original_len: bytes.len(),
            was_compressed: false,
        });
    }

    let out = ImageProcessor::from_bytes(bytes)?
        .fit_within(settings.max_dimension)
        .to_jpeg_bytes(settings.quality)?;

    info!(
        from = bytes.len(),
        to = out.len(),
        quality = settings.quality,
        "Image compressed for upload"
    );

    Ok(Compressed {
        bytes: out,
        original_len: bytes.len(),
        was_compressed: true,
    })
}
