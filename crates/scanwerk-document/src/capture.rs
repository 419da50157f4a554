// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture validation: every acquisition source (camera, file picker,
// clipboard) funnels through `validate_capture` before a payload may enter
// the page session.

use image::ImageFormat;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::{ImageKind, PageImage};
use tracing::{debug, instrument, warn};

/// Detect the raster format from the payload's magic bytes.
pub fn detect_kind(bytes: &[u8]) -> Option<ImageKind> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Jpeg => Some(ImageKind::Jpeg),
        ImageFormat::Png => Some(ImageKind::Png),
        ImageFormat::WebP => Some(ImageKind::Webp),
        ImageFormat::Gif => Some(ImageKind::Gif),
        ImageFormat::Bmp => Some(ImageKind::Bmp),
        ImageFormat::Tiff => Some(ImageKind::Tiff),
        _ => None,
    }
}

/// Validate a raw capture and wrap it as a `PageImage`.
///
/// Rejects payloads larger than `limit` bytes, payloads whose declared MIME
/// type is not `image/*`, and payloads whose signature is not a supported
/// raster format. Nothing is decoded here; decoding happens when a page is
/// opened for editing or compressed for upload.
#[instrument(skip(bytes), fields(size = bytes.len()))]
pub fn validate_capture(bytes: Vec<u8>, declared_mime: Option<&str>, limit: usize) -> Result<PageImage> {
    if bytes.len() > limit {
        warn!(limit, "capture rejected: too large");
        return Err(ScanwerkError::ImageTooLarge {
            size: bytes.len(),
            limit,
        });
    }

    if let Some(mime) = declared_mime {
        if !mime.to_ascii_lowercase().starts_with("image/") {
            warn!(mime, "capture rejected: not an image");
            return Err(ScanwerkError::UnsupportedMediaType(mime.to_string()));
        }
    }

    let kind = detect_kind(&bytes).ok_or_else(|| {
        ScanwerkError::UnsupportedMediaType(
            declared_mime.unwrap_or("unrecognised data").to_string(),
        )
    })?;

    debug!(kind = kind.mime_type(), "capture accepted");
    Ok(PageImage::new(bytes, kind))
}
