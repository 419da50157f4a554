// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode, quarter-turn rotation, crop, fit-within resize,
// and re-encoding. Operates on in-memory images using the `image` crate.

use image::{DynamicImage, ImageFormat, RgbaImage};
use scanwerk_core::error::ScanwerkError;
use scanwerk_core::types::{PixelRect, Rotation};
use tracing::{debug, info, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let jpeg = ImageProcessor::from_bytes(&page_bytes)?
///     .rotate(Rotation::Deg90)
///     .fit_within(1500)
///     .to_jpeg_bytes(80)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanwerkError> {
        let img = image::load_from_memory(data).map_err(|err| {
            ScanwerkError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Consume the processor and return an RGBA8 canvas.
    pub fn into_rgba8(self) -> RgbaImage {
        self.image.into_rgba8()
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Rotate clockwise by a quarter-turn multiple.
    ///
    /// Quarter turns are lossless: the pixel grid is re-indexed about the
    /// image centre, and 90/270 swap width and height.
    #[instrument(skip(self), fields(degrees = rotation.degrees()))]
    pub fn rotate(self, rotation: Rotation) -> Self {
        let image = match rotation {
            Rotation::Deg0 => return self,
            Rotation::Deg90 => self.image.rotate90(),
            Rotation::Deg180 => self.image.rotate180(),
            Rotation::Deg270 => self.image.rotate270(),
        };
        debug!(
            new_w = image.width(),
            new_h = image.height(),
            "Rotation applied"
        );
        Self { image }
    }

    /// Crop to a pixel rectangle. Values are clamped to image bounds.
    #[instrument(skip(self))]
    pub fn crop(self, rect: PixelRect) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = rect.x.min(img_w.saturating_sub(1));
        let safe_y = rect.y.min(img_h.saturating_sub(1));
        let safe_w = rect.width.min(img_w - safe_x);
        let safe_h = rect.height.min(img_h - safe_y);

        info!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        let cropped = self.image.crop_imm(safe_x, safe_y, safe_w, safe_h);
        Self { image: cropped }
    }

    /// Downscale so the longer edge is at most `max_edge`, preserving aspect
    /// ratio. Images already within bounds are returned unchanged (no
    /// upscaling). Uses Lanczos3 filtering.
    #[instrument(skip(self), fields(max_edge))]
    pub fn fit_within(self, max_edge: u32) -> Self {
        let (w, h) = (self.image.width(), self.image.height());
        if w.max(h) <= max_edge {
            return self;
        }
        info!(from_w = w, from_h = h, max_edge, "Downscaling image");
        let resized = self
            .image
            .resize(max_edge, max_edge, image::imageops::FilterType::Lanczos3);
        debug!(
            new_w = resized.width(),
            new_h = resized.height(),
            "Resize complete"
        );
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ScanwerkError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    ///
    /// JPEG has no alpha channel, so transparency is dropped.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, ScanwerkError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder).map_err(|err| {
            ScanwerkError::ImageError(format!("JPEG encoding failed: {}", err))
        })?;
        Ok(buffer)
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ScanwerkError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        ScanwerkError::ImageError(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255])))
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        let p = ImageProcessor::from_dynamic(sample(40, 10)).rotate(Rotation::Deg90);
        assert_eq!((p.width(), p.height()), (10, 40));
        let p = p.rotate(Rotation::Deg270);
        assert_eq!((p.width(), p.height()), (40, 10));
        let p = p.rotate(Rotation::Deg180);
        assert_eq!((p.width(), p.height()), (40, 10));
    }

    #[test]
    fn rotate_90_moves_top_left_to_top_right() {
        let mut img = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let rotated = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(img))
            .rotate(Rotation::Deg90)
            .into_rgba8();
        assert_eq!(rotated.dimensions(), (2, 4));
        assert_eq!(rotated.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn crop_is_clamped_to_bounds() {
        let p = ImageProcessor::from_dynamic(sample(20, 20)).crop(PixelRect {
            x: 15,
            y: 15,
            width: 50,
            height: 50,
        });
        assert_eq!((p.width(), p.height()), (5, 5));
    }

    #[test]
    fn fit_within_never_upscales() {
        let p = ImageProcessor::from_dynamic(sample(100, 50)).fit_within(1500);
        assert_eq!((p.width(), p.height()), (100, 50));

        let p = ImageProcessor::from_dynamic(sample(300, 150)).fit_within(100);
        assert_eq!((p.width(), p.height()), (100, 50));
    }

    #[test]
    fn jpeg_round_trip_decodes() {
        let bytes = ImageProcessor::from_dynamic(sample(16, 8))
            .to_jpeg_bytes(92)
            .unwrap();
        let back = ImageProcessor::from_bytes(&bytes).unwrap();
        assert_eq!((back.width(), back.height()), (16, 8));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            ImageProcessor::from_bytes(b"definitely not an image"),
            Err(ScanwerkError::ImageError(_))
        ));
    }
}
