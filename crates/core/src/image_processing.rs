//! Image encoding and preview scaling utilities.
//!
//! Captured regions are shipped to the OCR service as PNG; clipboard images
//! are downscaled before they reach the overlay so per-frame painting stays
//! cheap. [`ImageFingerprint`] keys the preview cache so an unchanged
//! clipboard image is never re-encoded frame after frame.

use crate::error::{AppError, Result};
use image::codecs::png::PngEncoder;
use image::{imageops, ExtendedColorType, ImageEncoder, RgbaImage};

/// Identity of an image's content for cache purposes: dimensions plus the
/// raw byte length. Cheap to compute every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFingerprint {
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// Image processing helpers for the capture and preview paths.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Encodes an RGBA image as PNG bytes for upload.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageProcessing`] if encoding fails.
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
        let mut buffer: Vec<u8> = Vec::new();

        PngEncoder::new(&mut buffer)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;

        Ok(buffer)
    }

    /// Downscales an image by `scale` for the overlay preview.
    ///
    /// The result is never smaller than 1x1 regardless of scale.
    pub fn downscale_preview(image: &RgbaImage, scale: f32) -> RgbaImage {
        let width = ((image.width() as f32 * scale) as u32).max(1);
        let height = ((image.height() as f32 * scale) as u32).max(1);
        imageops::thumbnail(image, width, height)
    }

    /// Computes the content fingerprint used to key the preview cache.
    pub fn fingerprint(image: &RgbaImage) -> ImageFingerprint {
        ImageFingerprint {
            width: image.width(),
            height: image.height(),
            bytes: image.as_raw().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downscale_respects_scale_and_floor() {
        let image = RgbaImage::new(200, 100);
        let preview = ImageProcessor::downscale_preview(&image, 0.1);
        assert_eq!((preview.width(), preview.height()), (20, 10));

        let tiny = ImageProcessor::downscale_preview(&RgbaImage::new(3, 3), 0.1);
        assert_eq!((tiny.width(), tiny.height()), (1, 1));
    }

    #[test]
    fn fingerprint_tracks_dimensions() {
        let a = ImageProcessor::fingerprint(&RgbaImage::new(4, 4));
        let b = ImageProcessor::fingerprint(&RgbaImage::new(4, 4));
        let c = ImageProcessor::fingerprint(&RgbaImage::new(4, 5));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn encode_png_produces_magic_bytes() {
        let png = ImageProcessor::encode_png(&RgbaImage::new(2, 2)).unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }
}
