//! Image decoding with a fast JPEG path.
//!
//! Uses zune-jpeg for JPEG files, falls back to the image crate for
//! everything else and for JPEGs zune-jpeg rejects.

use crate::core::duplicates::read_file_bytes;
use crate::error::HashError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decoder that picks the fastest available backend per format
pub struct FastDecoder;

impl FastDecoder {
    /// Decode an image from a file path.
    pub fn decode(path: &Path) -> Result<DynamicImage, HashError> {
        let image = if is_jpeg(path) {
            Self::decode_jpeg(path).or_else(|_| Self::decode_fallback(path))?
        } else {
            Self::decode_fallback(path)?
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(HashError::EmptyImage {
                path: path.to_path_buf(),
            });
        }

        Ok(image)
    }

    fn decode_jpeg(path: &Path) -> Result<DynamicImage, HashError> {
        let file_bytes = read_file_bytes(path)?;

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&file_bytes[..], options);

        let pixels = decoder.decode().map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: "Failed to get image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;
        let buffer_error = || HashError::DecodeError {
            path: path.to_path_buf(),
            reason: "Decoded buffer does not match image size".to_string(),
        };

        let image = match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => DynamicImage::ImageRgb8(
                ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels).ok_or_else(buffer_error)?,
            ),
            ColorSpace::RGBA => DynamicImage::ImageRgba8(
                ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
                    .ok_or_else(buffer_error)?,
            ),
            ColorSpace::Luma => DynamicImage::ImageLuma8(
                ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
                    .ok_or_else(buffer_error)?,
            ),
            _ => return Self::decode_fallback(path),
        };

        Ok(image)
    }

    fn decode_fallback(path: &Path) -> Result<DynamicImage, HashError> {
        image::open(path).map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn jpeg_detection_is_case_insensitive() {
        assert!(is_jpeg(Path::new("photo.JPG")));
        assert!(is_jpeg(Path::new("photo.jpeg")));
        assert!(!is_jpeg(Path::new("photo.png")));
    }

    #[test]
    fn decodes_png_through_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.png");
        image::RgbImage::from_pixel(4, 3, Rgb([10, 20, 30])).save(&path).unwrap();

        let decoded = FastDecoder::decode(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn decodes_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.jpg");
        image::RgbImage::from_pixel(16, 8, Rgb([200, 100, 50])).save(&path).unwrap();

        let decoded = FastDecoder::decode(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"this is not a valid image file").unwrap();

        assert!(FastDecoder::decode(&path).is_err());
    }
}
