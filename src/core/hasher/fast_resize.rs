//! Fast SIMD-accelerated image resizing.
//!
//! Uses fast_image_resize, which picks AVX2/NEON paths when available.
//! Grayscale here is the unweighted mean of the three channels, not the
//! luma weighting `image` uses.

use crate::error::HashError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage};

/// Fast image resizer using SIMD acceleration
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    /// Create a new fast resizer
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Resize to exactly `width` x `height` RGB, ignoring aspect ratio.
    pub fn resize_rgb(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, HashError> {
        let rgb = image.to_rgb8();
        let (src_width, src_height) = rgb.dimensions();

        if src_width == 0 || src_height == 0 {
            return Err(HashError::Resize("Invalid source dimensions".to_string()));
        }
        if width == 0 || height == 0 {
            return Err(HashError::Resize("Invalid destination dimensions".to_string()));
        }

        let src_image = Image::from_vec_u8(src_width, src_height, rgb.into_raw(), PixelType::U8x3)
            .map_err(|e| HashError::Resize(format!("Failed to create source image: {}", e)))?;

        let mut dst_image = Image::new(width, height, PixelType::U8x3);

        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| HashError::Resize(e.to_string()))?;

        ImageBuffer::from_raw(width, height, dst_image.into_vec())
            .ok_or_else(|| HashError::Resize("Failed to create result buffer".to_string()))
    }

    /// Resize to `width` x `height` and reduce to mean-of-channels gray.
    pub fn resize_to_grayscale(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, HashError> {
        let rgb = self.resize_rgb(image, width, height)?;
        Ok(average_grayscale(&rgb))
    }

    /// Fit inside a `side` x `side` square keeping aspect ratio, centre it
    /// on black, and reduce to gray.
    pub fn fit_to_square(
        &mut self,
        image: &DynamicImage,
        side: u32,
    ) -> Result<GrayImage, HashError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(HashError::Resize("Invalid source dimensions".to_string()));
        }

        let scale = side as f64 / width.max(height) as f64;
        let fit_width = ((width as f64 * scale).round() as u32).clamp(1, side);
        let fit_height = ((height as f64 * scale).round() as u32).clamp(1, side);

        let fitted = self.resize_to_grayscale(image, fit_width, fit_height)?;

        let mut canvas = GrayImage::new(side, side);
        let x = ((side - fit_width) / 2) as i64;
        let y = ((side - fit_height) / 2) as i64;
        image::imageops::overlay(&mut canvas, &fitted, x, y);

        Ok(canvas)
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Unweighted average of R, G and B per pixel
pub fn average_grayscale(rgb: &RgbImage) -> GrayImage {
    ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([((r as u16 + g as u16 + b as u16) / 3) as u8])
    })
}

/// Convenience function for one-off resizing
pub fn resize_to_grayscale(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<GrayImage, HashError> {
    FastResizer::new().resize_to_grayscale(image, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = ((x + y) * 128 / (width + height).max(1)) as u8;
            Rgb([r, g, b])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn resize_produces_correct_dimensions() {
        let resized = resize_to_grayscale(&create_test_image(100, 100), 9, 8).unwrap();
        assert_eq!(resized.dimensions(), (9, 8));
    }

    #[test]
    fn grayscale_is_unweighted_mean() {
        let mut rgb = RgbImage::new(1, 1);
        rgb.put_pixel(0, 0, Rgb([30, 60, 90]));

        assert_eq!(average_grayscale(&rgb).get_pixel(0, 0)[0], 60);
    }

    #[test]
    fn fit_to_square_letterboxes_wide_images() {
        let wide = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(200, 100, Rgb([255, 255, 255])));
        let square = FastResizer::new().fit_to_square(&wide, 128).unwrap();

        assert_eq!(square.dimensions(), (128, 128));
        // Top band is padding, centre row is image
        assert_eq!(square.get_pixel(64, 0)[0], 0);
        assert!(square.get_pixel(64, 64)[0] > 200);
    }

    #[test]
    fn resizer_reuse() {
        let mut resizer = FastResizer::new();
        let image = create_test_image(100, 100);

        let first = resizer.resize_to_grayscale(&image, 8, 8).unwrap();
        let second = resizer.resize_to_grayscale(&image, 8, 8).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn zero_destination_is_rejected() {
        assert!(resize_to_grayscale(&create_test_image(10, 10), 0, 8).is_err());
    }
}
