//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Resizing the image to (side+1) x side
//! 2. Converting to grayscale (mean of channels)
//! 3. Comparing each sample to the one on its right
//! 4. If left is darker than right, the bit is 1, else 0
//!
//! Every row contributes `side` bits, so the signature covers the whole
//! picture rather than only its top rows.

use super::fast_resize::FastResizer;
use super::{HashSignature, ImageHasher, GRID_HEIGHT, GRID_WIDTH};
use crate::error::HashError;
use image::{DynamicImage, GrayImage};

/// Difference Hash (dHash) implementation
pub struct DifferenceHasher {
    width: u32,
    height: u32,
}

impl DifferenceHasher {
    /// Hasher using the crate-wide grid
    pub fn new() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
        }
    }

    /// Hasher producing `side * side` bits from a `(side + 1) x side` grid
    pub fn with_side(side: u32) -> Self {
        Self {
            width: side + 1,
            height: side,
        }
    }

    /// Number of bits this hasher emits
    pub fn bit_count(&self) -> usize {
        ((self.width - 1) * self.height) as usize
    }

    /// Bits from an already-reduced grayscale grid, raster order
    fn bits_from_grid(&self, gray: &GrayImage) -> Vec<u8> {
        let mut bits = Vec::with_capacity(self.bit_count());
        for y in 0..self.height {
            for x in 0..self.width - 1 {
                let left = gray.get_pixel(x, y)[0];
                let right = gray.get_pixel(x + 1, y)[0];
                bits.push(u8::from(left < right));
            }
        }
        bits
    }
}

impl Default for DifferenceHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageHasher for DifferenceHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<HashSignature, HashError> {
        let gray = FastResizer::new().resize_to_grayscale(image, self.width, self.height)?;
        Ok(HashSignature::from_bits(self.bits_from_grid(&gray)))
    }
}
