//! Structural similarity (SSIM) between two same-size grayscale images.
//!
//! Windowed SSIM: statistics are taken over `WINDOW` x `WINDOW` blocks
//! placed every `STRIDE` pixels, and the per-window indices are averaged.

use crate::error::VerifyError;
use image::GrayImage;

/// Side of the square comparison window
pub const WINDOW: u32 = 8;

/// Distance between neighbouring window origins
pub const STRIDE: u32 = 4;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DYNAMIC_RANGE: f64 = 255.0;

const C1: f64 = (K1 * DYNAMIC_RANGE) * (K1 * DYNAMIC_RANGE);
const C2: f64 = (K2 * DYNAMIC_RANGE) * (K2 * DYNAMIC_RANGE);

/// Mean SSIM of `a` and `b`, clamped to `[0, 1]`.
///
/// Images smaller than a window are compared as a single window.
pub fn ssim(a: &GrayImage, b: &GrayImage) -> Result<f64, VerifyError> {
    if a.dimensions() != b.dimensions() {
        return Err(VerifyError::SizeMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }

    let (width, height) = a.dimensions();
    if width == 0 || height == 0 {
        return Ok(1.0);
    }

    let window_w = WINDOW.min(width);
    let window_h = WINDOW.min(height);

    let mut total = 0.0;
    let mut windows = 0u32;

    for y in window_origins(height, window_h) {
        for x in window_origins(width, window_w) {
            total += window_index(a, b, x, y, window_w, window_h);
            windows += 1;
        }
    }

    Ok((total / windows as f64).clamp(0.0, 1.0))
}

fn window_origins(extent: u32, window: u32) -> impl Iterator<Item = u32> {
    (0..=extent - window).step_by(STRIDE as usize)
}

fn window_index(a: &GrayImage, b: &GrayImage, x0: u32, y0: u32, w: u32, h: u32) -> f64 {
    let n = (w * h) as f64;
    let (mut sum_a, mut sum_b) = (0.0, 0.0);
    let (mut sum_aa, mut sum_bb, mut sum_ab) = (0.0, 0.0, 0.0);

    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let pa = a.get_pixel(x, y)[0] as f64;
            let pb = b.get_pixel(x, y)[0] as f64;
            sum_a += pa;
            sum_b += pb;
            sum_aa += pa * pa;
            sum_bb += pb * pb;
            sum_ab += pa * pb;
        }
    }

    let mean_a = sum_a / n;
    let mean_b = sum_b / n;
    let var_a = sum_aa / n - mean_a * mean_a;
    let var_b = sum_bb / n - mean_b * mean_b;
    let covariance = sum_ab / n - mean_a * mean_b;

    let numerator = (2.0 * mean_a * mean_b + C1) * (2.0 * covariance + C2);
    let denominator = (mean_a * mean_a + mean_b * mean_b + C1) * (var_a + var_b + C2);

    numerator / denominator
}
