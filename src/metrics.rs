//! Objective fidelity metrics between a cover and a stego image.
//!
//! SSIM here is the simplified single-window form: one set of means,
//! variances and covariance over the whole luma plane. It is not the
//! sliding-window SSIM of reference implementations and its values are not
//! comparable with theirs.

use image::RgbImage;
use serde::Serialize;

/// Peak channel value
const MAX_PIXEL_VALUE: f64 = 255.0;

/// SSIM stabilizer `(0.01 * 255)^2`
const SSIM_C1: f64 = (0.01 * MAX_PIXEL_VALUE) * (0.01 * MAX_PIXEL_VALUE);

/// SSIM stabilizer `(0.03 * 255)^2`
const SSIM_C2: f64 = (0.03 * MAX_PIXEL_VALUE) * (0.03 * MAX_PIXEL_VALUE);

/// PSNR and SSIM of a pair of images
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub mse: f64,
    /// `f64::INFINITY` for identical images
    pub psnr: f64,
    pub ssim: f64,
}

impl QualityMetrics {
    /// Compares two images of equal dimensions
    pub fn compare(original: &RgbImage, modified: &RgbImage) -> Self {
        let mse = mean_squared_error(original, modified);
        Self {
            mse,
            psnr: psnr_from_mse(mse),
            ssim: structural_similarity(original, modified),
        }
    }
}

/// Mean squared per-channel difference
pub fn mean_squared_error(original: &RgbImage, modified: &RgbImage) -> f64 {
    let original_samples = original.as_raw();
    let modified_samples = modified.as_raw();
    if original_samples.is_empty() {
        return 0.0;
    }

    let squared_error_sum: f64 = original_samples
        .iter()
        .zip(modified_samples)
        .map(|(&a, &b)| {
            let difference = a as f64 - b as f64;
            difference * difference
        })
        .sum();
    squared_error_sum / original_samples.len() as f64
}

/// `10 log10(255^2 / MSE)`, infinite when nothing changed
pub fn psnr_from_mse(mse: f64) -> f64 {
    if mse == 0.0 {
        return f64::INFINITY;
    }
    10.0 * (MAX_PIXEL_VALUE * MAX_PIXEL_VALUE / mse).log10()
}

/// Global single-window SSIM over BT.601 luma
pub fn structural_similarity(original: &RgbImage, modified: &RgbImage) -> f64 {
    let original_luma = luma_plane(original);
    let modified_luma = luma_plane(modified);
    if original_luma.is_empty() {
        return 1.0;
    }

    let original_mean = mean(&original_luma);
    let modified_mean = mean(&modified_luma);
    let original_variance = covariance(&original_luma, original_mean, &original_luma, original_mean);
    let modified_variance = covariance(&modified_luma, modified_mean, &modified_luma, modified_mean);
    let cross_covariance = covariance(&original_luma, original_mean, &modified_luma, modified_mean);

    let numerator =
        (2.0 * original_mean * modified_mean + SSIM_C1) * (2.0 * cross_covariance + SSIM_C2);
    let denominator = (original_mean * original_mean + modified_mean * modified_mean + SSIM_C1)
        * (original_variance + modified_variance + SSIM_C2);
    numerator / denominator
}

fn luma_plane(rgb_image: &RgbImage) -> Vec<f64> {
    rgb_image
        .pixels()
        .map(|pixel| 0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn covariance(a: &[f64], a_mean: f64, b: &[f64], b_mean: f64) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x - a_mean) * (y - b_mean))
        .sum::<f64>()
        / a.len() as f64
}
