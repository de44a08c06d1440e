pub mod cli;
pub mod complexity;
pub mod config;
pub mod error;
pub mod metrics;
pub mod payload;
pub mod planner;
pub mod steganography;
pub mod visualize;

pub use config::{CarrierChannel, EmbeddingConfiguration};
pub use error::{Result, SteganographyError};
pub use steganography::{
    CapacityAnalysis, EmbeddingMetrics, EmbeddingResult, ExtractionReport, SteganographyEngine,
};

use image::RgbImage;

/// Hides `secret_text` in a copy of `cover_image` using the default configuration
pub fn embed(cover_image: &RgbImage, secret_text: &str) -> Result<EmbeddingResult> {
    SteganographyEngine::new().hide_text_in_rgb_image(cover_image, secret_text)
}

/// Recovers text hidden with [`embed`]
pub fn extract(stego_image: &RgbImage) -> Result<String> {
    Ok(SteganographyEngine::new()
        .extract_text_from_rgb_image(stego_image)?
        .secret_text)
}
