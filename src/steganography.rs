use crate::complexity::{ComplexityMap, SobelAnalyzer};
use crate::config::EmbeddingConfiguration;
use crate::error::{Result, SteganographyError};
use crate::metrics::QualityMetrics;
use crate::payload::{self, HEADER_BITS};
use crate::planner::{BitDepth, BitDepthPlan, BlockPlanner};
use image::{DynamicImage, RgbImage};
use serde::Serialize;
use tracing::{debug, info};

/// Metrics reported for a successful embedding
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingMetrics {
    pub psnr: f64,
    pub ssim: f64,
    pub mse: f64,
    pub payload_bits: usize,
    pub capacity_bits: usize,
    /// Percentage of the capacity used by the frame
    pub utilization: f64,
    pub complexity_threshold: f64,
    pub one_bit_pixels: usize,
    pub two_bit_pixels: usize,
    pub text_length_chars: usize,
    pub text_length_bytes: usize,
    pub width: u32,
    pub height: u32,
}

/// Stego image together with its metrics
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    pub stego_image: RgbImage,
    pub metrics: EmbeddingMetrics,
}

/// Recovered text and what was read to get it
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub secret_text: String,
    pub bits_read: usize,
    pub declared_length: u32,
    pub complexity_threshold: f64,
}

/// Capacity breakdown of an image under its bit-depth plan
#[derive(Debug, Clone, Serialize)]
pub struct CapacityAnalysis {
    pub total_capacity_bits: usize,
    pub total_capacity_bytes: usize,
    /// Longest UTF-8 message, in bytes, whose frame still fits
    pub max_message_bytes: usize,
    pub average_bits_per_pixel: f64,
    pub high_complexity_blocks: usize,
    pub low_complexity_blocks: usize,
    pub total_blocks: usize,
    pub complexity_threshold: f64,
    pub high_complexity_percentage: f64,
    pub low_complexity_percentage: f64,
    /// Share of capacity bits carried by 1-bit blocks, in percent
    pub one_bit_share: f64,
    /// Share of capacity bits carried by 2-bit blocks, in percent
    pub two_bit_share: f64,
}

/// Accepts only 8-bit RGB images
pub fn rgb_pixels(image: DynamicImage) -> Result<RgbImage> {
    match image {
        DynamicImage::ImageRgb8(rgb_image) => Ok(rgb_image),
        other => Err(SteganographyError::InvalidInput(format!(
            "expected an 8-bit RGB image, got {:?}",
            other.color()
        ))),
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Adaptive LSB engine: Sobel complexity, block plan, carrier-channel embedding
#[derive(Debug, Clone)]
pub struct SteganographyEngine {
    configuration: EmbeddingConfiguration,
    analyzer: SobelAnalyzer,
    planner: BlockPlanner,
}

impl SteganographyEngine {
    /// Creates a new steganography engine with default configuration
    pub fn new() -> Self {
        let configuration = EmbeddingConfiguration::default();
        Self {
            analyzer: SobelAnalyzer::new(configuration.carrier_channel),
            planner: BlockPlanner::new(configuration.block_size),
            configuration,
        }
    }

    /// Creates a new steganography engine with custom configuration
    pub fn with_configuration(configuration: EmbeddingConfiguration) -> Result<Self> {
        configuration.validate()?;
        Ok(Self {
            analyzer: SobelAnalyzer::new(configuration.carrier_channel),
            planner: BlockPlanner::new(configuration.block_size),
            configuration,
        })
    }

    pub fn configuration(&self) -> &EmbeddingConfiguration {
        &self.configuration
    }

    fn validate_image(&self, rgb_image: &RgbImage) -> Result<()> {
        if rgb_image.width() == 0 || rgb_image.height() == 0 {
            return Err(SteganographyError::InvalidInput(format!(
                "image has a zero dimension ({}x{})",
                rgb_image.width(),
                rgb_image.height()
            )));
        }
        Ok(())
    }

    /// Computes the complexity map the plan is derived from
    pub fn complexity_map(&self, rgb_image: &RgbImage) -> Result<ComplexityMap> {
        self.validate_image(rgb_image)?;
        Ok(self.analyzer.analyze(rgb_image))
    }

    /// Computes the bit-depth plan of an image
    pub fn plan(&self, rgb_image: &RgbImage) -> Result<BitDepthPlan> {
        let complexity_map = self.complexity_map(rgb_image)?;
        let plan = self.planner.plan(&complexity_map);
        debug!(
            threshold = plan.threshold,
            blocks = plan.block_count(),
            two_bit_blocks = plan.blocks_with_depth(BitDepth::Two),
            capacity_bits = plan.capacity_bits(),
            "computed bit-depth plan"
        );
        Ok(plan)
    }

    /// Calculates maximum payload capacity for an RGB image in bits
    pub fn calculate_capacity_bits(&self, rgb_image: &RgbImage) -> Result<usize> {
        Ok(self.plan(rgb_image)?.capacity_bits())
    }

    /// Reports how much an image can carry and how its blocks split
    pub fn analyze_capacity(&self, rgb_image: &RgbImage) -> Result<CapacityAnalysis> {
        let plan = self.plan(rgb_image)?;
        let total_capacity_bits = plan.capacity_bits();
        let total_blocks = plan.block_count();
        let high_complexity_blocks = plan.blocks_with_depth(BitDepth::Two);
        let low_complexity_blocks = plan.blocks_with_depth(BitDepth::One);
        let one_bit_capacity = plan.pixels_with_depth(BitDepth::One);
        let two_bit_capacity = plan.pixels_with_depth(BitDepth::Two) * 2;
        let total_pixels = rgb_image.width() as usize * rgb_image.height() as usize;

        Ok(CapacityAnalysis {
            total_capacity_bits,
            total_capacity_bytes: total_capacity_bits / 8,
            max_message_bytes: total_capacity_bits.saturating_sub(payload::FRAME_OVERHEAD_BITS) / 8,
            average_bits_per_pixel: total_capacity_bits as f64 / total_pixels as f64,
            high_complexity_blocks,
            low_complexity_blocks,
            total_blocks,
            complexity_threshold: plan.threshold,
            high_complexity_percentage: percentage(high_complexity_blocks, total_blocks),
            low_complexity_percentage: percentage(low_complexity_blocks, total_blocks),
            one_bit_share: percentage(one_bit_capacity, total_capacity_bits),
            two_bit_share: percentage(two_bit_capacity, total_capacity_bits),
        })
    }

    /// Hides `secret_text` in a copy of `cover_image`.
    ///
    /// Fails with `CapacityExceeded` before any output buffer exists when the
    /// framed text does not fit the cover's plan.
    pub fn hide_text_in_rgb_image(
        &self,
        cover_image: &RgbImage,
        secret_text: &str,
    ) -> Result<EmbeddingResult> {
        let plan = self.plan(cover_image)?;
        let bit_stream = payload::encode(secret_text)?;
        let available_capacity = plan.capacity_bits();

        if bit_stream.len() > available_capacity {
            return Err(SteganographyError::CapacityExceeded {
                required: bit_stream.len(),
                available: available_capacity,
            });
        }

        let carrier_index = self.configuration.carrier_channel.index();
        let mut stego_image = cover_image.clone();
        let mut current_bit_index = 0;

        'blocks: for block in &plan.blocks {
            let bit_depth = block.bit_depth.bits();
            for (pixel_x, pixel_y) in block.pixels() {
                if current_bit_index >= bit_stream.len() {
                    break 'blocks;
                }

                let pixel = stego_image.get_pixel_mut(pixel_x, pixel_y);
                let mut carrier_value = pixel[carrier_index];
                for bit_position in (0..bit_depth).rev() {
                    let Some(&bit) = bit_stream.get(current_bit_index) else {
                        break;
                    };
                    carrier_value = (carrier_value & !(1u8 << bit_position)) | (bit << bit_position);
                    current_bit_index += 1;
                }
                pixel[carrier_index] = carrier_value;
            }
        }

        info!(
            payload_bits = bit_stream.len(),
            capacity_bits = available_capacity,
            "embedded payload"
        );

        let quality = QualityMetrics::compare(cover_image, &stego_image);
        let metrics = EmbeddingMetrics {
            psnr: quality.psnr,
            ssim: quality.ssim,
            mse: quality.mse,
            payload_bits: bit_stream.len(),
            capacity_bits: available_capacity,
            utilization: percentage(bit_stream.len(), available_capacity),
            complexity_threshold: plan.threshold,
            one_bit_pixels: plan.pixels_with_depth(BitDepth::One),
            two_bit_pixels: plan.pixels_with_depth(BitDepth::Two),
            text_length_chars: secret_text.chars().count(),
            text_length_bytes: secret_text.len(),
            width: cover_image.width(),
            height: cover_image.height(),
        };

        Ok(EmbeddingResult {
            stego_image,
            metrics,
        })
    }

    /// Recovers the text hidden by [`hide_text_in_rgb_image`](Self::hide_text_in_rgb_image).
    ///
    /// The plan is recomputed from the stego image itself. Traversal stops as
    /// soon as the frame declared by the length header has been read.
    pub fn extract_text_from_rgb_image(&self, stego_image: &RgbImage) -> Result<ExtractionReport> {
        let plan = self.plan(stego_image)?;
        let total_capacity = plan.capacity_bits();

        if total_capacity < HEADER_BITS {
            return Err(SteganographyError::NoPayloadFound(format!(
                "image capacity of {} bits cannot hold a {}-bit length header",
                total_capacity, HEADER_BITS
            )));
        }

        let carrier_index = self.configuration.carrier_channel.index();
        let mut extracted_bits = Vec::new();
        let mut frame_bits: Option<(u32, usize)> = None;

        'blocks: for block in &plan.blocks {
            let bit_depth = block.bit_depth.bits();
            for (pixel_x, pixel_y) in block.pixels() {
                let carrier_value = stego_image.get_pixel(pixel_x, pixel_y)[carrier_index];
                for bit_position in (0..bit_depth).rev() {
                    extracted_bits.push((carrier_value >> bit_position) & 1);
                }

                if frame_bits.is_none() {
                    if let Some(declared_length) = payload::declared_length(&extracted_bits) {
                        let required_bits = payload::frame_bit_length(declared_length as u64);
                        if required_bits > total_capacity as u64 {
                            return Err(SteganographyError::NoPayloadFound(format!(
                                "declared length of {} bytes needs {} bits, image holds {}",
                                declared_length, required_bits, total_capacity
                            )));
                        }
                        frame_bits = Some((declared_length, required_bits as usize));
                    }
                }

                if let Some((_, required_bits)) = frame_bits {
                    if extracted_bits.len() >= required_bits {
                        break 'blocks;
                    }
                }
            }
        }

        let (declared_length, required_bits) = frame_bits.ok_or_else(|| {
            SteganographyError::NoPayloadFound("length header could not be read".to_string())
        })?;
        extracted_bits.truncate(required_bits);

        let secret_text = payload::decode(&extracted_bits)?;
        info!(
            bits_read = extracted_bits.len(),
            declared_length, "extracted payload"
        );

        Ok(ExtractionReport {
            secret_text,
            bits_read: extracted_bits.len(),
            declared_length,
            complexity_threshold: plan.threshold,
        })
    }
}

impl Default for SteganographyEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CarrierChannel;
    use image::{ImageBuffer, Rgb, RgbaImage};

    fn textured(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                ((x * 37 + y * 11) % 256) as u8,
                ((x * y + 3 * x) % 256) as u8,
                ((x * 5 + y * 71) % 256) as u8,
            ])
        })
    }

    #[test]
    fn hide_and_extract_roundtrip() {
        let engine = SteganographyEngine::new();
        let cover = textured(32, 24);
        let result = engine.hide_text_in_rgb_image(&cover, "Hello, adaptive LSB!").unwrap();
        let report = engine.extract_text_from_rgb_image(&result.stego_image).unwrap();
        assert_eq!(report.secret_text, "Hello, adaptive LSB!");
        assert_eq!(report.declared_length, 20);
        assert_eq!(report.bits_read, result.metrics.payload_bits);
    }

    #[test]
    fn only_carrier_low_bits_change() {
        let engine = SteganographyEngine::new();
        let cover = textured(16, 16);
        let result = engine.hide_text_in_rgb_image(&cover, "abc").unwrap();

        for (original, stego) in cover.pixels().zip(result.stego_image.pixels()) {
            assert_eq!(original[0], stego[0]);
            assert_eq!(original[1], stego[1]);
            assert_eq!(original[2] & 0b1111_1100, stego[2] & 0b1111_1100);
        }
    }

    #[test]
    fn pixels_after_payload_are_untouched() {
        let engine = SteganographyEngine::new();
        let cover = textured(40, 40);
        let result = engine.hide_text_in_rgb_image(&cover, "x").unwrap();
        let plan = engine.plan(&cover).unwrap();

        let mut bits_seen = 0;
        for block in &plan.blocks {
            for (x, y) in block.pixels() {
                if bits_seen >= result.metrics.payload_bits {
                    assert_eq!(cover.get_pixel(x, y), result.stego_image.get_pixel(x, y));
                }
                bits_seen += block.bit_depth.bits() as usize;
            }
        }
    }

    #[test]
    fn truncated_border_is_never_written() {
        let engine = SteganographyEngine::new();
        let cover = textured(9, 9);
        let capacity = engine.calculate_capacity_bits(&cover).unwrap();
        let longest = "z".repeat((capacity - payload::FRAME_OVERHEAD_BITS) / 8);
        let result = engine.hide_text_in_rgb_image(&cover, &longest).unwrap();

        for index in 0..9 {
            assert_eq!(cover.get_pixel(8, index), result.stego_image.get_pixel(8, index));
            assert_eq!(cover.get_pixel(index, 8), result.stego_image.get_pixel(index, 8));
        }
    }

    #[test]
    fn capacity_error_reports_required_and_available() {
        let engine = SteganographyEngine::new();
        let cover: RgbImage = ImageBuffer::from_pixel(2, 2, Rgb([50, 60, 70]));
        match engine.hide_text_in_rgb_image(&cover, "hi") {
            Err(SteganographyError::CapacityExceeded {
                required,
                available,
            }) => {
                assert_eq!(required, 56);
                assert!(available <= 8);
            }
            other => panic!("expected CapacityExceeded, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn zero_dimension_rejected() {
        let engine = SteganographyEngine::new();
        let empty = RgbImage::new(0, 5);
        assert!(matches!(
            engine.hide_text_in_rgb_image(&empty, "a"),
            Err(SteganographyError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.extract_text_from_rgb_image(&empty),
            Err(SteganographyError::InvalidInput(_))
        ));
    }

    #[test]
    fn non_rgb_image_rejected() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
        assert!(matches!(rgb_pixels(rgba), Err(SteganographyError::InvalidInput(_))));

        let rgb = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert_eq!(rgb_pixels(rgb).unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn tiny_image_reports_no_payload() {
        let engine = SteganographyEngine::new();
        let tiny: RgbImage = ImageBuffer::from_pixel(1, 1, Rgb([1, 2, 3]));
        assert!(matches!(
            engine.extract_text_from_rgb_image(&tiny),
            Err(SteganographyError::NoPayloadFound(_))
        ));
    }

    #[test]
    fn green_carrier_with_larger_blocks() {
        let configuration = EmbeddingConfiguration {
            block_size: 4,
            carrier_channel: CarrierChannel::Green,
        };
        let engine = SteganographyEngine::with_configuration(configuration).unwrap();
        let cover = textured(30, 30);
        let result = engine.hide_text_in_rgb_image(&cover, "green channel").unwrap();

        for (original, stego) in cover.pixels().zip(result.stego_image.pixels()) {
            assert_eq!(original[2], stego[2]);
        }
        let report = engine.extract_text_from_rgb_image(&result.stego_image).unwrap();
        assert_eq!(report.secret_text, "green channel");
    }

    #[test]
    fn invalid_configuration_rejected() {
        let configuration = EmbeddingConfiguration {
            block_size: 0,
            ..EmbeddingConfiguration::default()
        };
        assert!(matches!(
            SteganographyEngine::with_configuration(configuration),
            Err(SteganographyError::Configuration(_))
        ));
    }

    #[test]
    fn capacity_analysis_is_consistent() {
        let engine = SteganographyEngine::new();
        let cover = textured(20, 10);
        let analysis = engine.analyze_capacity(&cover).unwrap();

        assert_eq!(analysis.total_blocks, 50);
        assert_eq!(
            analysis.high_complexity_blocks + analysis.low_complexity_blocks,
            50
        );
        assert_eq!(
            analysis.total_capacity_bits,
            analysis.low_complexity_blocks * 4 + analysis.high_complexity_blocks * 8
        );
        assert_eq!(analysis.total_capacity_bytes, analysis.total_capacity_bits / 8);
        assert!((analysis.one_bit_share + analysis.two_bit_share - 100.0).abs() < 1e-9);
        assert!(
            (analysis.high_complexity_percentage + analysis.low_complexity_percentage - 100.0)
                .abs()
                < 1e-9
        );

        let longest = "m".repeat(analysis.max_message_bytes);
        assert!(engine.hide_text_in_rgb_image(&cover, &longest).is_ok());
        let too_long = "m".repeat(analysis.max_message_bytes + 1);
        assert!(engine.hide_text_in_rgb_image(&cover, &too_long).is_err());
    }

    #[test]
    fn metrics_describe_the_embedding() {
        let engine = SteganographyEngine::new();
        let cover = textured(24, 24);
        let metrics = engine
            .hide_text_in_rgb_image(&cover, "héllo")
            .unwrap()
            .metrics;

        assert_eq!(metrics.text_length_chars, 5);
        assert_eq!(metrics.text_length_bytes, 6);
        assert_eq!(metrics.payload_bits, 40 + 6 * 8);
        assert_eq!(metrics.one_bit_pixels + metrics.two_bit_pixels, 24 * 24);
        assert_eq!((metrics.width, metrics.height), (24, 24));
        assert!(metrics.psnr > 40.0);
        assert!(metrics.ssim > 0.99);
        assert!(metrics.utilization > 0.0 && metrics.utilization <= 100.0);
    }
}
