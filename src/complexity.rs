use crate::config::CarrierChannel;
use crate::planner::MAX_BIT_DEPTH;
use image::RgbImage;

/// Horizontal 3x3 Sobel kernel
const SOBEL_HORIZONTAL: [[i64; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];

/// Vertical 3x3 Sobel kernel
const SOBEL_VERTICAL: [[i64; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// BT.601 luma weights scaled by 1000; equal pixels give exactly equal samples
const LUMA_WEIGHTS: [i32; 3] = [299, 587, 114];

/// Clears every carrier bit the embedder is allowed to rewrite
const CARRIER_STABLE_MASK: u8 = !((1u8 << MAX_BIT_DEPTH) - 1);

/// Upper bound of a normalized complexity score
pub const MAX_SCORE: u8 = 255;

/// Per-pixel edge strength, rescaled into `0..=255`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexityMap {
    width: u32,
    height: u32,
    scores: Vec<u8>,
}

impl ComplexityMap {
    /// Builds a map from row-major scores
    pub fn from_scores(width: u32, height: u32, scores: Vec<u8>) -> Option<Self> {
        if scores.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            scores,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Score at pixel `(x, y)`; callers stay inside the map
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.scores[y as usize * self.width as usize + x as usize]
    }

    /// Row-major scores
    pub fn scores(&self) -> &[u8] {
        &self.scores
    }
}

/// Sobel gradient-magnitude complexity analyzer.
///
/// Borders use edge-replicate padding. The luma projection is taken after
/// clearing the carrier channel's low `MAX_BIT_DEPTH` bits, so a cover image
/// and any stego image derived from it produce the same map.
#[derive(Debug, Clone, Copy)]
pub struct SobelAnalyzer {
    carrier_channel: CarrierChannel,
}

impl SobelAnalyzer {
    pub fn new(carrier_channel: CarrierChannel) -> Self {
        Self { carrier_channel }
    }

    /// Computes the normalized complexity map of an RGB image
    pub fn analyze(&self, rgb_image: &RgbImage) -> ComplexityMap {
        let width = rgb_image.width();
        let height = rgb_image.height();
        let luminance_plane = self.extract_luminance_plane(rgb_image);

        let mut squared_magnitudes = Vec::with_capacity(luminance_plane.len());
        let mut peak_squared_magnitude = 0i64;

        for y in 0..height as i64 {
            for x in 0..width as i64 {
                let mut gradient_x = 0i64;
                let mut gradient_y = 0i64;

                for kernel_y in 0..3 {
                    for kernel_x in 0..3 {
                        let sample = Self::replicated_sample(
                            &luminance_plane,
                            width,
                            height,
                            x + kernel_x as i64 - 1,
                            y + kernel_y as i64 - 1,
                        ) as i64;
                        gradient_x += sample * SOBEL_HORIZONTAL[kernel_y][kernel_x];
                        gradient_y += sample * SOBEL_VERTICAL[kernel_y][kernel_x];
                    }
                }

                let squared_magnitude = gradient_x * gradient_x + gradient_y * gradient_y;
                peak_squared_magnitude = peak_squared_magnitude.max(squared_magnitude);
                squared_magnitudes.push(squared_magnitude);
            }
        }

        let scores = if peak_squared_magnitude > 0 {
            let peak_magnitude = (peak_squared_magnitude as f64).sqrt();
            squared_magnitudes
                .iter()
                .map(|&squared_magnitude| {
                    ((squared_magnitude as f64).sqrt() / peak_magnitude * MAX_SCORE as f64) as u8
                })
                .collect()
        } else {
            vec![0u8; squared_magnitudes.len()]
        };

        ComplexityMap {
            width,
            height,
            scores,
        }
    }

    /// Fixed-point BT.601 luma (x1000) of every pixel, carrier low bits cleared
    fn extract_luminance_plane(&self, rgb_image: &RgbImage) -> Vec<i32> {
        let carrier_index = self.carrier_channel.index();

        rgb_image
            .pixels()
            .map(|pixel| {
                let mut channels = pixel.0;
                channels[carrier_index] &= CARRIER_STABLE_MASK;
                LUMA_WEIGHTS[0] * channels[0] as i32
                    + LUMA_WEIGHTS[1] * channels[1] as i32
                    + LUMA_WEIGHTS[2] * channels[2] as i32
            })
            .collect()
    }

    /// Reads the plane with coordinates clamped to the nearest edge pixel
    fn replicated_sample(plane: &[i32], width: u32, height: u32, x: i64, y: i64) -> i32 {
        let clamped_x = x.clamp(0, width as i64 - 1) as usize;
        let clamped_y = y.clamp(0, height as i64 - 1) as usize;
        plane[clamped_y * width as usize + clamped_x]
    }
}

impl Default for SobelAnalyzer {
    fn default() -> Self {
        Self::new(CarrierChannel::default())
    }
}
