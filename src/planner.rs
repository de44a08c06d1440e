//! Block partitioning and the 1-bit / 2-bit decision rule.
//!
//! The map is cut into non-overlapping `K x K` blocks in row-major block
//! order. Trailing rows and columns that do not fill a whole block are
//! truncated: they belong to no block and never carry payload.
//!
//! A block gets two bits per pixel when its mean complexity is at least the
//! mean of all block means and is non-zero; otherwise one. The comparison is
//! done on integer sums so that the embed and extract paths cannot disagree
//! on a tie.

use crate::complexity::ComplexityMap;
use crate::config::MAX_BLOCK_SIZE;

/// Largest number of carrier bits written into a single pixel
pub const MAX_BIT_DEPTH: u8 = 2;

/// Carrier bits used per pixel of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    One,
    Two,
}

impl BitDepth {
    pub fn bits(self) -> u8 {
        match self {
            BitDepth::One => 1,
            BitDepth::Two => MAX_BIT_DEPTH,
        }
    }
}

/// One planning tile with its assigned depth
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Top-left pixel
    pub origin_x: u32,
    pub origin_y: u32,
    pub size: u32,
    /// Sum of the tile's complexity scores
    pub complexity_sum: u64,
    pub mean_complexity: f64,
    pub bit_depth: BitDepth,
}

impl Block {
    pub fn pixel_count(&self) -> usize {
        (self.size * self.size) as usize
    }

    pub fn capacity_bits(&self) -> usize {
        self.pixel_count() * self.bit_depth.bits() as usize
    }

    /// Pixel coordinates of the block in row-major order
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.size).flat_map(move |dy| {
            (0..self.size).map(move |dx| (self.origin_x + dx, self.origin_y + dy))
        })
    }
}

/// Ordered block list with depths; a pure function of the map and block size
#[derive(Debug, Clone, PartialEq)]
pub struct BitDepthPlan {
    pub block_size: u32,
    pub blocks_across: u32,
    pub blocks_down: u32,
    /// Mean of all block means; zero when there are no blocks
    pub threshold: f64,
    pub blocks: Vec<Block>,
}

impl BitDepthPlan {
    /// Total payload bits the plan can carry
    pub fn capacity_bits(&self) -> usize {
        self.blocks.iter().map(Block::capacity_bits).sum()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks_with_depth(&self, depth: BitDepth) -> usize {
        self.blocks
            .iter()
            .filter(|block| block.bit_depth == depth)
            .count()
    }

    pub fn pixels_with_depth(&self, depth: BitDepth) -> usize {
        self.blocks
            .iter()
            .filter(|block| block.bit_depth == depth)
            .map(Block::pixel_count)
            .sum()
    }

    /// Depth of the block covering `(x, y)`, `None` in the truncated border
    pub fn depth_at(&self, x: u32, y: u32) -> Option<BitDepth> {
        let block_x = x / self.block_size;
        let block_y = y / self.block_size;
        if block_x >= self.blocks_across || block_y >= self.blocks_down {
            return None;
        }
        let index = (block_y * self.blocks_across + block_x) as usize;
        self.blocks.get(index).map(|block| block.bit_depth)
    }
}

/// Partitions a complexity map into blocks and assigns bit depths
#[derive(Debug, Clone, Copy)]
pub struct BlockPlanner {
    block_size: u32,
}

impl BlockPlanner {
    /// `block_size` is clamped into `1..=MAX_BLOCK_SIZE`
    pub fn new(block_size: u32) -> Self {
        Self {
            block_size: block_size.clamp(1, MAX_BLOCK_SIZE),
        }
    }

    pub fn plan(&self, complexity_map: &ComplexityMap) -> BitDepthPlan {
        let block_size = self.block_size;
        let blocks_across = complexity_map.width() / block_size;
        let blocks_down = complexity_map.height() / block_size;
        let block_area = (block_size * block_size) as f64;

        let mut block_sums = Vec::with_capacity((blocks_across * blocks_down) as usize);
        for block_y in 0..blocks_down {
            for block_x in 0..blocks_across {
                let mut complexity_sum = 0u64;
                for dy in 0..block_size {
                    for dx in 0..block_size {
                        complexity_sum += complexity_map
                            .get(block_x * block_size + dx, block_y * block_size + dy)
                            as u64;
                    }
                }
                block_sums.push((block_x, block_y, complexity_sum));
            }
        }

        let block_count = block_sums.len() as u64;
        let total_sum: u64 = block_sums.iter().map(|&(_, _, sum)| sum).sum();
        let threshold = if block_count == 0 {
            0.0
        } else {
            total_sum as f64 / (block_count as f64 * block_area)
        };

        let blocks = block_sums
            .into_iter()
            .map(|(block_x, block_y, complexity_sum)| {
                // mean >= threshold  <=>  sum * count >= total
                let at_or_above = complexity_sum * block_count >= total_sum;
                let bit_depth = if at_or_above && complexity_sum > 0 {
                    BitDepth::Two
                } else {
                    BitDepth::One
                };
                Block {
                    origin_x: block_x * block_size,
                    origin_y: block_y * block_size,
                    size: block_size,
                    complexity_sum,
                    mean_complexity: complexity_sum as f64 / block_area,
                    bit_depth,
                }
            })
            .collect();

        BitDepthPlan {
            block_size,
            blocks_across,
            blocks_down,
            threshold,
            blocks,
        }
    }
}

impl Default for BlockPlanner {
    fn default() -> Self {
        Self::new(2)
    }
}
