//! Diagnostic renderings of the complexity map and the bit-depth plan.

use crate::complexity::{ComplexityMap, MAX_SCORE};
use crate::planner::{BitDepth, BitDepthPlan};
use image::{ImageBuffer, Rgb, RgbImage};

const ONE_BIT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TWO_BIT_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const UNUSED_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Blue (smooth) to red (busy) heat map
pub fn complexity_heatmap(complexity_map: &ComplexityMap) -> RgbImage {
    ImageBuffer::from_fn(complexity_map.width(), complexity_map.height(), |x, y| {
        let score = complexity_map.get(x, y);
        Rgb([score, 0, MAX_SCORE - score])
    })
}

/// Green for 1-bit pixels, yellow for 2-bit pixels, black outside every block
pub fn embedding_mask(plan: &BitDepthPlan, width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| match plan.depth_at(x, y) {
        Some(BitDepth::One) => ONE_BIT_COLOR,
        Some(BitDepth::Two) => TWO_BIT_COLOR,
        None => UNUSED_COLOR,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::BlockPlanner;

    #[test]
    fn heatmap_maps_scores_to_red_and_blue() {
        let map = ComplexityMap::from_scores(2, 1, vec![0, 200]).unwrap();
        let heatmap = complexity_heatmap(&map);
        assert_eq!(heatmap.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(heatmap.get_pixel(1, 0), &Rgb([200, 0, 55]));
    }

    #[test]
    fn mask_marks_depths_and_border() {
        #[rustfmt::skip]
        let scores = vec![
            90, 90, 0, 0, 5,
            90, 90, 0, 0, 5,
            1,  1,  1, 1, 1,
        ];
        let map = ComplexityMap::from_scores(5, 3, scores).unwrap();
        let plan = BlockPlanner::new(2).plan(&map);
        let mask = embedding_mask(&plan, 5, 3);

        assert_eq!(mask.get_pixel(0, 0), &TWO_BIT_COLOR);
        assert_eq!(mask.get_pixel(3, 1), &ONE_BIT_COLOR);
        assert_eq!(mask.get_pixel(4, 0), &UNUSED_COLOR);
        assert_eq!(mask.get_pixel(0, 2), &UNUSED_COLOR);
    }
}
