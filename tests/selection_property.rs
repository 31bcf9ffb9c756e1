#[macro_use]
extern crate proptest;

use image::DynamicImage;
use proptest::prelude::*;
use rustc_hash::FxHashSet;
use slidesmith::retrieval::ImageCandidate;
use slidesmith::selection::select_best;

fn candidate(width: u32, height: u32) -> ImageCandidate {
    ImageCandidate {
        section_title: "Section".to_owned(),
        query: "query".to_owned(),
        width,
        height,
        resolution: u64::from(width) * u64::from(height),
        image: DynamicImage::new_rgb8(1, 1),
    }
}

proptest! {
    #[test]
    fn prop_winner_carries_the_maximum_resolution(
        dims in prop::collection::vec((1u32..4000, 1u32..4000), 1..12),
    ) {
        let pool: Vec<ImageCandidate> = dims.iter().map(|(w, h)| candidate(*w, *h)).collect();
        let max = pool.iter().map(|c| c.resolution).max().unwrap();
        prop_assert_eq!(select_best(pool).unwrap().resolution, max);
    }

    #[test]
    fn prop_arrival_order_does_not_change_a_unique_winner(
        dims in prop::collection::vec((1u32..4000, 1u32..4000), 1..12),
        rotation in 0usize..12,
    ) {
        // Keep only distinct resolutions so the winner is unambiguous.
        let mut seen = FxHashSet::default();
        let dims: Vec<(u32, u32)> = dims
            .into_iter()
            .filter(|(w, h)| seen.insert(u64::from(*w) * u64::from(*h)))
            .collect();
        prop_assume!(!dims.is_empty());

        let baseline: Vec<ImageCandidate> =
            dims.iter().map(|(w, h)| candidate(*w, *h)).collect();
        let mut rotated = baseline.clone();
        let len = rotated.len();
        rotated.rotate_left(rotation % len);

        let a = select_best(baseline).unwrap();
        let b = select_best(rotated).unwrap();
        prop_assert_eq!((a.width, a.height), (b.width, b.height));
    }
}
