//! Grid invariants under arbitrary carve sequences

use glam::Vec2;
use millsim_core::{ToolShape, ToolSpec};
use millsim_stock::{Block, CarveResult, MillingMask};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Carve {
    x: i32,
    y: i32,
    depth: f32,
    max_height: f32,
    ball: bool,
}

fn carve_strategy() -> impl Strategy<Value = Carve> {
    (-12i32..40, -12i32..40, -1.0f32..1.5, 0.0f32..2.0, any::<bool>()).prop_map(
        |(x, y, depth, max_height, ball)| Carve {
            x,
            y,
            depth,
            max_height,
            ball,
        },
    )
}

fn masks() -> (MillingMask, MillingMask) {
    let pitch = Vec2::splat(0.1);
    (
        MillingMask::for_tool(&ToolSpec::new(ToolShape::Flat, 0.45), pitch, 4.0),
        MillingMask::for_tool(&ToolSpec::new(ToolShape::Ball, 0.45), pitch, 4.0),
    )
}

proptest! {
    #[test]
    fn prop_heights_stay_in_range_and_never_grow(
        width in 1u32..32,
        height in 1u32..32,
        carves in prop::collection::vec(carve_strategy(), 1..40),
    ) {
        let (flat, ball) = masks();
        let mut block = Block::new(width, height, 0.2).unwrap();
        let mut previous = block.heights().to_vec();

        for carve in &carves {
            let mask = if carve.ball { &ball } else { &flat };
            block.carve_silent(mask, carve.x, carve.y, carve.depth, carve.max_height);

            for (before, after) in previous.iter().zip(block.heights()) {
                prop_assert!((0.0..=1.0).contains(after));
                prop_assert!(after <= before);
            }
            previous = block.heights().to_vec();
        }
    }

    #[test]
    fn prop_disjoint_footprint_changes_nothing(
        side in 1u32..16,
        dx in prop::sample::select(vec![-1i32, 1]),
        dy in prop::sample::select(vec![-1i32, 1]),
        depth in -1.0f32..1.0,
    ) {
        let (flat, _) = masks();
        let mut block = Block::new(side, side, 0.0).unwrap();
        let x = if dx < 0 { -(flat.width() as i32) } else { side as i32 };
        let y = if dy < 0 { -(flat.height() as i32) } else { side as i32 };

        let result = block.carve_silent(&flat, x, y, depth, 0.0);

        prop_assert_eq!(result, CarveResult::default());
        prop_assert!(block.heights().iter().all(|&h| h == 1.0));
    }

    #[test]
    fn prop_flat_mask_sets_cut_height(prior in 0.0f32..1.0, depth in -1.0f32..1.0) {
        let mut block = Block::new(3, 3, 0.0).unwrap();
        block.carve_silent(&MillingMask::filled(3, 3, prior), 0, 0, 0.0, 1.0);

        block.carve_silent(&MillingMask::filled(3, 3, 0.0), 0, 0, depth, 1.0);

        let expected = prior.min((-depth).max(0.0));
        for &h in block.heights() {
            prop_assert!((h - expected).abs() < 1e-6);
        }
    }
}
