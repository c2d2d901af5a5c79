//! Pacing independence of path traversal

use glam::Vec3;
use millsim_core::{ToolShape, ToolSpec};
use millsim_simulator::Cutter;
use millsim_stock::Block;
use proptest::prelude::*;

fn block() -> Block {
    let mut block = Block::new(48, 48, 0.2).unwrap();
    block.set_block_size(Vec3::new(6.0, 2.0, 6.0)).unwrap();
    block
}

fn path() -> Vec<Vec3> {
    vec![
        Vec3::new(-2.0, 2.5, -2.0),
        Vec3::new(-2.0, 1.0, -2.0),
        Vec3::new(2.0, 0.8, -1.0),
        Vec3::new(0.5, 0.3, 2.0),
        Vec3::new(0.5, 2.5, 2.0),
    ]
}

fn tool(ball: bool) -> ToolSpec {
    let shape = if ball { ToolShape::Ball } else { ToolShape::Flat };
    ToolSpec::new(shape, 0.4)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_any_dt_sequence_matches_instant_completion(
        ball in any::<bool>(),
        steps in prop::collection::vec(0.001f32..1.5, 1..40),
    ) {
        let mut reference = block();
        Cutter::new(path(), tool(ball), 1.0, &reference)
            .unwrap()
            .complete_instantly(&mut reference);

        let mut paced = block();
        let mut cutter = Cutter::new(path(), tool(ball), 1.0, &paced).unwrap();
        for dt in steps.iter().cycle() {
            if cutter.is_done() {
                break;
            }
            cutter.update(*dt, &mut paced);
        }

        prop_assert_eq!(reference.heights(), paced.heights());
    }

    #[test]
    fn prop_each_event_kind_at_most_once_per_segment(
        ball in any::<bool>(),
        blade in 0.0f32..2.0,
        dt in 0.01f32..3.0,
    ) {
        let mut b = block();
        let mut cutter = Cutter::new(path(), tool(ball), blade, &b).unwrap();
        let mut events = Vec::new();
        while !cutter.is_done() {
            events.extend(cutter.update(dt, &mut b).events);
        }

        let mut keys: Vec<_> = events.iter().map(|e| (e.segment, e.kind)).collect();
        let before = keys.len();
        keys.sort_by_key(|(segment, kind)| (*segment, *kind as u8));
        keys.dedup();
        prop_assert_eq!(keys.len(), before);
    }
}
