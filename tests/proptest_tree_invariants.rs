//! Property-based invariants for the parameter mapping and the recursive
//! generator.
//!
//! 1. Trunk length saturates at 80 and 200 and never decreases with activity.
//! 2. Leaf brightness saturates at 80 and 200.
//! 3. Bark color is one of two values, split at a streak of 10.
//! 4. Growth terminates within the full-binary-tree bound and every leaf
//!    comes from a branch of length <= 10.
//! 5. Leaf channels stay within their jitter bounds for any random sequence.
//! 6. A depth cap below the natural depth turns the whole frontier into
//!    leaves at exactly the cap.

use bloom_renderer::params::{
    base_length, branch_color, leaf_brightness, BranchColor, RenderParameters,
};
use bloom_renderer::random::{FixedSequence, SeededRandom};
use bloom_renderer::sketch::{
    grow_tree, grow_tree_with, GrowthRules, Leaf, PrimitiveLog, Segment, Sketchpad, Turtle,
    LEAF_BLUE, LEAF_GREEN_JITTER, LEAF_RED, LEAF_THRESHOLD, LEAF_TINT_JITTER,
};
use proptest::prelude::*;

/// Counts calls without storing primitives.
#[derive(Default)]
struct Tally {
    segments: u64,
    leaves: u64,
    longest_leaf: f32,
}

impl Sketchpad for Tally {
    fn segment(&mut self, _segment: &Segment) {
        self.segments += 1;
    }

    fn leaf(&mut self, leaf: &Leaf) {
        self.leaves += 1;
        self.longest_leaf = self.longest_leaf.max(leaf.length);
    }
}

fn params(base_length: f32, brightness: f32) -> RenderParameters {
    RenderParameters {
        base_length,
        branch_color: BranchColor::DarkBrown,
        leaf_base_brightness: brightness,
    }
}

/// Levels a constant decay needs to bring `length` down to the leaf threshold.
fn levels_needed(length: f32, decay: f32) -> u32 {
    if length <= LEAF_THRESHOLD {
        return 0;
    }
    ((LEAF_THRESHOLD / length).ln() / decay.ln()).ceil() as u32 + 1
}

fn check_termination(length: f32, decay: f32, seed: u64) -> Result<(), TestCaseError> {
    let rules = GrowthRules {
        decay: (decay, decay),
        ..GrowthRules::default()
    };
    let mut tally = Tally::default();
    let mut rng = SeededRandom::new(seed);
    let stats = grow_tree_with(
        &mut tally,
        &mut rng,
        &params(length, 140.0),
        Turtle::at(0.0, 0.0),
        rules,
    );

    let bound = levels_needed(length, decay);
    prop_assert!(stats.max_depth <= bound, "depth {} > {}", stats.max_depth, bound);
    prop_assert!(tally.leaves <= 1u64 << stats.max_depth);
    prop_assert_eq!(tally.segments + 1, tally.leaves);
    prop_assert!(
        tally.longest_leaf <= LEAF_THRESHOLD,
        "leaf from a branch of length {}",
        tally.longest_leaf
    );
    Ok(())
}

#[test]
fn depth_cap_bounds_a_long_slowly_decaying_trunk() {
    // 1000 * 0.9^d stays above the leaf threshold until d = 44
    let rules = GrowthRules {
        decay: (0.9, 0.9),
        max_depth: 12,
        ..GrowthRules::default()
    };
    let mut log = PrimitiveLog::new();
    let mut rng = SeededRandom::new(12);
    let stats = grow_tree_with(
        &mut log,
        &mut rng,
        &params(1000.0, 140.0),
        Turtle::at(0.0, 0.0),
        rules,
    );

    assert_eq!(stats.max_depth, 12);
    assert_eq!(stats.leaves, 1 << 12);
    assert_eq!(stats.segments, (1 << 12) - 1);
    assert!(log.leaves().all(|leaf| leaf.depth == 12));
    assert!(log.leaves().all(|leaf| leaf.length > LEAF_THRESHOLD));
    assert!(log.segments().all(|segment| segment.depth < 12));
}

proptest! {
    #[test]
    fn base_length_saturates(score in 0u32..=1_000_000) {
        let len = base_length(score);
        prop_assert!((80.0..=200.0).contains(&len));
        if score >= 200 {
            prop_assert_eq!(len, 200.0);
        }
    }

    #[test]
    fn base_length_is_monotonic(a in 0u32..=400, b in 0u32..=400) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(base_length(lo) <= base_length(hi));
    }

    #[test]
    fn brightness_saturates(days in 0u32..=1_000) {
        let b = leaf_brightness(days);
        prop_assert!((80.0..=200.0).contains(&b));
        if days >= 30 {
            prop_assert_eq!(b, 200.0);
        }
        if days == 0 {
            prop_assert_eq!(b, 80.0);
        }
    }

    #[test]
    fn branch_color_is_two_level(streak in 0u32..=10_000) {
        let expected = if streak > 10 { BranchColor::WarmBrown } else { BranchColor::DarkBrown };
        prop_assert_eq!(branch_color(streak), expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn long_trunks_terminate(length in 1.0f32..=1000.0, decay in 0.7f32..=0.75, seed in any::<u64>()) {
        check_termination(length, decay, seed)?;
    }

    #[test]
    fn slow_decay_terminates(length in 1.0f32..=40.0, decay in 0.7f32..0.9, seed in any::<u64>()) {
        check_termination(length, decay, seed)?;
    }

    #[test]
    fn leaf_jitter_is_bounded(
        brightness in 80.0f32..=200.0,
        units in prop::collection::vec(0.0f32..1.0, 1..16),
    ) {
        let mut log = PrimitiveLog::new();
        let mut rng = FixedSequence::new(units);
        grow_tree(&mut log, &mut rng, &params(40.0, brightness), Turtle::at(0.0, 0.0));
        prop_assert!(log.leaves().count() > 0);
        for leaf in log.leaves() {
            let (r, g, b) = leaf.rgb;
            prop_assert!((f32::from(g) - brightness).abs() <= LEAF_GREEN_JITTER + 0.5);
            prop_assert!((f32::from(r) - LEAF_RED).abs() <= LEAF_TINT_JITTER + 0.5);
            prop_assert!((f32::from(b) - LEAF_BLUE).abs() <= LEAF_TINT_JITTER + 0.5);
        }
    }
}
