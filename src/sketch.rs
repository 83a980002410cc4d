//! The recursive branch/leaf generator.
//!
//! The tree is never stored. Each recursion frame carries a branch length and
//! a [`Turtle`]; the two children of a node receive copies of the same turtle,
//! so a subtree can never disturb its sibling's origin or heading. Everything
//! drawn goes through a [`Sketchpad`], which is either a real surface or a
//! [`PrimitiveLog`] that records what would have been drawn.

use crate::params::{linear_map, BranchColor, RenderParameters};
use crate::random::RandomSource;

/// Branches at or below this length become leaves.
pub const LEAF_THRESHOLD: f32 = 10.0;
/// Recursion depth at which a frame is forced to become a leaf.
pub const MAX_DEPTH: u32 = 40;

pub const MIN_STROKE_WEIGHT: f32 = 1.0;
pub const MAX_STROKE_WEIGHT: f32 = 15.0;

/// Base red and blue of a leaf; green carries the brightness.
pub const LEAF_RED: f32 = 70.0;
pub const LEAF_BLUE: f32 = 90.0;
pub const LEAF_GREEN_JITTER: f32 = 30.0;
pub const LEAF_TINT_JITTER: f32 = 20.0;

/// Position plus heading. Heading is in degrees, 0 points up, positive turns
/// clockwise (screen coordinates, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turtle {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

impl Turtle {
    pub fn at(x: f32, y: f32) -> Self {
        Turtle { x, y, heading: 0.0 }
    }

    pub fn forward(self, distance: f32) -> Self {
        let rad = self.heading.to_radians();
        Turtle {
            x: self.x + distance * rad.sin(),
            y: self.y - distance * rad.cos(),
            ..self
        }
    }

    pub fn turn(self, degrees: f32) -> Self {
        Turtle {
            heading: self.heading + degrees,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub length: f32,
    pub weight: f32,
    pub color: BranchColor,
    pub depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leaf {
    pub at: (f32, f32),
    pub heading: f32,
    /// Length of the branch frame that turned into this leaf.
    pub length: f32,
    pub size: f32,
    pub rgb: (u8, u8, u8),
    pub depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Segment(Segment),
    Leaf(Leaf),
}

/// Receiver for the generator's output.
pub trait Sketchpad {
    fn segment(&mut self, segment: &Segment);
    fn leaf(&mut self, leaf: &Leaf);
}

/// Shape of the recursion. The defaults are the production values; tests
/// narrow them to pin down specific behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthRules {
    pub leaf_threshold: f32,
    pub max_depth: u32,
    /// Turn for the left child, degrees.
    pub left_turn: (f32, f32),
    /// Turn for the right child, degrees.
    pub right_turn: (f32, f32),
    pub decay: (f32, f32),
    pub leaf_size: (f32, f32),
}

impl Default for GrowthRules {
    fn default() -> Self {
        GrowthRules {
            leaf_threshold: LEAF_THRESHOLD,
            max_depth: MAX_DEPTH,
            left_turn: (-30.0, -20.0),
            right_turn: (20.0, 30.0),
            decay: (0.7, 0.9),
            leaf_size: (6.0, 14.0),
        }
    }
}

/// Counters for one draw pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub segments: usize,
    pub leaves: usize,
    pub max_depth: u32,
}

pub fn stroke_weight(length: f32) -> f32 {
    linear_map(length, 10.0, 100.0, MIN_STROKE_WEIGHT, MAX_STROKE_WEIGHT)
        .clamp(MIN_STROKE_WEIGHT, MAX_STROKE_WEIGHT)
}

fn channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

struct Grower<'a, P: ?Sized, R: ?Sized> {
    pad: &'a mut P,
    rng: &'a mut R,
    rules: GrowthRules,
    color: BranchColor,
    brightness: f32,
    stats: TreeStats,
}

impl<P: Sketchpad + ?Sized, R: RandomSource + ?Sized> Grower<'_, P, R> {
    fn branch(&mut self, length: f32, turtle: Turtle, depth: u32) {
        self.stats.max_depth = self.stats.max_depth.max(depth);

        if !length.is_finite() || length <= self.rules.leaf_threshold || depth >= self.rules.max_depth
        {
            self.leaf(length, turtle, depth);
            return;
        }

        let tip = turtle.forward(length);
        self.pad.segment(&Segment {
            from: (turtle.x, turtle.y),
            to: (tip.x, tip.y),
            length,
            weight: stroke_weight(length),
            color: self.color,
            depth,
        });
        self.stats.segments += 1;

        let (lo, hi) = self.rules.left_turn;
        let left = tip.turn(self.rng.range(lo, hi));
        let decay = self.decay();
        self.branch(length * decay, left, depth + 1);

        let (lo, hi) = self.rules.right_turn;
        let right = tip.turn(self.rng.range(lo, hi));
        let decay = self.decay();
        self.branch(length * decay, right, depth + 1);
    }

    fn decay(&mut self) -> f32 {
        let (lo, hi) = self.rules.decay;
        self.rng.range(lo, hi)
    }

    fn leaf(&mut self, length: f32, turtle: Turtle, depth: u32) {
        let green = self.brightness + self.rng.range(-LEAF_GREEN_JITTER, LEAF_GREEN_JITTER);
        let red = LEAF_RED + self.rng.range(-LEAF_TINT_JITTER, LEAF_TINT_JITTER);
        let blue = LEAF_BLUE + self.rng.range(-LEAF_TINT_JITTER, LEAF_TINT_JITTER);
        let (lo, hi) = self.rules.leaf_size;
        let size = self.rng.range(lo, hi);

        self.pad.leaf(&Leaf {
            at: (turtle.x, turtle.y),
            heading: turtle.heading,
            length,
            size,
            rgb: (channel(red), channel(green), channel(blue)),
            depth,
        });
        self.stats.leaves += 1;
    }
}

/// Grow one tree rooted at `root` with the default rules.
pub fn grow_tree<P, R>(
    pad: &mut P,
    rng: &mut R,
    params: &RenderParameters,
    root: Turtle,
) -> TreeStats
where
    P: Sketchpad + ?Sized,
    R: RandomSource + ?Sized,
{
    grow_tree_with(pad, rng, params, root, GrowthRules::default())
}

pub fn grow_tree_with<P, R>(
    pad: &mut P,
    rng: &mut R,
    params: &RenderParameters,
    root: Turtle,
    rules: GrowthRules,
) -> TreeStats
where
    P: Sketchpad + ?Sized,
    R: RandomSource + ?Sized,
{
    let mut grower = Grower {
        pad,
        rng,
        rules,
        color: params.branch_color,
        brightness: params.leaf_base_brightness,
        stats: TreeStats::default(),
    };
    grower.branch(params.base_length, root, 0);
    grower.stats
}

/// Records every primitive in draw order.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveLog {
    primitives: Vec<Primitive>,
}

impl PrimitiveLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Segment(s) => Some(s),
            Primitive::Leaf(_) => None,
        })
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Leaf> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Leaf(l) => Some(l),
            Primitive::Segment(_) => None,
        })
    }

    /// Number of segment levels, i.e. deepest segment depth plus one.
    pub fn segment_levels(&self) -> u32 {
        self.segments().map(|s| s.depth + 1).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

impl Sketchpad for PrimitiveLog {
    fn segment(&mut self, segment: &Segment) {
        self.primitives.push(Primitive::Segment(*segment));
    }

    fn leaf(&mut self, leaf: &Leaf) {
        self.primitives.push(Primitive::Leaf(*leaf));
    }
}
