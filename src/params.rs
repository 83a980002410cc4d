use crate::metrics::ActivityMetrics;
use tiny_skia::Color;

pub const MIN_BASE_LENGTH: f32 = 80.0;
pub const MAX_BASE_LENGTH: f32 = 200.0;
/// Activity score at which the trunk stops growing.
pub const SCORE_CEILING: f32 = 200.0;

pub const MIN_LEAF_BRIGHTNESS: f32 = 80.0;
pub const MAX_LEAF_BRIGHTNESS: f32 = 200.0;
pub const ACTIVE_DAYS_CEILING: f32 = 30.0;

/// Streaks longer than this switch the bark to the warm palette.
pub const WARM_STREAK_THRESHOLD: u32 = 10;

/// Linear remap of `value` from `[in_lo, in_hi]` onto `[out_lo, out_hi]`.
/// Not clamped.
pub fn linear_map(value: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    out_lo + (value - in_lo) / (in_hi - in_lo) * (out_hi - out_lo)
}

/// Two-level bark palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchColor {
    DarkBrown,
    WarmBrown,
}

impl BranchColor {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            BranchColor::DarkBrown => (101, 67, 33),
            BranchColor::WarmBrown => (139, 90, 43),
        }
    }

    pub fn color(self) -> Color {
        let (r, g, b) = self.rgb();
        Color::from_rgba8(r, g, b, 255)
    }
}

/// Visual parameters derived from a set of activity metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParameters {
    pub base_length: f32,
    pub branch_color: BranchColor,
    pub leaf_base_brightness: f32,
}

impl RenderParameters {
    pub fn from_metrics(metrics: &ActivityMetrics) -> Self {
        RenderParameters {
            base_length: base_length(metrics.activity_score()),
            branch_color: branch_color(metrics.streak),
            leaf_base_brightness: leaf_brightness(metrics.days_with_commits),
        }
    }
}

pub fn base_length(activity_score: u32) -> f32 {
    linear_map(
        activity_score as f32,
        0.0,
        SCORE_CEILING,
        MIN_BASE_LENGTH,
        MAX_BASE_LENGTH,
    )
    .clamp(MIN_BASE_LENGTH, MAX_BASE_LENGTH)
}

pub fn branch_color(streak: u32) -> BranchColor {
    if streak > WARM_STREAK_THRESHOLD {
        BranchColor::WarmBrown
    } else {
        BranchColor::DarkBrown
    }
}

pub fn leaf_brightness(days_with_commits: u32) -> f32 {
    linear_map(
        days_with_commits as f32,
        0.0,
        ACTIVE_DAYS_CEILING,
        MIN_LEAF_BRIGHTNESS,
        MAX_LEAF_BRIGHTNESS,
    )
    .clamp(MIN_LEAF_BRIGHTNESS, MAX_LEAF_BRIGHTNESS)
}
