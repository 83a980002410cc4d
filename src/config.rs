use crate::error::BloomError;
use crate::metrics::parse_commit_day;
use chrono::NaiveDate;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tiny_skia::Color;

#[derive(Parser, Debug)]
#[command(name = "bloom-renderer", about = "Render commit activity as a procedural tree")]
pub struct RenderConfig {
    /// Path to a `/commit_activity` JSON response
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output PNG path
    #[arg(short, long, default_value = "tree.png")]
    pub output: PathBuf,

    /// Surface width
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Surface height
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Override total commits
    #[arg(long)]
    pub total_commits: Option<u32>,

    /// Override merged pull requests
    #[arg(long)]
    pub merged_prs: Option<u32>,

    /// Override current streak
    #[arg(long)]
    pub streak: Option<u32>,

    /// Override longest streak
    #[arg(long)]
    pub max_streak: Option<u32>,

    /// Override number of active days in the last 30
    #[arg(long)]
    pub days_with_commits: Option<u32>,

    /// Recompute streaks from the input's commit days, ending on this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_today)]
    pub today: Option<NaiveDate>,

    /// Seed for branch angles and leaf jitter (unseeded when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// TOML file with style overrides
    #[arg(long)]
    pub style: Option<PathBuf>,

    /// Write the growth animation: a directory gets numbered PNGs, an .mp4 path goes through ffmpeg
    #[arg(long)]
    pub animation_output: Option<PathBuf>,

    /// Animation frames per second
    #[arg(long, default_value_t = 30)]
    pub fps: u32,
}

fn parse_today(s: &str) -> Result<NaiveDate, String> {
    parse_commit_day(s).ok_or_else(|| format!("expected YYYY-MM-DD, got {s:?}"))
}

/// Slowest trunk growth accepted, in pixels per frame.
pub const MIN_GROWTH_SPEED: f32 = 0.01;

/// Longest pause accepted before the leaves appear.
pub const MAX_LEAF_DELAY_MS: u64 = 60_000;

/// Presentation settings that sit around the generator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TreeStyle {
    /// Horizontal shift of the trunk, for hosts with a fixed side panel.
    pub side_panel_offset: f32,
    pub background: [u8; 3],
    /// Trunk pixels revealed per animation frame.
    pub growth_speed: f32,
    /// Pause between the last growth frame and the leaves appearing.
    pub leaf_delay_ms: u64,
    /// Quiet period a resize must survive before it triggers a redraw.
    pub resize_debounce_ms: u64,
}

impl Default for TreeStyle {
    fn default() -> Self {
        TreeStyle {
            side_panel_offset: 0.0,
            background: [2, 34, 34],
            growth_speed: 2.0,
            leaf_delay_ms: 700,
            resize_debounce_ms: 150,
        }
    }
}

impl TreeStyle {
    pub fn from_toml(content: &str) -> Result<Self, BloomError> {
        let style: Self = toml::from_str(content)?;
        style.validate()?;
        Ok(style)
    }

    pub fn from_file(path: &Path) -> Result<Self, BloomError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject values that deserialize fine but cannot drive a render.
    pub fn validate(&self) -> Result<(), BloomError> {
        if !self.side_panel_offset.is_finite() {
            return Err(BloomError::Style {
                field: "side_panel_offset",
                reason: format!("must be finite, got {}", self.side_panel_offset),
            });
        }
        if !self.growth_speed.is_finite() || self.growth_speed < MIN_GROWTH_SPEED {
            return Err(BloomError::Style {
                field: "growth_speed",
                reason: format!(
                    "must be at least {MIN_GROWTH_SPEED} px per frame, got {}",
                    self.growth_speed
                ),
            });
        }
        if self.leaf_delay_ms > MAX_LEAF_DELAY_MS {
            return Err(BloomError::Style {
                field: "leaf_delay_ms",
                reason: format!(
                    "must be at most {MAX_LEAF_DELAY_MS} ms, got {}",
                    self.leaf_delay_ms
                ),
            });
        }
        Ok(())
    }

    /// Root of the tree on a `width` x `height` surface: horizontal center
    /// plus the side panel shift, on the bottom edge.
    pub fn anchor(&self, width: u32, height: u32) -> (f32, f32) {
        (width as f32 / 2.0 + self.side_panel_offset, height as f32)
    }

    pub fn background_color(&self) -> Color {
        let [r, g, b] = self.background;
        Color::from_rgba8(r, g, b, 255)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_style_uses_defaults() {
        assert_eq!(TreeStyle::from_toml("").unwrap(), TreeStyle::default());
    }

    #[test]
    fn partial_style_overrides_named_fields() {
        let style = TreeStyle::from_toml(
            r"
            side_panel_offset = 137.0
            background = [0, 0, 0]
            ",
        )
        .unwrap();
        assert_eq!(style.side_panel_offset, 137.0);
        assert_eq!(style.background, [0, 0, 0]);
        assert_eq!(style.growth_speed, 2.0);
    }

    #[test]
    fn invalid_style_is_reported() {
        assert!(matches!(
            TreeStyle::from_toml("growth_speed = \"fast\""),
            Err(BloomError::Toml(_))
        ));
    }

    #[test]
    fn vanishing_growth_speed_is_rejected() {
        for content in [
            "growth_speed = 1e-9",
            "growth_speed = 0.0",
            "growth_speed = -2.0",
            "growth_speed = nan",
        ] {
            assert!(
                matches!(
                    TreeStyle::from_toml(content),
                    Err(BloomError::Style { field: "growth_speed", .. })
                ),
                "{content} was accepted"
            );
        }
        let slow = TreeStyle::from_toml("growth_speed = 0.01").unwrap();
        assert_eq!(slow.growth_speed, 0.01);
    }

    #[test]
    fn huge_leaf_delay_is_rejected() {
        assert!(matches!(
            TreeStyle::from_toml("leaf_delay_ms = 9000000000000000000"),
            Err(BloomError::Style { field: "leaf_delay_ms", .. })
        ));
        let style = TreeStyle::from_toml("leaf_delay_ms = 60000").unwrap();
        assert_eq!(style.leaf_delay_ms, MAX_LEAF_DELAY_MS);
    }

    #[test]
    fn style_file_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.toml");
        std::fs::write(&path, "side_panel_offset = inf").unwrap();
        assert!(matches!(
            TreeStyle::from_file(&path),
            Err(BloomError::Style { field: "side_panel_offset", .. })
        ));
    }

    #[test]
    fn cli_parses_metric_overrides() {
        let config = RenderConfig::parse_from([
            "bloom-renderer",
            "--width",
            "400",
            "--streak",
            "12",
            "--seed",
            "9",
        ]);
        assert_eq!(config.width, 400);
        assert_eq!(config.height, 600);
        assert_eq!(config.streak, Some(12));
        assert_eq!(config.seed, Some(9));
        assert!(config.input.is_none());
        assert!(config.today.is_none());
    }

    #[test]
    fn cli_validates_today() {
        let config =
            RenderConfig::try_parse_from(["bloom-renderer", "--today", "2024-05-10"]).unwrap();
        assert_eq!(config.today, NaiveDate::from_ymd_opt(2024, 5, 10));
        assert!(RenderConfig::try_parse_from(["bloom-renderer", "--today", "yesterday"]).is_err());
    }
}
