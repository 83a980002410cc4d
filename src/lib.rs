//! Render a user's recent commit activity as a procedurally grown tree.
//!
//! Five activity numbers map to a trunk length, a bark color and a leaf
//! brightness; a recursive generator then draws randomized branches ending in
//! almond-shaped leaves onto an owned [`tiny_skia`] surface.

pub mod animation;
pub mod config;
pub mod error;
pub mod metrics;
pub mod params;
pub mod random;
pub mod renderer;
pub mod sketch;
pub mod surface;

pub use config::TreeStyle;
pub use error::BloomError;
pub use metrics::ActivityMetrics;
pub use params::{BranchColor, RenderParameters};
pub use renderer::{RenderOutcome, SurfaceSize, TreeRenderer};
