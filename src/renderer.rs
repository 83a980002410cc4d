use crate::config::TreeStyle;
use crate::error::BloomError;
use crate::metrics::ActivityMetrics;
use crate::params::RenderParameters;
use crate::random::RandomSource;
use crate::sketch::{grow_tree, TreeStats, Turtle};
use crate::surface::DrawSurface;
use std::path::Path;
use std::time::{Duration, Instant};
use tiny_skia::Pixmap;

/// Called once per mount, after the first complete frame.
pub type ReadyCallback = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        SurfaceSize { width, height }
    }

    pub fn is_drawable(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Drawn(TreeStats),
    /// No usable surface yet; the pass will run on the next valid size.
    Deferred,
}

/// One mount of the tree view.
///
/// Owns the drawing surface for its whole lifetime. Every pass clears and
/// redraws the full surface; the surface is reused while the size holds and
/// replaced when it changes. Dropping or [`unmount`](Self::unmount)ing the
/// renderer releases both pixmap layers and discards a readiness callback
/// that never fired.
pub struct TreeRenderer<R: RandomSource> {
    style: TreeStyle,
    rng: R,
    metrics: ActivityMetrics,
    params: RenderParameters,
    size: Option<SurfaceSize>,
    surface: Option<DrawSurface>,
    on_ready: Option<ReadyCallback>,
    pending_resize: Option<(SurfaceSize, Instant)>,
    last_stats: Option<TreeStats>,
    passes: u64,
}

impl<R: RandomSource> TreeRenderer<R> {
    pub fn mount(style: TreeStyle, rng: R, on_ready: ReadyCallback) -> Self {
        let metrics = ActivityMetrics::default();
        tracing::debug!(?style, "mounting tree renderer");
        TreeRenderer {
            style,
            rng,
            metrics,
            params: RenderParameters::from_metrics(&metrics),
            size: None,
            surface: None,
            on_ready: Some(on_ready),
            pending_resize: None,
            last_stats: None,
            passes: 0,
        }
    }

    /// Derive parameters from `metrics` and redraw at `size`.
    pub fn render(&mut self, metrics: ActivityMetrics, size: SurfaceSize) -> RenderOutcome {
        self.metrics = metrics;
        self.params = RenderParameters::from_metrics(&metrics);
        tracing::debug!(?metrics, params = ?self.params, "metrics updated");
        self.size = Some(size);
        self.draw()
    }

    /// Redraw at `size` with the parameters already in effect.
    pub fn resize(&mut self, size: SurfaceSize) -> RenderOutcome {
        self.pending_resize = None;
        self.size = Some(size);
        self.draw()
    }

    /// Record a resize notification without drawing. Only the latest request
    /// survives; [`settle`](Self::settle) applies it once it has been quiet
    /// for the style's debounce period.
    pub fn request_resize(&mut self, size: SurfaceSize, now: Instant) {
        self.pending_resize = Some((size, now));
    }

    pub fn settle(&mut self, now: Instant) -> Option<RenderOutcome> {
        let (size, requested_at) = self.pending_resize?;
        let quiet = Duration::from_millis(self.style.resize_debounce_ms);
        if now.saturating_duration_since(requested_at) < quiet {
            return None;
        }
        Some(self.resize(size))
    }

    pub fn has_pending_resize(&self) -> bool {
        self.pending_resize.is_some()
    }

    fn draw(&mut self) -> RenderOutcome {
        let Some(size) = self.size.filter(|s| s.is_drawable()) else {
            tracing::debug!(size = ?self.size, "no drawable size yet, deferring");
            return RenderOutcome::Deferred;
        };

        let reusable = self
            .surface
            .as_ref()
            .is_some_and(|s| s.width() == size.width && s.height() == size.height);
        if !reusable {
            // Release the old layers before allocating new ones.
            self.surface = None;
            match DrawSurface::new(size.width, size.height, self.style.background_color()) {
                Ok(surface) => {
                    tracing::debug!(width = size.width, height = size.height, "surface created");
                    self.surface = Some(surface);
                }
                Err(err) => {
                    tracing::warn!(%err, "surface unavailable, deferring");
                    return RenderOutcome::Deferred;
                }
            }
        }

        let (x, y) = self.style.anchor(size.width, size.height);
        let Some(surface) = self.surface.as_mut() else {
            return RenderOutcome::Deferred;
        };
        surface.clear();
        let stats = grow_tree(surface, &mut self.rng, &self.params, Turtle::at(x, y));

        self.passes += 1;
        self.last_stats = Some(stats);
        tracing::debug!(
            pass = self.passes,
            segments = stats.segments,
            leaves = stats.leaves,
            depth = stats.max_depth,
            "tree drawn"
        );

        if let Some(on_ready) = self.on_ready.take() {
            tracing::info!("first frame ready");
            on_ready();
        }

        RenderOutcome::Drawn(stats)
    }

    /// Root of the tree on the current surface.
    pub fn anchor(&self) -> Option<(f32, f32)> {
        self.surface
            .as_ref()
            .map(|s| self.style.anchor(s.width(), s.height()))
    }

    pub fn parameters(&self) -> &RenderParameters {
        &self.params
    }

    pub fn metrics(&self) -> &ActivityMetrics {
        &self.metrics
    }

    pub fn surface(&self) -> Option<&DrawSurface> {
        self.surface.as_ref()
    }

    pub fn last_stats(&self) -> Option<TreeStats> {
        self.last_stats
    }

    /// Completed draw passes in this mount.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn is_ready(&self) -> bool {
        self.on_ready.is_none()
    }

    pub fn snapshot(&self) -> Option<Pixmap> {
        self.surface.as_ref().map(DrawSurface::composite)
    }

    pub fn save_png(&self, path: &Path) -> Result<(), BloomError> {
        let surface = self.surface.as_ref().ok_or(BloomError::Surface {
            width: self.size.map_or(0, |s| s.width),
            height: self.size.map_or(0, |s| s.height),
        })?;
        surface.save_png(path)
    }

    /// Tear down this mount. The surface is released before returning and a
    /// readiness callback that has not fired is dropped unfired.
    pub fn unmount(mut self) {
        self.surface = None;
        self.pending_resize = None;
        if self.on_ready.take().is_some() {
            tracing::debug!("unmounted before first frame, readiness suppressed");
        }
        tracing::debug!(passes = self.passes, "tree renderer unmounted");
    }
}
