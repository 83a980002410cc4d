//! Growth animation.
//!
//! One tree is recorded into a [`PrimitiveLog`] and then replayed frame by
//! frame: segments are revealed level by level as progress advances, and the
//! leaves appear only after the tree has finished growing and a short pause.
//! Frames are independent surfaces, so they render in parallel.

use crate::config::TreeStyle;
use crate::error::BloomError;
use crate::params::RenderParameters;
use crate::random::RandomSource;
use crate::renderer::SurfaceSize;
use crate::sketch::{grow_tree, Primitive, PrimitiveLog, Segment, Sketchpad, TreeStats, Turtle};
use crate::surface::{save_png, DrawSurface};
use rayon::prelude::*;
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use tiny_skia::{Color, Pixmap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSpec {
    /// Fraction of the segment levels revealed, 0..=1.
    pub progress: f32,
    pub leaves: bool,
}

/// Upper bound on each phase of the schedule: ten minutes at 60 fps.
pub const MAX_PHASE_FRAMES: usize = 36_000;

/// Frames for a trunk of `base_length`: growth at `growth_speed` pixels per
/// frame, a pause of `leaf_delay_ms`, then one second with leaves. Each phase
/// is capped at [`MAX_PHASE_FRAMES`].
pub fn frame_schedule(base_length: f32, style: &TreeStyle, fps: u32) -> Vec<FrameSpec> {
    let steps = f64::from(base_length) / f64::from(style.growth_speed);
    let growth = if steps.is_finite() && steps >= 1.0 {
        (steps.ceil() as usize).min(MAX_PHASE_FRAMES)
    } else {
        1
    };
    let hold = usize::try_from(u64::from(fps).saturating_mul(style.leaf_delay_ms) / 1000)
        .unwrap_or(MAX_PHASE_FRAMES)
        .min(MAX_PHASE_FRAMES);
    let bloom = usize::try_from(fps)
        .unwrap_or(MAX_PHASE_FRAMES)
        .clamp(1, MAX_PHASE_FRAMES);

    let mut frames = Vec::with_capacity(growth + hold + bloom);
    frames.extend((1..=growth).map(|i| FrameSpec {
        progress: i as f32 / growth as f32,
        leaves: false,
    }));
    frames.extend((0..hold).map(|_| FrameSpec {
        progress: 1.0,
        leaves: false,
    }));
    frames.extend((0..bloom).map(|_| FrameSpec {
        progress: 1.0,
        leaves: true,
    }));
    frames
}

/// Primitives drawn in `frame`, with partially grown segments shortened.
pub fn visible_primitives(log: &PrimitiveLog, frame: FrameSpec) -> Vec<Primitive> {
    let levels = log.segment_levels() as f32;
    let front = frame.progress.clamp(0.0, 1.0) * levels;

    log.primitives()
        .iter()
        .filter_map(|p| match p {
            Primitive::Segment(s) => {
                let reveal = (front - s.depth as f32).clamp(0.0, 1.0);
                (reveal > 0.0).then(|| Primitive::Segment(partial(s, reveal)))
            }
            Primitive::Leaf(_) => frame.leaves.then_some(*p),
        })
        .collect()
}

fn partial(s: &Segment, reveal: f32) -> Segment {
    if reveal >= 1.0 {
        return *s;
    }
    let to = (
        s.from.0 + (s.to.0 - s.from.0) * reveal,
        s.from.1 + (s.to.1 - s.from.1) * reveal,
    );
    Segment {
        to,
        length: s.length * reveal,
        ..*s
    }
}

pub struct GrowthAnimation {
    log: PrimitiveLog,
    stats: TreeStats,
    size: SurfaceSize,
    background: Color,
    frames: Vec<FrameSpec>,
}

impl GrowthAnimation {
    pub fn record<R: RandomSource + ?Sized>(
        params: &RenderParameters,
        size: SurfaceSize,
        style: &TreeStyle,
        rng: &mut R,
        fps: u32,
    ) -> Result<Self, BloomError> {
        if !size.is_drawable() {
            return Err(BloomError::Surface {
                width: size.width,
                height: size.height,
            });
        }
        let (x, y) = style.anchor(size.width, size.height);
        let mut log = PrimitiveLog::new();
        let stats = grow_tree(&mut log, rng, params, Turtle::at(x, y));
        Ok(GrowthAnimation {
            log,
            stats,
            size,
            background: style.background_color(),
            frames: frame_schedule(params.base_length, style, fps),
        })
    }

    pub fn frames(&self) -> &[FrameSpec] {
        &self.frames
    }

    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    pub fn render_frame(&self, index: usize) -> Result<Pixmap, BloomError> {
        let frame = self.frames.get(index).copied().unwrap_or(FrameSpec {
            progress: 1.0,
            leaves: true,
        });
        let mut surface = DrawSurface::new(self.size.width, self.size.height, self.background)?;
        for primitive in visible_primitives(&self.log, frame) {
            match primitive {
                Primitive::Segment(s) => surface.segment(&s),
                Primitive::Leaf(l) => surface.leaf(&l),
            }
        }
        Ok(surface.composite())
    }

    /// Write `frame_00000.png`, `frame_00001.png`, ... into `dir`.
    pub fn write_png_sequence(&self, dir: &Path) -> Result<usize, BloomError> {
        std::fs::create_dir_all(dir)?;
        (0..self.frames.len()).into_par_iter().try_for_each(|i| {
            let pixmap = self.render_frame(i)?;
            save_png(&pixmap, &dir.join(format!("frame_{i:05}.png")))
        })?;
        tracing::info!(frames = self.frames.len(), dir = %dir.display(), "animation frames written");
        Ok(self.frames.len())
    }

    /// Pipe raw RGBA frames into ffmpeg. The encoder is killed and reaped
    /// if streaming fails.
    pub fn write_video(&self, output: &Path, fps: u32) -> Result<(), BloomError> {
        let mut ffmpeg = Command::new("ffmpeg")
            .args([
                "-y",
                "-f", "rawvideo",
                "-pix_fmt", "rgba",
                "-s", &format!("{}x{}", self.size.width, self.size.height),
                "-r", &fps.max(1).to_string(),
                "-i", "-",
                "-c:v", "libx264",
                "-pix_fmt", "yuv420p",
                "-preset", "fast",
            ])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let Some(mut stdin) = ffmpeg.stdin.take() else {
            return reap_on_error(
                &mut ffmpeg,
                Err(BloomError::Encoder("failed to open ffmpeg stdin".into())),
            );
        };
        let streamed = self.stream_frames(&mut stdin);
        drop(stdin);
        let total = reap_on_error(&mut ffmpeg, streamed)?;

        let status = ffmpeg.wait()?;
        if !status.success() {
            return Err(BloomError::Encoder(format!("ffmpeg exited with status: {status}")));
        }
        tracing::info!(frames = total, output = %output.display(), "animation video written");
        Ok(())
    }

    /// Write every frame as raw RGBA into `sink`, rendering in parallel
    /// batches and writing in order. Returns the number of frames written.
    pub fn stream_frames<W: Write>(&self, sink: &mut W) -> Result<usize, BloomError> {
        let total = self.frames.len();
        let batch = rayon::current_num_threads().max(1);
        for start in (0..total).step_by(batch) {
            let end = (start + batch).min(total);
            let pixmaps = (start..end)
                .into_par_iter()
                .map(|i| self.render_frame(i))
                .collect::<Result<Vec<_>, _>>()?;
            for pixmap in &pixmaps {
                sink.write_all(pixmap.data())?;
            }
            tracing::debug!(frame = end, total, "frames encoded");
        }
        sink.flush()?;
        Ok(total)
    }
}

/// Kill and reap `child` when `result` is an error, then hand `result` back.
fn reap_on_error<T>(child: &mut Child, result: Result<T, BloomError>) -> Result<T, BloomError> {
    if result.is_err() {
        if let Err(err) = child.kill() {
            tracing::debug!(error = %err, "encoder already exited");
        }
        if let Err(err) = child.wait() {
            tracing::warn!(error = %err, "failed to reap encoder");
        }
    }
    result
}
