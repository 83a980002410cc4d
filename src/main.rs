use bloom_renderer::animation::GrowthAnimation;
use bloom_renderer::config::{RenderConfig, TreeStyle};
use bloom_renderer::metrics::{load_activity, ActivityMetrics, WINDOW_DAYS};
use bloom_renderer::random::{RandomSource, SeededRandom, ThreadRandom};
use bloom_renderer::{BloomError, RenderOutcome, SurfaceSize, TreeRenderer};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RenderConfig::parse();
    if let Err(e) = run(&config) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: &RenderConfig) -> Result<(), BloomError> {
    let style = match &config.style {
        Some(path) => TreeStyle::from_file(path)?,
        None => TreeStyle::default(),
    };
    let metrics = resolve_metrics(config)?;
    let size = SurfaceSize::new(config.width, config.height);

    let mut renderer = TreeRenderer::mount(
        style.clone(),
        random_source(config.seed),
        Box::new(|| tracing::info!("tree ready")),
    );

    let stats = match renderer.render(metrics, size) {
        RenderOutcome::Drawn(stats) => stats,
        RenderOutcome::Deferred => {
            return Err(BloomError::Surface {
                width: size.width,
                height: size.height,
            })
        }
    };
    let params = *renderer.parameters();
    tracing::info!(
        base_length = params.base_length,
        color = ?params.branch_color,
        brightness = params.leaf_base_brightness,
        segments = stats.segments,
        leaves = stats.leaves,
        "tree drawn"
    );

    renderer.save_png(&config.output)?;
    tracing::info!(output = %config.output.display(), "tree written");
    renderer.unmount();

    if let Some(ref target) = config.animation_output {
        let mut rng = random_source(config.seed);
        let animation = GrowthAnimation::record(&params, size, &style, &mut rng, config.fps)?;
        tracing::info!(frames = animation.frames().len(), "rendering growth animation");
        let is_video = target
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"));
        if is_video {
            animation.write_video(target, config.fps)?;
        } else {
            animation.write_png_sequence(target)?;
        }
    }

    Ok(())
}

/// Seeded runs give the still and the animation the same tree.
fn random_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom::new()),
    }
}

fn resolve_metrics(config: &RenderConfig) -> Result<ActivityMetrics, BloomError> {
    let mut metrics = match &config.input {
        Some(path) => {
            tracing::info!(input = %path.display(), "loading activity");
            let activity = load_activity(path)?;
            match config.today {
                Some(today) => activity.metrics_as_of(today),
                None => activity.into(),
            }
        }
        None => {
            if config.today.is_some() {
                tracing::warn!("--today has no effect without --input");
            }
            ActivityMetrics::default()
        }
    };

    if let Some(n) = config.total_commits {
        metrics.total_commits = n;
    }
    if let Some(n) = config.merged_prs {
        metrics.merged_prs = n;
    }
    if let Some(n) = config.streak {
        metrics.streak = n;
    }
    if let Some(n) = config.max_streak {
        metrics.max_streak = n;
    }
    if let Some(n) = config.days_with_commits {
        metrics.days_with_commits = n.min(WINDOW_DAYS as u32);
    }
    Ok(metrics)
}
