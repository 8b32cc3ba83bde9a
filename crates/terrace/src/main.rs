mod config;
mod runner;

use clap::Parser;
use std::path::PathBuf;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World seed
    #[arg(long)]
    seed: Option<u64>,

    /// World-gen RON file (overrides --preset)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Built-in world-gen preset: default, flat, dense_forest
    #[arg(long)]
    preset: Option<String>,

    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// Camera speed in world units per second (negative scrolls left)
    #[arg(long, allow_hyphen_values = true)]
    speed: Option<f32>,

    /// Ticks per simulated second
    #[arg(long)]
    tick_rate: Option<f32>,

    /// Visible viewport width in world units
    #[arg(long)]
    viewport_width: Option<f32>,

    /// Reverse the scroll direction every N ticks
    #[arg(long)]
    reverse_every: Option<u64>,

    /// Print the resolved world-gen config as RON and exit
    #[arg(long)]
    dump_worldgen: bool,
}

impl Args {
    /// Command-line flags sit on top of every other config layer
    fn apply(&self, app: &mut AppConfig) {
        if let Some(seed) = self.seed {
            app.world.seed = seed;
        }
        if let Some(path) = &self.config {
            app.world.worldgen_path = Some(path.display().to_string());
        }
        if let Some(preset) = &self.preset {
            app.world.preset = preset.clone();
        }
        if let Some(ticks) = self.ticks {
            app.run.ticks = ticks;
        }
        if let Some(speed) = self.speed {
            app.run.speed = speed;
        }
        if let Some(tick_rate) = self.tick_rate {
            app.run.tick_rate = tick_rate;
        }
        if let Some(width) = self.viewport_width {
            app.viewport.width = width;
        }
        if let Some(every) = self.reverse_every {
            app.run.reverse_every = every;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut app = AppConfig::load()?;
    args.apply(&mut app);

    if app.run.tick_rate <= 0.0 {
        anyhow::bail!("--tick-rate must be positive, got {}", app.run.tick_rate);
    }
    if app.viewport.width <= 0.0 {
        anyhow::bail!("--viewport-width must be positive, got {}", app.viewport.width);
    }

    let worldgen = app.world.resolve_worldgen()?;

    if args.dump_worldgen {
        println!("{}", worldgen.to_ron_string()?);
        return Ok(());
    }

    log::info!("Starting Terrace");
    log::info!("  Seed: {}", app.world.seed);
    log::info!("  World-gen: {}", worldgen.name);
    log::info!(
        "  Ticks: {} at {} Hz, speed {}",
        app.run.ticks,
        app.run.tick_rate,
        app.run.speed
    );

    let summary = runner::run(app.world.seed, worldgen, &app.viewport, &app.run)?;

    log::info!("Run finished after {} ticks", summary.ticks);
    log::info!("  Final camera x: {:.1}", summary.final_center_x);
    log::info!(
        "  Shifts: {} (created {} columns, evicted {}, skipped {} live)",
        summary.shifts,
        summary.created_columns,
        summary.evicted_columns,
        summary.skipped_columns
    );
    log::info!(
        "  Entities: {} live, {} peak",
        summary.live_entities,
        summary.max_live_entities
    );
    log::info!(
        "  Leaves: {} landed, {} regrown",
        summary.landed_leaves,
        summary.revived_leaves
    );
    log::info!(
        "  Birds: {} launched, {} removed, {} grounded",
        summary.launched_birds,
        summary.removed_birds,
        summary.grounded_birds
    );

    if summary.duplicate_entities > 0 {
        anyhow::bail!(
            "{} duplicate entities detected in the index",
            summary.duplicate_entities
        );
    }
    log::info!("  Duplicate entities: 0");

    Ok(())
}
