//! Driver configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `terrace.ron` file (if exists)
//! 3. Environment variables prefixed with `TERRACE_`
//! 4. Command-line flags (applied by `main`)
//!
//! Example environment variable: `TERRACE_RUN__SPEED=-450`

use ::config::{Config, Environment, File};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use terrace_core::WorldGenConfig;

/// Top-level driver configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub world: WorldSection,

    #[serde(default)]
    pub viewport: ViewportSection,

    #[serde(default)]
    pub run: RunSection,
}

/// Which world to stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSection {
    pub seed: u64,
    /// Built-in preset: default, flat, dense_forest
    pub preset: String,
    /// RON world-gen file; overrides the preset when set
    #[serde(default)]
    pub worldgen_path: Option<String>,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            seed: 220,
            preset: "default".to_string(),
            worldgen_path: None,
        }
    }
}

/// Simulated camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportSection {
    /// Visible width in world units
    pub width: f32,
    /// Camera centre at tick 0
    pub start_x: f32,
}

impl Default for ViewportSection {
    fn default() -> Self {
        Self {
            width: 1024.0,
            start_x: 0.0,
        }
    }
}

/// Headless loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSection {
    pub ticks: u64,
    /// Ticks per simulated second
    pub tick_rate: f32,
    /// Camera speed in world units per second; negative scrolls left
    pub speed: f32,
    /// Flip direction every N ticks (0 = never)
    pub reverse_every: u64,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            ticks: 3600,
            tick_rate: 60.0,
            speed: 300.0,
            reverse_every: 0,
        }
    }
}

impl AppConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `terrace.ron` file (if exists)
    /// 3. Environment variables prefixed with `TERRACE_` (highest priority)
    pub fn load() -> Result<Self> {
        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("world.seed", 220_i64)?
            .set_default("world.preset", "default")?
            .set_default("viewport.width", 1024.0)?
            .set_default("viewport.start_x", 0.0)?
            .set_default("run.ticks", 3600_i64)?
            .set_default("run.tick_rate", 60.0)?
            .set_default("run.speed", 300.0)?
            .set_default("run.reverse_every", 0_i64)?
            // Layer 2: Config file (optional, won't error if missing)
            .add_source(
                File::with_name("terrace")
                    .format(::config::FileFormat::Ron)
                    .required(false),
            )
            // Layer 3: Environment variables (TERRACE_RUN__SPEED, etc.)
            .add_source(Environment::with_prefix("TERRACE").separator("__"));

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl WorldSection {
    /// World-gen parameters from the RON file if one is set, else from the preset
    pub fn resolve_worldgen(&self) -> Result<WorldGenConfig> {
        if let Some(path) = &self.worldgen_path {
            return WorldGenConfig::load(path)
                .with_context(|| format!("Failed to load world-gen config {}", path));
        }

        let config = match self.preset.as_str() {
            "default" => WorldGenConfig::default(),
            "flat" => WorldGenConfig::preset_flat(),
            "dense_forest" => WorldGenConfig::preset_dense_forest(),
            other => bail!("Unknown world-gen preset '{}'", other),
        };
        config.validate().context("Built-in preset is invalid")?;
        Ok(config)
    }
}
