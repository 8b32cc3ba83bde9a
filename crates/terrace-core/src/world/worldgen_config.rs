//! World generation configuration - serializable parameters for world generation
//!
//! This module provides data structures that capture all world generation parameters,
//! enabling:
//! - Serialization to RON format for presets
//! - Configuration-driven generation of terrain, trees, decorations and bird flocks
//! - Tuning of the stream window without touching code

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::entity::Layer;

/// Errors raised while loading or validating a [`WorldGenConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read world-gen config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse world-gen config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to serialize world-gen config: {0}")]
    Serialize(#[from] ron::Error),

    #[error("invalid world-gen config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Complete world generation configuration
///
/// All parameters needed to generate and stream a world. Serializable to RON for presets.
/// The seed is NOT part of the config - same config + different seed = different world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldGenConfig {
    /// Display name for this configuration
    pub name: String,

    /// Grid unit shared by every generator
    pub grid: GridParams,

    /// Terrain height and block stacks
    pub terrain: TerrainParams,

    /// Tree placement and canopy shape
    pub trees: TreeConfig,

    /// Decorative static objects (clouds and friends)
    #[serde(default)]
    pub decorations: Vec<DecorationConfig>,

    /// Bird flocks launched from the viewport edges
    #[serde(default)]
    pub birds: Vec<BirdConfig>,

    /// Host layer ids for terrain and trees
    pub layers: LayerParams,

    /// Stream window margins
    pub stream: StreamParams,
}

/// Grid parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridParams {
    /// Width and height of one block cell in world units (default: 30)
    pub unit: i32,
}

/// Terrain height generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainParams {
    /// Ground height where the noise is zero (screen y, grows downward)
    pub base_height: f32,
    /// Noise multiplier (affects hill amplitude, default: 300.0)
    pub amplitude: f32,
    /// Blocks per column, counted from the surface downward (default: 28)
    pub depth_rows: i32,
    /// Top rows registered in the collidable ground layer (default: 2)
    pub surface_rows: i32,
    /// Noise layer sampled at `x / unit`
    pub height_noise: NoiseLayerConfig,
    /// Base block colour, jittered per cell
    pub base_color: [u8; 3],
}

/// Noise algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseTypeConfig {
    OpenSimplex2,
    OpenSimplex2S,
    Cellular,
    Perlin,
    ValueCubic,
    Value,
}

/// Fractal layering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FractalTypeConfig {
    None,
    FBm,
    Ridged,
    PingPong,
}

/// Configuration for one noise layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseLayerConfig {
    pub noise_type: NoiseTypeConfig,
    /// Frequency applied to the sample coordinate (default: 0.05)
    pub frequency: f32,
    pub fractal_type: FractalTypeConfig,
    pub octaves: u32,
    pub lacunarity: f32,
    pub gain: f32,
    /// Added to the world seed so layers stay uncorrelated
    pub seed_offset: i32,
}

/// Tree placement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Upper bound N of the placement roll `[1, N]` (default: 11)
    pub spawn_roll: i32,
    /// A tree spawns when the roll equals this value (default: 1)
    pub spawn_sentinel: i32,
    /// Shortest trunk in grid units (default: 5)
    pub min_height: i32,
    /// Tallest trunk in grid units (default: 14)
    pub max_height: i32,
    /// Smallest canopy side (default: 3)
    pub min_canopy: i32,
    /// Largest canopy side (default: 5)
    pub max_canopy: i32,
    /// Leaf sprite side in world units (default: 28)
    pub leaf_size: i32,
    pub trunk_color: [u8; 3],
    pub leaf_color: [u8; 3],
    /// Falling leaf timing
    pub leaf: LeafCycleConfig,
}

/// Timing and motion of the falling-leaf cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafCycleConfig {
    /// Seconds a leaf hangs before it falls
    pub min_life_secs: i32,
    pub max_life_secs: i32,
    /// Delay before swinging starts, in tenths of a second
    pub min_swing_delay_tenths: i32,
    pub max_swing_delay_tenths: i32,
    /// Period of the swing and breathing transitions
    pub min_transition_secs: i32,
    pub max_transition_secs: i32,
    pub angle_from: f32,
    pub angle_to: f32,
    pub size_from: f32,
    pub size_to: f32,
    /// Downward speed while falling
    pub fall_speed: f32,
    /// Horizontal drift swings between these velocities
    pub drift_from: f32,
    pub drift_to: f32,
    pub drift_period_secs: f32,
    pub fade_secs: f32,
    /// Seconds a faded leaf waits before regrowing
    pub min_revive_secs: i32,
    pub max_revive_secs: i32,
    /// Delay between a landing collision and the drift stop
    pub halt_delay_secs: f32,
}

/// Decorative static object generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecorationConfig {
    /// Display name, also used as the visual kind
    pub name: String,
    /// Spawn when a roll in `[0, probability)` equals `probability - 1` (default: 19)
    pub probability: i32,
    /// Highest spawn point (screen y, inclusive)
    pub band_top: i32,
    /// Lowest spawn point (screen y, exclusive)
    pub band_bottom: i32,
    /// Sprite names, one picked uniformly per spawn
    pub variants: Vec<String>,
    /// Sprite size in world units
    pub size: [i32; 2],
    /// Host layer id
    pub layer: i32,
}

/// One bird flock: a timed spawner sending birds across the viewport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirdConfig {
    /// Display name, also used as the visual kind
    pub name: String,
    /// Seconds between launches (default: 7)
    pub cycle_secs: f32,
    /// Highest flight line (screen y, inclusive)
    pub band_top: i32,
    /// Lowest flight line (screen y, exclusive)
    pub band_bottom: i32,
    /// Horizontal speed in world units per second (default: 80)
    pub speed: f32,
    /// Sprite size in world units
    pub size: [i32; 2],
    /// Wing frames, cycled while the bird is unhurt
    pub frames: Vec<String>,
    /// Ticks between wing frames (default: 6)
    pub flap_ticks: u32,
    /// Grid units past a viewport edge before a bird is removed (default: 5)
    pub despawn_margin_units: i32,
    /// Size of the explosion shown on the first strike
    pub struck_size: [i32; 2],
    /// Downward acceleration after the first strike (default: 600)
    pub struck_gravity: f32,
    /// Falling speed at which the acceleration is switched off (default: 400)
    pub terminal_fall_speed: f32,
    /// Seconds the explosion shows before the bird is roasted
    pub roast_delay_secs: f32,
    /// Host layer id
    pub layer: i32,
}

/// Host layer ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerParams {
    /// Collidable surface rows
    pub ground: i32,
    /// Fill rows below the surface
    pub ground_fill: i32,
    pub trunk: i32,
    pub leaf: i32,
}

/// Stream window parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamParams {
    /// Grid units kept materialized beyond each viewport edge (default: 5)
    pub margin_units: i32,
    /// Grid units swept by every eviction call (default: 3)
    pub eviction_units: i32,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            grid: GridParams::default(),
            terrain: TerrainParams::default(),
            trees: TreeConfig::default(),
            decorations: vec![DecorationConfig::default()],
            birds: vec![
                BirdConfig::default(),
                BirdConfig {
                    name: "pink_bird".to_string(),
                    cycle_secs: 5.0,
                    frames: vec!["pinkBird2".to_string(), "pinkBird1".to_string()],
                    ..BirdConfig::default()
                },
            ],
            layers: LayerParams::default(),
            stream: StreamParams::default(),
        }
    }
}

impl Default for GridParams {
    fn default() -> Self {
        Self { unit: 30 }
    }
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            base_height: 450.0,
            amplitude: 300.0,
            depth_rows: 28,
            surface_rows: 2,
            height_noise: NoiseLayerConfig::default(),
            base_color: [212, 123, 74],
        }
    }
}

impl Default for NoiseLayerConfig {
    fn default() -> Self {
        Self {
            noise_type: NoiseTypeConfig::Perlin,
            frequency: 0.05,
            fractal_type: FractalTypeConfig::FBm,
            octaves: 3,
            lacunarity: 2.0,
            gain: 0.5,
            seed_offset: 0,
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            spawn_roll: 11,
            spawn_sentinel: 1,
            min_height: 5,
            max_height: 14,
            min_canopy: 3,
            max_canopy: 5,
            leaf_size: 28,
            trunk_color: [100, 50, 20],
            leaf_color: [50, 200, 30],
            leaf: LeafCycleConfig::default(),
        }
    }
}

impl Default for LeafCycleConfig {
    fn default() -> Self {
        Self {
            min_life_secs: 3,
            max_life_secs: 49,
            min_swing_delay_tenths: 1,
            max_swing_delay_tenths: 19,
            min_transition_secs: 1,
            max_transition_secs: 3,
            angle_from: 80.0,
            angle_to: 95.0,
            size_from: 28.0,
            size_to: 32.0,
            fall_speed: 20.0,
            drift_from: 40.0,
            drift_to: -40.0,
            drift_period_secs: 4.0,
            fade_secs: 8.0,
            min_revive_secs: 3,
            max_revive_secs: 11,
            halt_delay_secs: 0.1,
        }
    }
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            name: "cloud".to_string(),
            probability: 19,
            band_top: 50,
            band_bottom: 200,
            variants: vec!["cloud".to_string(), "cloud1".to_string()],
            size: [70, 60],
            layer: 159,
        }
    }
}

impl Default for BirdConfig {
    fn default() -> Self {
        Self {
            name: "green_bird".to_string(),
            cycle_secs: 7.0,
            band_top: 20,
            band_bottom: 300,
            speed: 80.0,
            size: [50, 45],
            frames: vec!["greenBird2".to_string(), "greenBird1".to_string()],
            flap_ticks: 6,
            despawn_margin_units: 5,
            struck_size: [40, 30],
            struck_gravity: 600.0,
            terminal_fall_speed: 400.0,
            roast_delay_secs: 0.4,
            layer: 152,
        }
    }
}

impl Default for LayerParams {
    fn default() -> Self {
        Self {
            ground: 161,
            ground_fill: 162,
            trunk: 163,
            leaf: 164,
        }
    }
}

impl Default for StreamParams {
    fn default() -> Self {
        Self {
            margin_units: 5,
            eviction_units: 3,
        }
    }
}

// ============================================================================
// Conversion helpers
// ============================================================================

impl NoiseTypeConfig {
    /// Convert to fastnoise_lite::NoiseType
    pub fn to_fastnoise(&self) -> fastnoise_lite::NoiseType {
        match self {
            NoiseTypeConfig::OpenSimplex2 => fastnoise_lite::NoiseType::OpenSimplex2,
            NoiseTypeConfig::OpenSimplex2S => fastnoise_lite::NoiseType::OpenSimplex2S,
            NoiseTypeConfig::Cellular => fastnoise_lite::NoiseType::Cellular,
            NoiseTypeConfig::Perlin => fastnoise_lite::NoiseType::Perlin,
            NoiseTypeConfig::ValueCubic => fastnoise_lite::NoiseType::ValueCubic,
            NoiseTypeConfig::Value => fastnoise_lite::NoiseType::Value,
        }
    }
}

impl FractalTypeConfig {
    /// Convert to fastnoise_lite::FractalType
    pub fn to_fastnoise(&self) -> fastnoise_lite::FractalType {
        match self {
            FractalTypeConfig::None => fastnoise_lite::FractalType::None,
            FractalTypeConfig::FBm => fastnoise_lite::FractalType::FBm,
            FractalTypeConfig::Ridged => fastnoise_lite::FractalType::Ridged,
            FractalTypeConfig::PingPong => fastnoise_lite::FractalType::PingPong,
        }
    }
}

impl NoiseLayerConfig {
    /// Create a FastNoiseLite instance from this config
    pub fn to_fastnoise(&self, base_seed: u64) -> fastnoise_lite::FastNoiseLite {
        let mut noise = fastnoise_lite::FastNoiseLite::with_seed(
            (base_seed as i32).wrapping_add(self.seed_offset),
        );
        noise.set_noise_type(Some(self.noise_type.to_fastnoise()));
        noise.set_frequency(Some(self.frequency));
        noise.set_fractal_type(Some(self.fractal_type.to_fastnoise()));
        noise.set_fractal_octaves(Some(self.octaves as i32));
        noise.set_fractal_lacunarity(Some(self.lacunarity));
        noise.set_fractal_gain(Some(self.gain));
        noise
    }
}

impl LayerParams {
    pub fn ground(&self) -> Layer {
        Layer(self.ground)
    }

    pub fn ground_fill(&self) -> Layer {
        Layer(self.ground_fill)
    }

    pub fn trunk(&self) -> Layer {
        Layer(self.trunk)
    }

    pub fn leaf(&self) -> Layer {
        Layer(self.leaf)
    }
}

// ============================================================================
// Loading and validation
// ============================================================================

impl WorldGenConfig {
    /// Parse a RON document and validate it
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: WorldGenConfig = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&source)?;
        log::info!("Loaded world-gen config '{}' from {:?}", config.name, path);
        Ok(config)
    }

    /// Pretty RON rendering of this config
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Check the constraints generation relies on
    ///
    /// Generation itself is total; everything that could make it loop forever
    /// or produce misaligned output is rejected here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.unit <= 0 {
            return Err(invalid("grid.unit", "must be positive"));
        }

        let terrain = &self.terrain;
        if terrain.depth_rows <= 0 {
            return Err(invalid("terrain.depth_rows", "must be positive"));
        }
        if terrain.surface_rows < 0 || terrain.surface_rows > terrain.depth_rows {
            return Err(invalid(
                "terrain.surface_rows",
                format!("must be within 0..={}", terrain.depth_rows),
            ));
        }

        let trees = &self.trees;
        if trees.spawn_roll < 1 {
            return Err(invalid("trees.spawn_roll", "must be at least 1"));
        }
        if !(1..=trees.spawn_roll).contains(&trees.spawn_sentinel) {
            return Err(invalid(
                "trees.spawn_sentinel",
                format!("must be within 1..={}", trees.spawn_roll),
            ));
        }
        if trees.min_height < 1 || trees.min_height > trees.max_height {
            return Err(invalid(
                "trees.min_height",
                "trunk height range must be non-empty and positive",
            ));
        }
        if trees.min_canopy < 1 || trees.min_canopy > trees.max_canopy {
            return Err(invalid(
                "trees.min_canopy",
                "canopy range must be non-empty and positive",
            ));
        }
        let first_odd = if trees.min_canopy % 2 == 1 {
            trees.min_canopy
        } else {
            trees.min_canopy + 1
        };
        if first_odd > trees.max_canopy {
            return Err(invalid(
                "trees.max_canopy",
                format!(
                    "canopy range {}..={} holds no odd side",
                    trees.min_canopy, trees.max_canopy
                ),
            ));
        }
        if trees.leaf_size <= 0 {
            return Err(invalid("trees.leaf_size", "must be positive"));
        }

        let leaf = &trees.leaf;
        if leaf.min_life_secs < 0 || leaf.min_life_secs > leaf.max_life_secs {
            return Err(invalid("trees.leaf.min_life_secs", "empty range"));
        }
        if leaf.min_swing_delay_tenths < 0
            || leaf.min_swing_delay_tenths > leaf.max_swing_delay_tenths
        {
            return Err(invalid("trees.leaf.min_swing_delay_tenths", "empty range"));
        }
        if leaf.min_transition_secs < 1 || leaf.min_transition_secs > leaf.max_transition_secs {
            return Err(invalid("trees.leaf.min_transition_secs", "empty range"));
        }
        if leaf.min_revive_secs < 0 || leaf.min_revive_secs > leaf.max_revive_secs {
            return Err(invalid("trees.leaf.min_revive_secs", "empty range"));
        }

        for decoration in &self.decorations {
            if decoration.probability < 1 {
                return Err(invalid("decorations.probability", "must be at least 1"));
            }
            if decoration.variants.is_empty() {
                return Err(invalid(
                    "decorations.variants",
                    format!("'{}' has no variants", decoration.name),
                ));
            }
            if decoration.band_top >= decoration.band_bottom {
                return Err(invalid(
                    "decorations.band_top",
                    format!("'{}' has an empty height band", decoration.name),
                ));
            }
        }
        if self.decorations.is_empty() {
            log::warn!("World-gen config '{}' has no decorations", self.name);
        }

        for bird in &self.birds {
            if bird.cycle_secs.is_nan() || bird.cycle_secs <= 0.0 {
                return Err(invalid(
                    "birds.cycle_secs",
                    format!("'{}' must launch after a positive delay", bird.name),
                ));
            }
            if bird.band_top >= bird.band_bottom {
                return Err(invalid(
                    "birds.band_top",
                    format!("'{}' has an empty height band", bird.name),
                ));
            }
            if bird.frames.is_empty() {
                return Err(invalid(
                    "birds.frames",
                    format!("'{}' has no wing frames", bird.name),
                ));
            }
            if bird.flap_ticks < 1 {
                return Err(invalid("birds.flap_ticks", "must be at least 1"));
            }
            if !bird.speed.is_finite() || bird.speed < 0.0 {
                return Err(invalid("birds.speed", "must be finite and not negative"));
            }
            if bird.despawn_margin_units < 0 {
                return Err(invalid("birds.despawn_margin_units", "must not be negative"));
            }
        }

        if self.stream.margin_units < 0 {
            return Err(invalid("stream.margin_units", "must not be negative"));
        }
        if self.stream.eviction_units < 1 {
            return Err(invalid("stream.eviction_units", "must be at least 1"));
        }

        Ok(())
    }
}

// ============================================================================
// Preset helpers
// ============================================================================

impl WorldGenConfig {
    /// Create a preset with gentle hills (good for testing movement)
    pub fn preset_flat() -> Self {
        Self {
            name: "Flat World".to_string(),
            terrain: TerrainParams {
                amplitude: 30.0,
                ..TerrainParams::default()
            },
            ..Self::default()
        }
    }

    /// Create a preset where roughly every fourth column grows a tree
    pub fn preset_dense_forest() -> Self {
        Self {
            name: "Dense Forest".to_string(),
            trees: TreeConfig {
                spawn_roll: 4,
                ..TreeConfig::default()
            },
            ..Self::default()
        }
    }
}
