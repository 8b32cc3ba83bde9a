//! World management - generation, indexing and the streaming window

pub mod birds;
pub mod column_rng;
pub mod decorations;
pub mod grid;
pub mod noise_field;
mod range_generator;
pub mod spatial_index;
pub mod stream_window;
pub mod terrain;
pub mod trees;
#[allow(clippy::module_inception)]
mod world;
pub mod worldgen_config;

pub use birds::{BirdLaunch, BirdSpawner};
pub use column_rng::{ColumnRng, WorldRng, column_rng, column_seed};
pub use decorations::DecorationGenerator;
pub use grid::ColumnRange;
pub use noise_field::NoiseField;
pub use range_generator::RangeGenerator;
pub use spatial_index::SpatialIndex;
pub use stream_window::{StreamWindow, WindowStep};
pub use terrain::TerrainGenerator;
pub use trees::TreeGenerator;
pub use world::{World, WorldStats};
pub use worldgen_config::{
    BirdConfig, ConfigError, DecorationConfig, GridParams, LayerParams, LeafCycleConfig,
    NoiseLayerConfig, StreamParams, TerrainParams, TreeConfig, WorldGenConfig,
};
