//! Deterministic side-scrolling world generation with a sliding stream window
//!
//! Given a world seed, every grid column of the world (terrain stack, trees,
//! decorations) is a pure function of `(column, seed)`. A [`world::World`]
//! keeps only a bounded window of columns materialized around the host's
//! viewport, creating columns as they are revealed and evicting columns that
//! scrolled far enough behind.

pub mod entity;
pub mod host;
pub mod world;

pub use entity::{
    Behavior, BehaviorEvent, Contact, EntityHandle, Layer, PlacedEntity, SpawnRequest, Visual,
};
pub use host::{Host, MemoryHost, Viewport};
pub use world::{
    ColumnRange, ConfigError, RangeGenerator, SpatialIndex, StreamWindow, World, WorldGenConfig,
    WindowStep,
};
