//! Entities spawned into the host and the behaviors attached to them

mod behavior;
mod placed;

pub use behavior::{
    Behavior, BehaviorEvent, BehaviorEvents, BirdFlight, BirdPhase, Contact, LeafCycle, LeafPhase,
};
pub use placed::{
    Block, EntityHandle, EntityKind, Layer, PlacedEntity, SpawnRequest, Visual, approximate_color,
};
