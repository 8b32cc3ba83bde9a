//! Spawn requests and indexed entities

use glam::IVec2;

use super::behavior::Behavior;
use crate::world::column_rng::{WorldRng, cell_rng};

/// Host rendering/physics layer id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Layer(pub i32);

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Layer({})", self.0)
    }
}

/// Opaque removal handle handed out by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub u64);

impl std::fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// What the host should draw
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Visual {
    Ground { tint: [u8; 3] },
    Trunk { tint: [u8; 3] },
    Leaf { tint: [u8; 3] },
    Decoration { kind: String, variant: String },
    Bird { kind: String, frame: String },
}

impl Visual {
    pub fn kind(&self) -> EntityKind {
        match self {
            Visual::Ground { .. } => EntityKind::Ground,
            Visual::Trunk { .. } => EntityKind::Trunk,
            Visual::Leaf { .. } => EntityKind::Leaf,
            Visual::Decoration { .. } => EntityKind::Decoration,
            Visual::Bird { .. } => EntityKind::Bird,
        }
    }
}

/// Coarse entity category, used for stats and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Ground,
    Trunk,
    Leaf,
    Decoration,
    Bird,
}

const TINT_SALT: u64 = 0x7431_6e74;
const TINT_DELTA: i32 = 10;

/// Slightly varied copy of `base` for the cell at `(x, y)`
///
/// A pure function of the cell and seed. It uses its own RNG so the column's
/// placement draws are left untouched.
pub fn approximate_color(base: [u8; 3], x: i32, y: i32, seed: u64) -> [u8; 3] {
    let mut rng = cell_rng(x, y, seed ^ TINT_SALT);
    base.map(|channel| {
        (channel as i32 + rng.roll_between(-TINT_DELTA, TINT_DELTA)).clamp(0, 255) as u8
    })
}

/// Everything the host needs to create one entity
///
/// Positions are top-left corners in world units (y grows downward). Two
/// requests compare equal when they describe the same entity, regardless of
/// the handle the host assigns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpawnRequest {
    pub position: IVec2,
    pub size: IVec2,
    pub visual: Visual,
    pub layer: Layer,
    pub collidable: bool,
}

/// One grid cell of terrain or trunk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Block {
    pub column: i32,
    pub row_y: i32,
    pub visual: Visual,
    pub collidable: bool,
}

impl Block {
    pub fn to_request(&self, unit: i32, layer: Layer) -> SpawnRequest {
        SpawnRequest {
            position: IVec2::new(self.column, self.row_y),
            size: IVec2::splat(unit),
            visual: self.visual.clone(),
            layer,
            collidable: self.collidable,
        }
    }
}

/// An entity the world spawned and still tracks
#[derive(Debug, Clone)]
pub struct PlacedEntity {
    pub handle: EntityHandle,
    /// Index key: the column that owns this entity (the trunk column for leaves)
    pub column: i32,
    pub layer: Layer,
    pub kind: EntityKind,
    /// The request this entity was spawned from
    pub request: SpawnRequest,
    pub behavior: Option<Behavior>,
}

impl PlacedEntity {
    pub fn new(handle: EntityHandle, column: i32, request: SpawnRequest) -> Self {
        Self {
            handle,
            column,
            layer: request.layer,
            kind: request.visual.kind(),
            request,
            behavior: None,
        }
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = Some(behavior);
        self
    }
}
