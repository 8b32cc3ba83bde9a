//! Host seam - the rendering/physics engine the world spawns into
//!
//! The world never draws or simulates anything itself. It asks a [`Host`] to
//! create and remove entities and reads the viewport from it every tick.
//! [`MemoryHost`] is a headless implementation used by tests and the CLI.

use ahash::AHashMap;

use crate::entity::{BehaviorEvent, EntityHandle, Layer, SpawnRequest};

/// Visible horizontal span of the host camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center_x: f32,
    pub half_width: f32,
}

impl Viewport {
    pub fn new(center_x: f32, width: f32) -> Self {
        Self {
            center_x,
            half_width: width / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.half_width * 2.0
    }

    pub fn left(&self) -> f32 {
        self.center_x - self.half_width
    }

    pub fn right(&self) -> f32 {
        self.center_x + self.half_width
    }
}

/// Engine operations the world depends on
pub trait Host {
    /// Create an entity and return its removal handle
    fn spawn(&mut self, request: SpawnRequest) -> EntityHandle;

    /// Remove an entity from a layer; false if it is not in that layer
    fn remove(&mut self, handle: EntityHandle, layer: Layer) -> bool;

    /// Current camera span
    fn viewport(&self) -> Viewport;

    /// Apply a behavior event (transitions, velocity changes) to an entity
    fn apply_behavior(&mut self, _handle: EntityHandle, _event: &BehaviorEvent) {}
}

/// In-memory host that records everything the world asks of it
#[derive(Debug)]
pub struct MemoryHost {
    next_handle: u64,
    live: AHashMap<EntityHandle, SpawnRequest>,
    viewport: Viewport,
    removed_total: usize,
    max_live: usize,
    events: Vec<(EntityHandle, BehaviorEvent)>,
}

impl MemoryHost {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            next_handle: 1,
            live: AHashMap::new(),
            viewport,
            removed_total: 0,
            max_live: 0,
            events: Vec::new(),
        }
    }

    /// Move the camera horizontally
    pub fn scroll_by(&mut self, dx: f32) {
        self.viewport.center_x += dx;
    }

    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&SpawnRequest> {
        self.live.get(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_in_layer(&self, layer: Layer) -> usize {
        self.live.values().filter(|r| r.layer == layer).count()
    }

    /// Live entities as `(handle, request)` pairs, in no particular order
    pub fn live(&self) -> impl Iterator<Item = (EntityHandle, &SpawnRequest)> {
        self.live.iter().map(|(h, r)| (*h, r))
    }

    pub fn removed_total(&self) -> usize {
        self.removed_total
    }

    /// Highest number of simultaneously live entities seen so far
    pub fn max_live(&self) -> usize {
        self.max_live
    }

    /// Number of live entities that share an identical request with another live entity
    pub fn duplicate_count(&self) -> usize {
        let mut seen: AHashMap<&SpawnRequest, usize> = AHashMap::new();
        for request in self.live.values() {
            *seen.entry(request).or_insert(0) += 1;
        }
        seen.values().filter(|&&n| n > 1).map(|n| n - 1).sum()
    }

    pub fn events(&self) -> &[(EntityHandle, BehaviorEvent)] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl Host for MemoryHost {
    fn spawn(&mut self, request: SpawnRequest) -> EntityHandle {
        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle, request);
        self.max_live = self.max_live.max(self.live.len());
        handle
    }

    fn remove(&mut self, handle: EntityHandle, layer: Layer) -> bool {
        let in_layer = self.live.get(&handle).is_some_and(|r| r.layer == layer);
        if in_layer {
            self.live.remove(&handle);
            self.removed_total += 1;
        }
        in_layer
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn apply_behavior(&mut self, handle: EntityHandle, event: &BehaviorEvent) {
        self.events.push((handle, event.clone()));
    }
}
