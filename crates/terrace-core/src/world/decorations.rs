//! Decorative static objects (clouds and the like)

use glam::IVec2;

use super::column_rng::{WorldRng, column_rng};
use super::grid::ColumnRange;
use super::range_generator::RangeGenerator;
use super::spatial_index::SpatialIndex;
use super::worldgen_config::DecorationConfig;
use crate::entity::{Layer, PlacedEntity, SpawnRequest, Visual};
use crate::host::Host;

/// Spawns one decoration kind at a sampled height band
///
/// Several decoration generators may run side by side; each mixes its own
/// stream id into the world seed so their placement rolls are independent.
pub struct DecorationGenerator {
    seed: u64,
    unit: i32,
    config: DecorationConfig,
    layers: [Layer; 1],
}

impl DecorationGenerator {
    pub fn new(world_seed: u64, stream: u64, unit: i32, config: &DecorationConfig) -> Self {
        Self {
            seed: world_seed.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            unit,
            config: config.clone(),
            layers: [Layer(config.layer)],
        }
    }

    /// The decoration spawned at `column`, if any
    ///
    /// Draw order: placement roll, band height, variant.
    pub fn placement_at(&self, column: i32) -> Option<SpawnRequest> {
        let config = &self.config;
        let mut rng = column_rng(column, self.seed);
        if rng.roll_below(config.probability) != config.probability - 1 {
            return None;
        }
        let y = rng.roll_between(config.band_top, config.band_bottom - 1);
        let variant = rng.roll_below(config.variants.len() as i32) as usize;
        Some(SpawnRequest {
            position: IVec2::new(column, y),
            size: IVec2::new(config.size[0], config.size[1]),
            visual: Visual::Decoration {
                kind: config.name.clone(),
                variant: config.variants[variant].clone(),
            },
            layer: self.layers[0],
            collidable: false,
        })
    }
}

impl RangeGenerator for DecorationGenerator {
    fn name(&self) -> &'static str {
        "decorations"
    }

    fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn create_in_range(&mut self, range: ColumnRange, host: &mut dyn Host, index: &mut SpatialIndex) {
        for column in range.columns(self.unit) {
            if let Some(request) = self.placement_at(column) {
                log::trace!("[GEN] {} at {} y {}", self.config.name, column, request.position.y);
                let handle = host.spawn(request.clone());
                index.register(column, PlacedEntity::new(handle, column, request));
            }
        }
    }

    fn delete(&mut self, range: ColumnRange, host: &mut dyn Host, index: &mut SpatialIndex) {
        let removed = index.delete_range(range, self.unit, &self.layers, host);
        log::trace!("[EVICT] {} {} removed {}", self.config.name, range, removed);
    }
}
