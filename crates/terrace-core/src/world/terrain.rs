//! Terrain block stacks
//!
//! Each column gets a vertical stack of `depth_rows` blocks hanging from its
//! ground height. The top `surface_rows` blocks go to the collidable ground
//! layer; the rest go to the fill layer.

use std::sync::Arc;

use super::grid::ColumnRange;
use super::noise_field::NoiseField;
use super::range_generator::RangeGenerator;
use super::spatial_index::SpatialIndex;
use super::worldgen_config::{LayerParams, TerrainParams};
use crate::entity::{Block, Layer, PlacedEntity, Visual, approximate_color};
use crate::host::Host;

pub struct TerrainGenerator {
    field: Arc<NoiseField>,
    seed: u64,
    unit: i32,
    depth_rows: i32,
    surface_rows: i32,
    base_color: [u8; 3],
    /// `[surface, fill]`
    layers: [Layer; 2],
}

impl TerrainGenerator {
    pub fn new(
        field: Arc<NoiseField>,
        seed: u64,
        unit: i32,
        params: &TerrainParams,
        layers: &LayerParams,
    ) -> Self {
        Self {
            field,
            seed,
            unit,
            depth_rows: params.depth_rows,
            surface_rows: params.surface_rows,
            base_color: params.base_color,
            layers: [layers.ground(), layers.ground_fill()],
        }
    }

    /// Quantized ground height of a column
    pub fn height_at(&self, column: i32) -> i32 {
        self.field.height_at(column)
    }

    /// The block stack of one column, top row first, with the layer of each block
    pub fn stack_at(&self, column: i32) -> Vec<(Layer, Block)> {
        let top = self.height_at(column);
        (0..self.depth_rows)
            .map(|row| {
                let row_y = top + row * self.unit;
                let surface = row < self.surface_rows;
                let layer = if surface { self.layers[0] } else { self.layers[1] };
                let block = Block {
                    column,
                    row_y,
                    visual: Visual::Ground {
                        tint: approximate_color(self.base_color, column, row_y, self.seed),
                    },
                    collidable: surface,
                };
                (layer, block)
            })
            .collect()
    }
}

impl RangeGenerator for TerrainGenerator {
    fn name(&self) -> &'static str {
        "terrain"
    }

    fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn create_in_range(&mut self, range: ColumnRange, host: &mut dyn Host, index: &mut SpatialIndex) {
        for column in range.columns(self.unit) {
            let stack = self.stack_at(column);
            log::trace!(
                "[GEN] terrain column {} ground {} ({} blocks)",
                column,
                stack.first().map(|(_, b)| b.row_y).unwrap_or_default(),
                stack.len()
            );
            for (layer, block) in stack {
                let request = block.to_request(self.unit, layer);
                let handle = host.spawn(request.clone());
                index.register(column, PlacedEntity::new(handle, column, request));
            }
        }
    }

    fn delete(&mut self, range: ColumnRange, host: &mut dyn Host, index: &mut SpatialIndex) {
        let removed = index.delete_range(range, self.unit, &self.layers, host);
        log::trace!("[EVICT] terrain {} removed {} blocks", range, removed);
    }
}
