//! Tree placement
//!
//! A column grows a tree when its placement roll hits the sentinel. The tree is
//! a trunk of blocks standing on the ground plus a square canopy of leaves
//! centred on the trunk top. Every entity of a tree, leaves included, is
//! indexed under the trunk column so the whole tree leaves with that column.

use std::sync::Arc;

use glam::IVec2;

use super::column_rng::{WorldRng, column_rng};
use super::grid::ColumnRange;
use super::noise_field::NoiseField;
use super::range_generator::RangeGenerator;
use super::spatial_index::SpatialIndex;
use super::worldgen_config::{LayerParams, TreeConfig};
use crate::entity::{
    Behavior, Block, Layer, PlacedEntity, SpawnRequest, Visual, approximate_color,
};
use crate::host::Host;

/// Shape decided for one column's tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreePlan {
    pub column: i32,
    /// Ground height under the trunk
    pub ground: i32,
    /// Trunk height in grid units
    pub height: i32,
    /// Canopy side in cells, always odd
    pub canopy_side: i32,
}

impl TreePlan {
    /// Screen y of the topmost trunk block
    pub fn trunk_top(&self, unit: i32) -> i32 {
        self.ground - self.height * unit
    }

    /// Top-left corner of every canopy cell, row by row
    pub fn canopy_cells(&self, unit: i32) -> impl Iterator<Item = IVec2> {
        let half = self.canopy_side / 2;
        let start_x = self.column - half * unit;
        let start_y = self.trunk_top(unit) - half * unit;
        let side = self.canopy_side;
        (0..side).flat_map(move |row| {
            (0..side).map(move |col| IVec2::new(start_x + col * unit, start_y + row * unit))
        })
    }
}

pub struct TreeGenerator {
    field: Arc<NoiseField>,
    seed: u64,
    unit: i32,
    config: TreeConfig,
    /// `[trunk, leaf]`
    layers: [Layer; 2],
}

impl TreeGenerator {
    pub fn new(
        field: Arc<NoiseField>,
        seed: u64,
        unit: i32,
        config: &TreeConfig,
        layers: &LayerParams,
    ) -> Self {
        Self {
            field,
            seed,
            unit,
            config: config.clone(),
            layers: [layers.trunk(), layers.leaf()],
        }
    }

    /// Decide whether `column` grows a tree and how it looks
    ///
    /// Draw order: placement roll, trunk height, canopy side.
    pub fn plan_at(&self, column: i32) -> Option<TreePlan> {
        let mut rng = column_rng(column, self.seed);
        if rng.roll_between(1, self.config.spawn_roll) != self.config.spawn_sentinel {
            return None;
        }
        let height = rng.roll_between(self.config.min_height, self.config.max_height);
        let canopy_side = rng.roll_odd_between(self.config.min_canopy, self.config.max_canopy);
        Some(TreePlan {
            column,
            ground: self.field.height_at(column),
            height,
            canopy_side,
        })
    }

    pub fn trunk_blocks(&self, plan: &TreePlan) -> Vec<Block> {
        (plan.trunk_top(self.unit)..plan.ground)
            .step_by(self.unit as usize)
            .map(|row_y| Block {
                column: plan.column,
                row_y,
                visual: Visual::Trunk {
                    tint: approximate_color(self.config.trunk_color, plan.column, row_y, self.seed),
                },
                collidable: true,
            })
            .collect()
    }

    /// Spawn request for the leaf growing at `cell`
    pub fn leaf_request(&self, cell: IVec2) -> SpawnRequest {
        SpawnRequest {
            position: cell,
            size: IVec2::splat(self.config.leaf_size),
            visual: Visual::Leaf {
                tint: approximate_color(self.config.leaf_color, cell.x, cell.y, self.seed),
            },
            layer: self.layers[1],
            collidable: false,
        }
    }

    fn spawn_tree(&self, plan: &TreePlan, host: &mut dyn Host, index: &mut SpatialIndex) -> usize {
        let mut spawned = 0;
        for block in self.trunk_blocks(plan) {
            let request = block.to_request(self.unit, self.layers[0]);
            let handle = host.spawn(request.clone());
            index.register(plan.column, PlacedEntity::new(handle, plan.column, request));
            spawned += 1;
        }
        for cell in plan.canopy_cells(self.unit) {
            let request = self.leaf_request(cell);
            let handle = host.spawn(request.clone());
            let behavior = Behavior::falling_leaf(cell, self.seed, &self.config.leaf);
            index.register(
                plan.column,
                PlacedEntity::new(handle, plan.column, request).with_behavior(behavior),
            );
            spawned += 1;
        }
        spawned
    }
}

impl RangeGenerator for TreeGenerator {
    fn name(&self) -> &'static str {
        "trees"
    }

    fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn create_in_range(&mut self, range: ColumnRange, host: &mut dyn Host, index: &mut SpatialIndex) {
        for column in range.columns(self.unit) {
            if let Some(plan) = self.plan_at(column) {
                let spawned = self.spawn_tree(&plan, host, index);
                log::trace!(
                    "[GEN] tree at {} height {} canopy {} ({} entities)",
                    column,
                    plan.height,
                    plan.canopy_side,
                    spawned
                );
            }
        }
    }

    fn delete(&mut self, range: ColumnRange, host: &mut dyn Host, index: &mut SpatialIndex) {
        let removed = index.delete_range(range, self.unit, &self.layers, host);
        log::trace!("[EVICT] trees {} removed {} entities", range, removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::host::{MemoryHost, Viewport};
    use crate::world::worldgen_config::WorldGenConfig;
    use std::collections::HashSet;

    fn generator(seed: u64, config: &WorldGenConfig) -> TreeGenerator {
        let field = Arc::new(NoiseField::new(seed, &config.terrain, config.grid.unit));
        TreeGenerator::new(field, seed, config.grid.unit, &config.trees, &config.layers)
    }

    fn first_tree(trees: &TreeGenerator) -> TreePlan {
        (0..10_000)
            .find_map(|i| trees.plan_at(i * 30))
            .expect("some column should grow a tree")
    }

    #[test]
    fn test_canopy_side_is_odd_within_bounds() {
        let config = WorldGenConfig::default();
        let trees = generator(220, &config);
        let plans: Vec<TreePlan> = (-2000..2000).filter_map(|i| trees.plan_at(i * 30)).collect();
        assert!(!plans.is_empty());
        for plan in &plans {
            assert!(plan.canopy_side == 3 || plan.canopy_side == 5, "side {}", plan.canopy_side);
            assert!((5..=14).contains(&plan.height));
        }
    }

    #[test]
    fn test_spawn_rate_near_one_in_eleven() {
        let config = WorldGenConfig::default();
        let trees = generator(220, &config);
        let spawned = (0..10_000).filter(|i| trees.plan_at(i * 30).is_some()).count();
        // Expected ~909, sd ~29
        assert!((760..=1060).contains(&spawned), "spawned {}", spawned);
    }

    #[test]
    fn test_plan_replays_from_column_rng() {
        let config = WorldGenConfig::default();
        let trees = generator(220, &config);
        let plan = first_tree(&trees);

        let mut rng = column_rng(plan.column, 220);
        assert_eq!(rng.roll_between(1, 11), 1);
        assert_eq!(rng.roll_between(5, 14), plan.height);
        assert_eq!(rng.roll_odd_between(3, 5), plan.canopy_side);
    }

    #[test]
    fn test_tree_entities_indexed_under_trunk_column() {
        let config = WorldGenConfig::default();
        let mut trees = generator(220, &config);
        let plan = first_tree(&trees);
        let mut host = MemoryHost::new(Viewport::new(0.0, 600.0));
        let mut index = SpatialIndex::new();

        trees.create_in_range(ColumnRange::new(plan.column, plan.column + 30), &mut host, &mut index);

        let entities = index.entities_at(plan.column);
        let trunk = entities.iter().filter(|e| e.kind == EntityKind::Trunk).count();
        let leaves: Vec<_> = entities.iter().filter(|e| e.kind == EntityKind::Leaf).collect();
        assert_eq!(trunk as i32, plan.height);
        assert_eq!(leaves.len() as i32, plan.canopy_side * plan.canopy_side);
        assert!(leaves.iter().all(|l| l.behavior.is_some()));
        assert_eq!(index.column_count(), 1);

        // Canopy is centred on the trunk column
        let xs: HashSet<i32> = leaves.iter().map(|l| l.request.position.x).collect();
        let half = plan.canopy_side / 2;
        assert!(xs.contains(&(plan.column - half * 30)));
        assert!(xs.contains(&(plan.column + half * 30)));
    }

    #[test]
    fn test_trunk_stands_on_ground() {
        let config = WorldGenConfig::default();
        let trees = generator(7, &config);
        let plan = first_tree(&trees);
        let blocks = trees.trunk_blocks(&plan);
        assert_eq!(blocks.len() as i32, plan.height);
        assert_eq!(blocks[0].row_y, plan.ground - plan.height * 30);
        assert_eq!(blocks.last().map(|b| b.row_y), Some(plan.ground - 30));
    }

    #[test]
    fn test_create_then_delete_removes_whole_tree() {
        let config = WorldGenConfig::preset_dense_forest();
        let mut trees = generator(220, &config);
        let mut host = MemoryHost::new(Viewport::new(0.0, 600.0));
        let mut index = SpatialIndex::new();
        trees.create_in_range(ColumnRange::new(0, 3000), &mut host, &mut index);
        assert!(index.entity_count() > 0);
        trees.delete(ColumnRange::new(0, 3000), &mut host, &mut index);
        assert_eq!(index.entity_count(), 0);
        assert_eq!(host.live_count(), 0);
    }

    #[test]
    fn test_split_range_equals_single_range() {
        let config = WorldGenConfig::preset_dense_forest();
        let collect = |ranges: &[ColumnRange]| -> HashSet<SpawnRequest> {
            let mut trees = generator(220, &config);
            let mut host = MemoryHost::new(Viewport::new(0.0, 600.0));
            let mut index = SpatialIndex::new();
            for range in ranges {
                trees.create_in_range(*range, &mut host, &mut index);
            }
            host.live().map(|(_, r)| r.clone()).collect()
        };
        let whole = collect(&[ColumnRange::new(0, 3000)]);
        let split = collect(&[ColumnRange::new(0, 1500), ColumnRange::new(1500, 3000)]);
        assert!(!whole.is_empty());
        assert_eq!(whole, split);
    }
}
