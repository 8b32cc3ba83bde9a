//! World session - owns the generators, the spatial index, the window and the birds

use std::sync::Arc;

use ahash::AHashSet;
use smallvec::SmallVec;

use super::birds::BirdSpawner;
use super::decorations::DecorationGenerator;
use super::grid::{ColumnRange, floor_to_grid};
use super::noise_field::NoiseField;
use super::range_generator::RangeGenerator;
use super::spatial_index::SpatialIndex;
use super::stream_window::{StreamWindow, WindowStep};
use super::terrain::TerrainGenerator;
use super::trees::TreeGenerator;
use super::worldgen_config::{ConfigError, WorldGenConfig};
use crate::entity::{Behavior, BehaviorEvent, Contact, EntityHandle, PlacedEntity};
use crate::host::Host;

/// Streaming counters since the world was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub shifts: u64,
    pub created_columns: u64,
    pub evicted_columns: u64,
    /// Columns a shift asked for that were still live
    pub skipped_columns: u64,
    /// Indexed column content plus birds in flight
    pub live_entities: usize,
    pub revived_leaves: u64,
    pub launched_birds: u64,
    /// Birds that left the view or were struck down
    pub removed_birds: u64,
}

/// One independent world instance
///
/// Every generator shares this world's [`SpatialIndex`]; nothing is global, so
/// several worlds can run side by side. The world also keeps the set of live
/// columns and only forwards columns that are not materialized yet, which
/// keeps direction reversals from spawning a column twice.
pub struct World {
    config: WorldGenConfig,
    field: Arc<NoiseField>,
    generators: Vec<Box<dyn RangeGenerator>>,
    index: SpatialIndex,
    window: StreamWindow,
    live_columns: AHashSet<i32>,
    flocks: Vec<BirdSpawner>,
    birds: Vec<PlacedEntity>,
    stats: WorldStats,
}

impl World {
    /// Validate `config`, build the generators and materialize the window
    /// around the host viewport
    pub fn new(
        seed: u64,
        config: WorldGenConfig,
        host: &mut dyn Host,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let unit = config.grid.unit;
        let field = Arc::new(NoiseField::new(seed, &config.terrain, unit));

        let mut generators: Vec<Box<dyn RangeGenerator>> = vec![
            Box::new(TerrainGenerator::new(
                field.clone(),
                seed,
                unit,
                &config.terrain,
                &config.layers,
            )),
            Box::new(TreeGenerator::new(
                field.clone(),
                seed,
                unit,
                &config.trees,
                &config.layers,
            )),
        ];
        for (stream, decoration) in config.decorations.iter().enumerate() {
            generators.push(Box::new(DecorationGenerator::new(
                seed,
                stream as u64,
                unit,
                decoration,
            )));
        }

        let flocks = config
            .birds
            .iter()
            .enumerate()
            .map(|(flock, bird)| BirdSpawner::new(seed, flock, bird))
            .collect();

        let window = StreamWindow::from_viewport(host.viewport(), unit, &config.stream);
        log::info!(
            "[STREAM] World '{}' seed {} unit {} window {}",
            config.name,
            seed,
            unit,
            window.range()
        );

        let mut world = Self {
            config,
            field,
            generators,
            index: SpatialIndex::new(),
            window,
            live_columns: AHashSet::new(),
            flocks,
            birds: Vec::new(),
            stats: WorldStats::default(),
        };

        let initial = world.window.range();
        world.create_columns(initial, host);
        log::info!(
            "[STREAM] Materialized {} columns ({} entities)",
            world.live_columns.len(),
            world.index.entity_count()
        );
        Ok(world)
    }

    /// Ground height at any world x, independent of what is materialized
    pub fn ground_height_at(&self, x: f32) -> f32 {
        self.field.ground_height_at(x)
    }

    pub fn height_at(&self, x: i32) -> i32 {
        self.field.height_at(x)
    }

    pub fn window(&self) -> ColumnRange {
        self.window.range()
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Birds in flight, oldest first
    pub fn birds(&self) -> &[PlacedEntity] {
        &self.birds
    }

    pub fn live_column_count(&self) -> usize {
        self.live_columns.len()
    }

    pub fn is_live(&self, column: i32) -> bool {
        self.live_columns.contains(&column)
    }

    /// Generator names in the order they are driven
    pub fn generator_names(&self) -> Vec<&'static str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            live_entities: self.index.entity_count() + self.birds.len(),
            ..self.stats
        }
    }

    /// One simulation tick: follow the viewport, launch birds, then run
    /// entity behaviors
    pub fn update(&mut self, host: &mut dyn Host, dt: f32) -> WindowStep {
        let center = host.viewport().center_x;
        let step = self.window.step(center);

        if let Some((create, evict)) = step.strips() {
            self.stats.shifts += 1;
            self.create_columns(create, host);
            self.evict_columns(evict, host);
            log::debug!(
                "[STREAM] {:?} window {} live columns {}",
                step,
                self.window.range(),
                self.live_columns.len()
            );
        }

        self.launch_birds(host, dt);
        self.tick_behaviors(host, dt);
        self.release_birds(host);
        step
    }

    /// Forward a host collision to the entity's behavior
    pub fn on_collision(&mut self, handle: EntityHandle, contact: Contact, host: &mut dyn Host) {
        let config = &self.config;
        let Some(behavior) = self
            .index
            .entity_mut(handle)
            .or_else(|| self.birds.iter_mut().find(|bird| bird.handle == handle))
            .and_then(|entity| entity.behavior.as_mut())
        else {
            return;
        };
        let events = behavior.on_collision(contact, config);
        for event in events {
            match event {
                BehaviorEvent::Despawn => self.remove_bird(handle, host),
                other => host.apply_behavior(handle, &other),
            }
        }
    }

    /// Evict every live column and remove every bird, leaving the host empty
    /// of world content
    pub fn evict_all(&mut self, host: &mut dyn Host) {
        let birds: Vec<EntityHandle> = self.birds.iter().map(|bird| bird.handle).collect();
        for handle in birds {
            self.remove_bird(handle, host);
        }

        let unit = self.config.grid.unit;
        let (Some(min), Some(max)) = (
            self.live_columns.iter().min().copied(),
            self.live_columns.iter().max().copied(),
        ) else {
            return;
        };
        self.evict_columns(ColumnRange::new(min, max + unit), host);
    }

    /// Create the non-live columns of `range`, in contiguous runs
    fn create_columns(&mut self, range: ColumnRange, host: &mut dyn Host) {
        let unit = self.config.grid.unit;
        let mut runs: SmallVec<[ColumnRange; 2]> = SmallVec::new();
        let mut current: Option<ColumnRange> = None;

        for column in range.columns(unit) {
            if self.live_columns.contains(&column) {
                log::trace!("[STREAM] column {} already live, skipping", column);
                self.stats.skipped_columns += 1;
                if let Some(run) = current.take() {
                    runs.push(run);
                }
                continue;
            }
            match current.as_mut() {
                Some(run) => run.end = column + unit,
                None => current = Some(ColumnRange::new(column, column + unit)),
            }
        }
        runs.extend(current);

        for run in runs {
            for generator in self.generators.iter_mut() {
                generator.create_in_range(run, host, &mut self.index);
            }
            for column in run.columns(unit) {
                self.live_columns.insert(column);
                self.stats.created_columns += 1;
            }
        }
    }

    fn evict_columns(&mut self, range: ColumnRange, host: &mut dyn Host) {
        let unit = self.config.grid.unit;
        for generator in self.generators.iter_mut() {
            generator.delete(range, host, &mut self.index);
        }
        for column in range.columns(unit) {
            if self.live_columns.remove(&column) {
                self.stats.evicted_columns += 1;
                log::trace!("[EVICT] column {}", column);
            }
        }
    }

    fn launch_birds(&mut self, host: &mut dyn Host, dt: f32) {
        let view = host.viewport();
        let unit = self.config.grid.unit;
        for (spawner, flock) in self.flocks.iter_mut().zip(&self.config.birds) {
            let Some(launch) = spawner.tick(dt, view, flock) else {
                continue;
            };
            let handle = host.spawn(launch.request.clone());
            let column = floor_to_grid(launch.request.position.x, unit);
            let mut bird =
                PlacedEntity::new(handle, column, launch.request).with_behavior(launch.behavior);
            if let Some(behavior) = bird.behavior.as_mut() {
                for event in behavior.on_spawn(&self.config) {
                    host.apply_behavior(handle, &event);
                }
            }
            self.birds.push(bird);
            self.stats.launched_birds += 1;
            log::trace!("[BIRD] {} launched as {}", flock.name, handle);
        }
    }

    /// Remove birds whose centre is further than their flock margin past a
    /// viewport edge
    fn release_birds(&mut self, host: &mut dyn Host) {
        let view = host.viewport();
        let unit = self.config.grid.unit as f32;
        let flocks = &self.config.birds;
        let gone: Vec<EntityHandle> = self
            .birds
            .iter()
            .filter(|bird| match &bird.behavior {
                Some(Behavior::Bird(flight)) => {
                    let margin_units = flocks
                        .get(flight.flock())
                        .map_or(0, |flock| flock.despawn_margin_units);
                    let margin = margin_units as f32 * unit;
                    flight.is_beyond(view.left() - margin, view.right() + margin)
                }
                _ => false,
            })
            .map(|bird| bird.handle)
            .collect();

        for handle in gone {
            self.remove_bird(handle, host);
        }
    }

    fn remove_bird(&mut self, handle: EntityHandle, host: &mut dyn Host) {
        let Some(at) = self.birds.iter().position(|bird| bird.handle == handle) else {
            return;
        };
        let bird = self.birds.remove(at);
        host.remove(handle, bird.layer);
        self.stats.removed_birds += 1;
        log::trace!("[BIRD] {} removed", handle);
    }

    fn tick_behaviors(&mut self, host: &mut dyn Host, dt: f32) {
        let config = &self.config;
        let mut pending: Vec<(EntityHandle, BehaviorEvent)> = Vec::new();
        for entity in self.index.iter_mut().chain(self.birds.iter_mut()) {
            if let Some(behavior) = entity.behavior.as_mut() {
                pending.extend(
                    behavior
                        .tick(dt, config)
                        .into_iter()
                        .map(|event| (entity.handle, event)),
                );
            }
        }

        for (handle, event) in pending {
            match event {
                BehaviorEvent::Revive => self.revive(handle, host),
                BehaviorEvent::Despawn => self.remove_bird(handle, host),
                other => host.apply_behavior(handle, &other),
            }
        }
    }

    /// Replace a faded leaf with a fresh one at its original cell
    fn revive(&mut self, handle: EntityHandle, host: &mut dyn Host) {
        let Some(entity) = self.index.entity(handle) else {
            return;
        };
        let request = entity.request.clone();
        host.remove(handle, entity.layer);

        let fresh = host.spawn(request);
        self.index.rehandle(handle, fresh);
        let config = &self.config;
        let events = self
            .index
            .entity_mut(fresh)
            .and_then(|entity| entity.behavior.as_mut())
            .map(|behavior| behavior.on_spawn(config))
            .unwrap_or_default();
        for event in events {
            host.apply_behavior(fresh, &event);
        }
        self.stats.revived_leaves += 1;
        log::trace!("[LEAF] {} regrown as {}", handle, fresh);
    }
}
