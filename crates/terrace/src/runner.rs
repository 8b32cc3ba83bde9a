//! Headless streaming loop
//!
//! Scrolls a [`MemoryHost`] camera at a fixed speed, drives the world every
//! tick and plays the part of the physics engine. A leaf that starts falling
//! reports a ground collision once it has dropped to the terrain surface
//! below it, and a bird reports one when it flies into the ground.

use terrace_core::{
    Behavior, BehaviorEvent, ConfigError, Contact, EntityHandle, Host, MemoryHost, Viewport, World,
    WorldGenConfig,
};

use crate::config::{RunSection, ViewportSection};

/// Totals reported at the end of a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub ticks: u64,
    pub final_center_x: f32,
    pub shifts: u64,
    pub created_columns: u64,
    pub evicted_columns: u64,
    pub skipped_columns: u64,
    pub revived_leaves: u64,
    pub landed_leaves: u64,
    pub launched_birds: u64,
    pub removed_birds: u64,
    pub grounded_birds: u64,
    pub live_entities: usize,
    pub max_live_entities: usize,
    pub duplicate_entities: usize,
}

/// A falling leaf due to hit the ground at `due` seconds
struct Landing {
    due: f32,
    handle: EntityHandle,
}

pub fn run(
    seed: u64,
    worldgen: WorldGenConfig,
    viewport: &ViewportSection,
    settings: &RunSection,
) -> Result<RunSummary, ConfigError> {
    let mut host = MemoryHost::new(Viewport::new(viewport.start_x, viewport.width));
    let mut world = World::new(seed, worldgen, &mut host)?;

    let dt = 1.0 / settings.tick_rate;
    let mut velocity = settings.speed;
    let mut clock = 0.0_f32;
    let mut landings: Vec<Landing> = Vec::new();
    let mut landed = 0u64;
    let mut grounded = 0u64;
    let progress_every = (settings.tick_rate as u64 * 10).max(1);

    for tick in 1..=settings.ticks {
        if settings.reverse_every > 0 && tick % settings.reverse_every == 0 {
            velocity = -velocity;
            log::debug!("[STREAM] tick {} reversing, speed {}", tick, velocity);
        }

        host.scroll_by(velocity * dt);
        world.update(&mut host, dt);
        clock += dt;

        schedule_landings(&world, &host, clock, &mut landings);
        host.clear_events();

        landings.retain(|landing| {
            if landing.due > clock {
                return true;
            }
            world.on_collision(landing.handle, Contact::Terrain, &mut host);
            landed += 1;
            false
        });
        for handle in birds_touching_ground(&world) {
            world.on_collision(handle, Contact::Terrain, &mut host);
            grounded += 1;
        }
        // Collision reactions are already applied by the host
        host.clear_events();

        if tick % progress_every == 0 {
            let stats = world.stats();
            log::info!(
                "[STREAM] tick {} center {:.0} window {} live entities {}",
                tick,
                host.viewport().center_x,
                world.window(),
                stats.live_entities
            );
        }
    }

    let stats = world.stats();
    Ok(RunSummary {
        ticks: settings.ticks,
        final_center_x: host.viewport().center_x,
        shifts: stats.shifts,
        created_columns: stats.created_columns,
        evicted_columns: stats.evicted_columns,
        skipped_columns: stats.skipped_columns,
        revived_leaves: stats.revived_leaves,
        landed_leaves: landed,
        live_entities: stats.live_entities,
        max_live_entities: host.max_live(),
        launched_birds: stats.launched_birds,
        removed_birds: stats.removed_birds,
        grounded_birds: grounded,
        duplicate_entities: world.index().duplicate_count(),
    })
}

/// Airborne birds whose lower edge reached the ground below their centre
fn birds_touching_ground(world: &World) -> Vec<EntityHandle> {
    world
        .birds()
        .iter()
        .filter(|bird| match &bird.behavior {
            Some(Behavior::Bird(flight)) => {
                flight.is_airborne()
                    && flight.bottom() >= world.ground_height_at(flight.center().x)
            }
            _ => false,
        })
        .map(|bird| bird.handle)
        .collect()
}

/// Queue a ground collision for every leaf that started falling this tick
fn schedule_landings(world: &World, host: &MemoryHost, clock: f32, landings: &mut Vec<Landing>) {
    for (handle, event) in host.events() {
        let BehaviorEvent::Fall { fall_speed, .. } = event else {
            continue;
        };
        let Some(leaf) = host.get(*handle) else {
            continue;
        };
        let ground = world.height_at(leaf.position.x);
        let drop = (ground - leaf.position.y - leaf.size.y).max(0) as f32;
        landings.push(Landing {
            due: clock + drop / fall_speed.max(f32::EPSILON),
            handle: *handle,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(ticks: u64, speed: f32, reverse_every: u64) -> RunSection {
        RunSection {
            ticks,
            tick_rate: 30.0,
            speed,
            reverse_every,
        }
    }

    #[test]
    fn test_run_scrolls_and_streams() {
        let summary = run(
            220,
            WorldGenConfig::default(),
            &ViewportSection::default(),
            &settings(300, 300.0, 0),
        )
        .expect("default config is valid");
        // 10 s at 300 units/s
        assert!((summary.final_center_x - 3000.0).abs() < 1.0);
        assert!(summary.shifts >= 90);
        assert_eq!(summary.duplicate_entities, 0);
    }

    #[test]
    fn test_run_with_reversals_has_no_duplicates() {
        let summary = run(
            220,
            WorldGenConfig::default(),
            &ViewportSection::default(),
            &settings(900, 450.0, 45),
        )
        .expect("default config is valid");
        assert!(summary.skipped_columns > 0);
        assert_eq!(summary.duplicate_entities, 0);
    }

    #[test]
    fn test_leaves_land_and_regrow() {
        let mut worldgen = WorldGenConfig::preset_dense_forest();
        worldgen.trees.leaf.max_life_secs = 4;
        let summary = run(
            220,
            worldgen,
            &ViewportSection::default(),
            &settings(30 * 40, 0.0, 0),
        )
        .expect("preset is valid");
        assert!(summary.landed_leaves > 0);
        assert!(summary.revived_leaves > 0);
        // A 7 s and a 5 s flock over 40 s
        assert!(summary.launched_birds >= 10);
    }

    #[test]
    fn test_birds_flying_into_a_wall_are_grounded() {
        let mut worldgen = WorldGenConfig::default();
        worldgen.birds.truncate(1);
        worldgen.birds[0].cycle_secs = 1.0;
        // Flight lines deep below the surface
        worldgen.birds[0].band_top = 900;
        worldgen.birds[0].band_bottom = 950;
        let summary = run(
            220,
            worldgen,
            &ViewportSection::default(),
            &settings(30 * 5, 0.0, 0),
        )
        .expect("config is valid");
        assert!(summary.launched_birds >= 4);
        assert_eq!(summary.grounded_birds, summary.launched_birds);
    }

    #[test]
    fn test_invalid_worldgen_is_an_error() {
        let mut worldgen = WorldGenConfig::default();
        worldgen.grid.unit = 0;
        let result = run(
            220,
            worldgen,
            &ViewportSection::default(),
            &settings(10, 0.0, 0),
        );
        assert!(result.is_err());
    }
}
