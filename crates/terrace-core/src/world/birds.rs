//! Bird flocks - timed launches from the viewport edges
//!
//! Birds are not column content: they are never indexed by the window and
//! never evicted with a strip. The world ticks one [`BirdSpawner`] per
//! configured flock and owns the birds it launches.

use glam::IVec2;
use rand::SeedableRng;

use super::column_rng::{ColumnRng, WorldRng};
use super::worldgen_config::BirdConfig;
use crate::entity::{Behavior, BirdFlight, Layer, SpawnRequest, Visual};
use crate::host::Viewport;

const FLOCK_SALT: u64 = 0xB12D_F10C;

/// A bird ready to be handed to the host
#[derive(Debug, Clone)]
pub struct BirdLaunch {
    pub request: SpawnRequest,
    pub behavior: Behavior,
}

/// Launches one bird of a flock every `cycle_secs`
///
/// Each launch draws a flight line inside the height band, then a direction.
/// Right-flying birds enter at the left viewport edge, left-flying birds at
/// the right edge.
#[derive(Debug, Clone)]
pub struct BirdSpawner {
    flock: usize,
    rng: ColumnRng,
    until_next: f32,
}

impl BirdSpawner {
    pub fn new(world_seed: u64, flock: usize, config: &BirdConfig) -> Self {
        let stream = (flock as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self {
            flock,
            rng: ColumnRng::seed_from_u64(world_seed ^ FLOCK_SALT.wrapping_add(stream)),
            until_next: config.cycle_secs,
        }
    }

    /// Advance the launch timer; a bird is due each time it runs out
    pub fn tick(&mut self, dt: f32, view: Viewport, config: &BirdConfig) -> Option<BirdLaunch> {
        self.until_next -= dt;
        if self.until_next > 0.0 {
            return None;
        }
        self.until_next += config.cycle_secs;
        Some(self.launch(view, config))
    }

    fn launch(&mut self, view: Viewport, config: &BirdConfig) -> BirdLaunch {
        let y = self.rng.roll_between(config.band_top, config.band_bottom - 1);
        let facing_left = self.rng.roll_below(2) == 0;
        let (x, velocity_x) = if facing_left {
            (view.right(), -config.speed)
        } else {
            (view.left(), config.speed)
        };

        let top_left = IVec2::new(x.floor() as i32, y);
        let request = SpawnRequest {
            position: top_left,
            size: IVec2::new(config.size[0], config.size[1]),
            visual: Visual::Bird {
                kind: config.name.clone(),
                frame: config.frames.first().cloned().unwrap_or_default(),
            },
            layer: Layer(config.layer),
            collidable: true,
        };
        BirdLaunch {
            request,
            behavior: Behavior::Bird(BirdFlight::new(self.flock, top_left, velocity_x, config)),
        }
    }
}
