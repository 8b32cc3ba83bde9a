//! Per-entity behaviors
//!
//! A behavior is owned by the entity it drives and only reacts to lifecycle
//! hooks: `on_spawn`, `tick` and `on_collision`. Hooks return the events the
//! host should apply to the entity; the world forwards them through
//! [`crate::host::Host::apply_behavior`].

use glam::{IVec2, Vec2};
use smallvec::{SmallVec, smallvec};

use crate::world::column_rng::{ColumnRng, WorldRng, cell_rng};
use crate::world::worldgen_config::{BirdConfig, LeafCycleConfig, WorldGenConfig};

/// Events emitted by a behavior for one entity
#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorEvent {
    /// Start the hanging sway (angle and size oscillate back and forth)
    Swing {
        angle_from: f32,
        angle_to: f32,
        angle_period: f32,
        size_from: f32,
        size_to: f32,
        size_period: f32,
    },
    /// Detach and fall while drifting sideways and fading out
    Fall {
        fall_speed: f32,
        drift_from: f32,
        drift_to: f32,
        drift_period: f32,
        fade_secs: f32,
    },
    /// Stop every running transition, velocity and acceleration
    HaltMotion,
    /// Zero the horizontal velocity
    StopDrift,
    /// Fade finished and the wait is over; replace the entity at its origin
    Revive,
    /// Fly horizontally; `facing_left` mirrors the sprite
    Fly { velocity_x: f32, facing_left: bool },
    /// Show wing frame `frame`
    Flap { frame: usize },
    /// Show the explosion at `size`, stop and start falling with `gravity`
    Explode { size: IVec2, gravity: f32 },
    /// Explosion over; show the roasted sprite
    Roast,
    /// Falling fast enough; keep the velocity but stop accelerating
    CancelGravity,
    /// Remove the entity for good
    Despawn,
}

pub type BehaviorEvents = SmallVec<[BehaviorEvent; 2]>;

/// What an entity touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Terrain blocks
    Terrain,
    /// A hit from an actor the host drives, such as a player
    Strike,
}

/// Attached behavior kinds
#[derive(Debug, Clone)]
pub enum Behavior {
    FallingLeaf(LeafCycle),
    Bird(BirdFlight),
}

impl Behavior {
    /// Falling-leaf behavior for the leaf cell at `cell`, already scheduled
    pub fn falling_leaf(cell: IVec2, seed: u64, config: &LeafCycleConfig) -> Self {
        let mut cycle = LeafCycle::new(cell, seed);
        cycle.on_spawn(config);
        Behavior::FallingLeaf(cycle)
    }

    pub fn on_spawn(&mut self, config: &WorldGenConfig) -> BehaviorEvents {
        match self {
            Behavior::FallingLeaf(cycle) => {
                cycle.on_spawn(&config.trees.leaf);
                BehaviorEvents::new()
            }
            Behavior::Bird(flight) => flight.on_spawn(),
        }
    }

    pub fn tick(&mut self, dt: f32, config: &WorldGenConfig) -> BehaviorEvents {
        match self {
            Behavior::FallingLeaf(cycle) => cycle.tick(dt, &config.trees.leaf),
            Behavior::Bird(flight) => flight.tick(dt),
        }
    }

    pub fn on_collision(&mut self, contact: Contact, config: &WorldGenConfig) -> BehaviorEvents {
        match self {
            Behavior::FallingLeaf(cycle) if contact == Contact::Terrain => {
                cycle.on_collision(&config.trees.leaf)
            }
            Behavior::FallingLeaf(_) => BehaviorEvents::new(),
            Behavior::Bird(flight) => flight.on_collision(contact),
        }
    }
}

/// Where a leaf is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafPhase {
    /// Not scheduled yet
    Idle,
    Hanging,
    Falling,
    /// Hit the ground while falling; still fading
    Landed,
    /// Invisible, waiting to regrow
    Faded,
}

/// Timer state machine of a single leaf
///
/// Every duration is drawn from an RNG seeded by the leaf cell, so a leaf's
/// whole history is reproducible from `(cell, seed)` and the tick sequence.
#[derive(Debug, Clone)]
pub struct LeafCycle {
    cell: IVec2,
    phase: LeafPhase,
    rng: ColumnRng,
    swing_in: Option<f32>,
    fall_in: Option<f32>,
    fade_left: Option<f32>,
    revive_in: Option<f32>,
    halt_in: Option<f32>,
}

impl LeafCycle {
    pub fn new(cell: IVec2, seed: u64) -> Self {
        Self {
            cell,
            phase: LeafPhase::Idle,
            rng: cell_rng(cell.x, cell.y, seed),
            swing_in: None,
            fall_in: None,
            fade_left: None,
            revive_in: None,
            halt_in: None,
        }
    }

    /// Top-left corner of the leaf cell this cycle regrows at
    pub fn cell(&self) -> IVec2 {
        self.cell
    }

    pub fn phase(&self) -> LeafPhase {
        self.phase
    }

    /// Seconds until the leaf detaches, while hanging
    pub fn fall_in(&self) -> Option<f32> {
        self.fall_in
    }

    /// Schedule the sway and the fall
    pub fn on_spawn(&mut self, config: &LeafCycleConfig) {
        let life = self
            .rng
            .roll_between(config.min_life_secs, config.max_life_secs);
        let swing_delay = self.rng.roll_between(
            config.min_swing_delay_tenths,
            config.max_swing_delay_tenths,
        );
        self.phase = LeafPhase::Hanging;
        self.fall_in = Some(life as f32);
        self.swing_in = Some(swing_delay as f32 / 10.0);
        self.fade_left = None;
        self.revive_in = None;
        self.halt_in = None;
    }

    pub fn tick(&mut self, dt: f32, config: &LeafCycleConfig) -> BehaviorEvents {
        let mut events = BehaviorEvents::new();

        if self.phase == LeafPhase::Hanging {
            if expire(&mut self.swing_in, dt) {
                let event = self.swing_event(config);
                events.push(event);
            }
            if expire(&mut self.fall_in, dt) {
                self.swing_in = None;
                self.phase = LeafPhase::Falling;
                self.fade_left = Some(config.fade_secs);
                events.push(BehaviorEvent::Fall {
                    fall_speed: config.fall_speed,
                    drift_from: config.drift_from,
                    drift_to: config.drift_to,
                    drift_period: config.drift_period_secs,
                    fade_secs: config.fade_secs,
                });
                return events;
            }
        }

        if matches!(self.phase, LeafPhase::Falling | LeafPhase::Landed) {
            if expire(&mut self.halt_in, dt) {
                events.push(BehaviorEvent::StopDrift);
            }
            if expire(&mut self.fade_left, dt) {
                let wait = self
                    .rng
                    .roll_between(config.min_revive_secs, config.max_revive_secs);
                self.phase = LeafPhase::Faded;
                self.halt_in = None;
                self.revive_in = Some(wait as f32);
                log::trace!("[LEAF] {:?} faded, regrowing in {}s", self.cell, wait);
                return events;
            }
        }

        if self.phase == LeafPhase::Faded && expire(&mut self.revive_in, dt) {
            self.phase = LeafPhase::Idle;
            events.push(BehaviorEvent::Revive);
        }

        events
    }

    /// React to the leaf touching the ground; ignored unless it is falling
    pub fn on_collision(&mut self, config: &LeafCycleConfig) -> BehaviorEvents {
        let mut events = BehaviorEvents::new();
        if self.phase == LeafPhase::Falling {
            self.phase = LeafPhase::Landed;
            self.halt_in = Some(config.halt_delay_secs);
            events.push(BehaviorEvent::HaltMotion);
        }
        events
    }

    fn swing_event(&mut self, config: &LeafCycleConfig) -> BehaviorEvent {
        let angle_period = self
            .rng
            .roll_between(config.min_transition_secs, config.max_transition_secs);
        let size_period = self
            .rng
            .roll_between(config.min_transition_secs, config.max_transition_secs);
        BehaviorEvent::Swing {
            angle_from: config.angle_from,
            angle_to: config.angle_to,
            angle_period: angle_period as f32,
            size_from: config.size_from,
            size_to: config.size_to,
            size_period: size_period as f32,
        }
    }
}

/// Where a bird is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BirdPhase {
    Flying,
    /// Struck once; showing the explosion
    Exploding,
    /// Explosion over; the next strike removes it
    Roasted,
}

/// Flight and hit state of a single bird
///
/// The bird integrates its own motion so the world can tell when it has
/// left the view. Terrain contact stops it in place; the first strike blows
/// it up and lets it drop, a strike on the roasted bird removes it.
#[derive(Debug, Clone)]
pub struct BirdFlight {
    flock: usize,
    phase: BirdPhase,
    center: Vec2,
    size: Vec2,
    velocity: Vec2,
    gravity: f32,
    hits: u32,
    ticks: u32,
    frame: usize,
    frames: usize,
    flap_ticks: u32,
    struck_size: IVec2,
    struck_gravity: f32,
    terminal_fall_speed: f32,
    roast_delay: f32,
    roast_in: Option<f32>,
}

impl BirdFlight {
    pub fn new(flock: usize, top_left: IVec2, velocity_x: f32, config: &BirdConfig) -> Self {
        let size = IVec2::new(config.size[0], config.size[1]).as_vec2();
        Self {
            flock,
            phase: BirdPhase::Flying,
            center: top_left.as_vec2() + size / 2.0,
            size,
            velocity: Vec2::new(velocity_x, 0.0),
            gravity: 0.0,
            hits: 0,
            ticks: 0,
            frame: 0,
            frames: config.frames.len(),
            flap_ticks: config.flap_ticks.max(1),
            struck_size: IVec2::new(config.struck_size[0], config.struck_size[1]),
            struck_gravity: config.struck_gravity,
            terminal_fall_speed: config.terminal_fall_speed,
            roast_delay: config.roast_delay_secs,
            roast_in: None,
        }
    }

    /// Index of the flock in [`WorldGenConfig::birds`]
    pub fn flock(&self) -> usize {
        self.flock
    }

    pub fn phase(&self) -> BirdPhase {
        self.phase
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Lowest point of the sprite (screen y)
    pub fn bottom(&self) -> f32 {
        self.center.y + self.size.y / 2.0
    }

    /// Still moving or accelerating
    pub fn is_airborne(&self) -> bool {
        self.velocity != Vec2::ZERO || self.gravity != 0.0
    }

    /// Centre outside `[left, right]`
    pub fn is_beyond(&self, left: f32, right: f32) -> bool {
        self.center.x < left || self.center.x > right
    }

    pub fn on_spawn(&mut self) -> BehaviorEvents {
        smallvec![BehaviorEvent::Fly {
            velocity_x: self.velocity.x,
            facing_left: self.velocity.x < 0.0,
        }]
    }

    pub fn tick(&mut self, dt: f32) -> BehaviorEvents {
        let mut events = BehaviorEvents::new();

        self.velocity.y += self.gravity * dt;
        self.center += self.velocity * dt;
        if self.gravity != 0.0 && self.velocity.y > self.terminal_fall_speed {
            self.gravity = 0.0;
            events.push(BehaviorEvent::CancelGravity);
        }

        self.ticks += 1;
        if self.hits == 0 && self.frames > 1 && self.ticks % self.flap_ticks == 0 {
            self.frame = (self.frame + 1) % self.frames;
            events.push(BehaviorEvent::Flap { frame: self.frame });
        }

        if self.phase == BirdPhase::Exploding && expire(&mut self.roast_in, dt) {
            self.phase = BirdPhase::Roasted;
            events.push(BehaviorEvent::Roast);
        }

        events
    }

    pub fn on_collision(&mut self, contact: Contact) -> BehaviorEvents {
        let mut events = BehaviorEvents::new();
        match contact {
            Contact::Terrain => {
                if self.is_airborne() {
                    self.velocity = Vec2::ZERO;
                    self.gravity = 0.0;
                    events.push(BehaviorEvent::HaltMotion);
                }
            }
            Contact::Strike => {
                self.hits += 1;
                if self.hits == 1 {
                    // Resize around the same top-left corner
                    let top_left = self.center - self.size / 2.0;
                    self.size = self.struck_size.as_vec2();
                    self.center = top_left + self.size / 2.0;
                    self.phase = BirdPhase::Exploding;
                    self.velocity = Vec2::ZERO;
                    self.gravity = self.struck_gravity;
                    self.roast_in = Some(self.roast_delay);
                    events.push(BehaviorEvent::Explode {
                        size: self.struck_size,
                        gravity: self.struck_gravity,
                    });
                } else if self.phase == BirdPhase::Roasted {
                    events.push(BehaviorEvent::Despawn);
                }
            }
        }
        events
    }
}

/// Count a timer down; true exactly once, on the tick it runs out
fn expire(timer: &mut Option<f32>, dt: f32) -> bool {
    match timer {
        Some(remaining) => {
            *remaining -= dt;
            if *remaining <= 0.0 {
                *timer = None;
                true
            } else {
                false
            }
        }
        None => false,
    }
}
