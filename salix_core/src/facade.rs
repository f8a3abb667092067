//! Adapter traits through which the tree reaches the host's world.
//!
//! The runtime never owns an actor, a nav mesh or a mixer; it talks to the
//! façades below. Hosts implement them over the real simulation; the
//! ready-made implementations here cover tests and headless use.

use glam::Vec3;

use crate::time::Clock;
use crate::value::ActorUid;

/// Locomotion interface of the actor executing the tree.
pub trait ActorController {
    fn move_to(&mut self, goal: Vec3);
    fn stop_moving(&mut self);
    fn is_moving(&self) -> bool;
    /// Tally a confirmed kill by this actor.
    fn record_kill(&mut self);
    fn kill_count(&self) -> u32;
}

/// Read-only view of an actor resolved through [`WorldQuery::actor`].
pub trait ActorView {
    fn position(&self) -> Vec3;
    fn eye_position(&self) -> Vec3;
    fn forward(&self) -> Vec3;
    fn is_dead(&self) -> bool;
}

/// Result of a tile raycast.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayResult {
    pub hit_block: bool,
    pub impact: Vec3,
}

/// Spatial queries against the world the actors live in.
pub trait WorldQuery {
    fn raycast_vs_tiles(&self, from: Vec3, to: Vec3) -> RayResult;
    /// Emit an AI-sense noise event at `position`.
    fn make_noise(&mut self, position: Vec3, volume: f32);
    fn nav_accessible(&self, tile: (i32, i32), flying: bool) -> bool;
    fn actor(&self, uid: ActorUid) -> Option<&dyn ActorView>;
}

/// Damage application on actors that carry a health component.
pub trait HealthSink {
    /// `false` when the actor is missing or has no health component.
    fn damage(&mut self, target: ActorUid, amount: f32) -> bool;
}

pub trait AudioSink {
    fn play_at(&mut self, sound: &str, position: Vec3, volume: f32, speed: f32);
}

pub trait EventSink {
    fn fire(&mut self, command_line: &str);
}

/// Uniform random source, `uniform()` in `[0, 1)`.
pub trait Rng {
    fn uniform(&mut self) -> f32;
}

/// Everything a task or decorator may touch during one tick, borrowed from
/// the host. Rebuilt by the host every tick.
pub struct Runtime<'a> {
    /// Seconds since the previous tick.
    pub dt: f32,
    /// The actor executing this tree.
    pub actor: ActorUid,
    pub clock: &'a dyn Clock,
    pub rng: &'a mut dyn Rng,
    pub controller: &'a mut dyn ActorController,
    pub world: &'a mut dyn WorldQuery,
    pub health: &'a mut dyn HealthSink,
    pub audio: &'a mut dyn AudioSink,
    pub events: &'a mut dyn EventSink,
}

/// Deterministic [`Rng`] backed by `rand`'s standard generator.
pub struct SeededRandom {
    rng: rand::rngs::StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        SeededRandom {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }
}

impl Rng for SeededRandom {
    fn uniform(&mut self) -> f32 {
        use rand::Rng as _;
        self.rng.gen::<f32>()
    }
}

/// Controller that records requests instead of steering anything.
#[derive(Debug, Default)]
pub struct RecordingController {
    pub requests: Vec<Vec3>,
    pub stops: u32,
    moving: bool,
    kills: u32,
}

impl RecordingController {
    pub fn new() -> Self {
        RecordingController::default()
    }

    /// Pretend the actor reached its goal.
    pub fn arrive(&mut self) {
        self.moving = false;
    }
}

impl ActorController for RecordingController {
    fn move_to(&mut self, goal: Vec3) {
        self.requests.push(goal);
        self.moving = true;
    }

    fn stop_moving(&mut self) {
        self.stops += 1;
        self.moving = false;
    }

    fn is_moving(&self) -> bool {
        self.moving
    }

    fn record_kill(&mut self) {
        self.kills += 1;
    }

    fn kill_count(&self) -> u32 {
        self.kills
    }
}

/// World with no actors, no obstructions and unrestricted navigation.
#[derive(Debug, Default)]
pub struct NullWorld;

impl WorldQuery for NullWorld {
    fn raycast_vs_tiles(&self, _from: Vec3, to: Vec3) -> RayResult {
        RayResult {
            hit_block: false,
            impact: to,
        }
    }

    fn make_noise(&mut self, _position: Vec3, _volume: f32) {}

    fn nav_accessible(&self, _tile: (i32, i32), _flying: bool) -> bool {
        true
    }

    fn actor(&self, _uid: ActorUid) -> Option<&dyn ActorView> {
        None
    }
}

#[derive(Debug, Default)]
pub struct NullHealth;

impl HealthSink for NullHealth {
    fn damage(&mut self, _target: ActorUid, _amount: f32) -> bool {
        false
    }
}

/// Audio sink that keeps what was played.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub played: Vec<(String, Vec3, f32, f32)>,
}

impl AudioSink for RecordingAudio {
    fn play_at(&mut self, sound: &str, position: Vec3, volume: f32, speed: f32) {
        self.played.push((sound.to_owned(), position, volume, speed));
    }
}

/// Event sink that keeps the fired command lines.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    pub fired: Vec<String>,
}

impl EventSink for RecordingEvents {
    fn fire(&mut self, command_line: &str) {
        self.fired.push(command_line.to_owned());
    }
}
