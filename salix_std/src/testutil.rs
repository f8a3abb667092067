//! Shared fixtures for the catalog tests: a scripted world with actors, a
//! scripted random source and a runtime harness around them.

use std::cell::Cell;
use std::collections::HashMap;

use salix_core::facade::{
    ActorView, HealthSink, RayResult, RecordingAudio, RecordingController, RecordingEvents, Rng,
    Runtime, WorldQuery,
};
use salix_core::time::ManualClock;
use salix_core::{ActorUid, Vec3};

pub struct TestActor {
    pub position: Vec3,
    pub eye: Vec3,
    pub forward: Vec3,
    pub dead: bool,
}

impl TestActor {
    pub fn at(position: Vec3) -> Self {
        TestActor {
            position,
            eye: position + Vec3::new(0.0, 0.0, 0.5),
            forward: Vec3::X,
            dead: false,
        }
    }
}

impl ActorView for TestActor {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn eye_position(&self) -> Vec3 {
        self.eye
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}

/// World double with scripted raycasts and a flat navigable floor.
#[derive(Default)]
pub struct TestWorld {
    pub actors: HashMap<u32, TestActor>,
    /// Per-call raycast outcomes; calls beyond the script miss.
    pub ray_hits: Vec<bool>,
    pub ray_calls: Cell<usize>,
    pub nav_blocked: bool,
    pub noises: Vec<(Vec3, f32)>,
}

impl TestWorld {
    pub fn with_actor(uid: ActorUid, actor: TestActor) -> Self {
        let mut world = TestWorld::default();
        world.actors.insert(uid.raw(), actor);
        world
    }
}

impl WorldQuery for TestWorld {
    fn raycast_vs_tiles(&self, _from: Vec3, to: Vec3) -> RayResult {
        let call = self.ray_calls.get();
        self.ray_calls.set(call + 1);
        RayResult {
            hit_block: self.ray_hits.get(call).copied().unwrap_or(false),
            impact: to,
        }
    }

    fn make_noise(&mut self, position: Vec3, volume: f32) {
        self.noises.push((position, volume));
    }

    fn nav_accessible(&self, _tile: (i32, i32), _flying: bool) -> bool {
        !self.nav_blocked
    }

    fn actor(&self, uid: ActorUid) -> Option<&dyn ActorView> {
        self.actors.get(&uid.raw()).map(|a| a as &dyn ActorView)
    }
}

#[derive(Default)]
pub struct TestHealth {
    pub damaged: Vec<(ActorUid, f32)>,
    /// Pretend the target has no health component.
    pub refuse: bool,
}

impl HealthSink for TestHealth {
    fn damage(&mut self, target: ActorUid, amount: f32) -> bool {
        if self.refuse {
            return false;
        }
        self.damaged.push((target, amount));
        true
    }
}

/// Random source that replays a fixed script, cycling at the end.
#[derive(Default)]
pub struct ScriptedRng {
    pub values: Vec<f32>,
    at: usize,
}

impl ScriptedRng {
    pub fn new(values: &[f32]) -> Self {
        ScriptedRng {
            values: values.to_vec(),
            at: 0,
        }
    }
}

impl Rng for ScriptedRng {
    fn uniform(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.5;
        }
        let v = self.values[self.at % self.values.len()];
        self.at += 1;
        v
    }
}

/// All adapters a catalog test needs, with one call to borrow them as a
/// [`Runtime`].
pub struct Harness {
    pub actor: ActorUid,
    pub clock: ManualClock,
    pub rng: ScriptedRng,
    pub controller: RecordingController,
    pub world: TestWorld,
    pub health: TestHealth,
    pub audio: RecordingAudio,
    pub events: RecordingEvents,
}

impl Default for Harness {
    fn default() -> Self {
        Harness {
            actor: ActorUid::INVALID,
            clock: ManualClock::new(),
            rng: ScriptedRng::default(),
            controller: RecordingController::new(),
            world: TestWorld::default(),
            health: TestHealth::default(),
            audio: RecordingAudio::default(),
            events: RecordingEvents::default(),
        }
    }
}

impl Harness {
    pub fn new() -> Self {
        Harness::default()
    }

    /// Harness whose acting actor exists in the world at `position`.
    pub fn with_self_actor(position: Vec3) -> Self {
        let actor = ActorUid::new(1, 1);
        let mut harness = Harness::new();
        harness.actor = actor;
        harness.world = TestWorld::with_actor(actor, TestActor::at(position));
        harness
    }

    pub fn runtime(&mut self, dt: f32) -> Runtime<'_> {
        Runtime {
            dt,
            actor: self.actor,
            clock: &self.clock,
            rng: &mut self.rng,
            controller: &mut self.controller,
            world: &mut self.world,
            health: &mut self.health,
            audio: &mut self.audio,
            events: &mut self.events,
        }
    }
}
