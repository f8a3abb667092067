//! Headless demo: a small wander behavior ticked against stub adapters,
//! then saved, reloaded and compared byte for byte.

use salix_common::{load_board, save_board, History, KindRegistry};
use salix_core::facade::{
    ActorView, NullHealth, RayResult, RecordingAudio, RecordingController, RecordingEvents,
    SeededRandom, WorldQuery,
};
use salix_core::time::SystemClock;
use salix_core::{
    ActorUid, AttachedDecorator, Context, DataType, ExecResult, Node, NodeKind, Registry, Runtime,
    Vec3,
};
use salix_std::nodes::{MoveToTask, RandomPointTask, WaitTask, WatchValueDecorator};

struct DemoActor {
    position: Vec3,
}

impl ActorView for DemoActor {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn eye_position(&self) -> Vec3 {
        self.position + Vec3::new(0.0, 0.0, 0.6)
    }

    fn forward(&self) -> Vec3 {
        Vec3::X
    }

    fn is_dead(&self) -> bool {
        false
    }
}

struct DemoWorld {
    wanderer: DemoActor,
}

impl WorldQuery for DemoWorld {
    fn raycast_vs_tiles(&self, _from: Vec3, to: Vec3) -> RayResult {
        RayResult {
            hit_block: false,
            impact: to,
        }
    }

    fn make_noise(&mut self, position: Vec3, volume: f32) {
        tracing::info!(?position, volume, "noise");
    }

    fn nav_accessible(&self, _tile: (i32, i32), _flying: bool) -> bool {
        true
    }

    fn actor(&self, uid: ActorUid) -> Option<&dyn ActorView> {
        (uid == ActorUid::new(1, 1)).then_some(&self.wanderer as &dyn ActorView)
    }
}

fn standard_kinds() -> KindRegistry {
    let mut kinds = KindRegistry::new();
    kinds.add_task::<salix_core::nodes::DummyTask>();
    kinds.add_task::<WaitTask>();
    kinds.add_task::<salix_std::nodes::PlaySoundTask>();
    kinds.add_task::<salix_std::nodes::FireEventTask>();
    kinds.add_task::<MoveToTask>();
    kinds.add_task::<salix_std::nodes::AttackTask>();
    kinds.add_task::<RandomPointTask>();
    kinds.add_task::<salix_std::nodes::KeepDistanceTask>();
    kinds.add_task::<salix_std::nodes::SetValueTask>();
    kinds.add_task::<salix_std::nodes::MakeNoiseTask>();
    kinds.add_decorator::<salix_core::nodes::DummyDecorator>();
    kinds.add_decorator::<salix_std::nodes::CooldownDecorator>();
    kinds.add_decorator::<WatchValueDecorator>();
    kinds.add_decorator::<salix_std::nodes::CanSeeDecorator>();
    kinds.add_decorator::<salix_std::nodes::IsInRangeDecorator>();
    kinds
}

fn main() {
    tracing_subscriber::fmt::init();

    // Schema: a wander target, plus a panic key that preempts everything.
    let mut registry = Registry::new();
    registry.register("Wander", DataType::Vector).unwrap();
    registry.register("Alert", DataType::Boolean).unwrap();

    // Root (+abort on Alert) -> Sequence -> [RandomPoint, MoveTo, Wait].
    let mut ctx = Context::new();
    let mut alert = AttachedDecorator::new(Box::new(WatchValueDecorator::when_set("Alert")));
    alert.abort_lower = true;
    ctx.add_decorator(Context::ROOT, alert).unwrap();
    let seq = ctx.add_node(Node::new(NodeKind::Sequence { scoped: false }, "wander"));
    ctx.add_child(Context::ROOT, seq).unwrap();
    for (x, node) in [
        (0.2, Node::new(NodeKind::Task(Box::new(RandomPointTask::new("Wander", 6.0))), "pick")),
        (0.5, Node::new(NodeKind::Task(Box::new(MoveToTask::new("Wander", 0.5))), "go")),
        (0.8, Node::new(NodeKind::Task(Box::new(WaitTask::new(0.2))), "idle")),
    ] {
        let mut node = node;
        node.canvas_uv.x = x;
        let index = ctx.add_node(node);
        ctx.add_child(seq, index).unwrap();
    }

    let mut history = History::new();
    history.push_changes(&registry, &ctx);

    // Adapters.
    let clock = SystemClock::new();
    let mut rng = SeededRandom::new(42);
    let mut controller = RecordingController::new();
    let mut world = DemoWorld {
        wanderer: DemoActor {
            position: Vec3::new(8.5, 8.5, 0.0),
        },
    };
    let mut health = NullHealth;
    let mut audio = RecordingAudio::default();
    let mut events = RecordingEvents::default();

    for tick in 0..20 {
        // Pretend the world finished any requested motion every few ticks.
        if tick % 3 == 2 {
            controller.arrive();
        }
        let mut rt = Runtime {
            dt: 0.05,
            actor: ActorUid::new(1, 1),
            clock: &clock,
            rng: &mut rng,
            controller: &mut controller,
            world: &mut world,
            health: &mut health,
            audio: &mut audio,
            events: &mut events,
        };
        let result = ctx.execute(&registry, &mut rt);
        tracing::info!(tick, ?result, depth = ctx.exec_stack().len(), "ticked");
        if result == ExecResult::Success {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    tracing::info!(moves = controller.requests.len(), "wander requests issued");

    // Persistence round trip.
    let kinds = standard_kinds();
    let bytes = save_board(&registry, &ctx);
    let (registry2, ctx2) = load_board(&bytes, &kinds).expect("own output must load");
    assert_eq!(save_board(&registry2, &ctx2), bytes);
    tracing::info!(len = bytes.len(), "snapshot round-tripped byte exact");

    // And the undo stack still holds the pristine tree.
    history.undo(&kinds, &mut registry, &mut ctx).unwrap();
    tracing::info!(nodes = ctx.nodes().len(), "restored initial snapshot");
}
