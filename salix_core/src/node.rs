//! The tree node model: node kinds, the task and decorator traits, and the
//! per-tick context handed to them.

use glam::Vec2;
use uuid::Uuid;

use crate::as_any::{AsAny, AsAnyHelper};
use crate::blackboard::{DataHandle, Registry, Table};
use crate::facade::Runtime;
use crate::value::Value;
use crate::wire::{Decoder, Encoder, WireError};
use crate::{ExecResult, NodeIndex};

/// Status a task reports from [`Task::tick`]. The engine turns completed
/// statuses into the matching finish transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Success,
    Failure,
    /// Finish through the abort path instead. Only the dummy fixture uses
    /// this; real tasks are aborted from outside.
    Aborted,
}

/// Everything a task or decorator may reach while it runs: the blackboard
/// and the host adapters.
pub struct TickCtx<'a, 'r> {
    pub registry: &'a Registry,
    pub table: &'a mut Table,
    pub rt: &'a mut Runtime<'r>,
}

impl TickCtx<'_, '_> {
    /// Resolve a key name against the schema and look it up in the table.
    pub fn find(&self, key: &str) -> Option<&Value> {
        self.table.find(self.registry.handle_of(key)?)
    }

    /// Resolve a key name and fetch-or-create its table entry.
    pub fn set(&mut self, key: &str) -> Option<&mut Value> {
        let handle = self.registry.handle_of(key)?;
        self.table.set(self.registry, handle)
    }

    pub fn unset(&mut self, key: &str) {
        if let Some(handle) = self.registry.handle_of(key) {
            self.table.unset(handle);
        }
    }

    pub fn handle_of(&self, key: &str) -> Option<DataHandle> {
        self.registry.handle_of(key)
    }
}

/// A leaf behavior. `tick` is called every engine tick while the node is
/// running; runtime conditions (missing keys, missing actors) resolve to
/// [`TaskStatus::Failure`], never to panics or errors.
pub trait Task: std::fmt::Debug + AsAny {
    /// Registry name used for persistence dispatch, e.g. `"TaskWait"`.
    fn static_kind() -> &'static str
    where
        Self: Sized;

    /// Must return [`Task::static_kind`] of the concrete type.
    fn kind(&self) -> &'static str;

    /// Clear transient state; called when the node is (re-)entered.
    fn reset(&mut self) {}

    fn tick(&mut self, ctx: &mut TickCtx) -> TaskStatus;

    /// Cleanup when the node is preempted, e.g. stopping controller motion.
    fn on_abort(&mut self, _ctx: &mut TickCtx) {}

    /// Persist the kind-specific fields.
    fn save_body(&self, w: &mut Encoder);

    /// Counterpart of [`Task::save_body`].
    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError>;
}

/// A conditional gate attached to a node.
///
/// `check` is consulted when the owner is entered (the evaluation gate) and
/// once per engine tick for edge-triggered preemption.
pub trait Decorator: std::fmt::Debug + AsAny {
    /// Registry name used for persistence dispatch, e.g. `"DecoCooldown"`.
    fn static_kind() -> &'static str
    where
        Self: Sized;

    /// Must return [`Decorator::static_kind`] of the concrete type.
    fn kind(&self) -> &'static str;

    fn check(&mut self, ctx: &mut TickCtx) -> bool;

    /// Observes every finish of the owning node, including aborts.
    fn on_finished(&mut self, _result: ExecResult, _ctx: &mut TickCtx) {}

    fn save_body(&self, w: &mut Encoder);

    fn load_body(&mut self, r: &mut Decoder<'_>) -> Result<(), WireError>;
}

/// A decorator as mounted on a node, with its abort flags and the condition
/// cache driving edge detection.
#[derive(Debug)]
pub struct AttachedDecorator {
    pub decorator: Box<dyn Decorator>,
    /// Preempt the owner when the condition turns false.
    pub abort_self: bool,
    /// Preempt anything running deeper than the owner when the condition
    /// turns true.
    pub abort_lower: bool,
    pub(crate) condition: bool,
    pub(crate) order: u32,
}

impl AttachedDecorator {
    pub fn new(decorator: Box<dyn Decorator>) -> Self {
        AttachedDecorator {
            decorator,
            abort_self: false,
            abort_lower: false,
            condition: false,
            order: 0,
        }
    }

    /// Last condition seen by the tick phase.
    pub fn condition(&self) -> bool {
        self.condition
    }

    /// Pre-order rank, just before the owning node's.
    pub fn order(&self) -> u32 {
        self.order
    }
}

/// Structural kind of a node. Composites schedule children; tasks carry a
/// boxed behavior.
#[derive(Debug)]
pub enum NodeKind {
    Root,
    Sequence { scoped: bool },
    Selector { scoped: bool },
    Task(Box<dyn Task>),
}

impl NodeKind {
    pub fn registry_name(&self) -> &str {
        match self {
            NodeKind::Root => "Root",
            NodeKind::Sequence { .. } => "CompSequence",
            NodeKind::Selector { .. } => "CompSelect",
            NodeKind::Task(task) => task.kind(),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, NodeKind::Sequence { .. } | NodeKind::Selector { .. })
    }

    pub fn is_task(&self) -> bool {
        matches!(self, NodeKind::Task(_))
    }
}

/// One tree node owned by the context arena.
#[derive(Debug)]
pub struct Node {
    pub name: String,
    /// Stable identity, preserved across save/load.
    pub uuid: Uuid,
    pub kind: NodeKind,
    /// Editor layout hint in `[0, 1]`², persisted but not interpreted.
    pub canvas_uv: Vec2,
    pub decorators: Vec<AttachedDecorator>,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) children: Vec<NodeIndex>,
    pub(crate) order: u32,
    pub(crate) executing: bool,
    pub(crate) result: ExecResult,
    pub(crate) active_child: usize,
}

impl Node {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            uuid: Uuid::new_v4(),
            kind,
            canvas_uv: Vec2::new(0.5, 0.5),
            decorators: vec![],
            parent: None,
            children: vec![],
            order: 0,
            executing: false,
            result: ExecResult::Unknown,
            active_child: 0,
        }
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Pre-order rank within the tree.
    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn executing(&self) -> bool {
        self.executing
    }

    pub fn result(&self) -> ExecResult {
        self.result
    }

    pub fn active_child(&self) -> usize {
        self.active_child
    }

    /// Downcast the task behavior, if this is a task node of type `T`.
    pub fn task<T: Task + 'static>(&self) -> Option<&T> {
        match &self.kind {
            NodeKind::Task(task) => task.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn task_mut<T: Task + 'static>(&mut self) -> Option<&mut T> {
        match &mut self.kind {
            NodeKind::Task(task) => task.downcast_mut::<T>(),
            _ => None,
        }
    }
}
