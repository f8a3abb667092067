/*
    Core of a behavior tree runtime for AI actors.

    All tree execution is single threaded and cooperative: the host calls
    Context::execute once per simulation tick, nodes that need more time
    stay marked running and are re-entered on the next tick. Long-running
    work therefore never blocks; it is modelled with stopwatches and the
    controller's motion state.

    The context owns every node in an arena; nodes address each other with
    indices, never pointers, and the context is passed into node operations
    explicitly so there are no back references. Execution state is kept
    behind interior mutability because a composite's tick has to re-enter
    the context to run its children.
*/

pub mod blackboard;
pub mod context;
pub mod facade;
pub mod node;
pub mod nodes;
pub mod time;
pub mod value;
pub mod wire;

mod as_any;
pub use as_any::{AsAny, AsAnyHelper};

pub use blackboard::{DataEntry, DataHandle, Registry, RegistryError, Table};
pub use context::{CanvasBox, Context, TreeError};
pub use facade::Runtime;
pub use node::{AttachedDecorator, Decorator, Node, NodeKind, Task, TaskStatus, TickCtx};
pub use value::{ActorUid, DataType, Value};

pub use glam::{Vec2, Vec3};
pub use uuid::Uuid;

use serde::{Deserialize, Serialize};

/// Result state of one node's last run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecResult {
    /// Never ran, or currently running.
    #[default]
    Unknown,
    Success,
    Failed,
    Aborted,
}

impl ExecResult {
    /// Persisted discriminant, unknown values map to [`ExecResult::Unknown`].
    pub fn from_u8(v: u8) -> ExecResult {
        match v {
            1 => ExecResult::Success,
            2 => ExecResult::Failed,
            3 => ExecResult::Aborted,
            _ => ExecResult::Unknown,
        }
    }
}

/// Index of a node slot in its context's arena.
///
/// Indices are stable for the lifetime of the node; freed slots may be
/// reused by later additions. The root always lives at index zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

/// The imports a task or decorator implementation needs.
pub mod node_prelude {
    pub use crate::facade::{RayResult, Runtime};
    pub use crate::node::{Decorator, Task, TaskStatus, TickCtx};
    pub use crate::time::Stopwatch;
    pub use crate::value::{ActorUid, DataType, Value};
    pub use crate::wire::{Decoder, Encoder, WireError};
    pub use crate::{ExecResult, Vec2, Vec3};
}
