//! Undo/redo over whole-board snapshots.

use salix_core::{Context, Registry};

use crate::codec::{load_board, save_board, LoadError};
use crate::kinds::KindRegistry;

/// Two stacks of opaque snapshot blobs.
///
/// `push_changes` records the current state and invalidates the redo
/// branch; `undo`/`redo` reinstall the popped snapshot wholesale, fully
/// replacing the registry and every node, decorator and table binding of
/// the context.
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<Vec<u8>>,
    redo: Vec<Vec<u8>>,
}

impl History {
    pub fn new() -> Self {
        History::default()
    }

    pub fn push_changes(&mut self, registry: &Registry, ctx: &Context) {
        self.undo.push(save_board(registry, ctx));
        self.redo.clear();
    }

    /// Restore the most recently pushed snapshot. `Ok(false)` when there is
    /// nothing to undo; on decode errors the snapshot stays on the stack
    /// and the current state is untouched.
    pub fn undo(
        &mut self,
        kinds: &KindRegistry,
        registry: &mut Registry,
        ctx: &mut Context,
    ) -> Result<bool, LoadError> {
        let Some(snapshot) = self.undo.pop() else {
            return Ok(false);
        };
        match load_board(&snapshot, kinds) {
            Ok((new_registry, new_ctx)) => {
                *registry = new_registry;
                *ctx = new_ctx;
                self.redo.push(snapshot);
                Ok(true)
            }
            Err(e) => {
                self.undo.push(snapshot);
                Err(e)
            }
        }
    }

    /// Mirror of [`History::undo`] over the redo stack.
    pub fn redo(
        &mut self,
        kinds: &KindRegistry,
        registry: &mut Registry,
        ctx: &mut Context,
    ) -> Result<bool, LoadError> {
        let Some(snapshot) = self.redo.pop() else {
            return Ok(false);
        };
        match load_board(&snapshot, kinds) {
            Ok((new_registry, new_ctx)) => {
                *registry = new_registry;
                *ctx = new_ctx;
                self.undo.push(snapshot);
                Ok(true)
            }
            Err(e) => {
                self.redo.push(snapshot);
                Err(e)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
