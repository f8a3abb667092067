//! The execution context: the node arena, the execution stack and the
//! single-tick cooperative evaluator.

use std::cell::{Cell, RefCell};

use glam::Vec2;

use crate::blackboard::{Registry, Table};
use crate::facade::Runtime;
use crate::node::{Node, NodeKind, TaskStatus, TickCtx};
use crate::{AttachedDecorator, ExecResult, NodeIndex};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0:?} is not present")]
    UnknownNode(NodeIndex),
    #[error("the root cannot be removed or re-parented")]
    RootImmutable,
    #[error("node {0:?} cannot own children")]
    NotAComposite(NodeIndex),
    #[error("the root already has an entry child")]
    EntryOccupied,
    #[error("relation would create a cycle")]
    WouldCycle,
}

/// Editor viewport hint. Kept on the context for the editor's benefit, the
/// engine never reads it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CanvasBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for CanvasBox {
    fn default() -> Self {
        CanvasBox {
            min: Vec2::ZERO,
            max: Vec2::ONE,
        }
    }
}

/// Scheduling policy of a composite, resolved once per visit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Scheduling {
    Root,
    Sequence,
    Selector,
}

/// Owns one behavior tree and its blackboard table, and drives execution.
///
/// The arena exclusively owns every node; the root always occupies slot 0.
/// All execution state lives behind interior mutability so that one node's
/// tick can re-enter the context to run its children.
#[derive(Debug)]
pub struct Context {
    slots: Vec<Option<RefCell<Node>>>,
    stack: RefCell<Vec<NodeIndex>>,
    aborting: Cell<bool>,
    table: RefCell<Table>,
    /// Editor level-of-detail hint; persisted, not interpreted.
    pub lod: i32,
    /// Editor viewport hint; not interpreted.
    pub canvas: CanvasBox,
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

impl Context {
    pub const ROOT: NodeIndex = NodeIndex(0);

    pub fn new() -> Self {
        Context {
            slots: vec![Some(RefCell::new(Node::new(NodeKind::Root, "Root")))],
            stack: RefCell::new(vec![]),
            aborting: Cell::new(false),
            table: RefCell::new(Table::new()),
            lod: 0,
            canvas: CanvasBox::default(),
        }
    }

    // ------------------------------------------------------------------
    // Structure.

    pub fn node(&self, index: NodeIndex) -> Option<&RefCell<Node>> {
        self.slots.get(index.0)?.as_ref()
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        Some(self.slots.get_mut(index.0)?.as_mut()?.get_mut())
    }

    /// Live node indices, root first.
    pub fn nodes(&self) -> Vec<NodeIndex> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| NodeIndex(i))
            .collect()
    }

    pub fn entry(&self) -> Option<NodeIndex> {
        self.cell(Self::ROOT).borrow().children.first().copied()
    }

    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        let vacant = self.slots.iter().position(|s| s.is_none());
        match vacant {
            Some(i) => {
                self.slots[i] = Some(RefCell::new(node));
                NodeIndex(i)
            }
            None => {
                self.slots.push(Some(RefCell::new(node)));
                NodeIndex(self.slots.len() - 1)
            }
        }
    }

    pub fn is_child(&self, parent: NodeIndex, child: NodeIndex) -> bool {
        self.node(parent)
            .map(|n| n.borrow().children.contains(&child))
            .unwrap_or(false)
    }

    /// Attach `child` under `parent`, detaching it from any previous parent.
    /// Children are kept ordered by their canvas x position.
    pub fn add_child(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<(), TreeError> {
        if child == Self::ROOT {
            return Err(TreeError::RootImmutable);
        }
        self.ensure_live(parent)?;
        self.ensure_live(child)?;
        match &self.cell(parent).borrow().kind {
            NodeKind::Task(_) => return Err(TreeError::NotAComposite(parent)),
            NodeKind::Root if !self.cell(parent).borrow().children.is_empty() => {
                return Err(TreeError::EntryOccupied)
            }
            _ => {}
        }
        // Walking up from the parent must not reach the child.
        let mut cursor = Some(parent);
        while let Some(at) = cursor {
            if at == child {
                return Err(TreeError::WouldCycle);
            }
            cursor = self.cell(at).borrow().parent;
        }

        self.detach_running(parent);
        self.detach_running(child);
        self.unlink_from_parent(child);
        self.cell(parent).borrow_mut().children.push(child);
        self.cell(child).borrow_mut().parent = Some(parent);
        self.sort_children_of(parent);
        self.refresh_order();
        Ok(())
    }

    /// Replace the children of `parent`. Previous children that are not in
    /// the new list stay in the arena, detached.
    pub fn set_children(
        &mut self,
        parent: NodeIndex,
        children: &[NodeIndex],
    ) -> Result<(), TreeError> {
        self.ensure_live(parent)?;
        for &child in children {
            self.ensure_live(child)?;
        }
        self.detach_running(parent);
        let old = std::mem::take(&mut self.cell(parent).borrow_mut().children);
        for child in old {
            self.cell(child).borrow_mut().parent = None;
        }
        for &child in children {
            self.add_child(parent, child)?;
        }
        Ok(())
    }

    /// Set or clear the root's entry child.
    pub fn set_entry(&mut self, entry: Option<NodeIndex>) -> Result<(), TreeError> {
        self.detach_running(Self::ROOT);
        let old = std::mem::take(&mut self.cell(Self::ROOT).borrow_mut().children);
        for child in old {
            self.cell(child).borrow_mut().parent = None;
        }
        if let Some(index) = entry {
            self.add_child(Self::ROOT, index)?;
        }
        Ok(())
    }

    /// Remove a node and release its whole subtree.
    pub fn remove_node(&mut self, index: NodeIndex) -> Result<(), TreeError> {
        if index == Self::ROOT {
            return Err(TreeError::RootImmutable);
        }
        self.ensure_live(index)?;
        self.detach_running(index);
        self.unlink_from_parent(index);

        let mut doomed = vec![];
        self.preorder_into(index, &mut doomed);
        for dead in doomed {
            self.slots[dead.0] = None;
        }
        self.refresh_order();
        Ok(())
    }

    pub fn add_decorator(
        &mut self,
        index: NodeIndex,
        decorator: AttachedDecorator,
    ) -> Result<(), TreeError> {
        self.ensure_live(index)?;
        self.detach_running(index);
        self.cell(index).borrow_mut().decorators.push(decorator);
        self.refresh_order();
        Ok(())
    }

    pub fn remove_decorator(
        &mut self,
        index: NodeIndex,
        position: usize,
    ) -> Result<AttachedDecorator, TreeError> {
        self.ensure_live(index)?;
        if position >= self.cell(index).borrow().decorators.len() {
            return Err(TreeError::UnknownNode(index));
        }
        self.detach_running(index);
        let removed = self.cell(index).borrow_mut().decorators.remove(position);
        self.refresh_order();
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Blackboard table.

    pub fn table(&self) -> std::cell::Ref<'_, Table> {
        self.table.borrow()
    }

    pub fn table_mut(&self) -> std::cell::RefMut<'_, Table> {
        self.table.borrow_mut()
    }

    // ------------------------------------------------------------------
    // Execution.

    /// Snapshot of the execution stack, root at the front.
    pub fn exec_stack(&self) -> Vec<NodeIndex> {
        self.stack.borrow().clone()
    }

    /// Advance the tree by one tick.
    ///
    /// Decorators tick first and may raise the abort flag; a raised flag
    /// unwinds the stack before the root re-enters the active path. The
    /// returned value is the root's result after the tick,
    /// [`ExecResult::Unknown`] while the root is still executing.
    pub fn execute(&self, registry: &Registry, rt: &mut Runtime) -> ExecResult {
        self.tick_decorators(registry, rt);
        if self.aborting.get() {
            self.unwind_stack(registry, rt);
            self.aborting.set(false);
        }
        self.execute_node(Self::ROOT, registry, rt);
        let root = self.cell(Self::ROOT).borrow();
        if root.executing {
            ExecResult::Unknown
        } else {
            root.result
        }
    }

    /// Host-driven cancellation: unwind everything through the abort path.
    pub fn notify_abort(&self, registry: &Registry, rt: &mut Runtime) {
        self.unwind_stack(registry, rt);
        self.aborting.set(false);
    }

    /// Nodes in pre-order, root first. Detached subtrees are not visited.
    pub fn preorder(&self) -> Vec<NodeIndex> {
        let mut out = vec![];
        self.preorder_into(Self::ROOT, &mut out);
        out
    }

    /// Recompute pre-order ranks; each decorator ranks just before its
    /// owner. Called after every structural mutation.
    pub fn refresh_order(&self) {
        let mut counter = 0u32;
        self.refresh_order_walk(Self::ROOT, &mut counter);
    }

    // ------------------------------------------------------------------
    // Internals.

    fn cell(&self, index: NodeIndex) -> &RefCell<Node> {
        self.slots[index.0]
            .as_ref()
            .expect("node index must refer to a live node")
    }

    fn ensure_live(&self, index: NodeIndex) -> Result<(), TreeError> {
        match self.node(index) {
            Some(_) => Ok(()),
            None => Err(TreeError::UnknownNode(index)),
        }
    }

    fn unlink_from_parent(&mut self, index: NodeIndex) {
        let parent = self.cell(index).borrow().parent;
        if let Some(parent) = parent {
            self.cell(parent).borrow_mut().children.retain(|&c| c != index);
        }
        self.cell(index).borrow_mut().parent = None;
    }

    fn sort_children_of(&mut self, parent: NodeIndex) {
        let mut keyed: Vec<(NodeIndex, f32)> = self
            .cell(parent)
            .borrow()
            .children
            .iter()
            .map(|&c| (c, self.cell(c).borrow().canvas_uv.x))
            .collect();
        keyed.sort_by(|a, b| a.1.total_cmp(&b.1));
        self.cell(parent).borrow_mut().children = keyed.into_iter().map(|(c, _)| c).collect();
    }

    fn preorder_into(&self, index: NodeIndex, out: &mut Vec<NodeIndex>) {
        out.push(index);
        let children = self.cell(index).borrow().children.clone();
        for child in children {
            self.preorder_into(child, out);
        }
    }

    fn refresh_order_walk(&self, index: NodeIndex, counter: &mut u32) {
        {
            let mut node = self.cell(index).borrow_mut();
            for attached in node.decorators.iter_mut() {
                attached.order = *counter;
                *counter += 1;
            }
            node.order = *counter;
            *counter += 1;
        }
        let children = self.cell(index).borrow().children.clone();
        for child in children {
            self.refresh_order_walk(child, counter);
        }
    }

    /// Pre-root phase: run every decorator's `check` and raise the abort
    /// flag on the configured edges. The stack is only read here, never
    /// modified, so one snapshot taken up front serves all edge tests.
    fn tick_decorators(&self, registry: &Registry, rt: &mut Runtime) {
        let stack = self.stack.borrow().clone();
        let top_order = stack.last().map(|&top| self.cell(top).borrow().order);
        let visit = self.preorder();
        let mut table = self.table.borrow_mut();
        for index in visit {
            let on_stack = stack.contains(&index);
            let mut node = self.cell(index).borrow_mut();
            if node.decorators.is_empty() {
                continue;
            }
            let mut ctx = TickCtx {
                registry,
                table: &mut table,
                rt: &mut *rt,
            };
            for attached in node.decorators.iter_mut() {
                let current = attached.decorator.check(&mut ctx);
                let previous = attached.condition;
                attached.condition = current;
                // Rising edge: something deeper than the owner is running.
                if current && !previous && attached.abort_lower {
                    if top_order.is_some_and(|order| order > attached.order) {
                        self.aborting.set(true);
                    }
                }
                // Falling edge: the owner itself is running.
                if !current && previous && attached.abort_self && on_stack {
                    self.aborting.set(true);
                }
            }
        }
    }

    fn unwind_stack(&self, registry: &Registry, rt: &mut Runtime) {
        loop {
            let top = self.stack.borrow().last().copied();
            match top {
                Some(index) => self.finish_abort(index, registry, rt),
                None => break,
            }
        }
    }

    fn execute_node(&self, index: NodeIndex, registry: &Registry, rt: &mut Runtime) {
        let is_task = self.cell(index).borrow().kind.is_task();
        if is_task {
            self.execute_task(index, registry, rt);
        } else {
            self.execute_composite(index, registry, rt);
        }
    }

    fn execute_task(&self, index: NodeIndex, registry: &Registry, rt: &mut Runtime) {
        let executing = self.cell(index).borrow().executing;
        if !executing {
            self.begin_execute(index, registry, rt);
            if !self.evaluate(index, registry, rt) {
                self.finish_execute(index, false, registry, rt);
                return;
            }
        }
        let status = {
            let mut node = self.cell(index).borrow_mut();
            let mut table = self.table.borrow_mut();
            let mut ctx = TickCtx {
                registry,
                table: &mut table,
                rt: &mut *rt,
            };
            match &mut node.kind {
                NodeKind::Task(task) => task.tick(&mut ctx),
                _ => TaskStatus::Failure,
            }
        };
        match status {
            TaskStatus::Running => {}
            TaskStatus::Success => self.finish_execute(index, true, registry, rt),
            TaskStatus::Failure => self.finish_execute(index, false, registry, rt),
            TaskStatus::Aborted => self.finish_abort(index, registry, rt),
        }
    }

    fn execute_composite(&self, index: NodeIndex, registry: &Registry, rt: &mut Runtime) {
        let (scheduling, executing, child_count) = {
            let node = self.cell(index).borrow();
            let scheduling = match node.kind {
                NodeKind::Root => Scheduling::Root,
                NodeKind::Sequence { .. } => Scheduling::Sequence,
                NodeKind::Selector { .. } => Scheduling::Selector,
                NodeKind::Task(_) => unreachable!("tasks are dispatched to execute_task"),
            };
            (scheduling, node.executing, node.children.len())
        };

        if !executing {
            if scheduling == Scheduling::Root && child_count == 0 {
                return;
            }
            self.begin_execute(index, registry, rt);
            if scheduling != Scheduling::Root {
                // The root has no evaluation gate; its decorators only feed
                // the tick phase.
                if !self.evaluate(index, registry, rt) {
                    self.finish_execute(index, false, registry, rt);
                    return;
                }
                if child_count == 0 {
                    self.finish_execute(index, true, registry, rt);
                    return;
                }
            }
            let children = self.cell(index).borrow().children.clone();
            for child in children {
                self.reset_state(child);
            }
        }

        loop {
            let (children, active) = {
                let node = self.cell(index).borrow();
                (node.children.clone(), node.active_child)
            };
            let Some(&child) = children.get(active) else {
                // The children changed under us; there is nothing sensible
                // left to schedule.
                self.finish_execute(index, false, registry, rt);
                return;
            };

            let already_done = {
                let node = self.cell(child).borrow();
                !node.executing && node.result != ExecResult::Unknown
            };
            if !already_done {
                self.execute_node(child, registry, rt);
            }

            let (child_executing, child_result) = {
                let node = self.cell(child).borrow();
                (node.executing, node.result)
            };
            if child_executing {
                return;
            }

            match scheduling {
                Scheduling::Root => {
                    self.finish_execute(index, child_result == ExecResult::Success, registry, rt);
                    return;
                }
                Scheduling::Sequence => {
                    if child_result != ExecResult::Success {
                        self.finish_execute(index, false, registry, rt);
                        return;
                    }
                    if active + 1 < children.len() {
                        self.cell(index).borrow_mut().active_child = active + 1;
                        continue;
                    }
                    self.cell(index).borrow_mut().active_child = 0;
                    self.finish_execute(index, true, registry, rt);
                    return;
                }
                Scheduling::Selector => {
                    if child_result == ExecResult::Success {
                        self.cell(index).borrow_mut().active_child = 0;
                        self.finish_execute(index, true, registry, rt);
                        return;
                    }
                    if active + 1 < children.len() {
                        self.cell(index).borrow_mut().active_child = active + 1;
                        continue;
                    }
                    self.finish_execute(index, false, registry, rt);
                    return;
                }
            }
        }
    }

    /// Push a node onto the execution stack and mark it running. The
    /// stack-top parentage violation is logged and forgiven so diagnostic
    /// sessions can keep going.
    fn begin_execute(&self, index: NodeIndex, registry: &Registry, rt: &mut Runtime) {
        let _ = (registry, rt);
        let parent_ok = {
            let stack = self.stack.borrow();
            match stack.last() {
                None => index == Self::ROOT,
                Some(&top) => self.is_child(top, index),
            }
        };
        if !parent_ok {
            tracing::warn!(
                node = index.0,
                "corrupt exec stack: begin without the parent on top"
            );
        }
        self.stack.borrow_mut().push(index);

        let mut node = self.cell(index).borrow_mut();
        node.executing = true;
        node.result = ExecResult::Unknown;
        node.active_child = 0;
        if let NodeKind::Task(task) = &mut node.kind {
            task.reset();
        }
    }

    /// Run the evaluation gate: every decorator's condition, in order. Also
    /// refreshes the condition cache so entry does not fabricate an edge on
    /// the next tick.
    fn evaluate(&self, index: NodeIndex, registry: &Registry, rt: &mut Runtime) -> bool {
        let mut node = self.cell(index).borrow_mut();
        if node.decorators.is_empty() {
            return true;
        }
        let mut table = self.table.borrow_mut();
        let mut ctx = TickCtx {
            registry,
            table: &mut table,
            rt: &mut *rt,
        };
        for attached in node.decorators.iter_mut() {
            let ok = attached.decorator.check(&mut ctx);
            attached.condition = ok;
            if !ok {
                return false;
            }
        }
        true
    }

    fn finish_execute(&self, index: NodeIndex, success: bool, registry: &Registry, rt: &mut Runtime) {
        self.pop_stack_for(index);
        let result = if success {
            ExecResult::Success
        } else {
            ExecResult::Failed
        };
        let mut node = self.cell(index).borrow_mut();
        node.executing = false;
        node.result = result;
        let mut table = self.table.borrow_mut();
        let mut ctx = TickCtx {
            registry,
            table: &mut table,
            rt: &mut *rt,
        };
        for attached in node.decorators.iter_mut() {
            attached.decorator.on_finished(result, &mut ctx);
        }
    }

    fn finish_abort(&self, index: NodeIndex, registry: &Registry, rt: &mut Runtime) {
        self.pop_stack_for(index);
        let mut node = self.cell(index).borrow_mut();
        node.executing = false;
        node.result = ExecResult::Aborted;
        let mut table = self.table.borrow_mut();
        let mut ctx = TickCtx {
            registry,
            table: &mut table,
            rt: &mut *rt,
        };
        if let NodeKind::Task(task) = &mut node.kind {
            task.on_abort(&mut ctx);
        }
        for attached in node.decorators.iter_mut() {
            attached.decorator.on_finished(ExecResult::Aborted, &mut ctx);
        }
    }

    fn pop_stack_for(&self, index: NodeIndex) {
        let mut stack = self.stack.borrow_mut();
        if stack.last() != Some(&index) {
            tracing::warn!(
                node = index.0,
                "corrupt exec stack: finish for a node that is not on top"
            );
        }
        stack.pop();
    }

    fn reset_state(&self, index: NodeIndex) {
        let mut node = self.cell(index).borrow_mut();
        if !node.executing {
            node.result = ExecResult::Unknown;
            node.active_child = 0;
        }
    }

    /// Structural edits on a running node clear its execution state without
    /// adapter callbacks; hosts that want proper abort semantics call
    /// [`Context::notify_abort`] before editing.
    fn detach_running(&mut self, index: NodeIndex) {
        if !self.stack.get_mut().contains(&index) {
            return;
        }
        tracing::warn!(node = index.0, "structural edit preempted a running node");
        while let Some(top) = self.stack.get_mut().pop() {
            let node = self.slots[top.0]
                .as_mut()
                .expect("stacked node must be live")
                .get_mut();
            node.executing = false;
            node.result = ExecResult::Aborted;
            if let NodeKind::Task(task) = &mut node.kind {
                task.reset();
            }
            if top == index {
                break;
            }
        }
    }
}
