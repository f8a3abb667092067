//! Factories for persisted node and decorator kinds.

use std::collections::HashMap;

use salix_core::{Decorator, Task};

use crate::codec::LoadError;

pub type TaskFactory = Box<dyn Fn() -> Box<dyn Task>>;
pub type DecoratorFactory = Box<dyn Fn() -> Box<dyn Decorator>>;

/// Maps the registry names found in saved trees to constructors.
///
/// Composite kinds are structural and handled by the codec itself; only
/// tasks and decorators go through the registry. A kind may be reachable
/// under extra alias names to keep older saves loadable.
#[derive(Default)]
pub struct KindRegistry {
    tasks: HashMap<String, TaskFactory>,
    decorators: HashMap<String, DecoratorFactory>,
}

impl std::fmt::Debug for KindRegistry {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        fmt.debug_struct("KindRegistry")
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .field("decorators", &self.decorators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl KindRegistry {
    pub fn new() -> Self {
        KindRegistry::default()
    }

    pub fn add_task<T: Task + Default + 'static>(&mut self) {
        self.add_task_alias::<T>(T::static_kind());
    }

    /// Additional load-time name for a task kind.
    pub fn add_task_alias<T: Task + Default + 'static>(&mut self, alias: &str) {
        let factory: TaskFactory = Box::new(|| Box::<T>::default());
        self.tasks.insert(alias.to_owned(), factory);
    }

    pub fn add_decorator<D: Decorator + Default + 'static>(&mut self) {
        self.add_decorator_alias::<D>(D::static_kind());
    }

    /// Additional load-time name for a decorator kind.
    pub fn add_decorator_alias<D: Decorator + Default + 'static>(&mut self, alias: &str) {
        let factory: DecoratorFactory = Box::new(|| Box::<D>::default());
        self.decorators.insert(alias.to_owned(), factory);
    }

    pub fn create_task(&self, kind: &str) -> Result<Box<dyn Task>, LoadError> {
        match self.tasks.get(kind) {
            Some(factory) => Ok(factory()),
            None => Err(LoadError::UnknownNodeKind(kind.to_owned())),
        }
    }

    pub fn create_decorator(&self, kind: &str) -> Result<Box<dyn Decorator>, LoadError> {
        match self.decorators.get(kind) {
            Some(factory) => Ok(factory()),
            None => Err(LoadError::UnknownDecoratorKind(kind.to_owned())),
        }
    }

    pub fn task_kinds(&self) -> Vec<&str> {
        self.tasks.keys().map(|k| k.as_str()).collect()
    }

    pub fn decorator_kinds(&self) -> Vec<&str> {
        self.decorators.keys().map(|k| k.as_str()).collect()
    }
}
