//! Built-in fixture nodes. The game-facing catalogs live in `salix_std`;
//! these two exist so the engine can be exercised without it.

mod dummy_task;
pub use dummy_task::DummyTask;

mod dummy_decorator;
pub use dummy_decorator::DummyDecorator;
