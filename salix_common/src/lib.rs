//! Persistence support for the salix behavior tree runtime: the kind
//! registry that maps persisted names to factories, the versioned binary
//! codec, and the snapshot history backing undo/redo.

pub mod codec;
pub mod history;
pub mod kinds;

pub use codec::{load_board, load_file, save_board, save_file, LoadError};
pub use history::History;
pub use kinds::KindRegistry;
