pub mod config;
pub mod error;
pub mod keys;
pub mod protocol;
pub mod types;

pub use error::{DeskError, Result};
pub use keys::Key;
pub use types::{Action, ActionBatch, ActionKind, MouseButton};
