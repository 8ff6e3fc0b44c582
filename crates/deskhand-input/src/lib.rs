//! `deskhand-input`: replays abstract input actions against the host.
//!
//! # Architecture
//!
//! ```text
//! [Action]            ← decoded from an execute_actions request
//!     │
//!     ▼
//! Interpreter         ← strict in-order replay, fail-fast
//!     │
//!     ▼
//! dyn InputBackend    ← chosen once from config
//!     ├── NativeBackend   enigo on a dedicated input thread
//!     └── ShellBackend    hyprctl / ydotool, one process per call
//! ```
//!
//! Screen capture is independent of the interpreter: [`ScreenCapture`] has a
//! native (`xcap`) and a shell (`grim`) implementation, both yielding PNG.

pub mod backend;
pub mod capture;
pub mod interpreter;
pub mod native;
pub mod shell;

pub(crate) mod process;

pub use backend::{build_backend, InputBackend};
pub use capture::{build_capture, NativeCapture, ScreenCapture, Screenshot, ShellCapture};
pub use interpreter::{ActionError, BatchReport, Interpreter};
pub use native::NativeBackend;
pub use shell::ShellBackend;
