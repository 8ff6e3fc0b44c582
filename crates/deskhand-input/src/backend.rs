use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deskhand_core::config::InputConfig;
use deskhand_core::{Key, MouseButton, Result};

use crate::native::NativeBackend;
use crate::shell::ShellBackend;

// ─── InputBackend ─────────────────────────────────────────────────────────

/// The host input subsystem, as seen by the interpreter.
///
/// Every call resolves once the OS-level effect has been issued. Keys arrive
/// already resolved; each implementation maps [`Key`] to its native
/// identifier with an exhaustive `match`.
#[async_trait]
pub trait InputBackend: Send + Sync {
    /// Short label used in logs and errors.
    fn name(&self) -> &'static str;

    async fn press_key(&self, key: Key) -> Result<()>;

    async fn release_key(&self, key: Key) -> Result<()>;

    /// Absolute screen coordinates. Out-of-range values are passed through.
    async fn move_to(&self, x: i32, y: i32) -> Result<()>;

    /// Press and release `button` at the current pointer position.
    async fn click(&self, button: MouseButton) -> Result<()>;

    /// Emit every character of `text` in order.
    async fn type_text(&self, text: &str) -> Result<()>;
}

/// Build the backend selected in the config.
pub fn build_backend(config: &InputConfig) -> Arc<dyn InputBackend> {
    match config {
        InputConfig::Native => Arc::new(NativeBackend::spawn()),
        InputConfig::Shell {
            hyprctl,
            ydotool,
            command_timeout_ms,
        } => Arc::new(ShellBackend::new(
            hyprctl.clone(),
            ydotool.clone(),
            Duration::from_millis(*command_timeout_ms),
        )),
    }
}
