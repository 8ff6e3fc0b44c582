use std::sync::Arc;

use deskhand_core::config::Config;
use deskhand_input::{build_backend, build_capture, InputBackend, Interpreter, ScreenCapture};

/// Everything a running agent needs, built once at startup and passed
/// explicitly to the channel and the worker.
#[derive(Clone)]
pub struct AgentContext {
    pub config: Arc<Config>,
    pub backend: Arc<dyn InputBackend>,
    pub capture: Arc<dyn ScreenCapture>,
}

impl AgentContext {
    pub fn from_config(config: Config) -> Self {
        let backend = build_backend(&config.input);
        let capture = build_capture(&config.capture);
        Self::new(config, backend, capture)
    }

    pub fn new(
        config: Config,
        backend: Arc<dyn InputBackend>,
        capture: Arc<dyn ScreenCapture>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            capture,
        }
    }

    pub fn interpreter(&self) -> Interpreter {
        Interpreter::new(self.backend.clone())
    }

    /// The configured identity, if it is non-blank.
    pub fn agent_id(&self) -> Option<&str> {
        self.config
            .agent_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
