use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("unresolvable key: '{0}'")]
    UnresolvableKey(String),

    #[error("{backend} backend failed: {message}")]
    Backend { backend: String, message: String },

    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("channel error: {0}")]
    Channel(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DeskError {
    /// Shorthand for a backend invocation failure.
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeskError>;
