//! Error types for LagStream

/// Result type alias using LagStream's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for LagStream operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors (bad option values, unopenable dump paths)
    #[error("configuration error: {0}")]
    Config(String),

    /// Stream reading/parsing errors
    #[error("stream error: {0}")]
    Stream(String),

    /// Evaluation errors (violated run invariants)
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Create a new evaluation error
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }
}
