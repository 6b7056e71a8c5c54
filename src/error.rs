//! Unified error type for the server
//!
//! Startup-phase errors (config, corpus, index build/load) are fatal and
//! surface from `main` with a non-zero exit. Request-phase errors are
//! translated at the MCP boundary in `server` and never crash the process.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur while preparing or serving the documentation index
#[derive(Error, Debug)]
pub enum ServerError {
    /// Required environment variable is not set
    #[error("Environment variable not set: {0}")]
    MissingEnvVar(String),

    /// Invalid startup configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal failed
    #[error("Walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// HTML text extraction failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Embedding/completion provider call failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Persisted artifact (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Persisted vector data (de)serialization failed
    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Persisted artifacts are present but mutually inconsistent
    #[error("Index corruption: {0}")]
    IndexCorrupt(String),

    /// Stored vector length does not match the manifest dimension
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// MCP transport or service failure
    #[error("MCP runtime error: {0}")]
    McpRuntime(String),
}

impl From<async_openai::error::OpenAIError> for ServerError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Self::Provider(err.to_string())
    }
}

impl ServerError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an extraction error
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Create a corruption error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::IndexCorrupt(msg.into())
    }
}
