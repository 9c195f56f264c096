//! Error types for Memoria
//!
//! The search engine itself never fails; these errors come from the boundary
//! modules (config loading, export and import, the CLI host).

use thiserror::Error;

/// Result type alias for Memoria operations
pub type Result<T> = std::result::Result<T, MemoriaError>;

/// Main error type for Memoria
#[derive(Error, Debug)]
pub enum MemoriaError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{format} parse error at line {line}: {message}")]
    Parse {
        format: &'static str,
        line: usize,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MemoriaError {
    pub(crate) fn parse(format: &'static str, line: usize, message: impl Into<String>) -> Self {
        MemoriaError::Parse {
            format,
            line,
            message: message.into(),
        }
    }

    /// Check if the error was caused by the caller's input rather than the environment
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            MemoriaError::InvalidInput(_)
                | MemoriaError::Serialization(_)
                | MemoriaError::Parse { .. }
                | MemoriaError::Toml(_)
                | MemoriaError::Config(_)
        )
    }

    /// Stable numeric code, used as the CLI exit status
    pub fn code(&self) -> i32 {
        match self {
            MemoriaError::InvalidInput(_) => 2,
            MemoriaError::Serialization(_) => 3,
            MemoriaError::Parse { .. } => 3,
            MemoriaError::Io(_) => 4,
            MemoriaError::Config(_) | MemoriaError::Toml(_) => 5,
            MemoriaError::Internal(_) => 70,
        }
    }
}
