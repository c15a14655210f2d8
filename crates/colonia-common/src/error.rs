//! Error types for the Colonia engine
//!
//! Provides a unified error type for the few fallible surfaces. Tick
//! processing itself never surfaces an error to the host: every failure
//! path degrades to skip, default-reset, or penalty-and-continue.

use thiserror::Error;

/// Result type alias using ColoniaError
pub type Result<T> = std::result::Result<T, ColoniaError>;

/// Unified error type for Colonia operations
#[derive(Debug, Error)]
pub enum ColoniaError {
    // Checkpoint errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    // Slot storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// Implement From for common external error types
impl From<serde_json::Error> for ColoniaError {
    fn from(err: serde_json::Error) -> Self {
        ColoniaError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ColoniaError {
    fn from(err: std::io::Error) -> Self {
        ColoniaError::Storage(err.to_string())
    }
}

impl From<anyhow::Error> for ColoniaError {
    fn from(err: anyhow::Error) -> Self {
        ColoniaError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ColoniaError::Checkpoint("slot policy truncated".to_string());
        assert!(err.to_string().contains("slot policy truncated"));
    }

    #[test]
    fn test_from_serde_json() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: ColoniaError = parse.unwrap_err().into();
        assert!(matches!(err, ColoniaError::Serialization(_)));
    }
}
