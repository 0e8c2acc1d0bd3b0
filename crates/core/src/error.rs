//! Error types for DocForge.
//!
//! This module defines a unified error enum that covers every error category
//! in the knowledge engine: configuration, I/O, LLM, prompt, and the four
//! pipeline stages (analysis, generation, enhancement, persistence).

use thiserror::Error;

/// Unified error type for DocForge.
///
/// Every component boundary returns `Result<T, AppError>`. The pipeline
/// orchestrator decides which fallback applies to which variant; components
/// never panic.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Structural analysis, classification and planning errors
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Article generation errors
    #[error("Generation error: {0}")]
    Generation(String),

    /// Post-processing errors
    #[error("Enhancement error: {0}")]
    Enhancement(String),

    /// Document store errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
