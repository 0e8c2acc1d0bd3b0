//! DocForge Core Library
//!
//! This crate provides the foundational utilities shared by the DocForge
//! knowledge engine crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, EngineSettings};
pub use error::{AppError, AppResult};
