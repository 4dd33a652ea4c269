//! Error types for hades-core.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for hades-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid reference sensor index {index}: array has {num_mics} microphones")]
    InvalidSensorIndex { index: usize, num_mics: usize },

    #[error("Invalid {kind} value: {value}")]
    InvalidEnumValue { kind: &'static str, value: i32 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Failed to load impulse responses from {path}: {reason}")]
    IrLoad { path: PathBuf, reason: String },

    #[error("Malformed impulse response set: {0}")]
    MalformedIrSet(String),

    #[error("No microphone array impulse response file configured")]
    NoArrayIrPath,

    #[error("Failed to create {stage}: {message}")]
    EngineCreation {
        stage: &'static str,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn engine(stage: &'static str, message: impl Into<String>) -> Self {
        Self::EngineCreation {
            stage,
            message: message.into(),
        }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
