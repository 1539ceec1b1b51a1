//! Error types

use crate::keyframe::TrackRef;
use std::path::PathBuf;
use thiserror::Error;

/// Keyframe store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No keyframe at the requested time on the track
    #[error("No keyframe at {time}s on {track}")]
    KeyframeNotFound { track: TrackRef, time: f64 },

    /// Time is NaN or infinite
    #[error("Invalid keyframe time: {0}")]
    InvalidTime(f64),

    /// Transform has a non-finite component or non-positive scale
    #[error("Invalid transform for {0}: scale must be > 0 and all components finite")]
    InvalidTransform(String),

    /// Duration must be finite and positive
    #[error("Invalid duration: {0}")]
    InvalidDuration(f64),
}

/// Document decode/encode errors
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Malformed animation JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Animation document must be a JSON object")]
    NotAnObject,
}

/// Persistence errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Invalid step key component: {0:?}")]
    InvalidKey(String),
}

/// Engine configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
