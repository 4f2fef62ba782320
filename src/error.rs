//! Error types for Motiontuber

use thiserror::Error;

/// Main error type for Motiontuber
#[derive(Error, Debug)]
pub enum MotiontuberError {
    #[error("Animation error: {0}")]
    Animation(#[from] AnimationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Web server error: {0}")]
    Web(#[from] WebError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Animation sequencing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    #[error("Failed to load clip {clip}: {cause}")]
    LoadFailure { clip: String, cause: String },

    #[error("No animation found in {0}")]
    MissingAnimationData(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Web server errors
#[derive(Error, Debug)]
pub enum WebError {
    #[error("Failed to bind to address: {0}")]
    Bind(String),

    #[error("Server startup failed: {0}")]
    Startup(String),
}

/// Result type alias for Motiontuber operations
pub type Result<T> = std::result::Result<T, MotiontuberError>;
