//! Error types for Creator Compass.

use thiserror::Error;

/// Library-level error type for Creator Compass operations.
#[derive(Error, Debug)]
pub enum CompassError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Audio processing failed: {0}")]
    AudioProcessing(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Creator notes error: {0}")]
    CreatorNotes(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Transcript cache error: {0}")]
    Cache(#[from] crate::cache::CacheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Creator Compass operations.
pub type Result<T> = std::result::Result<T, CompassError>;
