//! Speech-to-text transcription.
//!
//! Transcribers are async and return the transcript text together with a
//! confidence score and the audio duration, which the transcript cache stores
//! alongside the text.

mod whisper;

pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Result of transcribing one audio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub text: String,
    /// Mean segment confidence in `0.0..=1.0`; 0 when unknown.
    pub confidence: f64,
    pub duration_seconds: f64,
}

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file.
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptResult>;
}
