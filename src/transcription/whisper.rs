//! OpenAI Whisper transcription implementation.

use super::{Transcriber, TranscriptResult};
use crate::audio::split_audio;
use crate::config::TranscriptionSettings;
use crate::error::{CompassError, Result};
use crate::openai::create_client;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Transcript of one chunk before merging.
struct ChunkTranscript {
    text: String,
    /// `avg_logprob` of every segment in the chunk.
    logprobs: Vec<f64>,
    duration: f64,
}

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    language: Option<String>,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
}

impl WhisperTranscriber {
    /// Create a transcriber from settings. Requires `OPENAI_API_KEY`.
    pub fn new(settings: &TranscriptionSettings) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: settings.model.clone(),
            language: settings.language.clone(),
            chunk_duration_seconds: settings.chunk_duration_seconds,
            max_concurrent_chunks: settings.max_concurrent_chunks.max(1),
        })
    }

    /// Transcribe a single audio file (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path) -> Result<ChunkTranscript> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| CompassError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| CompassError::OpenAI(format!("Whisper API error: {}", e)))?;

        let logprobs = response
            .segments
            .map(|segs| segs.iter().map(|s| s.avg_logprob as f64).collect())
            .unwrap_or_default();

        Ok(ChunkTranscript {
            text: response.text.trim().to_string(),
            logprobs,
            duration: response.duration as f64,
        })
    }

    /// Transcribe an audio file, splitting it if necessary.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_with_splitting(&self, audio_path: &Path) -> Result<TranscriptResult> {
        let temp_dir = tempfile::tempdir()?;
        let chunks = split_audio(audio_path, temp_dir.path(), self.chunk_duration_seconds).await?;

        if chunks.len() == 1 {
            let chunk = self.transcribe_single(audio_path).await?;
            return Ok(merge_chunks(vec![chunk]));
        }

        let chunk_count = chunks.len();
        info!("Processing {} audio chunks with {}", chunk_count, self.model);

        let pb = ProgressBar::new(chunk_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Whisper   [{bar:30.cyan/blue}] {pos}/{len}")
                .map_err(|e| CompassError::Transcription(e.to_string()))?
                .progress_chars("█▓░"),
        );

        let mut results: Vec<(usize, ChunkTranscript)> = Vec::with_capacity(chunk_count);

        let mut stream = stream::iter(chunks.into_iter().enumerate())
            .map(|(idx, (chunk_path, time_offset))| async move {
                let result = self.transcribe_single(&chunk_path).await;
                (idx, time_offset, result)
            })
            .buffer_unordered(self.max_concurrent_chunks);

        while let Some((idx, time_offset, result)) = stream.next().await {
            pb.inc(1);
            match result {
                Ok(chunk) => results.push((idx, chunk)),
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(CompassError::Transcription(format!(
                        "Chunk {} at {:.0}s failed: {}",
                        idx, time_offset, e
                    )));
                }
            }
        }

        pb.finish_and_clear();

        results.sort_by_key(|(idx, _)| *idx);
        Ok(merge_chunks(results.into_iter().map(|(_, c)| c).collect()))
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptResult> {
        self.transcribe_with_splitting(audio_path).await
    }
}

/// Join chunk transcripts in order. Confidence is the mean of `exp(avg_logprob)`
/// over all segments.
fn merge_chunks(chunks: Vec<ChunkTranscript>) -> TranscriptResult {
    let duration_seconds: f64 = chunks.iter().map(|c| c.duration).sum();
    let probabilities: Vec<f64> = chunks
        .iter()
        .flat_map(|c| c.logprobs.iter().map(|lp| lp.exp()))
        .collect();
    let confidence = if probabilities.is_empty() {
        0.0
    } else {
        (probabilities.iter().sum::<f64>() / probabilities.len() as f64).clamp(0.0, 1.0)
    };

    let text = chunks
        .into_iter()
        .map(|c| c.text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    TranscriptResult {
        text,
        confidence,
        duration_seconds,
    }
}
