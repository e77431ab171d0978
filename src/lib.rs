//! Creator Compass - creator content analysis and outreach drafting
//!
//! A CLI tool that transcribes creator videos, asks an LLM for a structured
//! analysis of the content and drafts a personalised outreach script.
//!
//! # Overview
//!
//! Creator Compass allows you to:
//! - Transcribe local audio and video files with Whisper
//! - Analyze a single video, or a creator folder with notes and several videos
//! - Get a complete analysis even when the model answers with broken JSON
//! - Reuse transcripts through a content-addressed cache
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `media` - Local media file detection
//! - `audio` - Audio extraction and splitting with ffmpeg
//! - `transcription` - Speech-to-text transcription
//! - `cache` - Transcript cache keyed by file fingerprint
//! - `analysis` - LLM analysis and interpretation of model output
//! - `creator` - Creator notes parsing
//! - `report` - Markdown reports
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use creator_compass::config::Settings;
//! use creator_compass::orchestrator::Orchestrator;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let outcome = orchestrator.analyze_file(Path::new("interview.mp4")).await?;
//!     println!("{}", outcome.record.optimal_outreach_script);
//!     println!("Report: {}", outcome.report_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod audio;
pub mod cache;
pub mod cli;
pub mod config;
pub mod creator;
pub mod error;
pub mod media;
pub mod openai;
pub mod orchestrator;
pub mod report;
pub mod transcription;

pub use error::{CompassError, Result};
