//! Configuration module for Creator Compass.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnalysisPrompts, CreatorPrompts, Prompts, EXAMPLE_SCRIPT_FRAGMENTS};
pub use settings::{
    BatchSettings, CacheSettings, GeneralSettings, LlmProvider, LlmSettings, OutreachSettings,
    PromptSettings, Settings, TranscriptionSettings,
};
