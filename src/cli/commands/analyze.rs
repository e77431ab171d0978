//! Analyze command implementation.

use crate::audio::probe_title;
use crate::cli::output::format_duration;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::media::MediaFile;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;
use tracing::debug;

/// Run the analyze command.
pub async fn run_analyze(
    file: &Path,
    author: Option<String>,
    title: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Analyze, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'compass doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut media = MediaFile::open(file)?;
    if let Some(author) = author {
        media = media.with_author(author);
    }
    // An explicit title wins over the container's title tag, which wins over the file name.
    let title = match title {
        Some(title) => Some(title),
        None => probe_title(file).await.unwrap_or_else(|e| {
            debug!("No title tag for {}: {}", file.display(), e);
            None
        }),
    };
    if let Some(title) = title {
        media = media.with_title(title);
    }

    Output::info(&format!("Analyzing: {}", media.title));
    let orchestrator = Orchestrator::new(settings)?;
    let outcome = orchestrator.analyze_media(media).await?;

    Output::header(&outcome.media.title);
    Output::kv("Duration", &format_duration(outcome.duration_seconds));
    if outcome.from_cache {
        Output::kv("Transcript", "from cache");
    }
    Output::analysis(&outcome.record);

    if let Some(path) = &outcome.transcript_path {
        Output::kv("Transcript saved", &path.display().to_string());
    }
    Output::success(&format!("Report written to {}", outcome.report_path.display()));

    Ok(())
}
