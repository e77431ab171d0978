//! Creator and batch command implementations.

use crate::cli::output::format_duration;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{CreatorOutcome, Orchestrator};
use anyhow::Result;
use std::path::Path;
use std::time::Duration;

/// Run the creator command.
pub async fn run_creator(folder: &Path, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Analyze, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'compass doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    Output::info(&format!("Analyzing creator folder: {}", folder.display()));
    let orchestrator = Orchestrator::new(settings)?;
    let outcome = orchestrator.analyze_creator_folder(folder).await?;

    print_outcome(&outcome);
    Output::analysis(&outcome.record);
    Output::success(&format!("Brief written to {}", outcome.report_path.display()));
    Ok(())
}

/// Run the batch command.
pub async fn run_batch(
    dir: &Path,
    limit: Option<usize>,
    delay: Option<u64>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Analyze, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'compass doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    Output::info(&format!("Batch analysis of {}", dir.display()));
    let orchestrator = Orchestrator::new(settings)?;
    let summary = orchestrator
        .batch(dir, limit, delay.map(Duration::from_secs))
        .await?;

    Output::header("Batch summary");
    for outcome in &summary.completed {
        Output::list_item(&format!(
            "{} ({} videos) -> {}",
            outcome.profile.name,
            outcome.videos.len(),
            outcome.report_path.display()
        ));
    }
    for (folder, reason) in &summary.failed {
        Output::error(&format!("{}: {}", folder.display(), reason));
    }

    if summary.completed.is_empty() {
        anyhow::bail!("No creator folder could be analyzed");
    }
    Output::success(&format!(
        "{} of {} creators analyzed",
        summary.completed.len(),
        summary.completed.len() + summary.failed.len()
    ));
    Ok(())
}

fn print_outcome(outcome: &CreatorOutcome) {
    Output::header(&outcome.profile.name);
    if !outcome.profile.platform.is_empty() {
        Output::kv("Platform", &outcome.profile.platform);
    }
    Output::kv("Videos analyzed", &outcome.videos.len().to_string());
    Output::kv("Total duration", &format_duration(outcome.total_duration_seconds()));
    for video in &outcome.videos {
        Output::list_item(&format!(
            "{} ({}, {})",
            video.title,
            format_duration(video.duration_seconds),
            video.content_style
        ));
    }
    for (title, reason) in &outcome.skipped {
        Output::warning(&format!("Skipped {}: {}", title, reason));
    }
}
