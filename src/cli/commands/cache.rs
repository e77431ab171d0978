//! Cache command implementation.

use crate::cache::TranscriptCache;
use crate::cli::output::format_size;
use crate::cli::{CacheAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::io::Write;

/// Run the cache command.
pub fn run_cache(action: &CacheAction, settings: &Settings) -> Result<()> {
    let mut cache = TranscriptCache::open(settings.cache_dir())?;

    match action {
        CacheAction::Stats => {
            let stats = cache.stats();
            Output::header("Transcript cache");
            Output::kv("Directory", &stats.cache_dir.display().to_string());
            Output::kv("Entries", &stats.entry_count.to_string());
            Output::kv("  from source files", &stats.source_entries.to_string());
            Output::kv("  from extracted audio", &stats.derived_entries.to_string());
            Output::kv("Blobs", &stats.blob_count.to_string());
            Output::kv("Size", &format_size(stats.total_size_bytes));
            if !settings.cache.enabled {
                Output::warning("Caching is disabled in the configuration.");
            }
        }

        CacheAction::Clear { yes } => {
            if !yes && !confirm("Remove every cached transcript?")? {
                Output::info("Cancelled.");
                return Ok(());
            }
            let removed = cache.clear()?;
            Output::success(&format!("Removed {} cached transcripts", removed));
        }

        CacheAction::Dedupe => {
            let report = cache.dedupe()?;
            if report.removed.is_empty() {
                Output::info(&format!("No duplicates among {} entries", report.total_before));
            } else {
                Output::success(&format!(
                    "Removed {} duplicate entries, {} kept",
                    report.removed.len(),
                    report.kept
                ));
            }
        }

        CacheAction::Remove { file } => {
            // A deleted file can no longer be fingerprinted; fall back to the recorded path.
            let key = match TranscriptCache::fingerprint(file) {
                Ok(key) => key,
                Err(e) => {
                    let wanted = file.display().to_string();
                    cache
                        .entries()
                        .find(|(_, record)| record.origin.path() == wanted)
                        .map(|(key, _)| key.clone())
                        .ok_or(e)?
                }
            };
            if cache.remove(&key)? {
                Output::success(&format!("Removed cached transcript of {}", file.display()));
            } else {
                Output::info(&format!("No cached transcript for {}", file.display()));
            }
        }
    }

    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
