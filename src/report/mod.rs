//! Markdown reports for video analyses and creator briefs.

use crate::analysis::{is_sentinel, AnalysisRecord};
use crate::creator::CreatorProfile;
use crate::error::{CompassError, Result};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Identifying details of the analysed content.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub author: String,
    pub title: String,
    pub duration_seconds: f64,
    /// Where the content came from, e.g. `video` or `creator folder`.
    pub source: String,
}

impl ReportMeta {
    pub fn new(author: Option<&str>, title: &str, duration_seconds: f64, source: &str) -> Self {
        Self {
            author: author.unwrap_or("Unknown").to_string(),
            title: title.to_string(),
            duration_seconds,
            source: source.to_string(),
        }
    }
}

/// Per-video digest kept for the creator brief.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSummary {
    pub title: String,
    pub duration_seconds: f64,
    pub main_topics: Vec<String>,
    pub content_style: String,
    pub tone: String,
}

impl VideoSummary {
    pub fn from_record(title: &str, duration_seconds: f64, record: &AnalysisRecord) -> Self {
        Self {
            title: title.to_string(),
            duration_seconds,
            main_topics: record.meaningful_topics().map(str::to_string).collect(),
            content_style: record.content_style.clone(),
            tone: record.tone.clone(),
        }
    }
}

/// Combined duration of the analysed videos.
pub fn total_duration(videos: &[VideoSummary]) -> f64 {
    videos.iter().map(|v| v.duration_seconds).sum()
}

/// `<author>-<title>-<YYYYMMDD_HHMMSS>.<ext>` with path separators replaced.
pub fn report_file_name(author: &str, title: &str, at: DateTime<Local>, ext: &str) -> String {
    format!(
        "{}-{}-{}.{}",
        safe_component(author),
        safe_component(title),
        at.format("%Y%m%d_%H%M%S"),
        ext
    )
}

fn safe_component(value: &str) -> String {
    value.replace(['/', '\\'], "_")
}

fn bullets(out: &mut String, items: &[String]) {
    let items: Vec<&String> = items.iter().filter(|s| !is_sentinel(s)).collect();
    if items.is_empty() {
        out.push_str("- _none identified_\n");
    }
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
}

fn analysis_sections(out: &mut String, record: &AnalysisRecord) {
    let _ = writeln!(out, "## Content profile\n");
    let _ = writeln!(out, "- **Style**: {}", record.content_style);
    let _ = writeln!(out, "- **Tone**: {}", record.tone);
    let _ = writeln!(out, "- **Target audience**: {}", record.target_audience);
    let _ = writeln!(out, "- **Unique approach**: {}\n", record.unique_approach);

    for (heading, items) in [
        ("Main topics", &record.main_topics),
        ("Audience pain points", &record.pain_points),
        ("Value propositions", &record.value_propositions),
        ("Core values", &record.core_values),
    ] {
        let _ = writeln!(out, "## {}\n", heading);
        bullets(out, items);
        out.push('\n');
    }

    let c = &record.characteristics;
    let _ = writeln!(out, "## Creator characteristics\n");
    let _ = writeln!(out, "- **Expertise**: {}", c.expertise);
    let _ = writeln!(out, "- **Style**: {}", c.style);
    let _ = writeln!(out, "- **Personality**: {}", c.personality);
    let _ = writeln!(out, "- **Experience level**: {}\n", c.experience_level);

    let _ = writeln!(out, "## Golden quotes\n");
    let quotes: Vec<&String> = record.golden_quotes.iter().filter(|q| !is_sentinel(q)).collect();
    if quotes.is_empty() {
        out.push_str("- _none identified_\n");
    }
    for quote in quotes {
        let _ = writeln!(out, "> {}\n", quote);
    }
    out.push('\n');

    let _ = writeln!(out, "## Core insight\n\n{}\n", record.core_insight);

    let m = &record.methodology_mapping;
    let _ = writeln!(out, "## Methodology mapping\n");
    let _ = writeln!(out, "- **Trust hook**: {}", m.trust_hook);
    let _ = writeln!(out, "- **Empathy anchor**: {}", m.empathy_anchor);
    let _ = writeln!(out, "- **Value map**: {}\n", m.value_map);

    let _ = writeln!(out, "---\n\n## Outreach script\n");
    for line in record.optimal_outreach_script.lines() {
        let _ = writeln!(out, "> {}", line);
    }
    out.push('\n');
}

fn footer(out: &mut String, tier: impl std::fmt::Display, at: DateTime<Local>) {
    let _ = writeln!(
        out,
        "---\n\n*Generated {} · extraction: {}*",
        at.format("%Y-%m-%d %H:%M:%S"),
        tier
    );
}

/// Render the report for a single video.
pub fn render_video_report(meta: &ReportMeta, record: &AnalysisRecord, at: DateTime<Local>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Outreach analysis: {}\n", meta.title);
    let _ = writeln!(out, "- **Creator**: {}", meta.author);
    let _ = writeln!(out, "- **Title**: {}", meta.title);
    let _ = writeln!(out, "- **Duration**: {:.1}s", meta.duration_seconds);
    let _ = writeln!(out, "- **Source**: {}\n", meta.source);
    analysis_sections(&mut out, record);
    footer(&mut out, record.tier, at);
    out
}

/// Render the brief for a creator folder.
pub fn render_creator_brief(
    profile: &CreatorProfile,
    record: &AnalysisRecord,
    videos: &[VideoSummary],
    at: DateTime<Local>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Creator brief: {}\n", profile.name);
    for (label, value) in [
        ("Platform", &profile.platform),
        ("Niche", &profile.niche),
        ("Followers", &profile.follower_count),
        ("Status", &profile.status),
        ("Profile", &profile.profile_url),
        ("Slogan", &profile.slogan),
    ] {
        if !value.is_empty() {
            let _ = writeln!(out, "- **{}**: {}", label, value);
        }
    }
    if !profile.one_liner.is_empty() {
        let _ = writeln!(out, "\n> {}", profile.one_liner);
    }

    let _ = writeln!(out, "\n## Videos analysed ({})\n", videos.len());
    let _ = writeln!(out, "- **Total duration**: {:.1}s\n", total_duration(videos));
    for video in videos {
        let _ = writeln!(out, "### {}\n", video.title);
        let _ = writeln!(out, "- **Duration**: {:.1}s", video.duration_seconds);
        let _ = writeln!(out, "- **Style**: {}", video.content_style);
        let _ = writeln!(out, "- **Tone**: {}", video.tone);
        if video.main_topics.is_empty() {
            let _ = writeln!(out, "- **Topics**: _none identified_\n");
        } else {
            let _ = writeln!(out, "- **Topics**: {}\n", video.main_topics.join(", "));
        }
    }

    if !profile.strengths.is_empty() || !profile.risks.is_empty() {
        let _ = writeln!(out, "## Notes fit assessment\n");
        for s in &profile.strengths {
            let _ = writeln!(out, "- ✅ {}", s);
        }
        for r in &profile.risks {
            let _ = writeln!(out, "- ❓ {}", r);
        }
        out.push('\n');
    }

    analysis_sections(&mut out, record);
    footer(&mut out, record.tier, at);
    out
}

fn render_transcript(meta: &ReportMeta, text: &str, at: DateTime<Local>) -> String {
    format!(
        "# Transcript: {}\n\n- **Creator**: {}\n- **Duration**: {:.1}s\n- **Source**: {}\n- **Transcribed**: {}\n- **Characters**: {}\n\n{}\n",
        meta.title,
        meta.author,
        meta.duration_seconds,
        meta.source,
        at.format("%Y-%m-%d %H:%M:%S"),
        text.chars().count(),
        text
    )
}

/// Writes reports and transcripts to their output directories.
pub struct ReportWriter {
    output_dir: PathBuf,
    transcripts_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>, transcripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            transcripts_dir: transcripts_dir.into(),
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| {
            CompassError::Report(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        let path = dir.join(name);
        std::fs::write(&path, content).map_err(|e| {
            CompassError::Report(format!("Failed to write {}: {}", path.display(), e))
        })?;
        Ok(path)
    }

    /// Write the report for one video.
    pub fn write_video_report(&self, meta: &ReportMeta, record: &AnalysisRecord) -> Result<PathBuf> {
        let now = Local::now();
        let name = report_file_name(&meta.author, &meta.title, now, "md");
        let path = Self::write(&self.output_dir, &name, &render_video_report(meta, record, now))?;
        info!("Report saved: {}", path.display());
        Ok(path)
    }

    /// Write the brief for a creator folder.
    pub fn write_creator_brief(
        &self,
        profile: &CreatorProfile,
        record: &AnalysisRecord,
        videos: &[VideoSummary],
    ) -> Result<PathBuf> {
        let now = Local::now();
        let name = report_file_name(&profile.name, "creator-brief", now, "md");
        let content = render_creator_brief(profile, record, videos, now);
        let path = Self::write(&self.output_dir, &name, &content)?;
        info!("Creator brief saved: {}", path.display());
        Ok(path)
    }

    /// Save a transcript next to the reports. Failures are logged, not returned.
    pub fn save_transcript(&self, meta: &ReportMeta, text: &str) -> Option<PathBuf> {
        let now = Local::now();
        let name = report_file_name(&meta.author, &meta.title, now, "txt");
        match Self::write(&self.transcripts_dir, &name, &render_transcript(meta, text, now)) {
            Ok(path) => {
                info!("Transcript saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not save transcript, continuing: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 5, 7).unwrap()
    }

    fn record() -> AnalysisRecord {
        AnalysisRecord {
            main_topics: vec!["espresso".to_string(), "unknown".to_string()],
            golden_quotes: vec!["Taste before you tweak.".to_string()],
            optimal_outreach_script: "Hi Ava,\nI'm Sam.".to_string(),
            ..AnalysisRecord::default()
        }
    }

    #[test]
    fn test_file_name_replaces_separators() {
        assert_eq!(
            report_file_name("A/B", "c\\d", at(), "md"),
            "A_B-c_d-20260314_090507.md"
        );
    }

    #[test]
    fn test_video_report_sections() {
        let meta = ReportMeta::new(None, "Espresso Basics", 62.0, "video");
        let report = render_video_report(&meta, &record(), at());
        assert!(report.starts_with("# Outreach analysis: Espresso Basics"));
        assert!(report.contains("- **Creator**: Unknown"));
        assert!(report.contains("- espresso\n"));
        assert!(!report.contains("- unknown\n"));
        assert!(report.contains("> Taste before you tweak."));
        assert!(report.contains("> Hi Ava,\n> I'm Sam.\n"));
        assert!(report.contains("extraction: default"));
    }

    #[test]
    fn test_creator_brief_includes_profile() {
        let profile = CreatorProfile {
            name: "Ava".to_string(),
            platform: "YouTube".to_string(),
            one_liner: "Approachable coffee.".to_string(),
            risks: vec!["Small reach".to_string()],
            ..CreatorProfile::default()
        };
        let videos = vec![
            VideoSummary::from_record("Espresso", 90.0, &record()),
            VideoSummary {
                title: "Milk steaming".to_string(),
                duration_seconds: 30.5,
                main_topics: Vec::new(),
                content_style: "tutorial".to_string(),
                tone: "calm".to_string(),
            },
        ];
        let brief = render_creator_brief(&profile, &record(), &videos, at());
        assert!(brief.contains("# Creator brief: Ava"));
        assert!(brief.contains("- **Platform**: YouTube"));
        assert!(!brief.contains("**Niche**"));
        assert!(brief.contains("> Approachable coffee."));
        assert!(brief.contains("## Videos analysed (2)"));
        assert!(brief.contains("- **Total duration**: 120.5s"));
        assert!(brief.contains("### Espresso\n\n- **Duration**: 90.0s"));
        assert!(brief.contains("- **Topics**: espresso\n"));
        assert!(brief.contains("### Milk steaming"));
        assert!(brief.contains("- **Tone**: calm"));
        assert!(brief.contains("- **Topics**: _none identified_"));
        assert!(brief.contains("- ❓ Small reach"));
    }

    #[test]
    fn test_writer_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("out"), dir.path().join("transcripts"));
        let meta = ReportMeta::new(Some("Ava"), "Espresso", 10.0, "video");

        let report = writer.write_video_report(&meta, &record()).unwrap();
        assert!(report.starts_with(dir.path().join("out")));
        assert!(report.file_name().unwrap().to_str().unwrap().starts_with("Ava-Espresso-"));

        let transcript = writer.save_transcript(&meta, "Pull a shot.").unwrap();
        let saved = std::fs::read_to_string(transcript).unwrap();
        assert!(saved.contains("- **Characters**: 12"));
        assert!(saved.ends_with("Pull a shot.\n"));
    }

    #[test]
    fn test_transcript_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let writer = ReportWriter::new(dir.path(), blocker.join("transcripts"));
        let meta = ReportMeta::new(Some("Ava"), "Espresso", 10.0, "video");
        assert!(writer.save_transcript(&meta, "text").is_none());
    }
}
