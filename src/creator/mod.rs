//! Creator notes and creator folders.
//!
//! A creator folder holds one Markdown notes file named `Creator - <name>.md`
//! (the older `人物 - <name>.md` form is also accepted) and the creator's videos.
//! The notes carry YAML front matter, a key/value table, a `> [!tip]` callout
//! with a one-line assessment, and bullet lists of strengths and risks.

use crate::error::{CompassError, Result};
use crate::media::{list_media, MediaFile};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Lines in a tip callout that are unfilled template text.
const TEMPLATE_MARKERS: &[&str] = &["在这里用一句话总结", "一句话总结", "Summarize in one sentence"];

/// Shortest fallback blockquote accepted as a one-liner.
const MIN_ONE_LINER_CHARS: usize = 10;

/// Profile of a creator parsed from their notes file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatorProfile {
    pub name: String,
    pub platform: String,
    pub niche: String,
    pub follower_count: String,
    pub status: String,
    pub profile_url: String,
    pub slogan: String,
    pub one_liner: String,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
}

impl CreatorProfile {
    /// Render the profile and transcripts as model input.
    ///
    /// `transcripts` are `(title, text)` pairs in analysis order.
    pub fn material(&self, transcripts: &[(String, String)]) -> String {
        let mut out = String::from("Creator profile:\n");
        for (label, value) in [
            ("Name", &self.name),
            ("Platform", &self.platform),
            ("Niche", &self.niche),
            ("Followers", &self.follower_count),
            ("Slogan", &self.slogan),
            ("Core value", &self.one_liner),
        ] {
            if !value.is_empty() {
                out.push_str(&format!("- {}: {}\n", label, value));
            }
        }
        for strength in &self.strengths {
            out.push_str(&format!("- Strength: {}\n", strength));
        }
        for risk in &self.risks {
            out.push_str(&format!("- Risk: {}\n", risk));
        }

        out.push_str("\nVideo transcripts:\n");
        for (title, text) in transcripts {
            out.push_str(&format!("【{}】{}\n", title, text));
        }
        out
    }
}

/// Parser for creator notes files.
pub struct NotesParser {
    file_name: Regex,
    table_row: Regex,
}

impl NotesParser {
    pub fn new() -> Self {
        Self {
            file_name: Regex::new(r"^(?:(?i:creator)|人物)\s*-\s*(.+)$").expect("Invalid regex"),
            table_row: Regex::new(r"^\|\s*(?:\*\*)?([^|*]+?)(?:\*\*)?\s*\|\s*([^|]+?)\s*\|")
                .expect("Invalid regex"),
        }
    }

    /// Whether `path` is named like a notes file.
    pub fn is_notes_file(&self, path: &Path) -> bool {
        path.extension().is_some_and(|e| e.eq_ignore_ascii_case("md"))
            && path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| self.file_name.is_match(s))
    }

    /// Parse a notes file from disk.
    pub fn parse_file(&self, path: &Path) -> Result<CreatorProfile> {
        if !path.is_file() {
            return Err(CompassError::NotFound(path.display().to_string()));
        }
        info!("Parsing creator notes: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        Ok(self.parse(stem, &content))
    }

    /// Parse notes content. `stem` is the file stem the creator name comes from.
    pub fn parse(&self, stem: &str, content: &str) -> CreatorProfile {
        let name = self
            .file_name
            .captures(stem)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let front = front_matter(content);
        let field = |key: &str| yaml_field(front, key).unwrap_or_default();

        let mut niche = field("niche");
        if niche.is_empty() {
            niche = self.table_field(content, &["audience", "粉丝画像"]);
        }
        let mut follower_count = field("follower_count");
        if follower_count.is_empty() {
            follower_count = self.table_field(content, &["followers", "粉丝数"]);
        }

        let profile = CreatorProfile {
            name,
            platform: field("platform"),
            niche,
            follower_count,
            status: field("status"),
            profile_url: field("profile_url"),
            slogan: self.table_field(content, &["slogan"]),
            one_liner: one_liner(content),
            strengths: bullet_list(content, "**[✅]"),
            risks: bullet_list(content, "**[❓]"),
        };
        debug!(
            "Parsed profile for {} ({} strengths, {} risks)",
            profile.name,
            profile.strengths.len(),
            profile.risks.len()
        );
        profile
    }

    /// Value of the first table row labelled with any of `keys`, in key order.
    fn table_field(&self, content: &str, keys: &[&str]) -> String {
        keys.iter()
            .find_map(|key| {
                content.lines().find_map(|line| {
                    let caps = self.table_row.captures(line.trim())?;
                    let label = caps.get(1)?.as_str().trim();
                    let value = caps.get(2)?.as_str().trim();
                    (label.eq_ignore_ascii_case(key) && !value.is_empty()).then(|| value.to_string())
                })
            })
            .unwrap_or_default()
    }
}

impl Default for NotesParser {
    fn default() -> Self {
        Self::new()
    }
}

/// The `---` delimited block at the top of the file, or the whole content.
fn front_matter(content: &str) -> &str {
    let trimmed = content.trim_start();
    let Some(rest) = trimmed.strip_prefix("---") else {
        return content;
    };
    match rest.find("\n---") {
        Some(end) => &rest[..end],
        None => content,
    }
}

fn yaml_field(block: &str, key: &str) -> Option<String> {
    block.lines().find_map(|line| {
        let value = line.trim_start().strip_prefix(key)?.trim_start().strip_prefix(':')?;
        let value = match value.find(" #") {
            Some(idx) => &value[..idx],
            None => value,
        };
        let value = value.trim().trim_matches('"').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn blockquote_text(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix('>').map(str::trim)
}

fn is_template(text: &str) -> bool {
    TEMPLATE_MARKERS.iter().any(|m| text.contains(m))
}

/// The assessment inside the `> [!tip]` callout, else the first substantial blockquote.
fn one_liner(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();

    if let Some(start) = lines
        .iter()
        .position(|l| blockquote_text(l).is_some_and(|t| t.to_lowercase().starts_with("[!tip]")))
    {
        let text = lines[start + 1..]
            .iter()
            .map_while(|l| blockquote_text(l))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() && !is_template(&text) {
            return text;
        }
    }

    lines
        .iter()
        .filter_map(|l| blockquote_text(l))
        .filter(|t| !t.starts_with("[!"))
        .find(|t| t.chars().count() > MIN_ONE_LINER_CHARS && !is_template(t))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Bullets under the first line starting with `heading`.
fn bullet_list(content: &str, heading: &str) -> Vec<String> {
    let mut lines = content.lines().skip_while(|l| !l.trim_start().starts_with(heading));
    if lines.next().is_none() {
        return Vec::new();
    }
    lines
        .skip_while(|l| l.trim().is_empty())
        .map_while(|l| l.trim_start().strip_prefix('-'))
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// A creator folder ready for analysis.
#[derive(Debug, Clone)]
pub struct CreatorFolder {
    pub root: PathBuf,
    pub notes_path: PathBuf,
    pub profile: CreatorProfile,
    /// Videos in the folder, sorted by name, with the creator as author.
    pub videos: Vec<MediaFile>,
}

impl CreatorFolder {
    /// Scan `root` for a notes file and at least one video.
    pub fn scan(root: &Path, parser: &NotesParser) -> Result<Self> {
        if !root.is_dir() {
            return Err(CompassError::CreatorNotes(format!(
                "Not a directory: {}",
                root.display()
            )));
        }

        let mut candidates: Vec<PathBuf> = std::fs::read_dir(root)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| parser.is_notes_file(p))
            .collect();
        candidates.sort();
        let notes_path = candidates.into_iter().next().ok_or_else(|| {
            CompassError::CreatorNotes(format!(
                "No notes file (Creator - <name>.md) in {}",
                root.display()
            ))
        })?;

        let profile = parser.parse_file(&notes_path)?;
        let videos: Vec<MediaFile> = list_media(root, None)?
            .into_iter()
            .filter(MediaFile::is_video)
            .map(|v| v.with_author(profile.name.clone()))
            .collect();

        if videos.is_empty() {
            return Err(CompassError::CreatorNotes(format!(
                "No video files in {}",
                root.display()
            )));
        }

        info!("Found {} videos for {}", videos.len(), profile.name);
        Ok(Self {
            root: root.to_path_buf(),
            notes_path,
            profile,
            videos,
        })
    }

    /// Whether `root` looks like a creator folder, without parsing it.
    pub fn looks_like(root: &Path, parser: &NotesParser) -> bool {
        std::fs::read_dir(root)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .any(|e| parser.is_notes_file(&e.path()))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTES: &str = r#"---
platform: "YouTube"
niche: ""   # fill in later
follower_count: 120k
status: contacted
profile_url: https://example.com/@ava
---

# Ava

| Field | Value |
| --- | --- |
| **Slogan** | Coffee without the snobbery |
| **Audience** | Home baristas on a budget |

> [!tip] One-line assessment
> Makes specialty coffee feel approachable,
> with honest gear tests.

## Fit

**[✅] Strengths**
- Consistent weekly uploads
- Transparent sponsorships

**[❓] Risks**

- Small audience outside North America
"#;

    fn parse() -> CreatorProfile {
        NotesParser::new().parse("Creator - Ava", NOTES)
    }

    #[test]
    fn test_front_matter_fields() {
        let profile = parse();
        assert_eq!(profile.name, "Ava");
        assert_eq!(profile.platform, "YouTube");
        assert_eq!(profile.follower_count, "120k");
        assert_eq!(profile.status, "contacted");
        assert_eq!(profile.profile_url, "https://example.com/@ava");
    }

    #[test]
    fn test_table_fields_fill_gaps() {
        let profile = parse();
        assert_eq!(profile.niche, "Home baristas on a budget");
        assert_eq!(profile.slogan, "Coffee without the snobbery");
    }

    #[test]
    fn test_one_liner_and_lists() {
        let profile = parse();
        assert_eq!(
            profile.one_liner,
            "Makes specialty coffee feel approachable, with honest gear tests."
        );
        assert_eq!(
            profile.strengths,
            vec!["Consistent weekly uploads", "Transparent sponsorships"]
        );
        assert_eq!(profile.risks, vec!["Small audience outside North America"]);
    }

    #[test]
    fn test_legacy_file_name_and_template_callout() {
        let content = "> [!tip] 一句话核心评估\n> 在这里用一句话总结为什么这位博主是我们的潜在合作伙伴\n\n> 真实测评，数据说话，粉丝信任度很高\n";
        let profile = NotesParser::new().parse("人物 - 小王", content);
        assert_eq!(profile.name, "小王");
        assert_eq!(profile.one_liner, "真实测评，数据说话，粉丝信任度很高");
        assert!(profile.strengths.is_empty());
    }

    #[test]
    fn test_is_notes_file() {
        let parser = NotesParser::new();
        assert!(parser.is_notes_file(Path::new("/x/Creator - Ava.md")));
        assert!(parser.is_notes_file(Path::new("/x/人物 - 小王.md")));
        assert!(!parser.is_notes_file(Path::new("/x/Ava.md")));
        assert!(!parser.is_notes_file(Path::new("/x/Creator - Ava.txt")));
    }

    #[test]
    fn test_scan_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Creator - Ava.md"), NOTES).unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"").unwrap();
        std::fs::write(dir.path().join("a.mov"), b"").unwrap();
        std::fs::write(dir.path().join("voice.mp3"), b"").unwrap();

        let parser = NotesParser::new();
        assert!(CreatorFolder::looks_like(dir.path(), &parser));

        let folder = CreatorFolder::scan(dir.path(), &parser).unwrap();
        assert_eq!(folder.profile.name, "Ava");
        let titles: Vec<_> = folder.videos.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(folder.videos[0].author.as_deref(), Some("Ava"));
    }

    #[test]
    fn test_scan_requires_videos() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Creator - Ava.md"), NOTES).unwrap();
        assert!(matches!(
            CreatorFolder::scan(dir.path(), &NotesParser::new()),
            Err(CompassError::CreatorNotes(_))
        ));
    }

    #[test]
    fn test_material_lists_transcripts() {
        let material = parse().material(&[("Espresso".to_string(), "Pull a shot.".to_string())]);
        assert!(material.contains("- Niche: Home baristas on a budget"));
        assert!(material.contains("- Risk: Small audience outside North America"));
        assert!(material.contains("【Espresso】Pull a shot."));
    }
}
