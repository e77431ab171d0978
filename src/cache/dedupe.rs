//! Detection of the same video cached under two fingerprints.
//!
//! Older runs keyed transcripts by the extracted audio file
//! (`<stem>_audio.mp3`) instead of the video. When both entries exist for one
//! video, the derived-audio entry is redundant. Matching is by transcript
//! length and file stem only, so it is a best-effort cleanup.

use super::record::{CacheRecord, Fingerprint};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// Outcome of a dedupe pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupeReport {
    /// Fingerprints of the removed derived-audio entries.
    pub removed: Vec<Fingerprint>,
    /// Entries left in the index.
    pub kept: usize,
    /// Entries in the index before the pass.
    pub total_before: usize,
}

fn derived_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_audio(_compressed)?\..*$").expect("Invalid regex"))
}

fn video_extension() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\.(mp4|mov|avi|mkv|flv|wmv|webm|m4v)$").expect("Invalid regex")
    })
}

/// Stem shared by a source video and the audio extracted from it.
pub(crate) fn logical_stem(record: &CacheRecord) -> String {
    let name = record.origin.name();
    if record.origin.is_source() {
        video_extension().replace(name, "").into_owned()
    } else {
        derived_suffix().replace(name, "").into_owned()
    }
}

/// Pick the derived entries that duplicate a source entry.
///
/// `blob_exists` is consulted for the source entry; a derived entry is only
/// selected when the source copy is still readable.
pub(crate) fn redundant_entries(
    index: &BTreeMap<Fingerprint, CacheRecord>,
    blob_exists: impl Fn(&Fingerprint) -> bool,
) -> Vec<Fingerprint> {
    let mut groups: HashMap<usize, Vec<(&Fingerprint, &CacheRecord)>> = HashMap::new();
    for (key, record) in index {
        groups.entry(record.text_length).or_default().push((key, record));
    }

    let mut redundant = Vec::new();
    for entries in groups.values() {
        let source_stems: Vec<String> = entries
            .iter()
            .filter(|(key, record)| record.origin.is_source() && blob_exists(key))
            .map(|(_, record)| logical_stem(record))
            .collect();
        if source_stems.is_empty() {
            continue;
        }

        redundant.extend(
            entries
                .iter()
                .filter(|(_, record)| !record.origin.is_source())
                .filter(|(_, record)| source_stems.contains(&logical_stem(record)))
                .map(|(key, _)| (*key).clone()),
        );
    }
    redundant.sort();
    redundant
}
