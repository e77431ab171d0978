//! Index records and fingerprints for the transcript cache.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Stable cache key for a file: SHA-256 of its resolved path and byte size.
///
/// Modification time is left out on purpose; it changes spuriously between
/// accesses to the same file. Two files that share a path and size over time
/// collide, which is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint from an already resolved path and size.
    pub fn from_parts(resolved: &Path, size: u64) -> Self {
        let digest = Sha256::digest(format!("{}_{}", resolved.display(), size).as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the blob holding this entry's transcript.
    pub fn blob_name(&self) -> String {
        format!("{}.txt", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What file an entry was keyed by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryOrigin {
    /// The video or audio file the user supplied.
    Source {
        source_file: String,
        source_name: String,
    },
    /// Audio extracted from a source (older entries were keyed this way).
    DerivedAudio { file_path: String, file_name: String },
}

impl EntryOrigin {
    pub fn source(path: &Path) -> Self {
        Self::Source {
            source_file: path.display().to_string(),
            source_name: file_name(path),
        }
    }

    pub fn derived_audio(path: &Path) -> Self {
        Self::DerivedAudio {
            file_path: path.display().to_string(),
            file_name: file_name(path),
        }
    }

    /// File name of the originating file.
    pub fn name(&self) -> &str {
        match self {
            Self::Source { source_name, .. } => source_name,
            Self::DerivedAudio { file_name, .. } => file_name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Source { source_file, .. } => source_file,
            Self::DerivedAudio { file_path, .. } => file_path,
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source { .. })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Metadata supplied with a transcript when it is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryMetadata {
    pub origin: EntryOrigin,
    pub duration: f64,
    pub confidence: f64,
}

/// One entry of `index.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    #[serde(flatten)]
    pub origin: EntryOrigin,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub confidence: f64,
    /// Transcript length in characters.
    pub text_length: usize,
    pub created_at: NaiveDateTime,
    /// Path of the blob at the time the entry was written.
    pub cache_file: String,
}

impl CacheRecord {
    pub(crate) fn new(metadata: EntryMetadata, text: &str, blob: &Path) -> Self {
        Self {
            origin: metadata.origin,
            duration: metadata.duration,
            confidence: metadata.confidence,
            text_length: text.chars().count(),
            created_at: Local::now().naive_local(),
            cache_file: blob.display().to_string(),
        }
    }
}

/// A transcript served from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTranscript {
    pub text: String,
    pub record: CacheRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_depends_on_path_and_size() {
        let a = Fingerprint::from_parts(Path::new("/videos/a.mp4"), 100);
        assert_eq!(a, Fingerprint::from_parts(Path::new("/videos/a.mp4"), 100));
        assert_ne!(a, Fingerprint::from_parts(Path::new("/videos/a.mp4"), 101));
        assert_ne!(a, Fingerprint::from_parts(Path::new("/videos/b.mp4"), 100));
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(a.blob_name(), format!("{}.txt", a));
    }

    #[test]
    fn test_index_record_formats() {
        let json = r#"{
            "source_file": "/videos/Ava - Espresso.mp4",
            "source_name": "Ava - Espresso.mp4",
            "duration": 312.5,
            "confidence": 0.91,
            "text_length": 4200,
            "created_at": "2024-05-01T10:20:30.123456",
            "cache_file": "/cache/abc.txt"
        }"#;
        let record: CacheRecord = serde_json::from_str(json).unwrap();
        assert!(record.origin.is_source());
        assert_eq!(record.origin.name(), "Ava - Espresso.mp4");

        let json = r#"{
            "file_name": "Espresso_audio.mp3",
            "file_path": "/tmp/Espresso_audio.mp3",
            "duration": 0.0,
            "confidence": 0.0,
            "text_length": 4200,
            "created_at": "2024-05-01T10:20:30",
            "cache_file": "/cache/def.txt"
        }"#;
        let record: CacheRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.origin,
            EntryOrigin::DerivedAudio {
                file_path: "/tmp/Espresso_audio.mp3".to_string(),
                file_name: "Espresso_audio.mp3".to_string(),
            }
        );

        let written = serde_json::to_value(&record).unwrap();
        assert_eq!(written["file_name"], "Espresso_audio.mp3");
        assert!(written.get("origin").is_none());
    }
}
