//! Local media files: detection, metadata and folder listing.

use crate::error::{CompassError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "opus", "m4a"];

/// Supported video file extensions (audio will be extracted).
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "flv", "wmv", "m4v"];

/// Kind of media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Detect the media kind from the file extension.
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Audio)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// A local media file queued for analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    pub kind: MediaKind,
    /// Title, the file stem unless overridden.
    pub title: String,
    /// Creator name, when known from context.
    pub author: Option<String>,
}

impl MediaFile {
    /// Validate `path` as a supported media file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CompassError::NotFound(path.display().to_string()));
        }

        let kind = MediaKind::detect(path).ok_or_else(|| {
            CompassError::InvalidInput(format!(
                "Not a recognized audio or video file: {} (supported: {}, {})",
                path.display(),
                VIDEO_EXTENSIONS.join(", "),
                AUDIO_EXTENSIONS.join(", ")
            ))
        })?;

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            title,
            author: None,
        })
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// List the media files directly inside `dir`, sorted by file name.
pub fn list_media(dir: &Path, limit: Option<usize>) -> Result<Vec<MediaFile>> {
    if !dir.is_dir() {
        return Err(CompassError::InvalidInput(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && MediaKind::detect(p).is_some())
        .collect();
    paths.sort();

    paths
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|p| MediaFile::open(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        assert_eq!(MediaKind::detect(Path::new("audio.mp3")), Some(MediaKind::Audio));
        assert_eq!(MediaKind::detect(Path::new("audio.WAV")), Some(MediaKind::Audio));
        assert_eq!(MediaKind::detect(Path::new("video.MKV")), Some(MediaKind::Video));
        assert_eq!(MediaKind::detect(Path::new("notes.md")), None);
        assert_eq!(MediaKind::detect(Path::new("no_extension")), None);
    }

    #[test]
    fn test_open_validates() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("Espresso Basics.mp4");
        std::fs::write(&video, b"").unwrap();
        let notes = dir.path().join("notes.pdf");
        std::fs::write(&notes, b"").unwrap();

        let media = MediaFile::open(&video).unwrap().with_author("Ava");
        assert_eq!(media.title, "Espresso Basics");
        assert_eq!(media.author.as_deref(), Some("Ava"));
        assert!(media.is_video());

        assert!(matches!(MediaFile::open(&notes), Err(CompassError::InvalidInput(_))));
        assert!(matches!(
            MediaFile::open(&dir.path().join("missing.mp4")),
            Err(CompassError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_media_sorted_and_limited() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp4", "a.mp3", "c.mov", "Creator - Ava.md"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let all = list_media(dir.path(), None).unwrap();
        let names: Vec<_> = all.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        assert_eq!(list_media(dir.path(), Some(2)).unwrap().len(), 2);
    }
}
