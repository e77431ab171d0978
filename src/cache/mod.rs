//! Content-addressed transcript cache.
//!
//! Transcripts are stored as `<fingerprint>.txt` blobs next to an
//! `index.json` that maps each fingerprint to its metadata. The index and the
//! blobs can drift apart (a killed process, manual deletion); a read that finds
//! an index entry without a readable blob removes the entry and reports a miss.
//!
//! Writes go through a temporary file in the cache directory that is then
//! renamed over the target. Concurrent writers on one directory are
//! last-write-wins on the index.

mod dedupe;
mod record;

pub use dedupe::DedupeReport;
pub use record::{CacheRecord, CachedTranscript, EntryMetadata, EntryOrigin, Fingerprint};

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

const INDEX_FILE: &str = "index.json";

/// Hard I/O failures of the cache. Inconsistencies never surface as errors.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cannot create cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot fingerprint {path}: {source}")]
    Fingerprint {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot serialize cache index: {0}")]
    Serialize(#[from] serde_json::Error),
}

type CacheResult<T> = std::result::Result<T, CacheError>;

/// Summary of the cache contents.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub entry_count: usize,
    /// Blob files on disk, including orphans without an index entry.
    pub blob_count: usize,
    pub source_entries: usize,
    pub derived_entries: usize,
    /// Bytes used by blobs and the index.
    pub total_size_bytes: u64,
    pub cache_dir: PathBuf,
}

/// Transcript cache rooted at one directory.
pub struct TranscriptCache {
    dir: PathBuf,
    index: BTreeMap<Fingerprint, CacheRecord>,
}

impl TranscriptCache {
    /// Open (creating if needed) the cache in `dir` and load its index.
    pub fn open(dir: impl Into<PathBuf>) -> CacheResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| CacheError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let mut cache = Self {
            dir,
            index: BTreeMap::new(),
        };
        cache.load();
        Ok(cache)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reload the index from disk. A missing or unreadable index yields an empty
    /// cache; individual records that fail to parse are skipped.
    pub fn load(&mut self) {
        let path = self.index_path();
        self.index = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<Fingerprint, serde_json::Value>>(&content) {
                Ok(raw) => Self::parse_records(raw),
                Err(e) => {
                    warn!("Ignoring unreadable cache index {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Cannot read cache index {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        debug!("Loaded {} cache entries from {}", self.index.len(), self.dir.display());
    }

    fn parse_records(
        raw: BTreeMap<Fingerprint, serde_json::Value>,
    ) -> BTreeMap<Fingerprint, CacheRecord> {
        raw.into_iter()
            .filter_map(|(key, value)| match serde_json::from_value::<CacheRecord>(value) {
                Ok(record) => Some((key, record)),
                Err(e) => {
                    warn!("Skipping malformed cache record {}: {}", key, e);
                    None
                }
            })
            .collect()
    }

    /// Write the in-memory index to disk.
    pub fn flush(&self) -> CacheResult<()> {
        let json = serde_json::to_string_pretty(&self.index)?;
        self.write_atomic(&self.index_path(), json.as_bytes())
    }

    /// Fingerprint a file by its resolved absolute path and size.
    pub fn fingerprint(path: &Path) -> CacheResult<Fingerprint> {
        let to_error = |source| CacheError::Fingerprint {
            path: path.to_path_buf(),
            source,
        };
        let resolved = path.canonicalize().map_err(to_error)?;
        let size = std::fs::metadata(&resolved).map_err(to_error)?.len();
        Ok(Fingerprint::from_parts(&resolved, size))
    }

    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.index.contains_key(key)
    }

    /// Look up a transcript. Never fails; inconsistent entries are dropped and count as a miss.
    pub fn get(&mut self, key: &Fingerprint) -> Option<CachedTranscript> {
        let record = self.index.get(key)?.clone();
        let blob = self.blob_path(key);

        match std::fs::read_to_string(&blob) {
            Ok(text) => {
                info!(
                    "Cache hit for {} (cached {})",
                    record.origin.name(),
                    record.created_at.format("%Y-%m-%d %H:%M:%S")
                );
                Some(CachedTranscript { text, record })
            }
            Err(e) => {
                warn!(
                    "Dropping cache entry {} for {}: blob unreadable ({})",
                    key,
                    record.origin.name(),
                    e
                );
                if let Err(e) = self.remove(key) {
                    warn!("Failed to drop cache entry {}: {}", key, e);
                }
                None
            }
        }
    }

    /// Store a transcript, overwriting any existing entry for `key`.
    pub fn put(&mut self, key: &Fingerprint, text: &str, metadata: EntryMetadata) -> CacheResult<()> {
        let blob = self.blob_path(key);
        self.write_atomic(&blob, text.as_bytes())?;

        let record = CacheRecord::new(metadata, text, &blob);
        let name = record.origin.name().to_string();
        let previous = self.index.insert(key.clone(), record);

        if let Err(e) = self.flush() {
            match previous {
                Some(previous) => self.index.insert(key.clone(), previous),
                None => self.index.remove(key),
            };
            return Err(e);
        }

        info!("Cached transcript for {} ({} chars)", name, text.chars().count());
        Ok(())
    }

    /// Remove an entry and its blob. Returns whether anything was removed.
    pub fn remove(&mut self, key: &Fingerprint) -> CacheResult<bool> {
        let removed_blob = self.remove_blob(key)?;
        let removed_entry = self.index.remove(key).is_some();
        if removed_entry {
            self.flush()?;
        }
        Ok(removed_blob || removed_entry)
    }

    /// Remove every blob and empty the index. Returns the number of blobs deleted.
    pub fn clear(&mut self) -> CacheResult<usize> {
        let mut removed = 0;
        for blob in self.blob_files() {
            std::fs::remove_file(&blob).map_err(|source| CacheError::Remove {
                path: blob.clone(),
                source,
            })?;
            removed += 1;
        }
        self.index.clear();
        self.flush()?;
        info!("Cleared {} cached transcripts", removed);
        Ok(removed)
    }

    pub fn stats(&self) -> CacheStats {
        let blobs = self.blob_files();
        let total_size_bytes: u64 = blobs
            .iter()
            .chain(std::iter::once(&self.index_path()))
            .filter_map(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .sum();
        let source_entries = self.index.values().filter(|r| r.origin.is_source()).count();

        CacheStats {
            entry_count: self.index.len(),
            blob_count: blobs.len(),
            source_entries,
            derived_entries: self.index.len() - source_entries,
            total_size_bytes,
            cache_dir: self.dir.clone(),
        }
    }

    /// Drop derived-audio entries that duplicate a readable source entry.
    pub fn dedupe(&mut self) -> CacheResult<DedupeReport> {
        let total_before = self.index.len();
        let redundant = dedupe::redundant_entries(&self.index, |key| self.blob_path(key).is_file());

        for key in &redundant {
            if let Some(record) = self.index.get(key) {
                info!("Removing duplicate cache entry for {}", record.origin.name());
            }
            self.remove_blob(key)?;
            self.index.remove(key);
        }
        if !redundant.is_empty() {
            self.flush()?;
        }

        Ok(DedupeReport {
            removed: redundant,
            kept: self.index.len(),
            total_before,
        })
    }

    /// Iterate over index entries in fingerprint order.
    pub fn entries(&self) -> impl Iterator<Item = (&Fingerprint, &CacheRecord)> {
        self.index.iter()
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    fn blob_path(&self, key: &Fingerprint) -> PathBuf {
        self.dir.join(key.blob_name())
    }

    fn remove_blob(&self, key: &Fingerprint) -> CacheResult<bool> {
        let path = self.blob_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Remove { path, source }),
        }
    }

    fn blob_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
            .collect()
    }

    fn write_atomic(&self, target: &Path, contents: &[u8]) -> CacheResult<()> {
        let to_error = |source| CacheError::Write {
            path: target.to_path_buf(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(to_error)?;
        tmp.write_all(contents).map_err(to_error)?;
        tmp.flush().map_err(to_error)?;
        tmp.persist(target).map_err(|e| to_error(e.error))?;
        Ok(())
    }
}
