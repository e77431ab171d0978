//! Transcript cache behaviour on a real directory.

use creator_compass::cache::{EntryMetadata, EntryOrigin, TranscriptCache};
use std::path::Path;
use tempfile::TempDir;

fn media(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn metadata(origin: EntryOrigin) -> EntryMetadata {
    EntryMetadata {
        origin,
        duration: 61.5,
        confidence: 0.92,
    }
}

fn blob_count(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "txt"))
        .count()
}

#[test]
fn entries_survive_reopening() {
    let media_dir = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let video = media(&media_dir, "espresso.mp4", b"video bytes");
    let key = TranscriptCache::fingerprint(&video).unwrap();

    {
        let mut cache = TranscriptCache::open(cache_dir.path()).unwrap();
        cache
            .put(&key, "Grind finer, then taste.", metadata(EntryOrigin::source(&video)))
            .unwrap();
    }

    let mut reopened = TranscriptCache::open(cache_dir.path()).unwrap();
    let hit = reopened.get(&key).unwrap();
    assert_eq!(hit.text, "Grind finer, then taste.");
    assert_eq!(hit.record.text_length, 24);
    assert_eq!(hit.record.origin.name(), "espresso.mp4");
    assert_eq!(hit.record.confidence, 0.92);
}

#[test]
fn fingerprint_tracks_path_and_size() {
    let media_dir = tempfile::tempdir().unwrap();
    let video = media(&media_dir, "clip.mp4", b"12345");
    let first = TranscriptCache::fingerprint(&video).unwrap();
    assert_eq!(first, TranscriptCache::fingerprint(&video).unwrap());

    std::fs::write(&video, b"123456").unwrap();
    assert_ne!(first, TranscriptCache::fingerprint(&video).unwrap());
}

#[test]
fn deleted_blob_heals_on_read() {
    let media_dir = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let video = media(&media_dir, "latte.mp4", b"video");
    let key = TranscriptCache::fingerprint(&video).unwrap();

    let mut cache = TranscriptCache::open(cache_dir.path()).unwrap();
    cache.put(&key, "Steam the milk.", metadata(EntryOrigin::source(&video))).unwrap();
    std::fs::remove_file(cache_dir.path().join(key.blob_name())).unwrap();

    assert!(cache.get(&key).is_none());
    assert!(!cache.contains(&key));

    let reopened = TranscriptCache::open(cache_dir.path()).unwrap();
    assert!(!reopened.contains(&key));
}

#[test]
fn dedupe_keeps_source_copy_only() {
    let media_dir = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let video = media(&media_dir, "pour-over.mp4", b"video");
    let audio = media(&media_dir, "pour-over_audio.mp3", b"audio");
    let other = media(&media_dir, "cold-brew_audio.mp3", b"other audio");
    let text = "Bloom for thirty seconds.";

    let mut cache = TranscriptCache::open(cache_dir.path()).unwrap();
    let video_key = TranscriptCache::fingerprint(&video).unwrap();
    let audio_key = TranscriptCache::fingerprint(&audio).unwrap();
    let other_key = TranscriptCache::fingerprint(&other).unwrap();
    cache.put(&video_key, text, metadata(EntryOrigin::source(&video))).unwrap();
    cache.put(&audio_key, text, metadata(EntryOrigin::derived_audio(&audio))).unwrap();
    cache
        .put(&other_key, "Steep overnight.", metadata(EntryOrigin::derived_audio(&other)))
        .unwrap();

    let report = cache.dedupe().unwrap();
    assert_eq!(report.removed, vec![audio_key.clone()]);
    assert_eq!(report.total_before, 3);
    assert_eq!(report.kept, 2);
    assert!(cache.contains(&video_key));
    assert!(cache.contains(&other_key));
    assert_eq!(blob_count(cache_dir.path()), 2);

    // A second pass finds nothing left to remove.
    assert!(cache.dedupe().unwrap().removed.is_empty());
}

#[test]
fn remove_and_clear() {
    let media_dir = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let a = media(&media_dir, "a.mp3", b"a");
    let b = media(&media_dir, "b.mp3", b"bb");
    let a_key = TranscriptCache::fingerprint(&a).unwrap();
    let b_key = TranscriptCache::fingerprint(&b).unwrap();

    let mut cache = TranscriptCache::open(cache_dir.path()).unwrap();
    cache.put(&a_key, "first", metadata(EntryOrigin::source(&a))).unwrap();
    cache.put(&b_key, "second", metadata(EntryOrigin::source(&b))).unwrap();

    assert!(cache.remove(&a_key).unwrap());
    assert!(!cache.remove(&a_key).unwrap());
    assert_eq!(cache.stats().entry_count, 1);

    assert_eq!(cache.clear().unwrap(), 1);
    let stats = cache.stats();
    assert_eq!(stats.entry_count, 0);
    assert_eq!(stats.blob_count, 0);
}
