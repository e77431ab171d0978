//! Pipeline orchestrator for Creator Compass.
//!
//! Coordinates the process from media file to report: cache lookup, audio
//! extraction, transcription, analysis and report writing.

use crate::analysis::{AnalysisRecord, ContentAnalyzer, ContentRequest};
use crate::audio::{extract_audio, extracted_audio_path};
use crate::cache::{EntryMetadata, EntryOrigin, Fingerprint, TranscriptCache};
use crate::config::{Prompts, Settings};
use crate::creator::{CreatorFolder, CreatorProfile, NotesParser};
use crate::error::{CompassError, Result};
use crate::media::MediaFile;
use crate::report::{total_duration, ReportMeta, ReportWriter, VideoSummary};
use crate::transcription::{Transcriber, TranscriptResult, WhisperTranscriber};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// The main orchestrator for the Creator Compass pipeline.
pub struct Orchestrator {
    settings: Settings,
    transcriber: Arc<dyn Transcriber>,
    analyzer: ContentAnalyzer,
    cache: Option<Mutex<TranscriptCache>>,
    reports: ReportWriter,
    notes: NotesParser,
    temp_dir: PathBuf,
}

impl Orchestrator {
    /// Create an orchestrator from settings, using Whisper and the configured LLM.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let transcriber: Arc<dyn Transcriber> =
            Arc::new(WhisperTranscriber::new(&settings.transcription)?);
        let analyzer = ContentAnalyzer::from_settings(&settings.llm, &settings.outreach, prompts)?;

        let cache = if settings.cache.enabled {
            match TranscriptCache::open(settings.cache_dir()) {
                Ok(cache) => Some(cache),
                Err(e) => {
                    warn!("Transcript cache unavailable, continuing without it: {}", e);
                    None
                }
            }
        } else {
            info!("Transcript cache disabled");
            None
        };

        Self::with_components(settings, transcriber, analyzer, cache)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        transcriber: Arc<dyn Transcriber>,
        analyzer: ContentAnalyzer,
        cache: Option<TranscriptCache>,
    ) -> Result<Self> {
        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;
        let reports = ReportWriter::new(settings.output_dir(), settings.transcripts_dir());

        Ok(Self {
            settings,
            transcriber,
            analyzer,
            cache: cache.map(Mutex::new),
            reports,
            notes: NotesParser::new(),
            temp_dir,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn lock_cache(&self) -> Option<MutexGuard<'_, TranscriptCache>> {
        self.cache
            .as_ref()
            .map(|c| c.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    fn fingerprint(&self, path: &Path) -> Option<Fingerprint> {
        self.cache.as_ref()?;
        match TranscriptCache::fingerprint(path) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!("Skipping cache for {}: {}", path.display(), e);
                None
            }
        }
    }

    fn cache_get(&self, key: &Fingerprint) -> Option<TranscriptResult> {
        let hit = self.lock_cache()?.get(key)?;
        Some(TranscriptResult {
            text: hit.text,
            confidence: hit.record.confidence,
            duration_seconds: hit.record.duration,
        })
    }

    fn cache_put(&self, key: &Fingerprint, source: &Path, transcript: &TranscriptResult) {
        let Some(mut cache) = self.lock_cache() else {
            return;
        };
        let metadata = EntryMetadata {
            origin: EntryOrigin::source(source),
            duration: transcript.duration_seconds,
            confidence: transcript.confidence,
        };
        if let Err(e) = cache.put(key, &transcript.text, metadata) {
            warn!("Failed to cache transcript for {}: {}", source.display(), e);
        }
    }

    /// Transcribe a media file, serving from the cache when possible.
    ///
    /// Returns the transcript and whether it came from the cache. Entries that
    /// were written under the extracted audio file are promoted to the source
    /// file's key on first use.
    #[instrument(skip(self, media), fields(path = %media.path.display()))]
    pub async fn transcribe_media(&self, media: &MediaFile) -> Result<(TranscriptResult, bool)> {
        let source_key = self.fingerprint(&media.path);

        if let Some(key) = &source_key {
            if let Some(hit) = self.cache_get(key) {
                return Ok((hit, true));
            }
        }

        let derived = extracted_audio_path(&media.path, &self.temp_dir);
        if media.is_video() && derived.is_file() {
            let legacy = self
                .fingerprint(&derived)
                .and_then(|key| self.cache_get(&key));
            if let Some(hit) = legacy {
                info!("Promoting cached transcript of extracted audio to {}", media.title);
                if let Some(key) = &source_key {
                    self.cache_put(key, &media.path, &hit);
                }
                return Ok((hit, true));
            }
        }

        let audio = if media.is_video() {
            eprintln!("  Extracting audio...");
            extract_audio(&media.path, &self.temp_dir).await?
        } else {
            media.path.clone()
        };

        eprintln!("  Transcribing {}...", media.title);
        let result = self.transcriber.transcribe(&audio).await;

        if media.is_video() {
            if let Err(e) = std::fs::remove_file(&audio) {
                warn!("Failed to clean up extracted audio: {}", e);
            }
        }

        let transcript = result?;
        if transcript.text.trim().is_empty() {
            return Err(CompassError::Transcription(format!(
                "No speech recognised in {}",
                media.path.display()
            )));
        }

        if let Some(key) = &source_key {
            self.cache_put(key, &media.path, &transcript);
        }
        Ok((transcript, false))
    }

    /// Analyze a single audio or video file and write its report.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn analyze_file(&self, path: &Path) -> Result<VideoOutcome> {
        let media = MediaFile::open(path)?;
        self.analyze_media(media).await
    }

    /// Analyze an already opened media file and write its report.
    pub async fn analyze_media(&self, media: MediaFile) -> Result<VideoOutcome> {
        let (transcript, from_cache) = self.transcribe_media(&media).await?;
        let meta = ReportMeta::new(
            media.author.as_deref(),
            &media.title,
            transcript.duration_seconds,
            &media.kind.to_string(),
        );
        let transcript_path = self.reports.save_transcript(&meta, &transcript.text);

        eprintln!("  Analyzing...");
        let record = self
            .analyzer
            .analyze_content(&ContentRequest {
                title: &media.title,
                author: media.author.as_deref(),
                transcript: &transcript.text,
            })
            .await?;

        let report_path = self.reports.write_video_report(&meta, &record)?;

        Ok(VideoOutcome {
            media,
            record,
            report_path,
            transcript_path,
            duration_seconds: transcript.duration_seconds,
            from_cache,
        })
    }

    /// Analyze a creator folder: analyze every video, then produce one brief
    /// from the notes and all transcripts.
    ///
    /// Videos that fail to transcribe or analyze are logged and skipped. The
    /// folder fails only when no video made it through.
    #[instrument(skip(self), fields(folder = %dir.display()))]
    pub async fn analyze_creator_folder(&self, dir: &Path) -> Result<CreatorOutcome> {
        let folder = CreatorFolder::scan(dir, &self.notes)?;
        let total = folder.videos.len();
        eprintln!("  Creator: {} ({} videos)", folder.profile.name, total);

        let mut transcripts: Vec<(String, String)> = Vec::with_capacity(total);
        let mut videos: Vec<VideoSummary> = Vec::with_capacity(total);
        let mut skipped = Vec::new();

        for (idx, video) in folder.videos.iter().enumerate() {
            eprintln!("  [{}/{}] {}", idx + 1, total, video.title);
            match self.analyze_folder_video(video).await {
                Ok((summary, text)) => {
                    transcripts.push((video.title.clone(), text));
                    videos.push(summary);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", video.title, e);
                    skipped.push((video.title.clone(), e.to_string()));
                }
            }
        }

        if videos.is_empty() {
            return Err(CompassError::Analysis(format!(
                "All {} videos of {} failed",
                total, folder.profile.name
            )));
        }

        eprintln!("  Analyzing creator...");
        let material = folder.profile.material(&transcripts);
        let record = self
            .analyzer
            .analyze_creator(&folder.profile.name, &material)
            .await?;

        let report_path = self
            .reports
            .write_creator_brief(&folder.profile, &record, &videos)?;

        Ok(CreatorOutcome {
            profile: folder.profile,
            record,
            report_path,
            videos,
            skipped,
        })
    }

    /// Transcribe and analyze one video of a creator folder.
    async fn analyze_folder_video(&self, video: &MediaFile) -> Result<(VideoSummary, String)> {
        let (transcript, _) = self.transcribe_media(video).await?;
        let meta = ReportMeta::new(
            video.author.as_deref(),
            &video.title,
            transcript.duration_seconds,
            "creator folder",
        );
        self.reports.save_transcript(&meta, &transcript.text);

        let record = self
            .analyzer
            .analyze_content(&ContentRequest {
                title: &video.title,
                author: video.author.as_deref(),
                transcript: &transcript.text,
            })
            .await?;

        let summary = VideoSummary::from_record(&video.title, transcript.duration_seconds, &record);
        Ok((summary, transcript.text))
    }

    /// Analyze every creator folder directly under `dir`, one at a time.
    ///
    /// `delay` overrides `batch.delay_seconds` between jobs.
    pub async fn batch(
        &self,
        dir: &Path,
        limit: Option<usize>,
        delay: Option<Duration>,
    ) -> Result<BatchSummary> {
        let folders = self.creator_folders(dir)?;
        if folders.is_empty() {
            return Err(CompassError::InvalidInput(format!(
                "No creator folders found in {}",
                dir.display()
            )));
        }

        let delay = delay.unwrap_or(Duration::from_secs(self.settings.batch.delay_seconds));
        let jobs: Vec<PathBuf> = folders.into_iter().take(limit.unwrap_or(usize::MAX)).collect();
        info!("Batch of {} creator folders", jobs.len());

        let mut summary = BatchSummary::default();
        for (idx, folder) in jobs.iter().enumerate() {
            if idx > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            eprintln!("\n[{}/{}] {}", idx + 1, jobs.len(), folder.display());
            match self.analyze_creator_folder(folder).await {
                Ok(outcome) => summary.completed.push(outcome),
                Err(e) => {
                    warn!("Creator folder {} failed: {}", folder.display(), e);
                    summary.failed.push((folder.clone(), e.to_string()));
                }
            }
        }

        Ok(summary)
    }

    /// Subdirectories of `dir` that contain a notes file, sorted by name.
    fn creator_folders(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(CompassError::InvalidInput(format!(
                "Not a directory: {}",
                dir.display()
            )));
        }
        let mut folders: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir() && CreatorFolder::looks_like(p, &self.notes))
            .collect();
        folders.sort();
        Ok(folders)
    }
}

/// Result of analyzing one media file.
#[derive(Debug)]
pub struct VideoOutcome {
    pub media: MediaFile,
    pub record: AnalysisRecord,
    pub report_path: PathBuf,
    /// `None` when the transcript could not be saved.
    pub transcript_path: Option<PathBuf>,
    pub duration_seconds: f64,
    pub from_cache: bool,
}

/// Result of analyzing a creator folder.
#[derive(Debug)]
pub struct CreatorOutcome {
    pub profile: CreatorProfile,
    pub record: AnalysisRecord,
    pub report_path: PathBuf,
    /// Per-video summaries of the videos that made it into the brief.
    pub videos: Vec<VideoSummary>,
    /// Videos that failed, with the reason.
    pub skipped: Vec<(String, String)>,
}

impl CreatorOutcome {
    pub fn total_duration_seconds(&self) -> f64 {
        total_duration(&self.videos)
    }
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub completed: Vec<CreatorOutcome>,
    pub failed: Vec<(PathBuf, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ChatModel, ExtractionTier};
    use crate::config::OutreachSettings;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const NOTES: &str = "---\nplatform: YouTube\n---\n\n> [!tip] Assessment\n> Honest gear tests.\n";

    struct CountingTranscriber {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transcriber for CountingTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<TranscriptResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TranscriptResult {
                text: "Dial in the grinder before buying a new machine.".to_string(),
                confidence: 0.9,
                duration_seconds: 42.0,
            })
        }
    }

    struct JsonChat;

    #[async_trait]
    impl ChatModel for JsonChat {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(r#"{"content_style": "tutorial", "main_topics": ["grinders"],
                   "pain_points": ["wasted beans"]}"#
                .to_string())
        }
    }

    fn settings(root: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.data_dir = root.join("data").display().to_string();
        settings.general.temp_dir = root.join("tmp").display().to_string();
        settings.general.output_dir = root.join("out").display().to_string();
        settings.batch.delay_seconds = 0;
        settings
    }

    fn orchestrator(root: &TempDir) -> (Arc<CountingTranscriber>, Orchestrator) {
        let settings = settings(root.path());
        let transcriber = Arc::new(CountingTranscriber {
            calls: AtomicUsize::new(0),
        });
        let analyzer = ContentAnalyzer::new(
            Arc::new(JsonChat),
            &OutreachSettings::default(),
            Prompts::default(),
        );
        let cache = TranscriptCache::open(root.path().join("cache")).unwrap();
        let orchestrator =
            Orchestrator::with_components(settings, transcriber.clone(), analyzer, Some(cache))
                .unwrap();
        (transcriber, orchestrator)
    }

    fn seed_cache(orchestrator: &Orchestrator, path: &Path, origin: EntryOrigin, text: &str) {
        let key = TranscriptCache::fingerprint(path).unwrap();
        orchestrator
            .lock_cache()
            .unwrap()
            .put(
                &key,
                text,
                EntryMetadata {
                    origin,
                    duration: 10.0,
                    confidence: 0.8,
                },
            )
            .unwrap();
    }

    #[tokio::test]
    async fn test_audio_file_is_cached_after_first_run() {
        let root = tempfile::tempdir().unwrap();
        let audio = root.path().join("Espresso.mp3");
        std::fs::write(&audio, b"fake audio").unwrap();
        let (transcriber, orchestrator) = orchestrator(&root);

        let first = orchestrator.analyze_file(&audio).await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.record.tier, ExtractionTier::Structured);
        assert!(first.report_path.exists());
        assert!(first.transcript_path.is_some());

        let second = orchestrator.analyze_file(&audio).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_legacy_extracted_audio_entry_is_promoted() {
        let root = tempfile::tempdir().unwrap();
        let video = root.path().join("Latte Art.mp4");
        std::fs::write(&video, b"fake video").unwrap();
        let (transcriber, orchestrator) = orchestrator(&root);

        let derived = extracted_audio_path(&video, &orchestrator.temp_dir);
        std::fs::write(&derived, b"fake audio").unwrap();
        seed_cache(
            &orchestrator,
            &derived,
            EntryOrigin::derived_audio(&derived),
            "Pour from higher first.",
        );

        let media = MediaFile::open(&video).unwrap();
        let (transcript, from_cache) = orchestrator.transcribe_media(&media).await.unwrap();
        assert!(from_cache);
        assert_eq!(transcript.text, "Pour from higher first.");
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);

        let source_key = TranscriptCache::fingerprint(&video).unwrap();
        assert!(orchestrator.lock_cache().unwrap().contains(&source_key));
    }

    #[tokio::test]
    async fn test_creator_folder_from_cached_videos() {
        let root = tempfile::tempdir().unwrap();
        let folder = root.path().join("ava");
        std::fs::create_dir(&folder).unwrap();
        std::fs::write(folder.join("Creator - Ava.md"), NOTES).unwrap();
        let video = folder.join("grinders.mp4");
        std::fs::write(&video, b"fake video").unwrap();

        let second = folder.join("scales.mov");
        std::fs::write(&second, b"fake video, longer").unwrap();

        let (transcriber, orchestrator) = orchestrator(&root);
        seed_cache(
            &orchestrator,
            &video,
            EntryOrigin::source(&video),
            "Grinders matter more than machines.",
        );
        seed_cache(
            &orchestrator,
            &second,
            EntryOrigin::source(&second),
            "Weigh every dose.",
        );

        let outcome = orchestrator.analyze_creator_folder(&folder).await.unwrap();
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.profile.name, "Ava");
        assert!(outcome.skipped.is_empty());
        assert!(outcome.record.optimal_outreach_script.contains("Ava"));

        let titles: Vec<&str> = outcome.videos.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["grinders", "scales"]);
        for video in &outcome.videos {
            assert_eq!(video.duration_seconds, 10.0);
            assert_eq!(video.content_style, "tutorial");
            assert_eq!(video.main_topics, vec!["grinders"]);
        }
        assert_eq!(outcome.total_duration_seconds(), 20.0);

        let brief = std::fs::read_to_string(&outcome.report_path).unwrap();
        assert!(brief.contains("## Videos analysed (2)"));
        assert!(brief.contains("- **Total duration**: 20.0s"));
        assert!(brief.contains("### grinders"));
        assert!(brief.contains("### scales"));
        assert!(brief.contains("- **Style**: tutorial"));
    }

    #[tokio::test]
    async fn test_analysis_continues_when_cache_write_fails() {
        let root = tempfile::tempdir().unwrap();
        let audio = root.path().join("Cortado.mp3");
        std::fs::write(&audio, b"fake audio").unwrap();
        let (transcriber, orchestrator) = orchestrator(&root);

        // A directory at the blob path makes every write for this key fail.
        let key = TranscriptCache::fingerprint(&audio).unwrap();
        let cache_dir = orchestrator.lock_cache().unwrap().dir().to_path_buf();
        std::fs::create_dir(cache_dir.join(key.blob_name())).unwrap();

        let outcome = orchestrator.analyze_file(&audio).await.unwrap();
        assert!(!outcome.from_cache);
        assert!(outcome.report_path.exists());
        assert_eq!(outcome.record.tier, ExtractionTier::Structured);
        assert!(!orchestrator.lock_cache().unwrap().contains(&key));

        let again = orchestrator.analyze_file(&audio).await.unwrap();
        assert!(!again.from_cache);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_creator_folder_where_every_video_fails() {
        let root = tempfile::tempdir().unwrap();
        let folder = root.path().join("kai");
        std::fs::create_dir(&folder).unwrap();
        std::fs::write(folder.join("Creator - Kai.md"), NOTES).unwrap();
        // Not a decodable video, so extraction fails.
        std::fs::write(folder.join("broken.mp4"), b"").unwrap();

        let (_, orchestrator) = orchestrator(&root);
        let err = orchestrator.analyze_creator_folder(&folder).await.unwrap_err();
        assert!(matches!(err, CompassError::Analysis(_)));
    }

    #[tokio::test]
    async fn test_batch_limits_and_collects_failures() {
        let root = tempfile::tempdir().unwrap();
        let batch_dir = root.path().join("creators");
        for name in ["a-ava", "b-kai", "c-zoe"] {
            let folder = batch_dir.join(name);
            std::fs::create_dir_all(&folder).unwrap();
            std::fs::write(folder.join(format!("Creator - {}.md", name)), NOTES).unwrap();
        }
        std::fs::write(batch_dir.join("a-ava").join("v.mp4"), b"fake").unwrap();
        std::fs::create_dir(batch_dir.join("not-a-creator")).unwrap();

        let (_, orchestrator) = orchestrator(&root);
        let video = batch_dir.join("a-ava").join("v.mp4");
        seed_cache(&orchestrator, &video, EntryOrigin::source(&video), "Hello viewers.");

        let summary = orchestrator.batch(&batch_dir, Some(2), None).await.unwrap();
        assert_eq!(summary.completed.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].0.ends_with("b-kai"));
    }

    #[tokio::test]
    async fn test_batch_without_creator_folders() {
        let root = tempfile::tempdir().unwrap();
        let (_, orchestrator) = orchestrator(&root);
        assert!(matches!(
            orchestrator.batch(root.path(), None, None).await,
            Err(CompassError::InvalidInput(_))
        ));
    }
}
