//! Audio extraction and processing with ffmpeg and ffprobe.

use crate::error::{CompassError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Suffix appended to the stem of audio extracted from a video.
pub const EXTRACTED_AUDIO_SUFFIX: &str = "_audio";

/// Path of the audio extracted from `video` into `temp_dir`.
pub fn extracted_audio_path(video: &Path, temp_dir: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    temp_dir.join(format!("{}{}.mp3", stem, EXTRACTED_AUDIO_SUFFIX))
}

/// Extracts the audio track of a video as mono 16 kHz MP3.
///
/// Speech recognition gains nothing from higher rates, and the smaller file
/// stays under upload limits for longer recordings.
#[instrument(skip(temp_dir), fields(video = %video.display()))]
pub async fn extract_audio(video: &Path, temp_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(temp_dir)?;
    let target = extracted_audio_path(video, temp_dir);

    info!("Extracting audio to {}", target.display());

    let result = Command::new("ffmpeg")
        .arg("-i").arg(video)
        .arg("-vn")
        .arg("-ac").arg("1")
        .arg("-ar").arg("16000")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("4")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(&target)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(target),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(CompassError::AudioProcessing(format!("ffmpeg extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CompassError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(CompassError::AudioProcessing(format!("ffmpeg error: {e}"))),
    }
}

/// Segments a long audio file into smaller chunks for transcription.
///
/// Returns tuples of (chunk_path, offset_seconds). Audio no longer than
/// `chunk_seconds` is returned as a single chunk pointing at `source`.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = probe_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let chunk_len = chunk_seconds.max(1) as f64;

    if total_duration <= chunk_len {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut segments = Vec::new();
    let mut offset = 0.0;
    let mut idx = 0u32;

    while offset < total_duration {
        let segment_path = output_dir.join(format!("{}_{:04}.mp3", base_name, idx));
        let segment_len = chunk_len.min(total_duration - offset);

        extract_segment(source, &segment_path, offset, segment_len).await?;

        debug!("Created segment {} at offset {:.1}s", idx, offset);
        segments.push((segment_path, offset));

        offset += chunk_len;
        idx += 1;
    }

    info!("Created {} audio segments", segments.len());
    Ok(segments)
}

/// Extracts a time segment from an audio file.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let copy_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Ok(status) = copy_result {
        if status.success() && dest.exists() {
            return Ok(());
        }
    }

    warn!("Stream copy failed, re-encoding segment");

    let encode_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("4")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(CompassError::AudioProcessing(format!("Segment extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CompassError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(CompassError::AudioProcessing(format!("ffmpeg error: {e}"))),
    }
}

/// Queries the duration of a media file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let json = probe_format(path).await?;
    parse_duration(&json)
        .ok_or_else(|| CompassError::AudioProcessing("Could not determine audio duration".into()))
}

/// Title tag of a media file, if it has one.
pub async fn probe_title(path: &Path) -> Result<Option<String>> {
    let json = probe_format(path).await?;
    Ok(json["format"]["tags"]["title"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string))
}

async fn probe_format(path: &Path) -> Result<serde_json::Value> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CompassError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(CompassError::AudioProcessing(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(CompassError::AudioProcessing(format!(
            "ffprobe could not read {}",
            path.display()
        )));
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|_| CompassError::AudioProcessing("Invalid ffprobe output".into()))
}

fn parse_duration(json: &serde_json::Value) -> Option<f64> {
    json["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracted_audio_path() {
        let path = extracted_audio_path(Path::new("/videos/Ava - Espresso.mp4"), Path::new("/tmp/cc"));
        assert_eq!(path, PathBuf::from("/tmp/cc/Ava - Espresso_audio.mp3"));
    }

    #[test]
    fn test_parse_duration() {
        let json = serde_json::json!({"format": {"duration": "312.480000"}});
        assert_eq!(parse_duration(&json), Some(312.48));
        assert_eq!(parse_duration(&serde_json::json!({"format": {}})), None);
    }
}
