//! Audio processing utilities built on ffmpeg.

mod ffmpeg;

pub use ffmpeg::{
    extract_audio, extracted_audio_path, probe_duration, probe_title, split_audio,
    EXTRACTED_AUDIO_SUFFIX,
};
