//! Media tool seam: everything the pipeline asks of ffmpeg/ffprobe.

use crate::domain::jobs::MergeMode;
use async_trait::async_trait;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Streaming percent callback for long-running media operations.
pub type ProgressFn = Box<dyn Fn(u8) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Other,
}

/// Probe result: container duration plus the kinds of streams present.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub duration_sec: f64,
    pub streams: Vec<StreamKind>,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.streams.contains(&StreamKind::Video)
    }
}

/// Everything the merge stage needs to combine the dub with the source.
#[derive(Debug, Clone)]
pub struct MergeSpec {
    pub video: PathBuf,
    pub tts_audio: PathBuf,
    pub output: PathBuf,
    pub mode: MergeMode,
    /// Duration of the TTS track, used to parametrize mix-mode fades.
    /// Zero is valid and produces a zero-length fade.
    pub tts_duration: f64,
    /// Absolute path of an SRT file to burn into the video stream.
    pub subtitles: Option<PathBuf>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaToolPort: Send + Sync {
    /// Extract the audio track to 16-bit signed PCM WAV, reporting percent
    /// progress as the encode advances.
    async fn extract_audio(
        &self,
        src: &Path,
        out: &Path,
        on_progress: ProgressFn,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn probe(&self, path: &Path) -> Result<MediaInfo, Box<dyn Error + Send + Sync>>;

    /// Resample to mono 16 kHz 16-bit PCM WAV for ASR providers that need it.
    async fn convert_for_asr(
        &self,
        src: &Path,
        out: &Path,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Highpass at 200 Hz plus FFT denoise, re-encoded to 16-bit PCM WAV.
    async fn denoise(&self, src: &Path, out: &Path) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Combine the original video stream with the synthesized audio track.
    async fn merge(&self, spec: &MergeSpec) -> Result<(), Box<dyn Error + Send + Sync>>;
}
