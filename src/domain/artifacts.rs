//! Stem-derived artifact naming.
//!
//! Every file a job produces shares the stem of its source upload, so the
//! filesystem namespace is partitioned per job and workers never collide.

use std::path::{Path, PathBuf};

/// Filenames for all artifacts a job may produce, derived from the source
/// file's basename without extension.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    dir: PathBuf,
    stem: String,
}

impl ArtifactSet {
    pub fn new(source: &Path) -> Self {
        let dir = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("upload"));
        Self { dir, stem }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    fn named(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.stem, suffix))
    }

    pub fn audio(&self) -> PathBuf {
        self.named("-audio.wav")
    }

    pub fn enhanced_audio(&self) -> PathBuf {
        self.named("-audio-enhanced.wav")
    }

    /// Mono 16 kHz variant fed to ASR providers that require it.
    pub fn asr_audio(&self) -> PathBuf {
        self.named("-audio-16k.wav")
    }

    pub fn transcript(&self) -> PathBuf {
        self.named("-transcript.txt")
    }

    pub fn transcript_sidecar(&self) -> PathBuf {
        self.named("-transcript.txt.json")
    }

    pub fn translated(&self) -> PathBuf {
        self.named("-translated.txt")
    }

    pub fn tts(&self) -> PathBuf {
        self.named("-tts.mp3")
    }

    pub fn subtitles(&self) -> PathBuf {
        self.named(".srt")
    }

    pub fn dubbed(&self) -> PathBuf {
        self.named("-dubbed.mp4")
    }

    pub fn enhance_error_marker(&self) -> PathBuf {
        self.named("-enhance.error.txt")
    }

    pub fn tts_error_marker(&self) -> PathBuf {
        self.named("-tts.mp3.error.txt")
    }

    pub fn merge_error_marker(&self) -> PathBuf {
        self.named("-merge.error.txt")
    }

    pub fn merge_skip_marker(&self) -> PathBuf {
        self.named("-merge.skip.txt")
    }
}
