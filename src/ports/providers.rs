//! Provider capability seams: speech recognition, translation, synthesis.
//!
//! The pipeline depends only on these traits; concrete providers are chosen
//! once at startup by the factory in `adapters::providers`.

use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;
use std::path::Path;

/// Options for a synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub language_code: String,
    pub voice: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio file, returning the provider's raw payload.
    /// The shape varies per provider; `domain::transcript::normalize`
    /// harmonizes it downstream.
    async fn transcribe(&self, audio: &Path) -> Result<Value, Box<dyn Error + Send + Sync>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        target: &str,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize speech for `text`, writing the audio to `out`.
    /// Producing empty audio is an error.
    async fn synthesize(
        &self,
        text: &str,
        out: &Path,
        opts: &SynthesisOptions,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}
