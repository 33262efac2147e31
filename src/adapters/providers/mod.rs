//! Provider adapters and the startup factory.
//!
//! The factory reads configuration once and hands the pipeline concrete
//! `Arc<dyn …>` capabilities. Mock variants are first-class: they are the
//! default ASR provider and the only way to run the pipeline offline.

mod google;
mod mock;
mod openai;

pub use google::{GoogleSynthesizer, GoogleTranscriber, GoogleTranslator};
pub use mock::{MockAsr, MockTranslate, MockTts};
pub use openai::OpenAiTranscriber;

use crate::config::Settings;
use crate::ports::providers::{SpeechSynthesizer, SpeechToText, Translator};
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum ProviderError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    Io(std::io::Error),
    Timeout(u64),
    EmptyAudio,
    Decode(String),
    Config(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Http(e) => write!(f, "HTTP error: {}", e),
            ProviderError::Api { status, body } => write!(f, "API error {}: {}", status, body),
            ProviderError::Io(e) => write!(f, "IO error: {}", e),
            ProviderError::Timeout(secs) => write!(f, "provider call timed out after {}s", secs),
            ProviderError::EmptyAudio => write!(f, "provider returned empty audio"),
            ProviderError::Decode(e) => write!(f, "unexpected provider response: {}", e),
            ProviderError::Config(e) => write!(f, "configuration error: {}", e),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProviderError::Http(e) => Some(e),
            ProviderError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(err)
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError::Io(err)
    }
}

/// Surface a non-2xx response as an API error with its body.
pub(super) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        status: status.as_u16(),
        body,
    })
}

pub fn speech_to_text(settings: &Settings) -> Result<Arc<dyn SpeechToText>, ProviderError> {
    match settings.asr_provider.as_str() {
        "mock" => Ok(Arc::new(MockAsr)),
        "openai" => Ok(Arc::new(OpenAiTranscriber::new(settings)?)),
        "google" => Ok(Arc::new(GoogleTranscriber::new(settings)?)),
        other => Err(ProviderError::Config(format!(
            "unknown ASR provider: {}",
            other
        ))),
    }
}

pub fn translator(settings: &Settings) -> Result<Arc<dyn Translator>, ProviderError> {
    match settings.translate_provider.as_str() {
        "mock" => Ok(Arc::new(MockTranslate)),
        "google" => Ok(Arc::new(GoogleTranslator::new(settings)?)),
        other => Err(ProviderError::Config(format!(
            "unknown translate provider: {}",
            other
        ))),
    }
}

pub fn synthesizer(settings: &Settings) -> Result<Arc<dyn SpeechSynthesizer>, ProviderError> {
    match settings.tts_provider.as_str() {
        "mock" => Ok(Arc::new(MockTts)),
        "google" => Ok(Arc::new(GoogleSynthesizer::new(settings)?)),
        other => Err(ProviderError::Config(format!(
            "unknown TTS provider: {}",
            other
        ))),
    }
}
