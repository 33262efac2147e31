//! Deterministic offline providers for testing and local development.

use crate::ports::providers::{SpeechSynthesizer, SpeechToText, SynthesisOptions, Translator};
use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;
use std::path::Path;

/// A short but valid-enough MP3 frame header so downstream tooling sees a
/// non-empty audio artifact.
const PLACEHOLDER_MP3: &[u8] = &[0xFF, 0xFB, 0x90, 0x00];

pub struct MockAsr;

#[async_trait]
impl SpeechToText for MockAsr {
    async fn transcribe(&self, audio: &Path) -> Result<Value, Box<dyn Error + Send + Sync>> {
        let name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Value::String(format!("[mock transcript] {}", name)))
    }
}

pub struct MockTranslate;

#[async_trait]
impl Translator for MockTranslate {
    async fn translate(
        &self,
        text: &str,
        target: &str,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        Ok(format!("[{}] {}", target, text))
    }
}

pub struct MockTts;

#[async_trait]
impl SpeechSynthesizer for MockTts {
    async fn synthesize(
        &self,
        _text: &str,
        out: &Path,
        _opts: &SynthesisOptions,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        tokio::fs::write(out, PLACEHOLDER_MP3).await?;
        Ok(())
    }
}
