//! OpenAI-compatible transcription backend (Whisper API and lookalikes).

use super::{check_status, ProviderError};
use crate::config::Settings;
use crate::ports::providers::SpeechToText;
use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;
use std::path::Path;
use std::time::Duration;

pub struct OpenAiTranscriber {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: Option<String>,
    timestamps: bool,
    timeout: Duration,
}

impl OpenAiTranscriber {
    pub fn new(settings: &Settings) -> Result<Self, ProviderError> {
        let api_key = settings
            .openai_api_key
            .clone()
            .ok_or_else(|| ProviderError::Config("OPENAI_API_KEY is not set".to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: settings.openai_base_url.trim_end_matches('/').to_string(),
            api_key,
            language: settings.asr_language.clone(),
            timestamps: settings.asr_timestamps,
            timeout: Duration::from_secs(settings.asr_timeout_secs),
        })
    }

    async fn request(&self, audio: &Path) -> Result<Value, ProviderError> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", "whisper-1");
        if let Some(ref language) = self.language {
            form = form.text("language", language.clone());
        }
        if self.timestamps {
            // verbose_json carries segments plus per-word timing
            form = form
                .text("response_format", "verbose_json")
                .text("timestamp_granularities[]", "word");
        }

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SpeechToText for OpenAiTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Value, Box<dyn Error + Send + Sync>> {
        let value = tokio::time::timeout(self.timeout, self.request(audio))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout.as_secs()))??;
        Ok(value)
    }
}
