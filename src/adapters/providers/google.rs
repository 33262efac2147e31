//! Google REST backends: Speech-to-Text, Translation v2, Text-to-Speech.
//!
//! All three ride the same API key. Responses are consumed as loose
//! `serde_json::Value`s; the ASR payload goes to the normalizer untouched.

use super::{check_status, ProviderError};
use crate::config::Settings;
use crate::ports::providers::{SpeechSynthesizer, SpeechToText, SynthesisOptions, Translator};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use std::error::Error;
use std::path::Path;
use std::time::Duration;

const SPEECH_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";
const TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";
const TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Timeout for translate and synthesize calls; ASR gets its own from config.
const CALL_TIMEOUT: Duration = Duration::from_secs(120);

fn api_key(settings: &Settings) -> Result<String, ProviderError> {
    settings
        .google_api_key
        .clone()
        .ok_or_else(|| ProviderError::Config("GOOGLE_API_KEY is not set".to_string()))
}

pub struct GoogleTranscriber {
    client: reqwest::Client,
    api_key: String,
    language: Option<String>,
    timestamps: bool,
    timeout: Duration,
}

impl GoogleTranscriber {
    pub fn new(settings: &Settings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key(settings)?,
            language: settings.asr_language.clone(),
            timestamps: settings.asr_timestamps,
            timeout: Duration::from_secs(settings.asr_timeout_secs),
        })
    }

    async fn request(&self, audio: &Path) -> Result<Value, ProviderError> {
        let bytes = tokio::fs::read(audio).await?;
        let body = json!({
            "config": {
                "languageCode": self.language.as_deref().unwrap_or("en-US"),
                "enableWordTimeOffsets": self.timestamps,
            },
            "audio": { "content": BASE64.encode(&bytes) },
        });

        let response = self
            .client
            .post(SPEECH_URL)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SpeechToText for GoogleTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Value, Box<dyn Error + Send + Sync>> {
        let value = tokio::time::timeout(self.timeout, self.request(audio))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout.as_secs()))??;
        Ok(value)
    }
}

pub struct GoogleTranslator {
    client: reqwest::Client,
    api_key: String,
}

impl GoogleTranslator {
    pub fn new(settings: &Settings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key(settings)?,
        })
    }

    async fn request(&self, text: &str, target: &str) -> Result<String, ProviderError> {
        let body = json!({ "q": text, "target": target, "format": "text" });
        let response = self
            .client
            .post(TRANSLATE_URL)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        let value: Value = response.json().await?;
        value
            .pointer("/data/translations/0/translatedText")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Decode("no translatedText in response".to_string()))
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        target: &str,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let translated = tokio::time::timeout(CALL_TIMEOUT, self.request(text, target))
            .await
            .map_err(|_| ProviderError::Timeout(CALL_TIMEOUT.as_secs()))??;
        Ok(translated)
    }
}

pub struct GoogleSynthesizer {
    client: reqwest::Client,
    api_key: String,
}

impl GoogleSynthesizer {
    pub fn new(settings: &Settings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key(settings)?,
        })
    }

    async fn request(
        &self,
        text: &str,
        out: &Path,
        opts: &SynthesisOptions,
    ) -> Result<(), ProviderError> {
        let mut voice = json!({ "languageCode": opts.language_code });
        if let Some(ref name) = opts.voice {
            voice["name"] = json!(name);
        }
        let body = json!({
            "input": { "text": text },
            "voice": voice,
            "audioConfig": { "audioEncoding": "MP3" },
        });

        let response = self
            .client
            .post(TTS_URL)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        let value: Value = response.json().await?;
        let content = value
            .get("audioContent")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Decode("no audioContent in response".to_string()))?;
        let bytes = BASE64
            .decode(content)
            .map_err(|e| ProviderError::Decode(format!("bad audioContent base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(ProviderError::EmptyAudio);
        }
        tokio::fs::write(out, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        out: &Path,
        opts: &SynthesisOptions,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        tokio::time::timeout(CALL_TIMEOUT, self.request(text, out, opts))
            .await
            .map_err(|_| ProviderError::Timeout(CALL_TIMEOUT.as_secs()))??;
        Ok(())
    }
}
