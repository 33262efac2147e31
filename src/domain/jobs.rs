//! Job records as they live in the queue substrate.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The only job name this service processes.
pub const PROCESS_VIDEO: &str = "process-video";

/// How the synthesized voice is combined with the original audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Drop the original audio entirely; the dub is the only track.
    Replace,
    /// Attenuate the original to 0.7, fade the dub in/out, amix both.
    Mix,
}

impl MergeMode {
    /// Lower-cased parse; unknown values default to `Replace`.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "mix" => MergeMode::Mix,
            _ => MergeMode::Replace,
        }
    }
}

/// Submission payload. The optional flags override the environment defaults
/// when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    /// Path of the uploaded source file inside the upload directory
    pub source_path: PathBuf,
    /// Original filename as sent by the client
    pub original_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_mode: Option<MergeMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burn_subtitles: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhance: Option<bool>,
}

/// Queue-visible lifecycle of a job. Transitions are forward-only, except
/// that the substrate moves `Active` jobs back to `Queued` when a worker's
/// lease expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Active,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Active => "active",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(JobState::Queued),
            "active" => Some(JobState::Active),
            "completed" => Some(JobState::Completed),
            "failed" => Some(JobState::Failed),
            _ => None,
        }
    }
}

/// Artifact paths of a completed job. Every populated path exists on disk at
/// completion time; optional artifacts stay `null` when their stage was
/// skipped or failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub audio: Option<PathBuf>,
    pub enhanced_audio: Option<PathBuf>,
    pub transcript: Option<PathBuf>,
    pub translated: Option<PathBuf>,
    pub tts: Option<PathBuf>,
    pub dubbed: Option<PathBuf>,
}

/// A durable job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    pub name: String,
    pub data: JobData,
    pub state: JobState,
    pub progress: u8,
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<String>,
}

impl JobRecord {
    /// A fresh `process-video` record in the queued state.
    pub fn new(id: String, data: JobData) -> Self {
        Self {
            id,
            name: PROCESS_VIDEO.to_string(),
            data,
            state: JobState::Queued,
            progress: 0,
            result: None,
            failed_reason: None,
        }
    }
}
