//! Configuration loaded from environment variables.

use crate::domain::jobs::MergeMode;
use crate::domain::subtitles::SrtLimits;
use std::env;
use std::path::PathBuf;

/// Runtime configuration for the monolith deployment.
///
/// Every value has a default so the server comes up with nothing but a
/// running Redis. Per-job flags in the submission payload override the
/// corresponding defaults here.
#[derive(Clone, Debug)]
pub struct Settings {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Serve the HTML index page listing the upload directory
    pub is_test: bool,
    /// Redis connection URL
    pub redis_url: String,
    /// Directory for uploads and generated artifacts
    pub upload_dir: PathBuf,
    /// Number of worker tasks draining the job queue
    pub worker_count: usize,
    /// Seconds before an in-flight job's lease expires and it is requeued
    pub job_lease_secs: u64,

    /// ASR provider: `mock` / `openai` / `google`
    pub asr_provider: String,
    /// Language hint passed to the ASR provider
    pub asr_language: Option<String>,
    /// Request word-level timing from the ASR provider
    pub asr_timestamps: bool,
    /// Resample extracted audio to mono 16 kHz before ASR
    pub asr_convert: bool,
    /// Wall-clock timeout for a single ASR call
    pub asr_timeout_secs: u64,

    /// Translation provider: `mock` / `google`
    pub translate_provider: String,
    /// BCP-47 target language code
    pub translate_target: String,

    /// TTS provider: `mock` / `google`
    pub tts_provider: String,
    /// Default TTS language code when the target language is not mapped
    pub tts_language: String,
    /// TTS voice name (provider default when unset)
    pub tts_voice: Option<String>,

    /// Default merge mode when the job does not specify one
    pub merge_mode: MergeMode,
    /// Default for burning subtitles into the merged video
    pub burn_subtitles: bool,
    /// Default for the denoise pass on extracted audio
    pub enhance: bool,

    /// Subtitle builder bounds
    pub srt_limits: SrtLimits,

    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub google_api_key: Option<String>,
}

impl Settings {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("127.0.0.1")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("3000")),
            is_test: env::var("IS_TEST")
                .map(|v| flag_is_true(&v))
                .unwrap_or(true),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| String::from("redis://127.0.0.1/")),
            upload_dir: PathBuf::from(
                env::var("UPLOAD_DIR").unwrap_or_else(|_| String::from("uploads")),
            ),
            worker_count: env_parse("WORKER_COUNT", 2),
            job_lease_secs: env_parse("JOB_LEASE_SECS", 60),

            asr_provider: env::var("ASR_PROVIDER").unwrap_or_else(|_| String::from("mock")),
            asr_language: env::var("ASR_LANGUAGE").ok().filter(|v| !v.is_empty()),
            asr_timestamps: env_flag("ASR_TIMESTAMPS"),
            asr_convert: env_flag("ASR_CONVERT"),
            asr_timeout_secs: env_parse("ASR_TIMEOUT_SECS", 300),

            translate_provider: env::var("TRANSLATE_PROVIDER")
                .unwrap_or_else(|_| String::from("google")),
            translate_target: env::var("TRANSLATE_TARGET").unwrap_or_else(|_| String::from("id")),

            tts_provider: env::var("TTS_PROVIDER").unwrap_or_else(|_| String::from("google")),
            tts_language: env::var("TTS_LANGUAGE").unwrap_or_else(|_| String::from("id-ID")),
            tts_voice: env::var("TTS_VOICE").ok().filter(|v| !v.is_empty()),

            merge_mode: env::var("MERGE_MODE")
                .map(|v| MergeMode::parse(&v))
                .unwrap_or(MergeMode::Replace),
            burn_subtitles: env_flag("BURN_SUBTITLES"),
            enhance: env_flag("ENHANCE"),

            srt_limits: SrtLimits {
                max_words: env_parse("SRT_MAX_WORDS", 7),
                max_line_duration: env_parse("SRT_MAX_LINE_DURATION", 4.0),
                max_chars: env_parse("SRT_MAX_CHARS", 80),
            },

            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| String::from("https://api.openai.com")),
            google_api_key: env::var("GOOGLE_API_KEY").ok().filter(|v| !v.is_empty()),
        }
    }
}

#[cfg(test)]
impl Settings {
    /// Offline defaults for unit tests: mock providers, no network.
    pub(crate) fn for_tests() -> Self {
        Self {
            addr: String::from("127.0.0.1"),
            port: String::from("3000"),
            is_test: true,
            redis_url: String::from("redis://127.0.0.1/"),
            upload_dir: PathBuf::from("uploads"),
            worker_count: 1,
            job_lease_secs: 60,
            asr_provider: String::from("mock"),
            asr_language: None,
            asr_timestamps: false,
            asr_convert: false,
            asr_timeout_secs: 300,
            translate_provider: String::from("mock"),
            translate_target: String::from("id"),
            tts_provider: String::from("mock"),
            tts_language: String::from("id-ID"),
            tts_voice: None,
            merge_mode: MergeMode::Replace,
            burn_subtitles: false,
            enhance: false,
            srt_limits: SrtLimits::default(),
            openai_api_key: None,
            openai_base_url: String::from("https://api.openai.com"),
            google_api_key: None,
        }
    }
}

/// A submission flag is truthy iff it is the string "true", case-insensitive.
pub fn flag_is_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|v| flag_is_true(&v)).unwrap_or(false)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
