//! Overdub - Video Dubbing Pipeline
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (jobs, transcripts, subtitles, artifacts)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations (Redis, providers, ffmpeg, HTTP)
//! - application/: Pipeline engine, worker loop, submission service
//! - config: Environment configuration
//!
//! A job moves through five stages: extract audio, transcribe, translate,
//! synthesize speech, merge the dub back into the video. Upstream stages
//! produce user-visible artifacts independently, so most stage failures are
//! tolerated: they leave a marker file next to the job's stem instead of
//! failing the job.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod retry;

// Re-exports for convenience
pub use adapters::redis::RedisPool;
pub use config::Settings;
pub use domain::jobs;
