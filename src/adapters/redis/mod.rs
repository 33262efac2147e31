//! Redis adapter for the queue substrate.
//!
//! This module provides Redis-backed implementations of:
//! - `JobQueuePort` for job enqueueing/dequeueing with a worker lease
//! - `JobRepository` for job state, progress, and result storage
//!
//! Layout: a waiting list and an active list of job ids (moved atomically
//! with `BLMOVE`), plus one hash per job carrying its durable record. An
//! active job holds a lease timestamp; the reaper moves expired entries
//! back to waiting so a crashed worker's job is re-run.

mod error;
mod pool;
mod queue;
mod record;
mod repository;

pub use error::QueueError;
pub use pool::RedisPool;

/// Redis key constants
const JOBS_WAITING: &str = "overdub:media-jobs:waiting";
const JOBS_ACTIVE: &str = "overdub:media-jobs:active";
const JOB_KEY_PREFIX: &str = "overdub:job:";

fn job_key(id: &str) -> String {
    format!("{}{}", JOB_KEY_PREFIX, id)
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
