//! Redis connection pool.

use super::error::QueueError;
use deadpool_redis::{Config, Pool, Runtime};
use std::time::Duration;

/// Redis-backed adapter for queue and repository operations.
#[derive(Clone)]
pub struct RedisPool {
    pub(super) pool: Pool,
    pub(super) lease_ms: u64,
}

impl RedisPool {
    /// Create a new RedisPool with connection pool. `lease` bounds how long
    /// a crashed worker can hold a job before it is requeued.
    pub fn new(redis_url: &str, lease: Duration) -> Result<Self, QueueError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self {
            pool,
            lease_ms: lease.as_millis() as u64,
        })
    }

    pub fn lease(&self) -> Duration {
        Duration::from_millis(self.lease_ms)
    }
}
