//! Redis JobQueuePort implementation.

use super::error::QueueError;
use super::pool::RedisPool;
use super::record::{fields_from_record, record_from_map, F_LEASE, F_STATE};
use super::{job_key, now_ms, JOBS_ACTIVE, JOBS_WAITING};
use crate::domain::jobs::{JobRecord, JobState};
use crate::ports::queue::JobQueuePort;
use async_trait::async_trait;
use deadpool_redis::redis::{AsyncCommands, Direction};
use std::collections::HashMap;

#[async_trait]
impl JobQueuePort for RedisPool {
    async fn enqueue(
        &self,
        record: &JobRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(QueueError::from)?;
        let fields = fields_from_record(record)?;
        conn.hset_multiple::<_, _, _, ()>(job_key(&record.id), &fields)
            .await
            .map_err(QueueError::from)?;
        conn.lpush::<_, _, ()>(JOBS_WAITING, &record.id)
            .await
            .map_err(QueueError::from)?;
        Ok(())
    }

    async fn dequeue(
        &self,
        timeout_secs: f64,
    ) -> Result<Option<JobRecord>, Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(QueueError::from)?;

        // BLMOVE is atomic: the id is on the active list before any worker
        // can see it, so a job is never processed twice concurrently.
        let id: Option<String> = conn
            .blmove(
                JOBS_WAITING,
                JOBS_ACTIVE,
                Direction::Right,
                Direction::Left,
                timeout_secs,
            )
            .await
            .map_err(QueueError::from)?;
        let Some(id) = id else {
            return Ok(None);
        };

        let key = job_key(&id);
        conn.hset_multiple::<_, _, _, ()>(
            &key,
            &[
                (F_STATE, JobState::Active.as_str().to_string()),
                (F_LEASE, (now_ms() + self.lease_ms).to_string()),
            ],
        )
        .await
        .map_err(QueueError::from)?;

        let map: HashMap<String, String> = conn.hgetall(&key).await.map_err(QueueError::from)?;
        if map.is_empty() {
            return Err(QueueError::Corrupt(format!("job {} has no record", id)).into());
        }
        Ok(Some(record_from_map(&id, &map)?))
    }
}
