//! Redis JobRepository implementation.

use super::error::QueueError;
use super::pool::RedisPool;
use super::record::{record_from_map, F_FAILED, F_LEASE, F_PROGRESS, F_RETURN, F_STATE};
use super::{job_key, now_ms, JOBS_ACTIVE, JOBS_WAITING};
use crate::domain::jobs::{JobRecord, JobResult, JobState};
use crate::ports::repository::JobRepository;
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use std::collections::HashMap;

#[async_trait]
impl JobRepository for RedisPool {
    async fn get(
        &self,
        id: &str,
    ) -> Result<Option<JobRecord>, Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(QueueError::from)?;
        let map: HashMap<String, String> = conn
            .hgetall(job_key(id))
            .await
            .map_err(QueueError::from)?;
        if map.is_empty() {
            return Ok(None);
        }
        Ok(Some(record_from_map(id, &map)?))
    }

    async fn update_progress(
        &self,
        id: &str,
        progress: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(QueueError::from)?;
        let key = job_key(id);

        // Monotone: drop updates that would move progress backwards. The
        // job's single worker is the only writer, so read-then-write holds.
        let current: Option<String> = conn.hget(&key, F_PROGRESS).await.map_err(QueueError::from)?;
        let current: u8 = current.and_then(|p| p.parse().ok()).unwrap_or(0);
        if progress > current {
            conn.hset::<_, _, _, ()>(&key, F_PROGRESS, progress.to_string())
                .await
                .map_err(QueueError::from)?;
        }
        // Every progress write doubles as a heartbeat.
        conn.hset::<_, _, _, ()>(&key, F_LEASE, (now_ms() + self.lease_ms).to_string())
            .await
            .map_err(QueueError::from)?;
        Ok(())
    }

    async fn complete(
        &self,
        id: &str,
        result: &JobResult,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(QueueError::from)?;
        conn.hset_multiple::<_, _, _, ()>(
            job_key(id),
            &[
                (F_STATE, JobState::Completed.as_str().to_string()),
                (F_PROGRESS, "100".to_string()),
                (F_RETURN, serde_json::to_string(result)?),
            ],
        )
        .await
        .map_err(QueueError::from)?;
        conn.lrem::<_, _, ()>(JOBS_ACTIVE, 1, id)
            .await
            .map_err(QueueError::from)?;
        Ok(())
    }

    async fn fail(
        &self,
        id: &str,
        reason: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(QueueError::from)?;
        conn.hset_multiple::<_, _, _, ()>(
            job_key(id),
            &[
                (F_STATE, JobState::Failed.as_str().to_string()),
                (F_FAILED, reason.to_string()),
            ],
        )
        .await
        .map_err(QueueError::from)?;
        conn.lrem::<_, _, ()>(JOBS_ACTIVE, 1, id)
            .await
            .map_err(QueueError::from)?;
        Ok(())
    }

    async fn requeue_expired(&self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(QueueError::from)?;
        let active: Vec<String> = conn
            .lrange(JOBS_ACTIVE, 0, -1)
            .await
            .map_err(QueueError::from)?;

        let now = now_ms();
        let mut reclaimed = 0;
        for id in active {
            let lease: Option<String> = conn
                .hget(job_key(&id), F_LEASE)
                .await
                .map_err(QueueError::from)?;
            let expired = lease
                .and_then(|l| l.parse::<u64>().ok())
                .map(|l| l < now)
                .unwrap_or(true);
            if !expired {
                continue;
            }
            let removed: i64 = conn
                .lrem(JOBS_ACTIVE, 1, &id)
                .await
                .map_err(QueueError::from)?;
            if removed == 0 {
                // The worker finished between the scan and the remove.
                continue;
            }
            // RPUSH so reclaimed jobs are picked up next, ahead of the backlog.
            conn.rpush::<_, _, ()>(JOBS_WAITING, &id)
                .await
                .map_err(QueueError::from)?;
            conn.hset::<_, _, _, ()>(
                job_key(&id),
                F_STATE,
                JobState::Queued.as_str().to_string(),
            )
            .await
            .map_err(QueueError::from)?;
            reclaimed += 1;
        }
        Ok(reclaimed)
    }
}
