use crate::domain::jobs::{JobRecord, JobResult};
use async_trait::async_trait;
use std::error::Error;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Fetch a job record by id.
    async fn get(&self, id: &str) -> Result<Option<JobRecord>, Box<dyn Error + Send + Sync>>;

    /// Advance the job's progress. Lower values than the stored progress are
    /// ignored so reports stay monotone; the worker's lease is refreshed as a
    /// side effect.
    async fn update_progress(
        &self,
        id: &str,
        progress: u8,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Mark the job completed with its artifact set and progress 100.
    async fn complete(
        &self,
        id: &str,
        result: &JobResult,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Mark the job failed with the fatal message.
    async fn fail(&self, id: &str, reason: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Move active jobs whose lease has expired back to the waiting queue.
    /// Returns how many were reclaimed.
    async fn requeue_expired(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;
}

#[async_trait]
impl<T: JobRepository + ?Sized> JobRepository for std::sync::Arc<T> {
    async fn get(&self, id: &str) -> Result<Option<JobRecord>, Box<dyn Error + Send + Sync>> {
        (**self).get(id).await
    }

    async fn update_progress(
        &self,
        id: &str,
        progress: u8,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        (**self).update_progress(id, progress).await
    }

    async fn complete(
        &self,
        id: &str,
        result: &JobResult,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        (**self).complete(id, result).await
    }

    async fn fail(&self, id: &str, reason: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        (**self).fail(id, reason).await
    }

    async fn requeue_expired(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        (**self).requeue_expired().await
    }
}
