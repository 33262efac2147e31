use crate::domain::jobs::JobRecord;
use async_trait::async_trait;
use std::error::Error;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueuePort: Send + Sync {
    /// Enqueue a job record durably.
    async fn enqueue(&self, record: &JobRecord) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Dequeue the next job, moving it to the active set under a lease.
    /// timeout_secs: 0.0 for infinite (or long poll), >0.0 for specific timeout
    async fn dequeue(
        &self,
        timeout_secs: f64,
    ) -> Result<Option<JobRecord>, Box<dyn Error + Send + Sync>>;
}

#[async_trait]
impl<T: JobQueuePort + ?Sized> JobQueuePort for std::sync::Arc<T> {
    async fn enqueue(&self, record: &JobRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        (**self).enqueue(record).await
    }

    async fn dequeue(
        &self,
        timeout_secs: f64,
    ) -> Result<Option<JobRecord>, Box<dyn Error + Send + Sync>> {
        (**self).dequeue(timeout_secs).await
    }
}
