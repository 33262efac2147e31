//! Submission service: turns an uploaded file into a queued job.

use crate::domain::jobs::{JobData, JobRecord};
use crate::ports::queue::JobQueuePort;
use tracing::info;
use uuid::Uuid;

pub struct SubmissionService<Q> {
    queue: Q,
}

impl<Q: JobQueuePort> SubmissionService<Q> {
    pub fn new(queue: Q) -> Self {
        Self { queue }
    }

    /// Assign a fresh id, verify the source is readable, and enqueue.
    /// Returns the job id for status polling.
    pub async fn submit(
        &self,
        data: JobData,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        tokio::fs::metadata(&data.source_path).await.map_err(|e| {
            format!(
                "source not readable: {}: {}",
                data.source_path.display(),
                e
            )
        })?;

        let record = JobRecord::new(Uuid::new_v4().to_string(), data);
        self.queue.enqueue(&record).await?;
        info!(
            "enqueued job {} for {}",
            record.id, record.data.original_name
        );
        Ok(record.id)
    }
}
