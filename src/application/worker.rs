//! Queue-draining worker and the lease reaper.

use crate::application::pipeline::Pipeline;
use crate::domain::jobs::{JobRecord, PROCESS_VIDEO};
use crate::ports::progress::ProgressSink;
use crate::ports::queue::JobQueuePort;
use crate::ports::repository::JobRepository;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct Worker<Q, R> {
    queue: Q,
    repo: R,
    pipeline: Arc<Pipeline>,
}

impl<Q, R> Worker<Q, R>
where
    Q: JobQueuePort,
    R: JobRepository + Clone + Send + Sync + 'static,
{
    pub fn new(queue: Q, repo: R, pipeline: Arc<Pipeline>) -> Self {
        Self {
            queue,
            repo,
            pipeline,
        }
    }

    /// Block on the queue forever, processing one job at a time.
    pub async fn run_worker_loop(&self, worker_id: usize) {
        info!("[Worker {}] started", worker_id);
        loop {
            match self.queue.dequeue(0.0).await {
                Ok(Some(job)) => {
                    info!("[Worker {}] processing job {}", worker_id, job.id);
                    self.handle_job(job).await;
                }
                Ok(None) => continue,
                Err(e) => {
                    error!("[Worker {}] queue error: {}", worker_id, e);
                    // Brief pause before retrying on error
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    /// Run the pipeline for one dequeued record and report its outcome.
    /// Never returns an error: outcomes land on the job record.
    pub async fn handle_job(&self, job: JobRecord) {
        if job.name != PROCESS_VIDEO {
            warn!("rejecting job {} with unknown name {:?}", job.id, job.name);
            if let Err(e) = self
                .repo
                .fail(&job.id, &format!("unknown job name: {}", job.name))
                .await
            {
                error!("could not fail job {}: {}", job.id, e);
            }
            return;
        }

        let sink: Arc<dyn ProgressSink> = Arc::new(RepoProgress {
            repo: self.repo.clone(),
            job_id: job.id.clone(),
        });

        match self.pipeline.run(&job.data, sink).await {
            Ok(result) => {
                if let Err(e) = self.repo.complete(&job.id, &result).await {
                    // Leave the record active; the reaper will hand the job
                    // to another worker once the lease lapses.
                    error!("could not complete job {}: {}", job.id, e);
                } else {
                    info!("job {} completed", job.id);
                }
            }
            Err(e) => {
                error!("job {} failed: {}", job.id, e);
                if let Err(e2) = self.repo.fail(&job.id, &e.to_string()).await {
                    error!("could not record failure for job {}: {}", job.id, e2);
                }
            }
        }
    }
}

/// Fire-and-forget progress writes. Failed updates are dropped: progress is
/// advisory and must never take a job down.
struct RepoProgress<R> {
    repo: R,
    job_id: String,
}

impl<R> ProgressSink for RepoProgress<R>
where
    R: JobRepository + Clone + Send + Sync + 'static,
{
    fn report(&self, pct: u8) {
        let repo = self.repo.clone();
        let id = self.job_id.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.update_progress(&id, pct).await {
                debug!("progress update for {} dropped: {}", id, e);
            }
        });
    }
}

/// Periodically hand expired leases back to the waiting queue so a crashed
/// worker's job gets re-run.
pub async fn run_reaper_loop<R: JobRepository>(repo: R, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        match repo.requeue_expired().await {
            Ok(0) => {}
            Ok(n) => info!("requeued {} expired job(s)", n),
            Err(e) => error!("lease reaper error: {}", e),
        }
    }
}
