//! Per-queue set of jobs keyed by job key.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracker_core::{LogEntry, TrackerConfig};

use crate::job::{Job, closed_channel};
use crate::messages::TrackerResult;

type JobMap = Arc<Mutex<HashMap<String, Job>>>;

/// Jobs of one queue, at most one per key.
pub struct JobSet {
    queue: String,
    config: TrackerConfig,
    jobs: JobMap,
}

impl JobSet {
    /// Create an empty set for the named queue.
    pub fn new(queue: impl Into<String>, config: TrackerConfig) -> Self {
        Self {
            queue: queue.into(),
            config,
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Name of the queue this set belongs to.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Start a job under `key`, or attach to the one already there.
    ///
    /// When a job exists for the key it is returned unchanged and `work` is
    /// dropped without running. Otherwise a new job is registered and `work`
    /// runs in the background. Once `work` has returned and `token` is
    /// cancelled, the job is closed and evicted; cancelling does not
    /// interrupt `work`.
    ///
    /// Returns as soon as the job is registered.
    pub async fn enqueue<F, Fut>(
        &self,
        token: CancellationToken,
        key: impl Into<String>,
        work: F,
    ) -> TrackerResult<Job>
    where
        F: FnOnce(Job) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.get(&key) {
            tracing::debug!("Attaching to job {}/{} ({})", self.queue, key, job.run_id());
            return Ok(job.clone());
        }

        let job = Job::spawn(&key, &self.queue, self.config.capacity()).await?;
        jobs.insert(key, job.clone());
        drop(jobs);

        tracing::info!("Enqueued job {}/{} ({})", self.queue, job.id(), job.run_id());
        tokio::spawn(run_job(job.clone(), token, work, Arc::clone(&self.jobs)));

        Ok(job)
    }

    /// Stream the log of the job under `key`.
    ///
    /// An unknown key yields a stream that is already closed.
    pub async fn log(&self, key: &str) -> mpsc::Receiver<LogEntry> {
        let Some(job) = self.get(key).await else {
            return closed_channel();
        };

        let mut source = job.observe().await;
        let (tx, rx) = mpsc::channel(self.config.capacity());
        tokio::spawn(async move {
            while let Some(entry) = source.recv().await {
                if tx.send(entry).await.is_err() {
                    break;
                }
            }
        });
        rx
    }

    /// Get the job registered under `key`.
    pub async fn get(&self, key: &str) -> Option<Job> {
        self.jobs.lock().await.get(key).cloned()
    }

    /// Keys of all registered jobs.
    pub async fn keys(&self) -> Vec<String> {
        self.jobs.lock().await.keys().cloned().collect()
    }

    /// Number of registered jobs.
    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    /// Check if no jobs are registered.
    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}

/// Drive one job from start to eviction.
async fn run_job<F, Fut>(job: Job, token: CancellationToken, work: F, jobs: JobMap)
where
    F: FnOnce(Job) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    if let Err(e) = tokio::spawn(work(job.clone())).await {
        tracing::error!("Job {}/{} work aborted: {}", job.queue(), job.id(), e);
        job.error(format!("work aborted: {}", e), "job").await;
    }

    token.cancelled().await;
    job.close().await;

    {
        let mut jobs = jobs.lock().await;
        if jobs
            .get(job.id())
            .is_some_and(|current| current.run_id() == job.run_id())
        {
            jobs.remove(job.id());
        }
    }

    job.shutdown();
    tracing::info!("Evicted job {}/{} ({})", job.queue(), job.id(), job.run_id());
}
