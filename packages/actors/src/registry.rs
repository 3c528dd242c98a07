//! Registry of job queues by name.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracker_core::{LogEntry, TrackerConfig};

use crate::job::{Job, closed_channel};
use crate::job_set::JobSet;
use crate::messages::TrackerResult;

/// Maps queue names to their job sets.
///
/// Construct one at startup and share it (e.g. in an `Arc`) with every
/// caller that starts or observes jobs.
pub struct QueueRegistry {
    config: TrackerConfig,
    queues: RwLock<HashMap<String, Arc<JobSet>>>,
}

impl QueueRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    /// Create a new empty registry with the given configuration.
    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            config,
            queues: RwLock::new(HashMap::new()),
        }
    }

    /// Get a queue by name, if it was ever created.
    pub fn get(&self, name: &str) -> Option<Arc<JobSet>> {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Get a queue by name, creating it on first use.
    pub fn get_or_create(&self, name: &str) -> Arc<JobSet> {
        if let Some(queue) = self.get(name) {
            return queue;
        }

        let mut queues = self.queues.write().unwrap_or_else(PoisonError::into_inner);
        queues
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!("Creating job queue: {}", name);
                Arc::new(JobSet::new(name, self.config.clone()))
            })
            .clone()
    }

    /// List all queue names.
    pub fn queue_names(&self) -> Vec<String> {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Start or attach to the job `key` in queue `queue`.
    pub async fn enqueue<F, Fut>(
        &self,
        queue: &str,
        key: impl Into<String>,
        token: CancellationToken,
        work: F,
    ) -> TrackerResult<Job>
    where
        F: FnOnce(Job) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.get_or_create(queue).enqueue(token, key, work).await
    }

    /// Stream the log of job `key` in queue `queue`.
    ///
    /// Unknown queues and keys yield a stream that is already closed.
    pub async fn log(&self, queue: &str, key: &str) -> mpsc::Receiver<LogEntry> {
        match self.get(queue) {
            Some(jobs) => jobs.log(key).await,
            None => closed_channel(),
        }
    }
}

impl Default for QueueRegistry {
    fn default() -> Self {
        Self::new()
    }
}
