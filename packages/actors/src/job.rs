//! Job handle and its fluent logging API.

use futures_util::Stream;
use ractor::{Actor, ActorRef};
use ractor::rpc::CallResult;
use tokio::sync::mpsc;
use tracker_core::{LogEntry, RunId};

use crate::job_actor::{JobActor, JobArgs};
use crate::messages::{JobMessage, TrackerError, TrackerResult};

/// Handle to a running or finished job.
///
/// Cheap to clone; every clone talks to the same job actor. Once the job is
/// evicted from its queue the actor is stopped and the handle goes stale:
/// emits are dropped and observers get an empty, closed stream.
#[derive(Clone)]
pub struct Job {
    id: String,
    queue: String,
    run_id: RunId,
    actor: ActorRef<JobMessage>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("queue", &self.queue)
            .field("run_id", &self.run_id)
            .finish()
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.run_id == other.run_id
    }
}

impl Eq for Job {}

impl Job {
    /// Spawn the actor for a new job run.
    pub(crate) async fn spawn(
        id: impl Into<String>,
        queue: impl Into<String>,
        subscriber_capacity: usize,
    ) -> TrackerResult<Self> {
        let id = id.into();
        let queue = queue.into();
        let run_id = RunId::new();
        let args = JobArgs {
            id: id.clone(),
            queue: queue.clone(),
            run_id,
            subscriber_capacity,
        };

        let (actor, _handle) = Actor::spawn(None, JobActor, args)
            .await
            .map_err(|e| TrackerError::Spawn(e.to_string()))?;

        Ok(Self {
            id,
            queue,
            run_id,
            actor,
        })
    }

    /// Job key, unique within its queue.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue the job belongs to.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Identifier of this particular run.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    async fn call<T, F>(&self, build: F) -> TrackerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(ractor::RpcReplyPort<T>) -> JobMessage,
    {
        match ractor::rpc::call(&self.actor, build, None).await {
            Ok(CallResult::Success(value)) => Ok(value),
            Ok(CallResult::Timeout) | Ok(CallResult::SenderError) => Err(TrackerError::NoReply),
            Err(e) => Err(TrackerError::Actor(e.to_string())),
        }
    }

    /// Append an entry, returning whether the log accepted it.
    ///
    /// Blocks until every current subscriber has room for the entry.
    pub async fn try_emit(&self, entry: LogEntry) -> TrackerResult<bool> {
        self.call(|reply| JobMessage::Append { entry, reply }).await
    }

    /// Append an entry and broadcast it to all subscribers.
    pub async fn emit(&self, entry: LogEntry) -> &Self {
        if let Err(e) = self.try_emit(entry).await {
            tracing::warn!(job_id = %self.id, queue = %self.queue, "Failed to emit: {}", e);
        }
        self
    }

    /// Log an informational message.
    pub async fn info(&self, message: impl Into<String>) -> &Self {
        self.emit(LogEntry::info(message)).await
    }

    /// Log a failure of the step identified by `tag`.
    pub async fn error(&self, message: impl Into<String>, tag: impl Into<String>) -> &Self {
        self.emit(LogEntry::error(message, tag)).await
    }

    /// Log a warning for the step identified by `tag`.
    pub async fn warn(&self, message: impl Into<String>, tag: impl Into<String>) -> &Self {
        self.emit(LogEntry::warn(message, tag)).await
    }

    /// Log that the step identified by `tag` has started.
    pub async fn in_progress(&self, message: impl Into<String>, tag: impl Into<String>) -> &Self {
        self.emit(LogEntry::in_progress(message, tag)).await
    }

    /// Log a progress update for the step identified by `tag`.
    pub async fn status_update(
        &self,
        message: impl Into<String>,
        tag: impl Into<String>,
    ) -> &Self {
        self.emit(LogEntry::status_update(message, tag)).await
    }

    /// Mark the step identified by `tag` as done.
    pub async fn done(&self, tag: impl Into<String>) -> &Self {
        self.emit(LogEntry::done(tag)).await
    }

    /// Report success with the default `"success!"` message.
    pub async fn finish(&self) -> &Self {
        self.finish_with_message("success!").await
    }

    /// Report success with a custom message.
    pub async fn finish_with_message(&self, message: impl Into<String>) -> &Self {
        self.emit(LogEntry::finish(message)).await
    }

    /// Point observers at a download URL.
    pub async fn download(&self, url: impl Into<String>) -> &Self {
        self.emit(LogEntry::download(url)).await
    }

    /// Redirect observers to another URL.
    pub async fn redirect(&self, url: impl Into<String>) -> &Self {
        self.emit(LogEntry::redirect(url)).await
    }

    /// Ask observers to render a named template with the given body.
    pub async fn render_template(&self, name: impl Into<String>, body: impl Into<String>) -> &Self {
        self.emit(LogEntry::render_template(name, body)).await
    }

    /// Terminate the log. Closing an already closed job is a no-op.
    pub async fn close(&self) {
        self.emit(LogEntry::close()).await;
    }

    /// Subscribe to the log.
    ///
    /// The receiver yields the whole history in append order, then live
    /// entries, and ends after the Close entry.
    pub async fn try_observe(&self) -> TrackerResult<mpsc::Receiver<LogEntry>> {
        self.call(|reply| JobMessage::Subscribe { reply }).await
    }

    /// Subscribe to the log, falling back to an empty closed stream if the
    /// job is gone.
    pub async fn observe(&self) -> mpsc::Receiver<LogEntry> {
        match self.try_observe().await {
            Ok(rx) => rx,
            Err(e) => {
                tracing::warn!(job_id = %self.id, queue = %self.queue, "Failed to observe: {}", e);
                closed_channel()
            }
        }
    }

    /// Snapshot of the entries appended so far, or the messaging error.
    pub async fn try_history(&self) -> TrackerResult<Vec<LogEntry>> {
        self.call(|reply| JobMessage::GetHistory { reply }).await
    }

    /// Snapshot of the entries appended so far.
    pub async fn history(&self) -> Vec<LogEntry> {
        self.try_history().await.unwrap_or_default()
    }

    /// Check whether the log has been closed. A stale handle counts as closed.
    pub async fn is_closed(&self) -> bool {
        self.call(|reply| JobMessage::IsClosed { reply })
            .await
            .unwrap_or(true)
    }

    /// Stop the backing actor.
    pub(crate) fn shutdown(&self) {
        self.actor.stop(Some("evicted".to_string()));
    }
}

/// A receiver that is already closed and yields nothing.
pub(crate) fn closed_channel() -> mpsc::Receiver<LogEntry> {
    let (_, rx) = mpsc::channel(1);
    rx
}

/// Adapt a log receiver into a `Stream`, e.g. for server-sent events.
pub fn log_stream(rx: mpsc::Receiver<LogEntry>) -> impl Stream<Item = LogEntry> + Send + 'static {
    futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|entry| (entry, rx))
    })
}
