//! Job actor owning one job's log and subscribers.

use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::{Semaphore, mpsc};
use tracker_core::{LogEntry, LogLevel, MAX_SUBSCRIBER_CAPACITY, RunId};

use crate::messages::JobMessage;

/// State for the job actor.
pub struct JobActorState {
    /// Job key, unique within its queue.
    pub id: String,
    /// Queue the job belongs to.
    pub queue: String,
    /// Run this actor serves.
    pub run_id: RunId,
    /// Append-only log history.
    history: Vec<LogEntry>,
    /// Live subscriber channels.
    subscribers: Vec<mpsc::Sender<LogEntry>>,
    /// Set once Close has been appended.
    closed: bool,
    /// Live buffer per subscriber.
    subscriber_capacity: usize,
}

impl JobActorState {
    /// Create a new job actor state.
    pub fn new(args: JobArgs) -> Self {
        Self {
            id: args.id,
            queue: args.queue,
            run_id: args.run_id,
            history: Vec::new(),
            subscribers: Vec::new(),
            closed: false,
            subscriber_capacity: args.subscriber_capacity.clamp(1, MAX_SUBSCRIBER_CAPACITY),
        }
    }

    /// Stamp, record and broadcast an entry.
    ///
    /// Waits for every subscriber to have room; subscribers whose receiver is
    /// gone are dropped. After Close all subscriber channels are released.
    async fn append(&mut self, mut entry: LogEntry) -> bool {
        if self.closed {
            // Repeated close is a silent no-op.
            if entry.is_terminal() {
                return false;
            }
            tracing::warn!(
                job_id = %self.id,
                queue = %self.queue,
                level = %entry.level,
                "Dropping entry appended after close"
            );
            return false;
        }

        let now = Utc::now();
        let timestamp = match self.history.last().and_then(|last| last.timestamp) {
            Some(previous) if previous > now => previous,
            _ => now,
        };
        entry.timestamp = Some(timestamp);

        let terminal = entry.is_terminal();
        if terminal {
            self.closed = true;
        }
        self.history.push(entry.clone());
        self.mirror(&entry);

        let mut live = Vec::with_capacity(self.subscribers.len());
        for tx in self.subscribers.drain(..) {
            if tx.send(entry.clone()).await.is_ok() && !terminal {
                live.push(tx);
            }
        }
        self.subscribers = live;
        true
    }

    /// Open a subscriber channel with the history already queued.
    fn subscribe(&mut self) -> mpsc::Receiver<LogEntry> {
        // Room for the full replay so the actor never waits on a receiver
        // that has not been handed out yet.
        let capacity = self
            .history
            .len()
            .saturating_add(self.subscriber_capacity)
            .min(Semaphore::MAX_PERMITS);
        let (tx, rx) = mpsc::channel(capacity);
        for entry in &self.history {
            if tx.try_send(entry.clone()).is_err() {
                tracing::warn!(job_id = %self.id, queue = %self.queue, "Replay did not fit");
                break;
            }
        }
        if !self.closed {
            self.subscribers.push(tx);
        }
        rx
    }

    /// Mirror an entry to the diagnostic log.
    fn mirror(&self, entry: &LogEntry) {
        let tag = entry.tag.as_deref().unwrap_or_default();
        let location = entry.location.as_deref().unwrap_or_default();
        let template = entry.template_name.as_deref().unwrap_or_default();
        let body = entry.template_body.as_deref().unwrap_or_default();
        let message = entry.diagnostic_message();

        if entry.level == LogLevel::Error {
            tracing::error!(
                job_id = %self.id,
                queue = %self.queue,
                run_id = %self.run_id,
                tag,
                location,
                template,
                body,
                "{}",
                message
            );
        } else {
            tracing::info!(
                job_id = %self.id,
                queue = %self.queue,
                run_id = %self.run_id,
                level = %entry.level,
                tag,
                location,
                template,
                body,
                "{}",
                message
            );
        }
    }
}

/// Job actor arguments.
pub struct JobArgs {
    pub id: String,
    pub queue: String,
    pub run_id: RunId,
    pub subscriber_capacity: usize,
}

/// Actor that serializes all access to one job's log.
pub struct JobActor;

impl Actor for JobActor {
    type Msg = JobMessage;
    type State = JobActorState;
    type Arguments = JobArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::debug!("Starting job actor: {}/{} ({})", args.queue, args.id, args.run_id);
        Ok(JobActorState::new(args))
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        tracing::debug!(
            "Stopped job actor: {}/{} ({}), {} entries",
            state.queue,
            state.id,
            state.run_id,
            state.history.len()
        );
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            JobMessage::Append { entry, reply } => {
                let accepted = state.append(entry).await;
                let _ = reply.send(accepted);
            }

            JobMessage::Subscribe { reply } => {
                let _ = reply.send(state.subscribe());
            }

            JobMessage::GetHistory { reply } => {
                let _ = reply.send(state.history.clone());
            }

            JobMessage::IsClosed { reply } => {
                let _ = reply.send(state.closed);
            }
        }

        Ok(())
    }
}
