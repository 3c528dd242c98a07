//! Message types for actor communication.

use ractor::RpcReplyPort;
use tokio::sync::mpsc;
use tracker_core::LogEntry;

/// Messages for the JobActor.
#[derive(Debug)]
pub enum JobMessage {
    /// Append an entry and broadcast it. Replies `false` if the log is closed.
    ///
    /// The reply is sent only once every subscriber accepted the entry.
    Append {
        entry: LogEntry,
        reply: RpcReplyPort<bool>,
    },

    /// Subscribe to the log: history first, then live entries.
    Subscribe {
        reply: RpcReplyPort<mpsc::Receiver<LogEntry>>,
    },

    /// Snapshot of the history so far.
    GetHistory { reply: RpcReplyPort<Vec<LogEntry>> },

    /// Check whether Close has been appended.
    IsClosed { reply: RpcReplyPort<bool> },
}

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Error type for tracker operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Failed to spawn job actor: {0}")]
    Spawn(String),

    #[error("Actor error: {0}")]
    Actor(String),

    #[error("Job actor dropped the reply")]
    NoReply,
}
