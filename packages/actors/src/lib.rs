//! Actor runtime for job progress tracking.
//!
//! Each job is a Ractor actor that owns its log history and subscriber
//! channels, so appends and subscriptions are serialized without shared
//! mutable state.
//!
//! # Architecture
//!
//! - `QueueRegistry` - Maps queue names to job sets, created on first use
//! - `JobSet` - Jobs of one queue; idempotent start and eviction
//! - `Job` - Handle to a job actor with a fluent logging API
//!
//! # Usage
//!
//! ```ignore
//! use tracker_actors::{CancellationToken, QueueRegistry};
//!
//! let registry = QueueRegistry::new();
//! let token = CancellationToken::new();
//! let job = registry
//!     .enqueue("downloads", "abc", token.clone(), |job| async move {
//!         job.info("start").await.download("http://x/file").await.finish().await;
//!     })
//!     .await?;
//!
//! let mut log = job.observe().await;
//! while let Some(entry) = log.recv().await {
//!     println!("{}", entry.to_sse_event());
//! }
//! ```

mod job;
mod job_actor;
mod job_set;
mod messages;
mod registry;

pub use job::{Job, log_stream};
pub use job_set::JobSet;
pub use messages::{TrackerError, TrackerResult};
pub use registry::QueueRegistry;

/// Re-export of the cancellation signal taken by `enqueue`.
pub use tokio_util::sync::CancellationToken;
