//! Core domain types for job progress tracking.
//!
//! This crate contains the data shared by the runtime and its consumers:
//! - LogEntry and LogLevel for the ordered progress log of a job
//! - RunId for telling one run of a job key apart from the next
//! - TrackerConfig for tuning subscriber buffering

mod config;
mod entry;
mod run;

pub use config::{MAX_SUBSCRIBER_CAPACITY, TrackerConfig};
pub use entry::{LogEntry, LogLevel};
pub use run::RunId;
