//! Log entry types for job progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a log entry.
///
/// `Close` is the single terminal level: once appended, a job's log accepts
/// nothing more and every subscriber stream ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
    Warn,
    Done,
    InProgress,
    Finish,
    Redirect,
    Download,
    RenderTemplate,
    StatusUpdate,
    Close,
}

impl LogLevel {
    /// Check if this level terminates the log.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LogLevel::Close)
    }

    /// Wire name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Done => "done",
            LogLevel::InProgress => "inprogress",
            LogLevel::Finish => "finish",
            LogLevel::Redirect => "redirect",
            LogLevel::Download => "download",
            LogLevel::RenderTemplate => "rendertemplate",
            LogLevel::StatusUpdate => "statusupdate",
            LogLevel::Close => "close",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a job's progress.
///
/// Entries are built by the level-specific constructors below and stamped
/// with a timestamp when the job appends them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Free-form categorization, e.g. the step an error belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Target URL or path for `Download` and `Redirect`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(
        rename = "template",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub template_name: Option<String>,
    #[serde(rename = "body", default, skip_serializing_if = "Option::is_none")]
    pub template_body: Option<String>,
    /// Set at append time; `None` until the entry is part of a job's log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.is_empty() { None } else { Some(value) }
}

impl LogEntry {
    /// Create a bare entry of the given level.
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            message: None,
            tag: None,
            location: None,
            template_name: None,
            template_body: None,
            timestamp: None,
        }
    }

    /// Set the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = non_empty(message);
        self
    }

    /// Set the tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = non_empty(tag);
        self
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = non_empty(location);
        self
    }

    /// Set the template name and body.
    pub fn with_template(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.template_name = non_empty(name);
        self.template_body = non_empty(body);
        self
    }

    /// Informational message.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info).with_message(message)
    }

    /// Failure of the step identified by `tag`.
    pub fn error(message: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(LogLevel::Error).with_message(message).with_tag(tag)
    }

    /// Warning for the step identified by `tag`.
    pub fn warn(message: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn).with_message(message).with_tag(tag)
    }

    /// Start of the step identified by `tag`.
    pub fn in_progress(message: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(LogLevel::InProgress)
            .with_message(message)
            .with_tag(tag)
    }

    /// Progress update for the step identified by `tag`.
    pub fn status_update(message: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(LogLevel::StatusUpdate)
            .with_message(message)
            .with_tag(tag)
    }

    /// Marks the step identified by `tag` as done.
    pub fn done(tag: impl Into<String>) -> Self {
        Self::new(LogLevel::Done).with_tag(tag)
    }

    /// Successful end of the work.
    pub fn finish(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Finish).with_message(message)
    }

    /// Download available at `location`.
    pub fn download(location: impl Into<String>) -> Self {
        Self::new(LogLevel::Download).with_location(location)
    }

    /// Redirect to `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(LogLevel::Redirect).with_location(location)
    }

    /// Template to render on the client.
    pub fn render_template(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(LogLevel::RenderTemplate).with_template(name, body)
    }

    /// Terminal entry.
    pub fn close() -> Self {
        Self::new(LogLevel::Close)
    }

    /// Check if this entry terminates the log.
    pub fn is_terminal(&self) -> bool {
        self.level.is_terminal()
    }

    /// Message used when mirroring the entry to diagnostics.
    ///
    /// Levels whose payload lives outside `message` report their level name.
    pub fn diagnostic_message(&self) -> &str {
        match self.level {
            LogLevel::Done
            | LogLevel::Finish
            | LogLevel::Redirect
            | LogLevel::StatusUpdate
            | LogLevel::RenderTemplate => self.level.as_str(),
            _ => self.message.as_deref().unwrap_or_default(),
        }
    }

    /// Format the entry as a Server-Sent Events frame.
    pub fn to_sse_event(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!("data: {}\n\n", json)
    }
}
