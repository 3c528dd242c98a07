#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracker_actors::JobSet;
use tracker_core::{LogEntry, LogLevel};

pub const WAIT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Receive the next entry, failing the test instead of hanging.
pub async fn next(rx: &mut mpsc::Receiver<LogEntry>) -> Option<LogEntry> {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for log entry")
}

/// Receive until the stream ends.
pub async fn drain(rx: &mut mpsc::Receiver<LogEntry>) -> Vec<LogEntry> {
    let mut entries = Vec::new();
    while let Some(entry) = next(rx).await {
        entries.push(entry);
    }
    entries
}

/// Check that nothing arrives for a short while and the stream is still open.
pub async fn assert_idle(rx: &mut mpsc::Receiver<LogEntry>) {
    let got = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(got.is_err(), "expected no entry, got {:?}", got);
}

/// Wait until `key` is no longer registered in `jobs`.
pub async fn wait_evicted(jobs: &JobSet, key: &str) {
    tokio::time::timeout(WAIT, async {
        while jobs.get(key).await.is_some() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job was not evicted");
}

pub fn levels(entries: &[LogEntry]) -> Vec<LogLevel> {
    entries.iter().map(|e| e.level).collect()
}

/// A tracing event as seen by `CapturedEvents`.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: HashMap<String, String>,
}

/// Layer recording every event, for asserting on diagnostics.
#[derive(Clone, Default)]
pub struct CapturedEvents(Arc<Mutex<Vec<CapturedEvent>>>);

impl CapturedEvents {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.message == message)
            .collect()
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: HashMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value = format!("{:?}", value);
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for CapturedEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.0.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}
