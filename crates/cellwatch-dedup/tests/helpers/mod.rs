//! Shared fixtures for cellwatch-dedup integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cellwatch_dedup::{
    CheckItem, Classification, ContentHasher, ContentIdentity, DedupError, DuplicateClassifier,
    Error, ExistingRecord, FileDescriptor, RecordStore, Result,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::field::{Field, Visit};
use tracing::Level;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;
use uuid::Uuid;

/// A 1x1 PNG, small enough to inline.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

/// Screenshot-like file whose bytes are unique to `name`.
pub fn screenshot(name: &str) -> FileDescriptor {
    let mut bytes = TINY_PNG.to_vec();
    bytes.extend_from_slice(name.as_bytes());
    FileDescriptor::from_bytes(name, bytes, "image/png")
}

/// A file whose encoded payload is not valid base64.
pub fn corrupt(name: &str) -> FileDescriptor {
    FileDescriptor::from_encoded(name, "data:image/png;base64,***not base64***", "image/png")
}

pub fn identity_of(file: &FileDescriptor) -> ContentIdentity {
    ContentHasher::new()
        .hash_file(file)
        .expect("fixture file must hash")
}

pub fn analysis() -> serde_json::Value {
    json!({"soc": 87, "packVoltage": 53.1, "cellDeltaMv": 12})
}

/// Stored record for `file` with the given quality and attempts.
pub fn record_for(
    file: &FileDescriptor,
    quality: Option<f64>,
    attempts: Option<i32>,
    timestamp: DateTime<Utc>,
) -> ExistingRecord {
    ExistingRecord {
        content_identity: identity_of(file),
        record_id: Uuid::new_v4(),
        timestamp,
        quality_score: quality,
        extraction_attempts: attempts,
        analysis: Some(analysis()),
    }
}

pub fn good_record(file: &FileDescriptor) -> ExistingRecord {
    record_for(file, Some(0.95), Some(2), Utc::now())
}

// =============================================================================
// STORES
// =============================================================================

/// Store whose lookup panics.
pub struct PanickingStore;

#[async_trait]
impl RecordStore for PanickingStore {
    async fn find_records_by_identities(
        &self,
        _identities: &[ContentIdentity],
    ) -> Result<Vec<ExistingRecord>> {
        panic!("store driver bug");
    }
}

/// Store that always refuses.
pub struct DownStore;

#[async_trait]
impl RecordStore for DownStore {
    async fn find_records_by_identities(
        &self,
        _identities: &[ContentIdentity],
    ) -> Result<Vec<ExistingRecord>> {
        Err(Error::Store("connection refused".to_string()))
    }
}

// =============================================================================
// CLASSIFIERS
// =============================================================================

/// How the scripted classifier answers for one file name.
#[derive(Clone)]
pub enum Scripted {
    Answer(Classification),
    Reject(DedupError),
    Hang(Duration),
    Panic,
    NoResults,
}

/// Classifier answering from a per-file-name script; unscripted files are `New`.
#[derive(Default)]
pub struct ScriptedClassifier {
    script: HashMap<String, Scripted>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, file_name: &str, behavior: Scripted) -> Self {
        self.script.insert(file_name.to_string(), behavior);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DuplicateClassifier for ScriptedClassifier {
    async fn classify(
        &self,
        items: Vec<CheckItem>,
    ) -> std::result::Result<Vec<Classification>, DedupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Yield so concurrent calls overlap.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut out = Vec::with_capacity(items.len());
        let mut outcome = Ok(());
        for item in &items {
            match self.script.get(&item.file_name) {
                None => out.push(Classification::New),
                Some(Scripted::Answer(c)) => out.push(c.clone()),
                Some(Scripted::Reject(e)) => {
                    outcome = Err(e.clone());
                    break;
                }
                Some(Scripted::Hang(d)) => {
                    tokio::time::sleep(*d).await;
                    out.push(Classification::New);
                }
                Some(Scripted::Panic) => panic!("classifier bug for {}", item.file_name),
                Some(Scripted::NoResults) => {}
            }
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome.map(|_| out)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// =============================================================================
// LOG CAPTURE
// =============================================================================

/// One captured event: its level and `file_name` field, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Captured {
    pub level: Level,
    pub file_name: Option<String>,
}

/// Layer recording every event emitted while installed.
#[derive(Clone, Default)]
pub struct LogRecorder(Arc<Mutex<Vec<Captured>>>);

impl LogRecorder {
    pub fn events(&self) -> Vec<Captured> {
        self.0.lock().unwrap().clone()
    }

    /// `file_name` values of events at `level`.
    pub fn files_at(&self, level: Level) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .filter_map(|e| e.file_name)
            .collect()
    }
}

struct FileNameVisitor(Option<String>);

impl Visit for FileNameVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "file_name" {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "file_name" {
            self.0 = Some(format!("{:?}", value).trim_matches('"').to_string());
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for LogRecorder {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FileNameVisitor(None);
        event.record(&mut visitor);
        self.0.lock().unwrap().push(Captured {
            level: *event.metadata().level(),
            file_name: visitor.0,
        });
    }
}
