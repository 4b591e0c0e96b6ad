//! Per-batch diagnostics.
//!
//! A [`BatchContext`] is created by the caller for one `resolve`/`check_all`
//! invocation and passed in by reference. Counters are atomic so the
//! resolver and checker can record through `&BatchContext`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::Serialize;
use uuid::Uuid;

use crate::models::Classification;

/// A file whose check failed and was absorbed into the `New` fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackNote {
    pub index: usize,
    pub file_name: String,
    pub reason: String,
}

/// Snapshot of a batch's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub hashed: usize,
    pub hash_failures: usize,
    pub lookups: usize,
    pub lookup_failures: usize,
    pub duplicates: usize,
    pub upgrades: usize,
    pub new: usize,
    pub failed: usize,
    pub fallbacks: usize,
}

#[derive(Debug)]
pub struct BatchContext {
    batch_id: Uuid,
    hashed: AtomicUsize,
    hash_failures: AtomicUsize,
    lookups: AtomicUsize,
    lookup_failures: AtomicUsize,
    duplicates: AtomicUsize,
    upgrades: AtomicUsize,
    new: AtomicUsize,
    failed: AtomicUsize,
    fallbacks: Mutex<Vec<FallbackNote>>,
}

impl Default for BatchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchContext {
    pub fn new() -> Self {
        Self::with_id(Uuid::now_v7())
    }

    pub fn with_id(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            hashed: AtomicUsize::new(0),
            hash_failures: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            lookup_failures: AtomicUsize::new(0),
            duplicates: AtomicUsize::new(0),
            upgrades: AtomicUsize::new(0),
            new: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            fallbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    pub fn record_hashed(&self) {
        self.hashed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hash_failure(&self) {
        self.hash_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup_failure(&self) {
        self.lookup_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a final classification.
    pub fn record_outcome(&self, classification: &Classification) {
        let counter = match classification {
            Classification::New => &self.new,
            Classification::Duplicate { .. } => &self.duplicates,
            Classification::NeedsUpgrade { .. } => &self.upgrades,
            Classification::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Remember a file that fell back to `New`.
    pub fn record_fallback(&self, index: usize, file_name: &str, reason: impl Into<String>) {
        let note = FallbackNote {
            index,
            file_name: file_name.to_string(),
            reason: reason.into(),
        };
        match self.fallbacks.lock() {
            Ok(mut notes) => notes.push(note),
            Err(poisoned) => poisoned.into_inner().push(note),
        }
    }

    /// Fallback notes recorded so far, in recording order.
    pub fn fallbacks(&self) -> Vec<FallbackNote> {
        match self.fallbacks.lock() {
            Ok(notes) => notes.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn stats(&self) -> BatchStats {
        BatchStats {
            hashed: self.hashed.load(Ordering::Relaxed),
            hash_failures: self.hash_failures.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            lookup_failures: self.lookup_failures.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            upgrades: self.upgrades.load(Ordering::Relaxed),
            new: self.new.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            fallbacks: self.fallbacks().len(),
        }
    }
}
