//! In-process record store.
//!
//! Used by tests and single-node deployments without PostgreSQL. Counts
//! lookups so callers can verify batching, and can be switched into an
//! unavailable state to exercise store-outage handling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use cellwatch_core::{ContentIdentity, Error, ExistingRecord, RecordStore, Result};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<ContentIdentity, Vec<ExistingRecord>>>,
    lookups: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-filled with `records`.
    pub fn with_records(records: impl IntoIterator<Item = ExistingRecord>) -> Self {
        let mut map: HashMap<ContentIdentity, Vec<ExistingRecord>> = HashMap::new();
        for record in records {
            map.entry(record.content_identity.clone())
                .or_default()
                .push(record);
        }
        Self {
            records: RwLock::new(map),
            ..Self::default()
        }
    }

    pub async fn insert(&self, record: ExistingRecord) {
        self.records
            .write()
            .await
            .entry(record.content_identity.clone())
            .or_default()
            .push(record);
    }

    /// Number of `find_records_by_identities` calls served or refused.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Make subsequent lookups fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_records_by_identities(
        &self,
        identities: &[ContentIdentity],
    ) -> Result<Vec<ExistingRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Store("memory store marked unavailable".to_string()));
        }

        let records = self.records.read().await;
        let found: Vec<ExistingRecord> = identities
            .iter()
            .filter_map(|id| records.get(id))
            .flatten()
            .cloned()
            .collect();
        debug!(
            component = "store",
            input_count = identities.len(),
            result_count = found.len(),
            "memory store: batch lookup"
        );
        Ok(found)
    }
}
