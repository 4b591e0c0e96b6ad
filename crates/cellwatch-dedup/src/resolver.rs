//! Server-side batch duplicate resolution.
//!
//! [`BatchResolver`] hashes every file, looks the distinct identities up in
//! the record store in as few round trips as possible, and classifies each
//! file. The returned vector always matches the input in length and order;
//! per-file problems become `Classification::Failed` at that position.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use cellwatch_core::defaults::LOOKUP_CHUNK_SIZE;
use cellwatch_core::{
    BatchContext, CheckContent, CheckItem, CheckRequest, CheckResponse, Classification,
    ContentIdentity, DedupConfig, DedupError, Error, ExistingRecord, FileDescriptor, RecordStore,
    Result, UpgradePolicy,
};
use futures::future::join_all;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::hashing::hash_file_offloaded;

type Hashed = std::result::Result<ContentIdentity, DedupError>;

/// Content type of payloads submitted inline to the duplicate-check endpoint.
const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// Classifies batches of files against stored analyses.
pub struct BatchResolver {
    store: Arc<dyn RecordStore>,
    policy: UpgradePolicy,
    lookup_chunk_size: usize,
}

/// Builder for [`BatchResolver`]. A store is mandatory.
#[derive(Default)]
pub struct BatchResolverBuilder {
    store: Option<Arc<dyn RecordStore>>,
    policy: Option<UpgradePolicy>,
    lookup_chunk_size: Option<usize>,
}

impl BatchResolverBuilder {
    /// Set the record store queried for prior analyses.
    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the upgrade policy; defaults to [`UpgradePolicy::default`].
    pub fn policy(mut self, policy: UpgradePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Set the maximum identities per store query.
    pub fn lookup_chunk_size(mut self, size: usize) -> Self {
        self.lookup_chunk_size = Some(size);
        self
    }

    /// Apply the policy and chunk size from `config`.
    pub fn config(self, config: &DedupConfig) -> Self {
        self.policy(config.upgrade_policy())
            .lookup_chunk_size(config.lookup_chunk_size)
    }

    /// Build the resolver. Fails with `Error::Config` without a store or
    /// with a zero chunk size.
    pub fn build(self) -> Result<BatchResolver> {
        let store = self
            .store
            .ok_or_else(|| Error::Config("batch resolver requires a record store".to_string()))?;
        let lookup_chunk_size = self.lookup_chunk_size.unwrap_or(LOOKUP_CHUNK_SIZE);
        if lookup_chunk_size == 0 {
            return Err(Error::Config(
                "lookup chunk size must be at least 1".to_string(),
            ));
        }
        Ok(BatchResolver {
            store,
            policy: self.policy.unwrap_or_default(),
            lookup_chunk_size,
        })
    }
}

impl BatchResolver {
    pub fn builder() -> BatchResolverBuilder {
        BatchResolverBuilder::default()
    }

    pub fn policy(&self) -> &UpgradePolicy {
        &self.policy
    }

    /// Classify submitted files.
    pub async fn resolve(&self, files: &[FileDescriptor], ctx: &BatchContext) -> Vec<Classification> {
        let start = Instant::now();
        let hashed = join_all(files.iter().map(|file| hash_file_offloaded(file))).await;
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();

        let results = self.classify_hashed(&names, hashed, ctx).await;
        log_batch_summary(ctx, results.len(), start);
        results
    }

    /// Classify items received by the remote duplicate-check endpoint.
    ///
    /// Items may carry a precomputed identity (validated here) or the encoded
    /// payload (hashed here).
    pub async fn resolve_items(&self, items: &[CheckItem], ctx: &BatchContext) -> Vec<Classification> {
        let start = Instant::now();
        let hashed = join_all(items.iter().map(|item| async move {
            match &item.content {
                CheckContent::Identity { content_identity } => {
                    ContentIdentity::parse(content_identity).map_err(|e| {
                        warn!(
                            batch_id = %ctx.batch_id(),
                            file_name = %item.file_name,
                            error_kind = e.kind(),
                            error = %e,
                            "resolver: item carries an invalid content identity"
                        );
                        e
                    })
                }
                CheckContent::Payload { payload } => {
                    let file = FileDescriptor::from_encoded(
                        item.file_name.as_str(),
                        payload.as_str(),
                        UNKNOWN_CONTENT_TYPE,
                    );
                    hash_file_offloaded(&file).await
                }
            }
        }))
        .await;
        let names: Vec<&str> = items.iter().map(|i| i.file_name.as_str()).collect();

        let results = self.classify_hashed(&names, hashed, ctx).await;
        log_batch_summary(ctx, results.len(), start);
        results
    }

    /// Answer a duplicate-check request in wire form.
    pub async fn handle_request(&self, request: &CheckRequest, ctx: &BatchContext) -> CheckResponse {
        let results = self.resolve_items(&request.files, ctx).await;
        CheckResponse::from_classifications(
            request
                .files
                .iter()
                .map(|item| item.file_name.as_str())
                .zip(results.iter()),
        )
    }

    async fn classify_hashed(
        &self,
        names: &[&str],
        hashed: Vec<Hashed>,
        ctx: &BatchContext,
    ) -> Vec<Classification> {
        let mut identities: Vec<ContentIdentity> = Vec::with_capacity(hashed.len());
        for outcome in &hashed {
            match outcome {
                Ok(id) => {
                    ctx.record_hashed();
                    identities.push(id.clone());
                }
                Err(_) => ctx.record_hash_failure(),
            }
        }
        identities.sort();
        identities.dedup();

        let matches = self.lookup(&identities, ctx).await;

        hashed
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| {
                let classification = match (outcome, &matches) {
                    (Err(error), _) => Classification::failed(error),
                    (Ok(_), Err(error)) => Classification::failed(error.clone()),
                    (Ok(id), Ok(found)) => match found.get(&id) {
                        Some(record) => self.classify_match(record),
                        None => Classification::New,
                    },
                };
                debug!(
                    batch_id = %ctx.batch_id(),
                    file_index = index,
                    file_name = names.get(index).copied().unwrap_or_default(),
                    outcome = classification.outcome(),
                    "resolver: classified file"
                );
                ctx.record_outcome(&classification);
                classification
            })
            .collect()
    }

    fn classify_match(&self, record: &ExistingRecord) -> Classification {
        let decision = self.policy.evaluate(record);
        if decision.needs_upgrade {
            if let Some(reason) = &decision.reason {
                debug!(record_id = %record.record_id, %reason, "resolver: stored analysis needs upgrade");
            }
            Classification::NeedsUpgrade {
                record_id: record.record_id,
                stale_analysis: record.analysis.clone(),
            }
        } else {
            Classification::Duplicate {
                record_id: record.record_id,
                cached_analysis: record.analysis.clone(),
                timestamp: record.timestamp,
            }
        }
    }

    /// Fetch the newest stored record per identity.
    ///
    /// Any failing chunk fails the whole lookup: every file still pending is
    /// then marked `LookupUnavailable`.
    async fn lookup(
        &self,
        identities: &[ContentIdentity],
        ctx: &BatchContext,
    ) -> std::result::Result<HashMap<ContentIdentity, ExistingRecord>, DedupError> {
        let mut newest: HashMap<ContentIdentity, ExistingRecord> = HashMap::new();

        for chunk in identities.chunks(self.lookup_chunk_size) {
            ctx.record_lookup();
            let call = AssertUnwindSafe(self.store.find_records_by_identities(chunk));
            let records = match call.catch_unwind().await {
                Ok(Ok(records)) => records,
                Ok(Err(e)) => return Err(self.lookup_failed(identities.len(), e.to_string(), ctx)),
                Err(_) => {
                    return Err(self.lookup_failed(
                        identities.len(),
                        "record store panicked".to_string(),
                        ctx,
                    ))
                }
            };

            for record in records {
                match newest.entry(record.content_identity.clone()) {
                    Entry::Occupied(mut slot) => {
                        if record.timestamp > slot.get().timestamp {
                            slot.insert(record);
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(record);
                    }
                }
            }
        }

        Ok(newest)
    }

    fn lookup_failed(&self, pending: usize, message: String, ctx: &BatchContext) -> DedupError {
        ctx.record_lookup_failure();
        error!(
            batch_id = %ctx.batch_id(),
            pending,
            error = %message,
            "resolver: record store lookup failed, marking pending files unavailable"
        );
        DedupError::LookupUnavailable(message)
    }
}

fn log_batch_summary(ctx: &BatchContext, result_count: usize, start: Instant) {
    let stats = ctx.stats();
    info!(
        batch_id = %ctx.batch_id(),
        result_count,
        duplicates = stats.duplicates,
        upgrades = stats.upgrades,
        new = stats.new,
        failed = stats.failed,
        duration_ms = start.elapsed().as_millis() as u64,
        "resolver: batch classified"
    );
}
