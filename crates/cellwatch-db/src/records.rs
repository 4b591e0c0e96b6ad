//! PostgreSQL record store: batch lookup of stored analyses by content hash.

use std::time::Instant;

use async_trait::async_trait;
use cellwatch_core::{ContentIdentity, ExistingRecord, RecordStore, Result};
use sqlx::{PgPool, Row};
use tracing::{debug, trace, warn};

/// Reads `bms_analysis` rows for the resolver.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_records_by_identities(
        &self,
        identities: &[ContentIdentity],
    ) -> Result<Vec<ExistingRecord>> {
        if identities.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let hashes: Vec<&str> = identities.iter().map(ContentIdentity::as_str).collect();

        // One round trip for the whole batch.
        let rows = sqlx::query(
            r#"SELECT id, content_hash, quality_score, extraction_attempts,
                      analysis, created_at
               FROM bms_analysis
               WHERE content_hash = ANY($1::text[])"#,
        )
        .bind(hashes)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(record) = record_from_row(row) {
                trace!(record_id = %record.record_id, content_id = %record.content_identity, "store: matched record");
                records.push(record);
            }
        }

        debug!(
            component = "store",
            db_table = "bms_analysis",
            input_count = identities.len(),
            result_count = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "store: batch lookup complete"
        );
        Ok(records)
    }
}

/// Convert a row, skipping rows whose stored hash is not a valid identity.
fn record_from_row(row: &sqlx::postgres::PgRow) -> Option<ExistingRecord> {
    let record_id: uuid::Uuid = row.get("id");
    let raw_hash: String = row.get("content_hash");
    let content_identity = match ContentIdentity::parse(&raw_hash) {
        Ok(id) => id,
        Err(e) => {
            warn!(%record_id, error = %e, "store: skipping row with invalid content hash");
            return None;
        }
    };

    Some(ExistingRecord {
        content_identity,
        record_id,
        timestamp: row.get("created_at"),
        quality_score: row.get("quality_score"),
        extraction_attempts: row.get("extraction_attempts"),
        analysis: row.get("analysis"),
    })
}
