//! Structured logging schema and field name constants for cellwatch.
//!
//! `tracing` macros take field names as identifiers, so call sites spell the
//! names out literally. These constants document the schema and are what log
//! queries (Loki, Elasticsearch) should use.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Payload decode failures, record store outages |
//! | WARN  | Per-file fallback to `New`, unparsable configuration |
//! | INFO  | Batch completion summaries |
//! | DEBUG | Per-file decisions, hash sizes and digests |
//! | TRACE | Per-record iteration during lookup |

// ─── Identity fields ───────────────────────────────────────────────────────

/// UUIDv7 of the batch being checked (see `BatchContext`).
pub const BATCH_ID: &str = "batch_id";

/// Component within the engine.
/// Values: "hasher", "resolver", "checker", "classifier", "store"
pub const COMPONENT: &str = "component";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Name of the submitted file.
pub const FILE_NAME: &str = "file_name";

/// Position of the file in the submitted batch.
pub const FILE_INDEX: &str = "file_index";

/// Content identity (hex digest).
pub const CONTENT_ID: &str = "content_id";

/// Stored record matched by content identity.
pub const RECORD_ID: &str = "record_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Byte length of a payload or payload fragment. Never the payload itself.
pub const PAYLOAD_LEN: &str = "payload_len";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of files or records in a result.
pub const RESULT_COUNT: &str = "result_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Classification or partition outcome ("new", "duplicate", "needs_upgrade").
pub const OUTCOME: &str = "outcome";

/// Error kind (see `DedupError::kind`).
pub const ERROR_KIND: &str = "error_kind";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
