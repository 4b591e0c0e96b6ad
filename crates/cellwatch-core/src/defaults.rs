//! Centralized default constants for cellwatch.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Environment overrides live in [`crate::config`].

// =============================================================================
// UPGRADE POLICY
// =============================================================================

/// Quality score (0.0–1.0) below which a stored analysis is redone.
pub const QUALITY_THRESHOLD: f64 = 0.7;

/// Extraction attempts a record needs before it counts as fully processed.
pub const MIN_EXTRACTION_ATTEMPTS: i32 = 1;

// =============================================================================
// CONTENT HASHING
// =============================================================================

/// Length of a rendered content identity (SHA-256 as lowercase hex).
pub const CONTENT_IDENTITY_LEN: usize = 64;

/// Payloads larger than this are hashed on the blocking pool.
pub const HASH_OFFLOAD_THRESHOLD_BYTES: usize = 256 * 1024;

// =============================================================================
// BATCH LOOKUP
// =============================================================================

/// Maximum identities bound into one store query.
pub const LOOKUP_CHUNK_SIZE: usize = 500;

// =============================================================================
// REMOTE CLASSIFICATION
// =============================================================================

/// Default base URL of the remote classification endpoint.
pub const CLASSIFY_URL: &str = "http://127.0.0.1:3000";

/// Path of the duplicate-check route on the classification endpoint.
pub const CLASSIFY_PATH: &str = "/api/duplicates/check";

/// Caller-enforced timeout per remote classification call, in seconds.
pub const REMOTE_TIMEOUT_SECS: u64 = 20;

/// Maximum remote classification calls in flight for one batch.
pub const MAX_CONCURRENT_CHECKS: usize = 8;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

pub const ENV_QUALITY_THRESHOLD: &str = "CELLWATCH_QUALITY_THRESHOLD";
pub const ENV_MIN_EXTRACTION_ATTEMPTS: &str = "CELLWATCH_MIN_EXTRACTION_ATTEMPTS";
pub const ENV_REMOTE_TIMEOUT_SECS: &str = "CELLWATCH_REMOTE_TIMEOUT_SECS";
pub const ENV_MAX_CONCURRENT_CHECKS: &str = "CELLWATCH_MAX_CONCURRENT_CHECKS";
pub const ENV_LOOKUP_CHUNK_SIZE: &str = "CELLWATCH_LOOKUP_CHUNK_SIZE";
pub const ENV_CLASSIFY_URL: &str = "CELLWATCH_CLASSIFY_URL";
