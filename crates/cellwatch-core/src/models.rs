//! Core data models for cellwatch duplicate detection.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::defaults::CONTENT_IDENTITY_LEN;
use crate::error::DedupError;

// =============================================================================
// CONTENT IDENTITY
// =============================================================================

/// Fixed-length hex digest identifying image content.
///
/// Only produced by [`crate::hash::ContentHasher`] or validated through
/// [`ContentIdentity::parse`], so every value is 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentIdentity(String);

impl ContentIdentity {
    /// Validate a digest received from outside the hasher.
    pub fn parse(value: &str) -> std::result::Result<Self, DedupError> {
        let trimmed = value.trim();
        if trimmed.len() != CONTENT_IDENTITY_LEN {
            return Err(DedupError::InvalidIdentity(format!(
                "expected {} hex characters, got {}",
                CONTENT_IDENTITY_LEN,
                trimmed.len()
            )));
        }
        if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DedupError::InvalidIdentity(
                "contains non-hex characters".to_string(),
            ));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// The digest as 64 lowercase hex characters.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentIdentity {
    type Error = DedupError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentIdentity> for String {
    fn from(id: ContentIdentity) -> Self {
        id.0
    }
}

// =============================================================================
// SUBMITTED FILES
// =============================================================================

/// Image payload as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Raw image bytes.
    Raw(Vec<u8>),
    /// Base64 text, optionally wrapped in a data URI (`data:image/png;base64,...`).
    Encoded(String),
}

impl Payload {
    /// Size of the payload as submitted (encoded length for `Encoded`).
    pub fn len(&self) -> usize {
        match self {
            Payload::Raw(bytes) => bytes.len(),
            Payload::Encoded(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A file submitted for one check-and-dispatch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub payload: Payload,
    pub content_type: String,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, payload: Payload, content_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload,
            content_type: content_type.into(),
        }
    }

    /// File backed by raw bytes.
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: Vec<u8>,
        content_type: impl Into<String>,
    ) -> Self {
        Self::new(name, Payload::Raw(bytes), content_type)
    }

    /// File backed by base64 text or a data URI.
    pub fn from_encoded(
        name: impl Into<String>,
        encoded: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self::new(name, Payload::Encoded(encoded.into()), content_type)
    }
}

// =============================================================================
// STORED RECORDS
// =============================================================================

/// A previously stored analysis, as returned by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingRecord {
    pub content_identity: ContentIdentity,
    pub record_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Extraction quality on a 0.0–1.0 scale; `None` when never scored.
    pub quality_score: Option<f64>,
    pub extraction_attempts: Option<i32>,
    /// Cached analysis payload, served on the fast path.
    pub analysis: Option<JsonValue>,
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Outcome of checking one file against prior analyses.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Content never seen before; full analysis required.
    New,
    /// Exact repeat of a stored analysis of acceptable quality.
    Duplicate {
        record_id: Uuid,
        cached_analysis: Option<JsonValue>,
        timestamp: DateTime<Utc>,
    },
    /// Repeat whose stored analysis must be redone.
    NeedsUpgrade {
        record_id: Uuid,
        stale_analysis: Option<JsonValue>,
    },
    /// The check for this file could not be completed.
    Failed { error: DedupError },
}

impl Classification {
    /// Stable outcome label for logs and wire encoding.
    pub fn outcome(&self) -> &'static str {
        match self {
            Classification::New => "new",
            Classification::Duplicate { .. } => "duplicate",
            Classification::NeedsUpgrade { .. } => "needs_upgrade",
            Classification::Failed { .. } => "failed",
        }
    }

    /// Id of the stored record a `Duplicate` or `NeedsUpgrade` refers to.
    pub fn record_id(&self) -> Option<Uuid> {
        match self {
            Classification::Duplicate { record_id, .. }
            | Classification::NeedsUpgrade { record_id, .. } => Some(*record_id),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Classification::Failed { .. })
    }

    pub fn failed(error: DedupError) -> Self {
        Classification::Failed { error }
    }
}
