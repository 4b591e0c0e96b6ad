//! Collaborator traits for the duplicate-detection engine.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::{DedupError, Result};
use crate::models::{Classification, ContentIdentity, ExistingRecord};
use crate::wire::CheckItem;

// =============================================================================
// RECORD STORE
// =============================================================================

/// Read-only access to previously stored analyses.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch every stored record whose identity is in `identities`.
    ///
    /// Implementations must answer with one round trip per call. Several
    /// records may share an identity; order is unspecified.
    async fn find_records_by_identities(
        &self,
        identities: &[ContentIdentity],
    ) -> Result<Vec<ExistingRecord>>;
}

// =============================================================================
// REMOTE CLASSIFICATION
// =============================================================================

/// Classifies files against prior analyses, locally or over the network.
#[async_trait]
pub trait DuplicateClassifier: Send + Sync {
    /// Classify `items`, returning one classification per item in order.
    async fn classify(
        &self,
        items: Vec<CheckItem>,
    ) -> std::result::Result<Vec<Classification>, DedupError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}
