//! # cellwatch-core
//!
//! Core types, policies, and collaborator traits for cellwatch duplicate
//! detection.
//!
//! This crate holds everything that needs no I/O: content hashing, the
//! quality-based upgrade policy, cache partitioning, per-batch diagnostics,
//! and the traits the resolver and checker talk to.

pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
pub mod hash;
pub mod logging;
pub mod models;
pub mod partition;
pub mod traits;
pub mod upgrade;
pub mod wire;

// Re-export commonly used types at crate root
pub use config::{CheckerConfig, DedupConfig};
pub use context::{BatchContext, BatchStats, FallbackNote};
pub use error::{DedupError, Error, Result};
pub use hash::{strip_data_uri, ContentHasher};
pub use models::*;
pub use partition::{partition, FastPathEntry, Partition, PartitionSummary, UpgradeEntry};
pub use traits::*;
pub use upgrade::{UpgradeDecision, UpgradePolicy, UpgradeReason};
pub use wire::{CheckContent, CheckItem, CheckRequest, CheckResponse, CheckResponseItem};
