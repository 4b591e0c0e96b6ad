//! # cellwatch-dedup
//!
//! Duplicate resolution and checking for BMS display images.
//!
//! This crate provides:
//! - `BatchResolver`: server-side batch classification with a single store lookup
//! - `DuplicateChecker`: client-side checking with per-file fault isolation
//! - `HttpClassifier` and `LocalClassifier`: remote and in-process classifiers
//! - Hashing that keeps large payloads off the async executor
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cellwatch_dedup::{BatchContext, DedupConfig, DuplicateChecker, HttpClassifier, partition};
//!
//! let config = DedupConfig::from_env();
//! let classifier = Arc::new(HttpClassifier::from_config(&config)?);
//! let checker = DuplicateChecker::new(classifier, config.checker_config());
//!
//! let ctx = BatchContext::new();
//! let results = checker.check_all(&files, &ctx).await;
//! let plan = partition(files.into_iter().zip(results));
//! ```

pub mod checker;
pub mod hashing;
pub mod local;
pub mod remote;
pub mod resolver;

// Re-export core types
pub use cellwatch_core::*;

pub use checker::DuplicateChecker;
pub use hashing::{hash_file_offloaded, hash_offloaded};
pub use local::LocalClassifier;
pub use remote::HttpClassifier;
pub use resolver::{BatchResolver, BatchResolverBuilder};
