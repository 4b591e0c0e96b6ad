//! Environment-driven configuration for the duplicate-detection engine.
//!
//! Every setting has a default in [`crate::defaults`]. `from_env` overrides
//! them from `CELLWATCH_*` variables; unparsable values are logged and the
//! default is kept.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::defaults;
use crate::upgrade::UpgradePolicy;

/// Settings for one client-side checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Caller-enforced timeout per remote classification call.
    pub remote_timeout: Duration,
    /// Maximum remote calls in flight per batch.
    pub max_concurrent_checks: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(defaults::REMOTE_TIMEOUT_SECS),
            max_concurrent_checks: defaults::MAX_CONCURRENT_CHECKS,
        }
    }
}

impl CheckerConfig {
    /// Set the per-call remote timeout.
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Set the per-batch limit on in-flight remote calls (at least 1).
    pub fn with_max_concurrent_checks(mut self, n: usize) -> Self {
        self.max_concurrent_checks = n.max(1);
        self
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupConfig {
    pub quality_threshold: f64,
    pub min_extraction_attempts: i32,
    pub remote_timeout_secs: u64,
    pub max_concurrent_checks: usize,
    pub lookup_chunk_size: usize,
    pub classify_url: String,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            quality_threshold: defaults::QUALITY_THRESHOLD,
            min_extraction_attempts: defaults::MIN_EXTRACTION_ATTEMPTS,
            remote_timeout_secs: defaults::REMOTE_TIMEOUT_SECS,
            max_concurrent_checks: defaults::MAX_CONCURRENT_CHECKS,
            lookup_chunk_size: defaults::LOOKUP_CHUNK_SIZE,
            classify_url: defaults::CLASSIFY_URL.to_string(),
        }
    }
}

impl DedupConfig {
    /// Load configuration from `CELLWATCH_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = Self::default();
        Self {
            quality_threshold: parse_or(
                &lookup,
                defaults::ENV_QUALITY_THRESHOLD,
                base.quality_threshold,
            ),
            min_extraction_attempts: parse_or(
                &lookup,
                defaults::ENV_MIN_EXTRACTION_ATTEMPTS,
                base.min_extraction_attempts,
            ),
            remote_timeout_secs: parse_or(
                &lookup,
                defaults::ENV_REMOTE_TIMEOUT_SECS,
                base.remote_timeout_secs,
            ),
            max_concurrent_checks: parse_or(
                &lookup,
                defaults::ENV_MAX_CONCURRENT_CHECKS,
                base.max_concurrent_checks,
            )
            .max(1),
            lookup_chunk_size: parse_or(
                &lookup,
                defaults::ENV_LOOKUP_CHUNK_SIZE,
                base.lookup_chunk_size,
            )
            .max(1),
            classify_url: lookup(defaults::ENV_CLASSIFY_URL)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(base.classify_url),
        }
    }

    pub fn upgrade_policy(&self) -> UpgradePolicy {
        UpgradePolicy::new(self.quality_threshold, self.min_extraction_attempts)
    }

    pub fn checker_config(&self) -> CheckerConfig {
        CheckerConfig::default()
            .with_remote_timeout(Duration::from_secs(self.remote_timeout_secs))
            .with_max_concurrent_checks(self.max_concurrent_checks)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, ?default, "config: unparsable value, using default");
            default
        }),
    }
}
