//! Quality-based re-processing policy for previously stored analyses.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::models::ExistingRecord;

/// Why a stored analysis must be redone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpgradeReason {
    MissingQuality,
    LowQuality { score: f64, threshold: f64 },
    MissingAttempts,
    InsufficientAttempts { attempts: i32, minimum: i32 },
}

impl fmt::Display for UpgradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeReason::MissingQuality => write!(f, "no quality score recorded"),
            UpgradeReason::LowQuality { score, threshold } => {
                write!(f, "quality score {:.2} below threshold {:.2}", score, threshold)
            }
            UpgradeReason::MissingAttempts => write!(f, "no extraction attempts recorded"),
            UpgradeReason::InsufficientAttempts { attempts, minimum } => write!(
                f,
                "{} extraction attempt(s), {} required",
                attempts, minimum
            ),
        }
    }
}

/// Result of evaluating a stored record against the policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDecision {
    pub needs_upgrade: bool,
    pub reason: Option<UpgradeReason>,
}

impl UpgradeDecision {
    fn keep() -> Self {
        Self {
            needs_upgrade: false,
            reason: None,
        }
    }

    fn redo(reason: UpgradeReason) -> Self {
        Self {
            needs_upgrade: true,
            reason: Some(reason),
        }
    }
}

/// Thresholds deciding whether a stored analysis is good enough to reuse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpgradePolicy {
    /// Minimum acceptable quality score (0.0–1.0).
    pub quality_threshold: f64,
    /// Attempts needed before a record counts as fully processed.
    pub min_extraction_attempts: i32,
}

impl Default for UpgradePolicy {
    fn default() -> Self {
        Self {
            quality_threshold: defaults::QUALITY_THRESHOLD,
            min_extraction_attempts: defaults::MIN_EXTRACTION_ATTEMPTS,
        }
    }
}

impl UpgradePolicy {
    pub fn new(quality_threshold: f64, min_extraction_attempts: i32) -> Self {
        Self {
            quality_threshold,
            min_extraction_attempts,
        }
    }

    /// Decide whether `record` must be re-analyzed.
    ///
    /// Absent or NaN quality data always requires an upgrade. Quality rules
    /// are checked before attempt rules.
    pub fn evaluate(&self, record: &ExistingRecord) -> UpgradeDecision {
        match record.quality_score {
            None => return UpgradeDecision::redo(UpgradeReason::MissingQuality),
            Some(score) if score.is_nan() => {
                return UpgradeDecision::redo(UpgradeReason::MissingQuality)
            }
            Some(score) if score < self.quality_threshold => {
                return UpgradeDecision::redo(UpgradeReason::LowQuality {
                    score,
                    threshold: self.quality_threshold,
                })
            }
            Some(_) => {}
        }

        match record.extraction_attempts {
            None => UpgradeDecision::redo(UpgradeReason::MissingAttempts),
            Some(attempts) if attempts < self.min_extraction_attempts => {
                UpgradeDecision::redo(UpgradeReason::InsufficientAttempts {
                    attempts,
                    minimum: self.min_extraction_attempts,
                })
            }
            Some(_) => UpgradeDecision::keep(),
        }
    }
}
