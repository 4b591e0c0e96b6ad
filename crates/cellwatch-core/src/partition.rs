//! Routing of classified files to the fast, upgrade, and new paths.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::{Classification, FileDescriptor};

/// A file rendered directly from its stored analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct FastPathEntry {
    pub file: FileDescriptor,
    pub record_id: Uuid,
    pub analysis: JsonValue,
    pub timestamp: DateTime<Utc>,
}

/// A file queued for re-analysis of an existing record.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeEntry {
    pub file: FileDescriptor,
    pub record_id: Uuid,
}

/// Files split by how the downstream pipeline must treat them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub fast_path: Vec<FastPathEntry>,
    pub upgrade_path: Vec<UpgradeEntry>,
    pub new_path: Vec<FileDescriptor>,
}

/// Counts per path, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    pub fast: usize,
    pub upgrade: usize,
    pub new: usize,
}

impl Partition {
    pub fn summary(&self) -> PartitionSummary {
        PartitionSummary {
            fast: self.fast_path.len(),
            upgrade: self.upgrade_path.len(),
            new: self.new_path.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.fast_path.len() + self.upgrade_path.len() + self.new_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split classified files into fast, upgrade, and new paths.
///
/// A `Duplicate` only takes the fast path when it carries usable analysis
/// data; otherwise it is analyzed again like a new file. `NeedsUpgrade`
/// always goes to the upgrade path. Input order is kept within each path.
pub fn partition<I>(classified: I) -> Partition
where
    I: IntoIterator<Item = (FileDescriptor, Classification)>,
{
    let mut out = Partition::default();

    for (file, classification) in classified {
        match classification {
            Classification::NeedsUpgrade { record_id, .. } => {
                out.upgrade_path.push(UpgradeEntry { file, record_id });
            }
            Classification::Duplicate {
                record_id,
                cached_analysis: Some(analysis),
                timestamp,
            } if has_analysis(&analysis) => {
                out.fast_path.push(FastPathEntry {
                    file,
                    record_id,
                    analysis,
                    timestamp,
                });
            }
            Classification::Duplicate { .. } | Classification::New | Classification::Failed { .. } => {
                out.new_path.push(file);
            }
        }
    }

    out
}

/// Whether a cached analysis payload holds anything renderable.
fn has_analysis(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Object(map) => !map.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::String(s) => !s.trim().is_empty(),
        JsonValue::Bool(_) | JsonValue::Number(_) => true,
    }
}
