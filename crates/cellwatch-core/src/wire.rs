//! JSON shapes exchanged with the remote duplicate-check endpoint.
//!
//! Field names are camelCase on the wire. The request carries either a
//! precomputed content identity or the encoded payload for each file; the
//! response carries one item per requested file, in request order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::DedupError;
use crate::models::{Classification, ContentIdentity};

/// What the server should look up for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckContent {
    Identity {
        #[serde(rename = "contentIdentity")]
        content_identity: String,
    },
    Payload {
        payload: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckItem {
    pub file_name: String,
    #[serde(flatten)]
    pub content: CheckContent,
}

impl CheckItem {
    pub fn identity(file_name: impl Into<String>, id: &ContentIdentity) -> Self {
        Self {
            file_name: file_name.into(),
            content: CheckContent::Identity {
                content_identity: id.as_str().to_string(),
            },
        }
    }

    pub fn payload(file_name: impl Into<String>, encoded: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: CheckContent::Payload {
                payload: encoded.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub files: Vec<CheckItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponseItem {
    pub file_name: String,
    pub is_duplicate: bool,
    pub needs_upgrade: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_analysis: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Set when the server could not classify the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResponseItem {
    /// Encode a server-side classification for the wire.
    pub fn from_classification(file_name: impl Into<String>, classification: &Classification) -> Self {
        let mut item = Self {
            file_name: file_name.into(),
            is_duplicate: false,
            needs_upgrade: false,
            record_id: None,
            cached_analysis: None,
            timestamp: None,
            error: None,
        };
        match classification {
            Classification::New => {}
            Classification::Duplicate {
                record_id,
                cached_analysis,
                timestamp,
            } => {
                item.is_duplicate = true;
                item.record_id = Some(*record_id);
                item.cached_analysis = cached_analysis.clone();
                item.timestamp = Some(*timestamp);
            }
            Classification::NeedsUpgrade {
                record_id,
                stale_analysis,
            } => {
                item.is_duplicate = true;
                item.needs_upgrade = true;
                item.record_id = Some(*record_id);
                item.cached_analysis = stale_analysis.clone();
            }
            Classification::Failed { error } => {
                item.error = Some(error.to_string());
            }
        }
        item
    }

    /// Decode a wire item back into a classification.
    ///
    /// A duplicate or upgrade flag without a record id, or a duplicate
    /// without a timestamp, is a protocol error.
    pub fn into_classification(self) -> Result<Classification, DedupError> {
        if let Some(message) = self.error {
            return Ok(Classification::failed(DedupError::Remote(format!(
                "server could not classify {}: {}",
                self.file_name, message
            ))));
        }

        if self.needs_upgrade {
            let record_id = self.record_id.ok_or_else(|| {
                DedupError::RemoteProtocol(format!(
                    "{}: needsUpgrade without recordId",
                    self.file_name
                ))
            })?;
            return Ok(Classification::NeedsUpgrade {
                record_id,
                stale_analysis: self.cached_analysis,
            });
        }

        if self.is_duplicate {
            let record_id = self.record_id.ok_or_else(|| {
                DedupError::RemoteProtocol(format!(
                    "{}: isDuplicate without recordId",
                    self.file_name
                ))
            })?;
            let timestamp = self.timestamp.ok_or_else(|| {
                DedupError::RemoteProtocol(format!(
                    "{}: isDuplicate without timestamp",
                    self.file_name
                ))
            })?;
            return Ok(Classification::Duplicate {
                record_id,
                cached_analysis: self.cached_analysis,
                timestamp,
            });
        }

        Ok(Classification::New)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub results: Vec<CheckResponseItem>,
}

impl CheckResponse {
    /// Encode resolver output, pairing each classification with its file name.
    pub fn from_classifications<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Classification)>,
    {
        Self {
            results: pairs
                .into_iter()
                .map(|(name, classification)| {
                    CheckResponseItem::from_classification(name, classification)
                })
                .collect(),
        }
    }
}
