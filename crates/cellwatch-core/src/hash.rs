//! Content hashing for submitted images.
//!
//! Identities are SHA-256 over the decoded image bytes, so the same picture
//! hashes identically whether it arrives as raw bytes, bare base64, or a
//! data URI.

use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::{alphabet, Engine};
use sha2::{Digest, Sha256};
use tracing::{debug, error};

use crate::error::DedupError;
use crate::models::{ContentIdentity, FileDescriptor, Payload};

/// Marker separating a data-URI header from its base64 body.
const BASE64_MARKER: &str = ";base64,";

/// Standard alphabet, padding optional on decode.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Derives [`ContentIdentity`] values from image payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a payload, decoding it first when it is base64 text.
    ///
    /// A decode failure is logged once at `error!` with the fragment size.
    pub fn hash(&self, payload: &Payload) -> Result<ContentIdentity, DedupError> {
        self.compute(payload).map_err(|err| {
            error!(
                payload_len = payload.len(),
                error_kind = err.kind(),
                error = %err,
                "hasher: failed to decode encoded payload"
            );
            err
        })
    }

    /// Hash a submitted file. A decode failure is logged once, with the file name.
    pub fn hash_file(&self, file: &FileDescriptor) -> Result<ContentIdentity, DedupError> {
        self.compute(&file.payload).map_err(|err| {
            error!(
                file_name = %file.name,
                payload_len = file.payload.len(),
                error_kind = err.kind(),
                error = %err,
                "hasher: file could not be hashed"
            );
            err
        })
    }

    fn compute(&self, payload: &Payload) -> Result<ContentIdentity, DedupError> {
        match payload {
            Payload::Raw(bytes) => Ok(self.hash_bytes(bytes)),
            Payload::Encoded(text) => Ok(self.hash_bytes(&decode_encoded(text)?)),
        }
    }

    /// Hash already-decoded bytes.
    pub fn hash_bytes(&self, bytes: &[u8]) -> ContentIdentity {
        let digest = Sha256::digest(bytes);
        let id = ContentIdentity::from_digest(&digest);
        debug!(payload_len = bytes.len(), content_id = %id, "hasher: computed identity");
        id
    }
}

/// Strip any `<scheme>;base64,` prefix, returning the base64 body.
pub fn strip_data_uri(text: &str) -> &str {
    match text.find(BASE64_MARKER) {
        Some(pos) => &text[pos + BASE64_MARKER.len()..],
        None => text,
    }
}

fn decode_encoded(text: &str) -> Result<Vec<u8>, DedupError> {
    let body = strip_data_uri(text);
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    LENIENT_STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| DedupError::HashDecode {
            fragment_len: body.len(),
            message: e.to_string(),
        })
}
