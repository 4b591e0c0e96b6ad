//! Hashing that keeps large payloads off the async executor.

use cellwatch_core::defaults::HASH_OFFLOAD_THRESHOLD_BYTES;
use cellwatch_core::{ContentHasher, ContentIdentity, DedupError, FileDescriptor, Payload};
use tokio::task::JoinError;

type Hashed = Result<ContentIdentity, DedupError>;

/// Hash `payload`, moving the work to the blocking pool when it is large.
pub async fn hash_offloaded(payload: &Payload) -> Hashed {
    if payload.len() <= HASH_OFFLOAD_THRESHOLD_BYTES {
        return ContentHasher::new().hash(payload);
    }

    let owned = payload.clone();
    joined(tokio::task::spawn_blocking(move || ContentHasher::new().hash(&owned)).await)
}

/// Hash a submitted file; a decode failure is logged once with its name and size.
pub async fn hash_file_offloaded(file: &FileDescriptor) -> Hashed {
    if file.payload.len() <= HASH_OFFLOAD_THRESHOLD_BYTES {
        return ContentHasher::new().hash_file(file);
    }

    let owned = file.clone();
    joined(tokio::task::spawn_blocking(move || ContentHasher::new().hash_file(&owned)).await)
}

fn joined(outcome: Result<Hashed, JoinError>) -> Hashed {
    outcome.map_err(|e| DedupError::Internal(format!("hashing task failed: {}", e)))?
}
