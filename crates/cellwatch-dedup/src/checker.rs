//! Client-side duplicate checking.
//!
//! [`DuplicateChecker`] asks a [`DuplicateClassifier`] about every file of a
//! batch, one independent task per file. It never fails a batch: any
//! per-file problem is logged and that file is treated as `New`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cellwatch_core::{
    BatchContext, CheckItem, CheckerConfig, Classification, ContentIdentity, DedupError,
    DuplicateClassifier, FileDescriptor,
};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinError};
use tracing::{debug, info, warn};

use crate::hashing::hash_file_offloaded;

/// Result of one per-file task.
struct TaskOutcome {
    hash_ok: bool,
    result: Result<Classification, DedupError>,
}

/// Aborts still-running per-file tasks when `check_all` is dropped early.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Checks batches of files against a classifier with per-file fault isolation.
pub struct DuplicateChecker {
    classifier: Arc<dyn DuplicateClassifier>,
    config: CheckerConfig,
}

impl DuplicateChecker {
    pub fn new(classifier: Arc<dyn DuplicateClassifier>, config: CheckerConfig) -> Self {
        Self { classifier, config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Classify every file in `files`.
    ///
    /// The result has the same length and order as `files` and never contains
    /// `Classification::Failed`. Fallbacks are recorded in `ctx`.
    ///
    /// `max_concurrent_checks` bounds the remote calls of this batch only;
    /// concurrent batches on the same checker do not share permits.
    pub async fn check_all(&self, files: &[FileDescriptor], ctx: &BatchContext) -> Vec<Classification> {
        let start = Instant::now();
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_checks.max(1)));

        let handles: Vec<_> = files
            .iter()
            .map(|file| {
                tokio::spawn(check_one(
                    Arc::clone(&self.classifier),
                    Arc::clone(&permits),
                    self.config.remote_timeout,
                    file.clone(),
                ))
            })
            .collect();
        let _guard = AbortOnDrop(handles.iter().map(|h| h.abort_handle()).collect());

        let joined = join_all(handles).await;

        let results: Vec<Classification> = joined
            .into_iter()
            .zip(files)
            .enumerate()
            .map(|(index, (joined, file))| {
                let result = match joined {
                    Ok(outcome) => {
                        if outcome.hash_ok {
                            ctx.record_hashed();
                        } else {
                            ctx.record_hash_failure();
                        }
                        outcome.result
                    }
                    Err(join_err) => Err(task_failure(join_err)),
                };
                let classification = self.settle(index, file, result, ctx);
                ctx.record_outcome(&classification);
                classification
            })
            .collect();

        let stats = ctx.stats();
        info!(
            batch_id = %ctx.batch_id(),
            classifier = self.classifier.name(),
            result_count = results.len(),
            duplicates = stats.duplicates,
            upgrades = stats.upgrades,
            new = stats.new,
            fallbacks = stats.fallbacks,
            duration_ms = start.elapsed().as_millis() as u64,
            "checker: batch checked"
        );
        results
    }

    /// Turn a task result into a final classification, falling back to `New`.
    fn settle(
        &self,
        index: usize,
        file: &FileDescriptor,
        result: Result<Classification, DedupError>,
        ctx: &BatchContext,
    ) -> Classification {
        let error = match result {
            Ok(Classification::Failed { error }) | Err(error) => error,
            Ok(classification) => {
                debug!(
                    batch_id = %ctx.batch_id(),
                    file_index = index,
                    file_name = %file.name,
                    outcome = classification.outcome(),
                    "checker: file classified"
                );
                return classification;
            }
        };

        warn!(
            batch_id = %ctx.batch_id(),
            file_index = index,
            file_name = %file.name,
            error_kind = error.kind(),
            error = %error,
            "checker: duplicate check failed, treating file as new"
        );
        ctx.record_fallback(index, &file.name, error.to_string());
        Classification::New
    }
}

async fn check_one(
    classifier: Arc<dyn DuplicateClassifier>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    file: FileDescriptor,
) -> TaskOutcome {
    let identity = match hash_file_offloaded(&file).await {
        Ok(identity) => identity,
        Err(error) => {
            return TaskOutcome {
                hash_ok: false,
                result: Err(error),
            }
        }
    };

    let result = classify_remote(classifier.as_ref(), &permits, timeout, &file.name, &identity).await;
    TaskOutcome {
        hash_ok: true,
        result,
    }
}

async fn classify_remote(
    classifier: &dyn DuplicateClassifier,
    permits: &Semaphore,
    timeout: Duration,
    file_name: &str,
    identity: &ContentIdentity,
) -> Result<Classification, DedupError> {
    let _permit = permits
        .acquire()
        .await
        .map_err(|_| DedupError::Internal("check semaphore closed".to_string()))?;

    let item = CheckItem::identity(file_name, identity);
    let results = match tokio::time::timeout(timeout, classifier.classify(vec![item])).await {
        Ok(results) => results?,
        Err(_) => {
            return Err(DedupError::RemoteTimeout {
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    };

    let count = results.len();
    let mut results = results.into_iter();
    match (results.next(), count) {
        (Some(classification), 1) => Ok(classification),
        _ => Err(DedupError::RemoteProtocol(format!(
            "expected 1 result, got {}",
            count
        ))),
    }
}

fn task_failure(err: JoinError) -> DedupError {
    if err.is_panic() {
        DedupError::Internal("check task panicked".to_string())
    } else {
        DedupError::Internal("check task was cancelled".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_batch_yields_empty_result() {
        struct Never;

        #[async_trait::async_trait]
        impl DuplicateClassifier for Never {
            async fn classify(&self, _items: Vec<CheckItem>) -> Result<Vec<Classification>, DedupError> {
                panic!("classifier must not be called for an empty batch");
            }

            fn name(&self) -> &str {
                "never"
            }
        }

        let checker = DuplicateChecker::new(Arc::new(Never), CheckerConfig::default());
        let ctx = BatchContext::new();
        assert!(checker.check_all(&[], &ctx).await.is_empty());
        assert_eq!(ctx.stats().fallbacks, 0);
    }
}
