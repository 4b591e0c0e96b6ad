//! Integration tests for DuplicateChecker.
//!
//! The checker must return one classification per file, in order, and never
//! let a single file's failure leak into the batch.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use cellwatch_db::MemoryRecordStore;
use cellwatch_dedup::{
    partition, BatchContext, BatchResolver, CheckerConfig, Classification, DedupError,
    DuplicateChecker, FileDescriptor, LocalClassifier,
};
use chrono::Utc;
use helpers::*;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use uuid::Uuid;

fn duplicate_answer() -> Classification {
    Classification::Duplicate {
        record_id: Uuid::new_v4(),
        cached_analysis: Some(analysis()),
        timestamp: Utc::now(),
    }
}

fn checker(classifier: Arc<ScriptedClassifier>, config: CheckerConfig) -> DuplicateChecker {
    DuplicateChecker::new(classifier, config)
}

#[tokio::test]
async fn test_rejected_file_falls_back_to_new_alone() {
    let answer = duplicate_answer();
    let classifier = Arc::new(
        ScriptedClassifier::new()
            .on("a.png", Scripted::Answer(answer.clone()))
            .on("b.png", Scripted::Reject(DedupError::Remote("503 Service Unavailable".into()))),
    );
    let ctx = BatchContext::new();

    let results = checker(classifier.clone(), CheckerConfig::default())
        .check_all(
            &[screenshot("a.png"), screenshot("b.png"), screenshot("c.png")],
            &ctx,
        )
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0], answer);
    assert_eq!(results[1], Classification::New);
    assert_eq!(results[2], Classification::New);
    assert!(!results.iter().any(Classification::is_failed));

    let fallbacks = ctx.fallbacks();
    assert_eq!(fallbacks.len(), 1);
    assert_eq!(fallbacks[0].index, 1);
    assert_eq!(fallbacks[0].file_name, "b.png");
    assert!(fallbacks[0].reason.contains("503"));
    assert_eq!(classifier.calls(), 3);
}

#[tokio::test]
async fn test_fallback_is_logged_at_warn_with_file_name() {
    let recorder = LogRecorder::default();
    let subscriber = tracing_subscriber::registry().with(recorder.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let classifier = Arc::new(
        ScriptedClassifier::new().on("b.png", Scripted::Reject(DedupError::Remote("reset".into()))),
    );
    checker(classifier, CheckerConfig::default())
        .check_all(&[screenshot("a.png"), screenshot("b.png")], &BatchContext::new())
        .await;

    assert_eq!(recorder.files_at(Level::WARN), vec!["b.png".to_string()]);
    assert!(recorder.events().iter().any(|e| e.level == Level::INFO));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_affects_only_the_slow_file() {
    let classifier = Arc::new(
        ScriptedClassifier::new()
            .on("fast.png", Scripted::Answer(duplicate_answer()))
            .on("slow.png", Scripted::Hang(Duration::from_secs(3600))),
    );
    let config = CheckerConfig::default().with_remote_timeout(Duration::from_secs(5));
    let ctx = BatchContext::new();
    let started = tokio::time::Instant::now();

    let results = checker(classifier, config)
        .check_all(&[screenshot("slow.png"), screenshot("fast.png")], &ctx)
        .await;

    assert_eq!(results[0], Classification::New);
    assert!(matches!(results[1], Classification::Duplicate { .. }));
    assert!(started.elapsed() < Duration::from_secs(60));

    let fallbacks = ctx.fallbacks();
    assert_eq!(fallbacks.len(), 1);
    assert_eq!(fallbacks[0].file_name, "slow.png");
    assert!(fallbacks[0].reason.contains("timed out after 5000ms"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_batches_do_not_share_permits() {
    let classifier = Arc::new(
        ScriptedClassifier::new()
            .on("stuck-1.png", Scripted::Hang(Duration::from_secs(3600)))
            .on("stuck-2.png", Scripted::Hang(Duration::from_secs(3600)))
            .on("quick.png", Scripted::Answer(duplicate_answer())),
    );
    let config = CheckerConfig::default()
        .with_max_concurrent_checks(2)
        .with_remote_timeout(Duration::from_secs(5));
    let checker = checker(classifier, config);
    let stuck = [screenshot("stuck-1.png"), screenshot("stuck-2.png")];
    let quick = [screenshot("quick.png")];
    let (ctx_a, ctx_b) = (BatchContext::new(), BatchContext::new());
    let started = tokio::time::Instant::now();

    let quick_batch = async {
        let results = checker.check_all(&quick, &ctx_b).await;
        (results, started.elapsed())
    };
    let (stuck_results, (quick_results, quick_elapsed)) =
        tokio::join!(checker.check_all(&stuck, &ctx_a), quick_batch);

    assert!(
        quick_elapsed < Duration::from_secs(1),
        "independent batch waited {:?}",
        quick_elapsed
    );
    assert!(matches!(quick_results[0], Classification::Duplicate { .. }));
    assert_eq!(stuck_results, vec![Classification::New, Classification::New]);
    assert_eq!(ctx_a.stats().fallbacks, 2);
    assert_eq!(ctx_b.stats().fallbacks, 0);
}

#[tokio::test]
async fn test_failed_classification_from_server_becomes_new() {
    let classifier = Arc::new(ScriptedClassifier::new().on(
        "x.png",
        Scripted::Answer(Classification::failed(DedupError::LookupUnavailable(
            "pool exhausted".into(),
        ))),
    ));
    let ctx = BatchContext::new();

    let results = checker(classifier, CheckerConfig::default())
        .check_all(&[screenshot("x.png")], &ctx)
        .await;

    assert_eq!(results, vec![Classification::New]);
    assert!(ctx.fallbacks()[0].reason.contains("pool exhausted"));
}

#[tokio::test]
async fn test_classifier_panic_is_isolated() {
    let classifier = Arc::new(
        ScriptedClassifier::new()
            .on("boom.png", Scripted::Panic)
            .on("ok.png", Scripted::Answer(duplicate_answer())),
    );
    let ctx = BatchContext::new();

    let results = checker(classifier, CheckerConfig::default())
        .check_all(&[screenshot("boom.png"), screenshot("ok.png")], &ctx)
        .await;

    assert_eq!(results[0], Classification::New);
    assert!(matches!(results[1], Classification::Duplicate { .. }));
    assert!(ctx.fallbacks()[0].reason.contains("panicked"));
}

#[tokio::test]
async fn test_missing_result_is_a_protocol_fallback() {
    let classifier = Arc::new(ScriptedClassifier::new().on("gap.png", Scripted::NoResults));
    let ctx = BatchContext::new();

    let results = checker(classifier, CheckerConfig::default())
        .check_all(&[screenshot("gap.png")], &ctx)
        .await;

    assert_eq!(results, vec![Classification::New]);
    assert!(ctx.fallbacks()[0].reason.contains("expected 1 result"));
}

#[tokio::test]
async fn test_unhashable_file_never_reaches_classifier() {
    let classifier = Arc::new(ScriptedClassifier::new());
    let ctx = BatchContext::new();

    let results = checker(classifier.clone(), CheckerConfig::default())
        .check_all(&[corrupt("broken.png"), screenshot("fine.png")], &ctx)
        .await;

    assert_eq!(results, vec![Classification::New, Classification::New]);
    assert_eq!(classifier.calls(), 1);
    let stats = ctx.stats();
    assert_eq!(stats.hashed, 1);
    assert_eq!(stats.hash_failures, 1);
    assert_eq!(stats.fallbacks, 1);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let classifier = Arc::new(ScriptedClassifier::new());
    let config = CheckerConfig::default().with_max_concurrent_checks(2);
    let files: Vec<FileDescriptor> = (0..8).map(|i| screenshot(&format!("f{}.png", i))).collect();

    let results = checker(classifier.clone(), config)
        .check_all(&files, &BatchContext::new())
        .await;

    assert_eq!(results.len(), 8);
    assert_eq!(classifier.calls(), 8);
    assert!(classifier.max_in_flight() <= 2);
}

#[tokio::test]
async fn test_same_names_are_mapped_by_position() {
    let stored = screenshot("same.png");
    let other = FileDescriptor::from_bytes("same.png", b"different pixels".to_vec(), "image/png");
    let record = good_record(&stored);
    let resolver = BatchResolver::builder()
        .store(Arc::new(MemoryRecordStore::with_records(vec![record.clone()])))
        .build()
        .unwrap();
    let checker = DuplicateChecker::new(
        Arc::new(LocalClassifier::new(Arc::new(resolver))),
        CheckerConfig::default(),
    );

    let results = checker
        .check_all(&[other, stored], &BatchContext::new())
        .await;

    assert_eq!(results[0], Classification::New);
    assert_eq!(results[1].record_id(), Some(record.record_id));
}

#[tokio::test]
async fn test_check_then_partition_routes_every_file() {
    let cached = screenshot("cached.png");
    let stale = screenshot("stale.png");
    let unseen = screenshot("unseen.png");
    let store = MemoryRecordStore::with_records(vec![
        good_record(&cached),
        record_for(&stale, None, Some(1), Utc::now()),
    ]);
    let resolver = BatchResolver::builder()
        .store(Arc::new(store))
        .build()
        .unwrap();
    let checker = DuplicateChecker::new(
        Arc::new(LocalClassifier::new(Arc::new(resolver))),
        CheckerConfig::default(),
    );

    let files = vec![unseen.clone(), cached.clone(), stale.clone(), corrupt("torn.png")];
    let results = checker.check_all(&files, &BatchContext::new()).await;
    let plan = partition(files.into_iter().zip(results));

    assert_eq!(plan.fast_path.len(), 1);
    assert_eq!(plan.fast_path[0].file.name, "cached.png");
    assert_eq!(plan.fast_path[0].analysis, analysis());
    assert_eq!(plan.upgrade_path.len(), 1);
    assert_eq!(plan.upgrade_path[0].file.name, "stale.png");
    let new_names: Vec<_> = plan.new_path.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(new_names, vec!["unseen.png", "torn.png"]);
}
