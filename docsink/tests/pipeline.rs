use docsink::destination::memory::MemoryDestination;
use docsink::error::{DocSinkResult, ErrorKind};
use docsink::pipeline::{Pipeline, PipelineStats};
use docsink::store::snapshot::file::FileSnapshotStore;
use docsink::store::snapshot::memory::MemorySnapshotStore;
use docsink::store::snapshot::{HierarchySnapshot, SnapshotStore};
use docsink::test_utils::destination::FailingDestination;
use docsink::test_utils::envelope::{
    change_envelope, division_created, organization_created, tombstone, unit_created,
};
use docsink::test_utils::pipeline::{
    envelope_stream, test_pipeline_config, test_pipeline_config_with_snapshots,
};
use docsink::types::{ChangeEnvelope, Division, EntityId, Organization, Unit, WriteInstruction};
use docsink_config::shared::HierarchyConfig;
use docsink_telemetry::tracing::init_test_tracing;
use futures::StreamExt;
use serde_json::json;

const T: i64 = HierarchyConfig::DEFAULT_PLACEHOLDER_ID_THRESHOLD;

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_converges_and_skips_bad_envelopes() {
    init_test_tracing();

    let destination = MemoryDestination::new();
    let snapshots = MemorySnapshotStore::new();
    let mut pipeline = Pipeline::new(
        test_pipeline_config(1),
        snapshots.clone(),
        destination.clone(),
    );
    pipeline.start().await.unwrap();

    let malformed = change_envelope("unit", "c", 2, None, Some(json!({"id": "two"})));
    let envelopes = vec![
        unit_created(1, "Lab", 5),
        malformed,
        tombstone(1),
        division_created(5, "Research", 9),
        organization_created(9, "Org"),
    ];

    let stats = pipeline.run(envelope_stream(envelopes)).await.unwrap();

    assert_eq!(
        stats,
        PipelineStats {
            processed: 3,
            skipped: 1,
            failed: 1,
            instructions: 3,
        }
    );

    let instructions = destination.instructions().await;
    assert_eq!(
        instructions
            .iter()
            .map(WriteInstruction::target_id)
            .collect::<Vec<_>>(),
        vec![EntityId(9), EntityId(T + 5), EntityId(9)]
    );

    let documents = destination.documents().await;
    assert_eq!(documents.len(), 1);
    let organization = &documents[&EntityId(9)];
    assert_eq!(organization.name, "Org");
    assert_eq!(
        organization.division(EntityId(5)).unwrap().units,
        vec![Unit::new(EntityId(1), "Lab")]
    );

    // Without snapshot settings only the final snapshot is written.
    assert_eq!(snapshots.writes().await, 1);
    let snapshot = snapshots.snapshot().await.unwrap();
    assert_eq!(
        snapshot.organizations.values().collect::<Vec<_>>(),
        vec![organization]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_resumes_from_file_snapshot() {
    init_test_tracing();

    let directory = tempfile::tempdir().unwrap();
    let config = test_pipeline_config_with_snapshots(1, directory.path());

    let first_destination = MemoryDestination::new();
    let mut first = Pipeline::new(
        config.clone(),
        FileSnapshotStore::new(directory.path()),
        first_destination.clone(),
    );
    first.start().await.unwrap();
    first
        .run(envelope_stream(vec![unit_created(1, "Lab", 5)]))
        .await
        .unwrap();
    assert!(first_destination.instructions().await.is_empty());

    let second_destination = MemoryDestination::new();
    let mut second = Pipeline::new(
        config,
        FileSnapshotStore::new(directory.path()),
        second_destination.clone(),
    );
    second.start().await.unwrap();
    assert!(
        second
            .store()
            .unwrap()
            .contains_organization(EntityId(T + 5))
    );

    second
        .run(envelope_stream(vec![division_created(5, "Research", 9)]))
        .await
        .unwrap();

    let organization = second_destination.document(EntityId(9)).await.unwrap();
    assert_eq!(
        organization.division(EntityId(5)).unwrap().units,
        vec![Unit::new(EntityId(1), "Lab")]
    );
    assert_eq!(
        second_destination.instructions().await.last(),
        Some(&WriteInstruction::delete(EntityId(T + 5)))
    );

    let stored = FileSnapshotStore::new(directory.path())
        .load_snapshot()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.organizations.keys().copied().collect::<Vec<_>>(),
        vec![EntityId(9)]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn unreadable_snapshot_starts_cold() {
    init_test_tracing();

    let directory = tempfile::tempdir().unwrap();
    std::fs::write(directory.path().join("divisions.json"), b"[{").unwrap();

    let mut pipeline = Pipeline::new(
        test_pipeline_config(1),
        FileSnapshotStore::new(directory.path()),
        MemoryDestination::new(),
    );
    pipeline.start().await.unwrap();

    assert_eq!(pipeline.store().unwrap().organization_count(), 0);
    assert_eq!(pipeline.store().unwrap().division_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn snapshot_store_hydrates_hierarchy() {
    init_test_tracing();

    let snapshot = HierarchySnapshot::from_documents(
        [Organization::new(EntityId(9), "Org")],
        Vec::<Division>::new(),
    );
    let destination = MemoryDestination::new();
    let mut pipeline = Pipeline::new(
        test_pipeline_config(1),
        MemorySnapshotStore::with_snapshot(snapshot),
        destination.clone(),
    );
    pipeline.start().await.unwrap();

    pipeline
        .run(envelope_stream(vec![division_created(5, "Research", 9)]))
        .await
        .unwrap();

    let organization = destination.document(EntityId(9)).await.unwrap();
    assert_eq!(organization.name, "Org");
    assert!(organization.contains_division(EntityId(5)));
}

#[tokio::test(flavor = "multi_thread")]
async fn destination_failure_stops_the_run() {
    init_test_tracing();

    let destination = FailingDestination::new(1);
    let mut pipeline = Pipeline::new(
        test_pipeline_config(1),
        MemorySnapshotStore::new(),
        destination.clone(),
    );
    pipeline.start().await.unwrap();

    let err = pipeline
        .run(envelope_stream(vec![
            organization_created(1, "First"),
            organization_created(2, "Second"),
            organization_created(3, "Third"),
        ]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationError);
    assert_eq!(destination.inner().instructions().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_write_and_failed_shutdown_are_reported_together() {
    init_test_tracing();

    let destination = FailingDestination::new(0).with_failing_shutdown();
    let mut pipeline = Pipeline::new(
        test_pipeline_config(1),
        MemorySnapshotStore::new(),
        destination,
    );
    pipeline.start().await.unwrap();

    let err = pipeline
        .run(envelope_stream(vec![organization_created(9, "Org")]))
        .await
        .unwrap_err();

    assert_eq!(
        err.kinds(),
        vec![ErrorKind::DestinationError, ErrorKind::DestinationError]
    );
    assert!(err.to_string().starts_with("[Many] 2 errors"));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_shutdown_fails_a_completed_run() {
    init_test_tracing();

    let destination = FailingDestination::new(usize::MAX).with_failing_shutdown();
    let mut pipeline = Pipeline::new(
        test_pipeline_config(1),
        MemorySnapshotStore::new(),
        destination.clone(),
    );
    pipeline.start().await.unwrap();

    let err = pipeline
        .run(envelope_stream(vec![organization_created(9, "Org")]))
        .await
        .unwrap_err();

    assert_eq!(err.kinds(), vec![ErrorKind::DestinationError]);
    assert!(destination.inner().document(EntityId(9)).await.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn source_failure_of_the_stream_is_fatal() {
    init_test_tracing();

    let mut pipeline = Pipeline::new(
        test_pipeline_config(1),
        MemorySnapshotStore::new(),
        MemoryDestination::new(),
    );
    pipeline.start().await.unwrap();

    let io_error: DocSinkResult<ChangeEnvelope> =
        Err(std::io::Error::other("connection reset").into());
    let envelopes = futures::stream::iter(vec![io_error]);

    let err = pipeline.run(envelopes).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IoError);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_stops_a_waiting_pipeline() {
    init_test_tracing();

    let destination = MemoryDestination::new();
    let mut pipeline = Pipeline::new(
        test_pipeline_config(1),
        MemorySnapshotStore::new(),
        destination.clone(),
    );
    pipeline.start().await.unwrap();
    let shutdown_tx = pipeline.shutdown_tx();

    // The stream never ends on its own.
    let envelopes = envelope_stream(vec![organization_created(9, "Org")])
        .chain(futures::stream::pending());

    let (stats, _) = tokio::join!(pipeline.run(envelopes), async move {
        shutdown_tx.send(()).unwrap();
    });

    assert_eq!(stats.unwrap().processed, 1);
    assert_eq!(destination.instructions().await.len(), 1);
}

#[tokio::test]
async fn run_requires_start() {
    let pipeline = Pipeline::new(
        test_pipeline_config(1),
        MemorySnapshotStore::new(),
        MemoryDestination::new(),
    );

    let err = pipeline
        .run(envelope_stream(Vec::new()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidState);
}
