//! End-to-end checks of the reporter and the setup runner against the
//! in-memory cluster.

use shardstat_core::config::ShardstatConfig;
use shardstat_core::memory::{InMemoryStore, RecordingTarget};
use shardstat_core::reporter::{generate_report, ReportOutcome};
use shardstat_core::setup::run_setup;
use shardstat_core::store::{CollectionEntry, DatabaseEntry};

fn cluster() -> InMemoryStore {
    let mut store = InMemoryStore::sharded(serde_json::json!({
        "_id": 1,
        "minCompatibleVersion": 5,
        "currentVersion": 6,
    }));
    store.add_database(DatabaseEntry { name: "reports".into(), partitioned: false });
    store.add_database(DatabaseEntry { name: "algo_log_db".into(), partitioned: true });
    store.add_database(DatabaseEntry { name: "algo".into(), partitioned: true });

    store.add_collection(CollectionEntry::new("algo_log_db.algo_log_collection"));
    store.add_collection(CollectionEntry::new("algo_log_db.archive"));
    store.add_collection(CollectionEntry::new("reports.daily"));

    for shard in ["shard0001", "shard0000", "shard0001", "shard0000", "shard0000"] {
        store.add_chunk("algo_log_db.algo_log_collection", shard);
    }
    store.add_chunk("algo_log_db.archive", "shard0001");
    store
}

#[tokio::test]
async fn full_report_matches_expected_text() {
    let store = cluster();
    let outcome = generate_report(&store, false).await.unwrap();
    assert!(outcome.is_sharded());

    let expected = concat!(
        "  sharding version: {\"_id\":1,\"minCompatibleVersion\":5,\"currentVersion\":6}\n",
        "  shards:\n",
        "\t\talgo_log_db.algo_log_collection chunks:\n",
        "\t\t\t\tshard0000\t3\n",
        "\t\t\t\tshard0001\t2\n",
        "\t\talgo_log_db.archive chunks:\n",
        "\t\t\t\tshard0001\t1\n",
    );
    assert_eq!(outcome.to_string(), expected);
}

#[tokio::test]
async fn queries_are_issued_sequentially_in_catalog_order() {
    let store = cluster();
    generate_report(&store, false).await.unwrap();

    // "algo" is partitioned but holds no collections; "reports" is skipped.
    assert_eq!(
        store.calls(),
        vec!["version", "databases", "collections", "collections", "chunks", "chunks"]
    );
}

#[tokio::test]
async fn failure_mid_report_yields_no_report() {
    let store = cluster().failing_on("collections");
    let result = generate_report(&store, false).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn unsharded_cluster_gets_the_fixed_message() {
    let outcome = generate_report(&InMemoryStore::default(), true).await.unwrap();
    assert_eq!(outcome, ReportOutcome::NotSharded);
    assert_eq!(outcome.to_string(), "not a shard deployment");
}

#[tokio::test]
async fn configured_plan_runs_against_target() {
    let yaml = r#"
setup:
  database: metrics
  retry:
    max_attempts: 2
    backoff: 0s
  steps:
    - action: drop_collection
      collection: samples
    - action: create_index
      collection: samples
      field: host
"#;
    let config = ShardstatConfig::from_yaml_str(yaml).unwrap();
    let target = RecordingTarget::default().failing("drop metrics.samples", 1);

    let report = run_setup(&target, &config.setup).await;

    assert!(report.is_success(), "{report}");
    assert_eq!(report.steps[0].attempts, 2);
    assert_eq!(
        target.calls(),
        vec!["drop metrics.samples", "drop metrics.samples", "index metrics.samples.host"]
    );
}
