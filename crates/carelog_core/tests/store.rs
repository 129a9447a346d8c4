//! Integration tests for the file-backed store.

use carelog_core::{
    CollectionKind, Config, CoreError, CycleRecord, Manifest, Store, SymptomLog, SCHEMA_VERSION,
};
use carelog_testkit::prelude::*;
use std::fs;

#[tokio::test]
async fn reopen_replays_every_committed_record() {
    let store = TestStore::file().await;
    scenarios::populate(&store, 5).await;
    store.put(sample_symptom(3_000)).await.unwrap();
    let before = store.snapshot().await.unwrap();

    let store = store.reopen().await;
    assert_eq!(store.snapshot().await.unwrap(), before);
}

#[tokio::test]
async fn replaced_record_stays_replaced_after_reopen() {
    let store = TestStore::file().await;
    store.put(sample_symptom(100)).await.unwrap();
    let mut updated = sample_symptom(100);
    updated.notes = "edited".into();
    store.put(updated.clone()).await.unwrap();

    let store = store.reopen().await;
    let logs: Vec<SymptomLog> = store.get_all().await.unwrap();
    assert_eq!(logs, vec![updated]);
}

#[tokio::test]
async fn torn_tail_is_dropped_and_earlier_records_survive() {
    let store = TestStore::file().await;
    for timestamp in [100, 200, 300] {
        store.put(sample_symptom(timestamp)).await.unwrap();
    }
    let (_guard, path) = store.close();

    tear_tail(&path, CollectionKind::SymptomLogs, 3);
    let torn_len = log_len(&path, CollectionKind::SymptomLogs);

    let store = open_store(&path).await;
    let logs: Vec<SymptomLog> = store.get_all().await.unwrap();
    assert_eq!(logs, vec![sample_symptom(100), sample_symptom(200)]);
    assert!(log_len(&path, CollectionKind::SymptomLogs) < torn_len);

    store.put(sample_symptom(400)).await.unwrap();
    drop(store);
    let store = open_store(&path).await;
    assert_eq!(store.count(CollectionKind::SymptomLogs).await, 3);
}

#[tokio::test]
async fn partial_frame_garbage_is_truncated() {
    let store = TestStore::file().await;
    store.put(sample_medication(10)).await.unwrap();
    let (_guard, path) = store.close();
    let intact = log_len(&path, CollectionKind::MedicationLogs);

    append_garbage(&path, CollectionKind::MedicationLogs, &[0xFF, 0x00, 0x00]);

    let store = open_store(&path).await;
    assert_eq!(store.count(CollectionKind::MedicationLogs).await, 1);
    assert_eq!(log_len(&path, CollectionKind::MedicationLogs), intact);
}

#[tokio::test]
async fn damage_before_the_last_frame_refuses_to_open() {
    let store = TestStore::file().await;
    store.put(sample_progress(1)).await.unwrap();
    store.put(sample_progress(2)).await.unwrap();
    let (_guard, path) = store.close();

    // inside the first frame's payload
    flip_byte(&path, CollectionKind::ProgressLogs, 20);

    let result = Store::open(&path, Config::default()).await;
    assert!(matches!(result, Err(CoreError::Format { .. })));
}

#[tokio::test]
async fn corrupt_length_mid_log_keeps_later_records_on_disk() {
    let store = TestStore::file().await;
    store.put(sample_symptom(100)).await.unwrap();
    let (_guard, path) = store.close();
    let first_frame = log_len(&path, CollectionKind::SymptomLogs);

    let store = open_store(&path).await;
    store.put(sample_symptom(200)).await.unwrap();
    store.put(sample_symptom(300)).await.unwrap();
    drop(store);
    let full_len = log_len(&path, CollectionKind::SymptomLogs);

    // high byte of the second frame's length field
    flip_byte(&path, CollectionKind::SymptomLogs, first_frame as usize + 3);

    let result = Store::open(&path, Config::default()).await;
    assert!(matches!(result, Err(CoreError::Format { .. })));
    assert_eq!(log_len(&path, CollectionKind::SymptomLogs), full_len);
}

#[tokio::test]
async fn cycle_ids_continue_after_reopen() {
    let store = TestStore::file().await;
    let first = store.put(sample_cycle("2024-01-01")).await.unwrap();
    let second = store.put(sample_cycle("2024-01-29")).await.unwrap();
    assert_eq!((first.id, second.id), (Some(1), Some(2)));

    let store = store.reopen().await;
    let third = store.put(sample_cycle("2024-02-26")).await.unwrap();
    assert_eq!(third.id, Some(3));
}

#[tokio::test]
async fn open_cycle_is_closed_by_put_with_same_id() {
    let store = TestStore::file().await;
    let cycle = store.put(sample_cycle("2024-03-01")).await.unwrap();
    store.put(cycle.closed("2024-03-06")).await.unwrap();

    let store = store.reopen().await;
    let cycles: Vec<CycleRecord> = store.get_all().await.unwrap();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].end.as_deref(), Some("2024-03-06"));
    assert!(!cycles[0].is_open());
}

#[tokio::test]
async fn second_open_of_same_directory_is_locked() {
    let store = TestStore::file().await;
    let path = store.path().unwrap();

    let result = Store::open(&path, Config::default()).await;
    assert!(matches!(result, Err(CoreError::StoreLocked)));

    let (_guard, path) = store.close();
    assert!(Store::open(&path, Config::default()).await.is_ok());
}

#[tokio::test]
async fn missing_directory_without_create_fails() {
    let temp = tempfile::tempdir().unwrap();
    let result = Store::open(
        temp.path().join("absent"),
        Config::default().create_if_missing(false),
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn older_manifest_gains_missing_collections() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("store");
    fs::create_dir_all(&path).unwrap();
    let old = Manifest {
        schema_version: 0,
        collections: vec!["profile".into(), "symptom_logs".into()],
    };
    fs::write(path.join("MANIFEST"), old.encode().unwrap()).unwrap();

    let store = open_store(&path).await;
    assert_eq!(store.schema_version(), SCHEMA_VERSION);
    store.put(sample_cycle("2024-01-01")).await.unwrap();
    drop(store);

    let manifest = Manifest::decode(&fs::read(path.join("MANIFEST")).unwrap()).unwrap();
    assert_eq!(manifest.schema_version, SCHEMA_VERSION);
    for kind in CollectionKind::ALL {
        assert!(manifest.has_collection(kind.name()), "missing {kind}");
    }
}

#[tokio::test]
async fn newer_manifest_is_schema_mismatch() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("store");
    fs::create_dir_all(&path).unwrap();
    let future = Manifest {
        schema_version: SCHEMA_VERSION + 1,
        ..Manifest::current()
    };
    fs::write(path.join("MANIFEST"), future.encode().unwrap()).unwrap();

    let result = Store::open(&path, Config::default()).await;
    assert!(matches!(
        result,
        Err(CoreError::SchemaMismatch { found, supported })
            if found == SCHEMA_VERSION + 1 && supported == SCHEMA_VERSION
    ));
}

#[tokio::test]
async fn tables_are_written_for_non_empty_collections() {
    let store = TestStore::file().await;
    scenarios::profile_and_two_symptoms(&store).await;
    let out = tempfile::tempdir().unwrap();

    let written = carelog_core::write_tables(&store, out.path()).await.unwrap();
    assert_eq!(written.len(), 2);

    let symptoms = fs::read_to_string(out.path().join("symptom_logs.csv")).unwrap();
    let mut lines = symptoms.lines();
    assert_eq!(lines.next(), Some("timestamp,symptom,severity,notes"));
    assert_eq!(lines.next(), Some("100,symptom-100,1,"));
    assert_eq!(lines.next(), Some("200,symptom-200,2,"));
}
