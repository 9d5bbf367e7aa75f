mod common;

use common::{Call, FakeCatalog, FakeSource, ORG, dataset, linked_storage, memory_storage};
use datadotworld_sync::api::{ApiResponse, DataworldAuth, verify_credentials};
use datadotworld_sync::db::{DbCredentials, SyncState, SyncStorage};
use datadotworld_sync::mapper::format_dataset;
use datadotworld_sync::service::{SkipReason, SyncAction, SyncOutcome, Synchronizer};
use datadotworld_sync::types::DatasetState;
use serde_json::json;

async fn setup() -> (Synchronizer<FakeCatalog, FakeSource>, FakeCatalog, FakeSource) {
    let catalog = FakeCatalog::default();
    let source = FakeSource::default();
    let sync = Synchronizer::new(linked_storage().await, catalog.clone(), source.clone());
    (sync, catalog, source)
}

fn storage(sync: &Synchronizer<FakeCatalog, FakeSource>) -> &SyncStorage {
    sync.storage()
}

const CREATED: SyncOutcome = SyncOutcome::Applied {
    action: SyncAction::Create,
    state: SyncState::UpToDate,
};
const UPDATED: SyncOutcome = SyncOutcome::Applied {
    action: SyncAction::Update,
    state: SyncState::UpToDate,
};

#[tokio::test]
async fn first_sync_creates_under_title_slug() {
    let (sync, catalog, source) = setup().await;
    source.put(dataset("d1", "Air Quality"));

    assert_eq!(sync.sync("d1").await.unwrap(), CREATED);

    let calls = catalog.calls();
    assert_eq!(calls.len(), 1);
    let Call::Put(id, doc) = &calls[0] else {
        panic!("expected a PUT, got {calls:?}");
    };
    assert_eq!(id, "air-quality");
    assert_eq!(doc["title"], "Air Quality");
    assert_eq!(doc["license"], "CC-BY");
    assert_eq!(doc["visibility"], "OPEN");
    assert_eq!(doc["files"][0]["name"], "readings.csv");

    let record = storage(&sync).find_sync_record("d1").await.unwrap().unwrap();
    assert_eq!(record.remote_id.as_deref(), Some("air-quality"));
    assert_eq!(record.state, SyncState::UpToDate);
    assert_eq!(record.organization_id, ORG);
    assert!(record.message.unwrap().contains("created"));
}

#[tokio::test]
async fn create_adopts_identifier_from_response() {
    let (sync, catalog, source) = setup().await;
    source.put(dataset("d1", "Air Quality"));
    catalog.respond(
        "put",
        ApiResponse::new(200, r#"{"uri":"https://data.world/acme/air-quality-2"}"#),
    );

    sync.sync("d1").await.unwrap();

    let record = storage(&sync).find_sync_record("d1").await.unwrap().unwrap();
    assert_eq!(record.remote_id.as_deref(), Some("air-quality-2"));
}

#[tokio::test]
async fn second_sync_goes_through_update() {
    let (sync, catalog, source) = setup().await;
    source.put(dataset("d1", "Air Quality"));
    sync.sync("d1").await.unwrap();
    catalog.clear();

    // The dirty-check fetch misses (default 404), so the write happens anyway.
    assert_eq!(sync.sync("d1").await.unwrap(), UPDATED);

    let calls = catalog.calls();
    assert_eq!(calls[0], Call::Get("air-quality".into()));
    assert!(matches!(&calls[1], Call::Put(id, _) if id == "air-quality"));
    assert_eq!(calls.len(), 2);
}

#[tokio::test]
async fn unchanged_remote_copy_is_not_rewritten() {
    let (sync, catalog, source) = setup().await;
    let ds = dataset("d1", "Air Quality");
    source.put(ds.clone());
    sync.sync("d1").await.unwrap();
    let before = storage(&sync).find_sync_record("d1").await.unwrap().unwrap();
    catalog.clear();

    let mut remote = serde_json::to_value(format_dataset(&ds)).unwrap();
    remote["id"] = json!("air-quality");
    remote["created"] = json!("2017-06-01T00:00:00.000Z");
    remote["files"][0]["sizeInBytes"] = json!(1024);
    catalog.respond("get", ApiResponse::new(200, remote.to_string()));

    assert_eq!(sync.sync("d1").await.unwrap(), SyncOutcome::Unchanged);
    assert!(!catalog.calls().iter().any(Call::is_put));
    let after = storage(&sync).find_sync_record("d1").await.unwrap().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn changed_remote_copy_is_rewritten() {
    let (sync, catalog, source) = setup().await;
    let ds = dataset("d1", "Air Quality");
    source.put(ds.clone());
    sync.sync("d1").await.unwrap();
    catalog.clear();

    let mut remote = serde_json::to_value(format_dataset(&ds)).unwrap();
    remote["summary"] = json!("edited on data.world");
    catalog.respond("get", ApiResponse::new(200, remote.to_string()));

    assert_eq!(sync.sync("d1").await.unwrap(), UPDATED);
    assert!(catalog.calls().iter().any(Call::is_put));
}

#[tokio::test]
async fn cleared_file_description_is_rewritten() {
    let (sync, catalog, source) = setup().await;
    let mut ds = dataset("d1", "Air Quality");
    ds.resources[0].description = Some("old description".to_string());
    source.put(ds.clone());
    sync.sync("d1").await.unwrap();
    catalog.clear();

    let stale = serde_json::to_value(format_dataset(&ds)).unwrap();
    ds.resources[0].description = None;
    source.put(ds);
    catalog.respond("get", ApiResponse::new(200, stale.to_string()));

    assert_eq!(sync.sync("d1").await.unwrap(), UPDATED);
    let puts: Vec<_> = catalog.calls().into_iter().filter(Call::is_put).collect();
    assert_eq!(puts.len(), 1);
    let Call::Put(_, doc) = &puts[0] else {
        unreachable!()
    };
    assert!(doc["files"][0].get("description").is_none());
}

#[tokio::test]
async fn rejected_update_is_failed() {
    let (sync, catalog, source) = setup().await;
    source.put(dataset("d1", "Air Quality"));
    sync.sync("d1").await.unwrap();
    let body = r#"{"message":"license: invalid"}"#;
    catalog.respond("put", ApiResponse::new(422, body));

    assert_eq!(
        sync.sync("d1").await.unwrap(),
        SyncOutcome::Applied {
            action: SyncAction::Update,
            state: SyncState::Failed
        }
    );
    let record = storage(&sync).find_sync_record("d1").await.unwrap().unwrap();
    assert_eq!(record.state, SyncState::Failed);
    assert_eq!(record.message.as_deref(), Some(body));
    assert_eq!(record.remote_id.as_deref(), Some("air-quality"));
}

#[tokio::test]
async fn rate_limited_update_stays_pending() {
    let (sync, catalog, source) = setup().await;
    source.put(dataset("d1", "Air Quality"));
    sync.sync("d1").await.unwrap();
    catalog.respond("put", ApiResponse::new(429, "too many requests"));

    assert_eq!(
        sync.sync("d1").await.unwrap(),
        SyncOutcome::Applied {
            action: SyncAction::Update,
            state: SyncState::Pending
        }
    );
    let record = storage(&sync).find_sync_record("d1").await.unwrap().unwrap();
    assert_eq!(record.state, SyncState::Pending);
    assert_eq!(record.message.as_deref(), Some("too many requests"));
}

#[tokio::test]
async fn update_of_missing_remote_falls_back_to_create() {
    let (sync, catalog, source) = setup().await;
    source.put(dataset("d1", "Air Quality"));
    sync.sync("d1").await.unwrap();
    catalog.clear();
    catalog.respond("put", ApiResponse::new(404, r#"{"message":"not found"}"#));

    assert_eq!(sync.sync("d1").await.unwrap(), CREATED);

    let puts: Vec<_> = catalog.calls().into_iter().filter(Call::is_put).collect();
    assert_eq!(puts.len(), 2);
    let record = storage(&sync).find_sync_record("d1").await.unwrap().unwrap();
    assert_eq!(record.state, SyncState::UpToDate);
    assert_eq!(record.remote_id.as_deref(), Some("air-quality"));
}

#[tokio::test]
async fn rate_limited_create_stays_pending() {
    let (sync, catalog, source) = setup().await;
    source.put(dataset("d1", "Air Quality"));
    catalog.respond("put", ApiResponse::new(429, r#"{"message":"slow down"}"#));

    assert_eq!(
        sync.sync("d1").await.unwrap(),
        SyncOutcome::Applied {
            action: SyncAction::Create,
            state: SyncState::Pending
        }
    );
    let record = storage(&sync).find_sync_record("d1").await.unwrap().unwrap();
    assert_eq!(record.state, SyncState::Pending);
    assert_eq!(record.message.as_deref(), Some(r#"{"message":"slow down"}"#));
}

#[tokio::test]
async fn server_error_is_deferred_too() {
    let (sync, catalog, source) = setup().await;
    source.put(dataset("d1", "Air Quality"));
    catalog.respond("put", ApiResponse::new(503, "unavailable"));

    sync.sync("d1").await.unwrap();
    let record = storage(&sync).find_sync_record("d1").await.unwrap().unwrap();
    assert_eq!(record.state, SyncState::Pending);
}

#[tokio::test]
async fn rejected_create_is_failed_and_retried_as_update() {
    let (sync, catalog, source) = setup().await;
    source.put(dataset("d1", "Air Quality"));
    let body = r#"{"message":"title: size must be between 1 and 60"}"#;
    catalog.respond("put", ApiResponse::new(400, body));

    assert_eq!(
        sync.sync("d1").await.unwrap(),
        SyncOutcome::Applied {
            action: SyncAction::Create,
            state: SyncState::Failed
        }
    );
    let record = storage(&sync).find_sync_record("d1").await.unwrap().unwrap();
    assert_eq!(record.state, SyncState::Failed);
    assert_eq!(record.message.as_deref(), Some(body));
    assert_eq!(record.remote_id.as_deref(), Some("air-quality"));

    catalog.clear();
    assert_eq!(sync.sync("d1").await.unwrap(), UPDATED);
    assert_eq!(catalog.calls()[0], Call::Get("air-quality".into()));
}

#[tokio::test]
async fn deleted_dataset_is_removed_remotely() {
    let (sync, catalog, source) = setup().await;
    let mut ds = dataset("d1", "Air Quality");
    source.put(ds.clone());
    sync.sync("d1").await.unwrap();
    catalog.clear();

    ds.state = DatasetState::Deleted;
    source.put(ds);
    assert_eq!(sync.sync("d1").await.unwrap(), SyncOutcome::Removed);
    assert_eq!(catalog.calls(), vec![Call::Delete("air-quality".into())]);
    assert!(storage(&sync).find_sync_record("d1").await.unwrap().is_none());
}

#[tokio::test]
async fn retained_deleted_record_is_not_deleted_twice() {
    let catalog = FakeCatalog::default();
    let source = FakeSource::default();
    let sync = Synchronizer::new(linked_storage().await, catalog.clone(), source.clone())
        .retain_deleted(true);
    let mut ds = dataset("d1", "Air Quality");
    source.put(ds.clone());
    sync.sync("d1").await.unwrap();

    ds.state = DatasetState::Deleted;
    source.put(ds);
    assert_eq!(sync.sync("d1").await.unwrap(), SyncOutcome::Removed);
    let record = sync.storage().find_sync_record("d1").await.unwrap().unwrap();
    assert_eq!(record.state, SyncState::Deleted);

    catalog.clear();
    assert_eq!(
        sync.sync("d1").await.unwrap(),
        SyncOutcome::Skipped(SkipReason::NotLinked)
    );
    assert!(catalog.calls().is_empty());
}

#[tokio::test]
async fn deleting_a_never_synced_dataset_does_nothing() {
    let (sync, catalog, source) = setup().await;
    let mut ds = dataset("d1", "Air Quality");
    ds.state = DatasetState::Deleted;
    source.put(ds);

    assert_eq!(
        sync.sync("d1").await.unwrap(),
        SyncOutcome::Skipped(SkipReason::NotLinked)
    );
    assert!(catalog.calls().is_empty());
    assert!(storage(&sync).find_sync_record("d1").await.unwrap().is_none());
}

#[tokio::test]
async fn delete_of_missing_remote_is_marked_failed() {
    let (sync, catalog, source) = setup().await;
    let mut ds = dataset("d1", "Air Quality");
    source.put(ds.clone());
    sync.sync("d1").await.unwrap();
    catalog.respond("delete", ApiResponse::new(404, "gone"));

    ds.state = DatasetState::Deleted;
    source.put(ds);
    assert_eq!(
        sync.sync("d1").await.unwrap(),
        SyncOutcome::Applied {
            action: SyncAction::Delete,
            state: SyncState::Failed
        }
    );
    let record = storage(&sync).find_sync_record("d1").await.unwrap().unwrap();
    assert_eq!(record.state, SyncState::Failed);
}

#[tokio::test]
async fn rate_limited_delete_keeps_record_pending() {
    let (sync, catalog, source) = setup().await;
    let mut ds = dataset("d1", "Air Quality");
    source.put(ds.clone());
    sync.sync("d1").await.unwrap();
    catalog.respond("delete", ApiResponse::new(429, "slow down"));

    ds.state = DatasetState::Deleted;
    source.put(ds);
    assert_eq!(
        sync.sync("d1").await.unwrap(),
        SyncOutcome::Applied {
            action: SyncAction::Delete,
            state: SyncState::Pending
        }
    );
    let record = storage(&sync).find_sync_record("d1").await.unwrap().unwrap();
    assert_eq!(record.state, SyncState::Pending);
    assert_eq!(record.remote_id.as_deref(), Some("air-quality"));

    // Still linked, so the next event retries the delete.
    catalog.clear();
    assert_eq!(sync.sync("d1").await.unwrap(), SyncOutcome::Removed);
    assert_eq!(catalog.calls(), vec![Call::Delete("air-quality".into())]);
}

#[tokio::test]
async fn purged_dataset_is_deleted_using_stored_organization() {
    let (sync, catalog, source) = setup().await;
    source.put(dataset("d1", "Air Quality"));
    sync.sync("d1").await.unwrap();
    catalog.clear();

    source.purge("d1");
    assert_eq!(sync.sync("d1").await.unwrap(), SyncOutcome::Removed);
    assert_eq!(catalog.calls(), vec![Call::Delete("air-quality".into())]);
}

#[tokio::test]
async fn drafts_and_other_types_are_ignored() {
    let (sync, catalog, source) = setup().await;
    let mut draft = dataset("d1", "Draft");
    draft.state = DatasetState::Draft;
    source.put(draft);
    let mut harvest = dataset("d2", "Harvest source");
    harvest.kind = "harvest".to_string();
    source.put(harvest);

    assert_eq!(
        sync.sync("d1").await.unwrap(),
        SyncOutcome::Skipped(SkipReason::Draft)
    );
    assert_eq!(
        sync.sync("d2").await.unwrap(),
        SyncOutcome::Skipped(SkipReason::NotADataset)
    );
    assert!(catalog.calls().is_empty());
}

#[tokio::test]
async fn organizations_without_integration_are_ignored() {
    let catalog = FakeCatalog::default();
    let source = FakeSource::default();
    let storage = memory_storage().await;
    storage
        .save_credentials(&DbCredentials {
            organization_id: ORG.to_string(),
            integration: false,
            show_links: false,
            owner: Some("acme".to_string()),
            api_key: Some("k".to_string()),
        })
        .await
        .unwrap();
    let sync = Synchronizer::new(storage, catalog.clone(), source.clone());

    source.put(dataset("d1", "Air Quality"));
    let mut orphan = dataset("d2", "No org");
    orphan.owner_org = None;
    source.put(orphan);
    let mut other = dataset("d3", "Other org");
    other.owner_org = Some("org-2".to_string());
    source.put(other);

    for id in ["d1", "d2", "d3"] {
        assert_eq!(
            sync.sync(id).await.unwrap(),
            SyncOutcome::Skipped(SkipReason::NoCredentials)
        );
    }
    assert!(catalog.calls().is_empty());
    assert!(sync.storage().find_sync_record("d1").await.unwrap().is_none());
}

#[tokio::test]
async fn only_unauthorized_means_invalid_credentials() {
    let auth = DataworldAuth {
        owner: "acme".into(),
        key: "k".into(),
    };
    for (status, valid) in [(401, false), (404, true), (200, true), (500, true)] {
        let catalog = FakeCatalog::default();
        catalog.respond("get", ApiResponse::new(status, ""));
        assert_eq!(verify_credentials(&catalog, &auth).await.unwrap(), valid, "{status}");
        assert_eq!(
            catalog.calls(),
            vec![Call::Get("definitely-fake-dataset-name".into())]
        );
    }
}
