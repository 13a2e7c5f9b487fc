//! Integration tests for the inventory.

use parts_inventory::{
    EnvelopeFormat, FileSlots, Inventory, InventoryConfig, LoadOutcome, MemorySlots,
    MockSeedSource, Notice, PersistPolicy, Record, RecordInput, RecordStore, SlotBackend,
    SortKey, SortOrder, StartupSource, StoreConfig,
};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const KEY: &str = "parts-inventory";

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn memory_store(config: StoreConfig) -> (Arc<MemorySlots>, RecordStore) {
    let slots = Arc::new(MemorySlots::new());
    let store = RecordStore::new(slots.clone(), config);
    (slots, store)
}

async fn bootstrap(store: RecordStore) -> Inventory {
    Inventory::bootstrap(
        store,
        &MockSeedSource::new(Duration::ZERO),
        InventoryConfig::default(),
    )
    .await
}

fn stored_ids(slots: &MemorySlots) -> Vec<String> {
    let raw = slots.get(KEY).unwrap().expect("envelope should be stored");
    let value: Value = serde_json::from_str(&raw).unwrap();
    value
        .as_array()
        .expect("saved envelope is a bare array")
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

// --- Realistic Workflow Tests ---

#[tokio::test]
async fn test_seed_add_and_total_value() {
    init_tracing();
    let (_, store) = memory_store(StoreConfig::default());
    let mut inventory = bootstrap(store).await;

    assert_eq!(inventory.startup().source, StartupSource::Seed);
    assert_eq!(inventory.startup().load_outcome, LoadOutcome::Missing);
    assert_eq!(inventory.len(), 2);

    let id = inventory
        .add(RecordInput::new("Spark Plug", 10.0, 3.00))
        .unwrap();
    let added = inventory.records().iter().find(|r| r.id == id).unwrap();
    assert!(added.added_at.is_some());

    let view = inventory.derive_view();
    assert_eq!(view.total_count, 3);
    assert!((view.total_value - 1817.00).abs() < 1e-9);
    assert_eq!(parts_inventory::format_usd(view.total_value), "$1,817.00");

    // Sorted by name ascending by default
    let names: Vec<&str> = view.page_records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Brake Pads", "Engine Oil Filter", "Spark Plug"]);
}

#[tokio::test]
async fn test_add_does_not_persist_but_save_does() {
    let (slots, store) = memory_store(StoreConfig::default());
    let mut inventory = Inventory::bootstrap(
        store,
        &MockSeedSource::new(Duration::ZERO),
        InventoryConfig {
            save_latency: Duration::ZERO,
            ..Default::default()
        },
    )
    .await;

    inventory.add(RecordInput::new("Spark Plug", 10.0, 3.0)).unwrap();
    assert!(!slots.contains(KEY));

    inventory.persist_now().await.unwrap();
    assert_eq!(stored_ids(&slots).len(), 3);
}

#[tokio::test]
async fn test_delete_persists_immediately() {
    let (slots, store) = memory_store(StoreConfig::default());
    let mut inventory = bootstrap(store).await;
    assert!(!slots.contains(KEY));

    assert_eq!(inventory.remove("1").unwrap(), 1);

    assert_eq!(stored_ids(&slots), vec!["2".to_string()]);
    assert_eq!(inventory.store().load().len(), 1);
}

#[tokio::test]
async fn test_delete_of_missing_id_still_persists() {
    let (slots, store) = memory_store(StoreConfig::default());
    let mut inventory = bootstrap(store).await;

    assert_eq!(inventory.remove("missing").unwrap(), 0);
    assert_eq!(stored_ids(&slots), vec!["1".to_string(), "2".to_string()]);
}

#[tokio::test]
async fn test_persist_policy_variants() {
    let (slots, store) = memory_store(StoreConfig::default());
    let mut inventory = Inventory::bootstrap(
        store,
        &MockSeedSource::new(Duration::ZERO),
        InventoryConfig {
            persist_policy: PersistPolicy::OnEveryMutation,
            ..Default::default()
        },
    )
    .await;
    inventory.add(RecordInput::new("Spark Plug", 10.0, 3.0)).unwrap();
    assert_eq!(stored_ids(&slots).len(), 3);

    let (slots, store) = memory_store(StoreConfig::default());
    let mut inventory = Inventory::bootstrap(
        store,
        &MockSeedSource::new(Duration::ZERO),
        InventoryConfig {
            persist_policy: PersistPolicy::ExplicitOnly,
            ..Default::default()
        },
    )
    .await;
    inventory.remove("1").unwrap();
    assert!(!slots.contains(KEY));
}

#[tokio::test]
async fn test_stored_records_win_over_seed() {
    let (slots, store) = memory_store(StoreConfig::default());
    store
        .save(&[Record::new("x", "Wiper Blade", 4.0, 9.5)])
        .unwrap();
    assert!(slots.contains(KEY));

    let inventory = bootstrap(store).await;
    assert_eq!(inventory.startup().source, StartupSource::Storage);
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory.records()[0].name, "Wiper Blade");
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_waits_for_seed() {
    let (_, store) = memory_store(StoreConfig::default());
    let started = tokio::time::Instant::now();

    let mut inventory =
        Inventory::bootstrap(store, &MockSeedSource::default(), InventoryConfig::default()).await;

    assert!(started.elapsed() >= Duration::from_millis(500));

    // Intents only exist after startup, so nothing added here can be overwritten by the seed.
    inventory.add(RecordInput::new("Spark Plug", 10.0, 3.0)).unwrap();
    assert_eq!(inventory.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_persist_now_waits_out_latency() {
    let (_, store) = memory_store(StoreConfig::default());
    let inventory = bootstrap(store).await;
    let handle = inventory.subscribe();
    let started = tokio::time::Instant::now();

    inventory.persist_now().await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(handle.drain(), vec![Notice::Saved { count: 2 }]);
}

#[tokio::test]
async fn test_notices_for_intents() {
    let (_, store) = memory_store(StoreConfig::default());
    let mut inventory = bootstrap(store).await;
    let handle = inventory.subscribe();

    inventory.add(RecordInput::new("Spark Plug", 10.0, 3.0)).unwrap();
    inventory.remove("2").unwrap();

    assert_eq!(
        handle.drain(),
        vec![
            Notice::Added {
                name: "Spark Plug".into()
            },
            Notice::Deleted { id: "2".into() },
        ]
    );
}

#[tokio::test]
async fn test_duplicate_ids_are_not_merged() {
    let (slots, store) = memory_store(StoreConfig::default());
    slots
        .set(
            KEY,
            &serde_json::json!([
                {"id": "dup", "name": "Brake Pads", "quantity": 25, "price": 45.5},
                {"id": "dup", "name": "Brake Pads", "quantity": 4, "price": 45.5},
                {"id": "solo", "name": "Wiper Blade", "quantity": 4, "price": 9.5}
            ])
            .to_string(),
        )
        .unwrap();

    let mut inventory = bootstrap(store).await;
    assert_eq!(inventory.startup().source, StartupSource::Storage);
    assert_eq!(inventory.len(), 3);
    assert_eq!(inventory.records().iter().filter(|r| r.id == "dup").count(), 2);

    assert_eq!(inventory.remove("dup").unwrap(), 2);
    assert_eq!(inventory.len(), 1);
    assert_eq!(stored_ids(&slots), vec!["solo".to_string()]);
}

// --- Pagination & Sorting ---

#[tokio::test]
async fn test_pagination_with_twelve_records() {
    let (_, store) = memory_store(StoreConfig::default());
    let mut inventory = Inventory::bootstrap(
        store,
        &MockSeedSource::new(Duration::ZERO),
        InventoryConfig::default(),
    )
    .await;
    for i in 0..10 {
        inventory
            .add(RecordInput::new(format!("Part {:02}", i), 1.0, 1.0))
            .unwrap();
    }
    assert_eq!(inventory.len(), 12);

    let view = inventory.derive_view();
    assert_eq!(view.total_pages, 3);
    assert_eq!(view.page_records.len(), 5);

    inventory.set_page(3);
    let view = inventory.derive_view();
    assert_eq!(view.current_page, 3);
    assert_eq!(view.page_records.len(), 2);

    // Adding does not move the page
    inventory.add(RecordInput::new("Part 99", 1.0, 1.0)).unwrap();
    assert_eq!(inventory.current_page(), 3);
}

#[tokio::test]
async fn test_delete_reclamps_page() {
    let (_, store) = memory_store(StoreConfig::default());
    let mut inventory = bootstrap(store).await;
    for i in 0..4 {
        inventory
            .add(RecordInput::new(format!("Part {}", i), 1.0, 1.0))
            .unwrap();
    }
    assert_eq!(inventory.set_page(2), 2);

    let last = inventory.records().last().unwrap().id.clone();
    inventory.remove(&last).unwrap();

    assert_eq!(inventory.total_pages(), 1);
    assert_eq!(inventory.current_page(), 1);
}

#[tokio::test]
async fn test_total_value_ignores_page_and_sort() {
    let (_, store) = memory_store(StoreConfig::default());
    let mut inventory = bootstrap(store).await;
    for i in 0..8 {
        inventory
            .add(RecordInput::new(format!("Part {}", i), i as f64, 2.0))
            .unwrap();
    }
    let expected = inventory.total_value();

    for key in SortKey::ALL {
        inventory.set_sort(key);
        for page in 1..=inventory.total_pages() {
            inventory.set_page(page);
            assert_eq!(inventory.derive_view().total_value, expected);
        }
    }
}

#[tokio::test]
async fn test_equal_prices_keep_collection_order() {
    let (_, store) = memory_store(StoreConfig::default());
    let mut inventory = Inventory::bootstrap(
        store,
        &MockSeedSource::new(Duration::ZERO),
        InventoryConfig::default(),
    )
    .await;
    let first = inventory.add(RecordInput::new("Zeta", 1.0, 7.0)).unwrap();
    let second = inventory.add(RecordInput::new("Alpha", 1.0, 7.0)).unwrap();

    inventory.set_sort(SortKey::Price);
    assert_eq!(inventory.sort_order(), SortOrder::Asc);
    let ids: Vec<String> = inventory
        .derive_view()
        .page_records
        .into_iter()
        .map(|r| r.id)
        .collect();
    let pos_first = ids.iter().position(|id| *id == first).unwrap();
    let pos_second = ids.iter().position(|id| *id == second).unwrap();
    assert!(pos_first < pos_second);
}

#[tokio::test]
async fn test_rapid_adds_get_distinct_ids() {
    let (_, store) = memory_store(StoreConfig::default());
    let mut inventory = bootstrap(store).await;

    let mut ids = HashSet::new();
    for i in 0..1000 {
        let id = inventory
            .add(RecordInput::new(format!("Part {}", i), 1.0, 1.0))
            .unwrap();
        assert!(ids.insert(id));
    }
    assert_eq!(inventory.len(), 1002);
}

// --- Persistence Round-Trips ---

#[test]
fn test_round_trip_default_format() {
    let (slots, store) = memory_store(StoreConfig::default());
    let mut spark = Record::new("3", "Spark Plug", 10.0, 3.0);
    spark.added_at = Some("2024-05-01T10:00:00.000Z".into());
    let records = vec![Record::new("1", "Engine Oil Filter", 50.0, 12.99), spark];

    store.save(&records).unwrap();

    // Saved as a bare array, which loads back through the legacy path
    let raw = slots.get(KEY).unwrap().unwrap();
    assert!(serde_json::from_str::<Value>(&raw).unwrap().is_array());
    let report = store.load_report();
    assert_eq!(report.outcome, LoadOutcome::Legacy { dropped: 0 });
    assert_eq!(report.records, records);
}

#[test]
fn test_round_trip_current_format() {
    let (_, store) = memory_store(StoreConfig {
        save_format: EnvelopeFormat::Current,
        ..Default::default()
    });
    let records = vec![
        Record::new("1", "Engine Oil Filter", 50.0, 12.99),
        Record::new("2", "Brake Pads", 25.0, 45.50),
    ];

    store.save(&records).unwrap();

    let report = store.load_report();
    assert_eq!(report.outcome, LoadOutcome::Current { dropped: 0 });
    assert_eq!(report.records, records);
}

#[test]
#[ignore = "save still writes the legacy bare array; enable once the default format is unified"]
fn test_default_save_writes_current_envelope() {
    let (slots, store) = memory_store(StoreConfig::default());
    store.save(&[Record::new("1", "Brake Pads", 25.0, 45.5)]).unwrap();

    let raw = slots.get(KEY).unwrap().unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    assert!(value.is_object());
    assert!(value["parts"].is_array());
    assert!(value["timestamp"].is_number());
}

#[tokio::test]
async fn test_file_backed_inventory_survives_restart() {
    let dir = TempDir::new().unwrap();
    let slot_dir = dir.path().join("slots");

    {
        let slots = Arc::new(FileSlots::open(&slot_dir).unwrap());
        let store = RecordStore::new(slots, StoreConfig::default());
        let mut inventory = Inventory::bootstrap(
            store,
            &MockSeedSource::new(Duration::ZERO),
            InventoryConfig {
                save_latency: Duration::ZERO,
                ..Default::default()
            },
        )
        .await;
        inventory.add(RecordInput::new("Spark Plug", 10.0, 3.0)).unwrap();
        inventory.persist_now().await.unwrap();
    }

    let slots = Arc::new(FileSlots::open(&slot_dir).unwrap());
    let store = RecordStore::new(slots, StoreConfig::default());
    let inventory = bootstrap(store).await;

    assert_eq!(inventory.startup().source, StartupSource::Storage);
    assert_eq!(inventory.len(), 3);
    assert!(inventory.records().iter().any(|r| r.name == "Spark Plug"));
}
