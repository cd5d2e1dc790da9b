//! Shared helpers for event store integration tests.
#![allow(dead_code)]

use std::path::Path;

use schoolfund_events::{EventRecordStore, Money};
use schoolfund_store::config::StoreConfig;
use schoolfund_store::json_file_repository::JsonFileRepository;
use schoolfund_test_support::init_tracing;

/// Opens a store on the default document file under `data_root`.
pub fn open_store(data_root: &Path) -> EventRecordStore<JsonFileRepository> {
    init_tracing();
    let config = StoreConfig::new(data_root);
    EventRecordStore::open(JsonFileRepository::from_config(&config))
}

/// Reads the persisted document back as raw JSON.
pub fn read_document(data_root: &Path) -> serde_json::Value {
    let path = StoreConfig::new(data_root).document_path();
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

/// Shorthand for an amount in currency units.
pub fn money(units: f64) -> Money {
    Money::from_units(units).unwrap()
}
