#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::fs;
use std::sync::Arc;

use skycast_store::{
    AlertCondition, AlertType, DashboardStore, FileStorage, NewAlert, PreferencesStore, StateStorage,
    Theme, DASHBOARD_KEY,
};
use skycast_weather::Location;
use tempfile::TempDir;

fn file_storage(dir: &TempDir) -> Arc<dyn StateStorage> {
    Arc::new(FileStorage::new(dir.path()))
}

#[test]
fn test_saved_location_survives_reload() {
    let dir = TempDir::new().unwrap();

    let mut store = DashboardStore::load(file_storage(&dir));
    store
        .add_saved_location(&Location::new("Paris", "Ile-de-France", "France", 48.87, 2.33))
        .unwrap();
    drop(store);

    let reloaded = DashboardStore::load(file_storage(&dir));
    let saved = reloaded.saved_locations();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].name, "Paris");
    assert!(!saved[0].is_favorite);
    assert_eq!(saved[0].lat, Some(48.87));
}

#[test]
fn test_whole_dashboard_round_trips() {
    let dir = TempDir::new().unwrap();

    let mut store = DashboardStore::load(file_storage(&dir));
    let alert = store
        .add_alert(NewAlert {
            location: "Madrid".to_string(),
            alert_type: AlertType::Wind,
            condition: AlertCondition::Above,
            threshold: 40.0,
            message: "Strong wind".to_string(),
            is_active: true,
        })
        .unwrap();
    store.toggle_alert(&alert.id);
    store.set_current_location("Madrid, Madrid");
    store.set_api_key("k-123");
    let state = store.state().clone();

    let reloaded = DashboardStore::load(file_storage(&dir));
    assert_eq!(reloaded.state(), &state);
    assert!(!reloaded.alerts()[0].is_active);
}

#[test]
fn test_corrupt_file_loads_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(format!("{}.json", DASHBOARD_KEY)), "{not json").unwrap();

    let store = DashboardStore::load(file_storage(&dir));

    assert!(store.alerts().is_empty());
    assert!(store.saved_locations().is_empty());
    assert_eq!(store.current_location(), "London, UK");
}

#[test]
fn test_minimal_legacy_document_loads() {
    let dir = TempDir::new().unwrap();
    let legacy = r#"{
        "savedLocations": [
            { "id": "1", "name": "Madrid", "isFavorite": true },
            { "id": "2", "name": "Barcelona", "isFavorite": false }
        ],
        "alerts": [],
        "currentLocation": "Madrid, Madrid",
        "apiKey": "test-key"
    }"#;
    fs::write(dir.path().join("weather-dashboard.json"), legacy).unwrap();

    let mut store = DashboardStore::load(file_storage(&dir));

    let saved = store.saved_locations();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].name, "Madrid");
    assert!(saved[0].is_favorite);
    assert_eq!(saved[1].name, "Barcelona");
    assert_eq!(store.api_key(), "test-key");

    assert_eq!(store.select_saved_location("2").as_deref(), Some("Barcelona"));
}

#[test]
fn test_preferences_persist_between_loads() {
    let dir = TempDir::new().unwrap();

    let mut prefs = PreferencesStore::load(file_storage(&dir));
    prefs.set_theme(Theme::Light);

    let reloaded = PreferencesStore::load(file_storage(&dir));
    assert_eq!(reloaded.theme(), Theme::Light);
    assert!(reloaded.auto_refresh());
}
