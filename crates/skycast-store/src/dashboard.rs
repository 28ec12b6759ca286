//! Alerts, saved locations, current location and credential, persisted
//! together as one JSON document.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skycast_weather::Location;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::storage::{load_or_default, persist, StateStorage};

pub const DASHBOARD_KEY: &str = "weather-dashboard";
pub const DEFAULT_LOCATION: &str = "London, UK";
pub const MAX_ALERTS: usize = 20;
pub const MAX_SAVED_LOCATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Temperature,
    Rain,
    Wind,
    Uv,
    Humidity,
    Pressure,
}

impl AlertType {
    /// Unit suffix used when showing a threshold
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Rain => "mm",
            Self::Wind => "km/h",
            Self::Uv => "",
            Self::Humidity => "%",
            Self::Pressure => "mb",
        }
    }
}

impl std::str::FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Ok(Self::Temperature),
            "rain" => Ok(Self::Rain),
            "wind" => Ok(Self::Wind),
            "uv" => Ok(Self::Uv),
            "humidity" => Ok(Self::Humidity),
            "pressure" => Ok(Self::Pressure),
            other => Err(format!("unknown alert type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    Above,
    Below,
    Equals,
}

impl std::str::FromStr for AlertCondition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "above" | ">" => Ok(Self::Above),
            "below" | "<" => Ok(Self::Below),
            "equals" | "=" => Ok(Self::Equals),
            other => Err(format!("unknown alert condition: {}", other)),
        }
    }
}

/// User-defined threshold alert. Stored and listed only; nothing evaluates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAlert {
    pub id: String,
    pub location: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub condition: AlertCondition,
    pub threshold: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Everything an alert needs except its id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub location: String,
    pub alert_type: AlertType,
    pub condition: AlertCondition,
    pub threshold: f64,
    pub message: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLocation {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl SavedLocation {
    /// Query string used when this entry becomes the current location
    pub fn query(&self) -> String {
        if self.region.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.region)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardState {
    pub alerts: Vec<WeatherAlert>,
    pub saved_locations: Vec<SavedLocation>,
    pub current_location: String,
    pub api_key: String,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            alerts: Vec::new(),
            saved_locations: Vec::new(),
            current_location: DEFAULT_LOCATION.to_string(),
            api_key: String::new(),
        }
    }
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

pub struct DashboardStore {
    storage: Arc<dyn StateStorage>,
    state: DashboardState,
}

impl std::fmt::Debug for DashboardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardStore")
            .field("alerts", &self.state.alerts.len())
            .field("saved_locations", &self.state.saved_locations.len())
            .field("current_location", &self.state.current_location)
            .finish_non_exhaustive()
    }
}

impl DashboardStore {
    /// Load the saved dashboard. Never fails: unreadable state yields defaults.
    pub fn load(storage: Arc<dyn StateStorage>) -> Self {
        let mut state: DashboardState = load_or_default(storage.as_ref(), DASHBOARD_KEY);
        if state.current_location.is_empty() {
            state.current_location = DEFAULT_LOCATION.to_string();
        }

        tracing::info!(
            "Loaded dashboard: {} alerts, {} saved locations, current '{}'",
            state.alerts.len(),
            state.saved_locations.len(),
            state.current_location
        );
        Self { storage, state }
    }

    /// Write the whole aggregate. Returns false if the write failed.
    pub fn save(&self) -> bool {
        persist(self.storage.as_ref(), DASHBOARD_KEY, &self.state)
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn alerts(&self) -> &[WeatherAlert] {
        &self.state.alerts
    }

    pub fn saved_locations(&self) -> &[SavedLocation] {
        &self.state.saved_locations
    }

    pub fn favorites(&self) -> impl Iterator<Item = &SavedLocation> {
        self.state.saved_locations.iter().filter(|l| l.is_favorite)
    }

    pub fn current_location(&self) -> &str {
        &self.state.current_location
    }

    pub fn api_key(&self) -> &str {
        &self.state.api_key
    }

    pub fn add_alert(&mut self, alert: NewAlert) -> Result<WeatherAlert> {
        if self.state.alerts.len() >= MAX_ALERTS {
            return Err(StoreError::LimitReached {
                kind: "alerts",
                max: MAX_ALERTS,
            });
        }

        let alert = WeatherAlert {
            id: new_id(),
            location: alert.location,
            alert_type: alert.alert_type,
            condition: alert.condition,
            threshold: alert.threshold,
            message: alert.message,
            is_active: alert.is_active,
            created_at: Utc::now(),
        };
        tracing::debug!("Adding alert {} for {}", alert.id, alert.location);
        self.state.alerts.push(alert.clone());
        self.save();
        Ok(alert)
    }

    /// Remove by id. Persists even when nothing matched.
    pub fn remove_alert(&mut self, id: &str) {
        self.state.alerts.retain(|a| a.id != id);
        self.save();
    }

    /// Flip `is_active`. Returns false, without writing, for an unknown id.
    pub fn toggle_alert(&mut self, id: &str) -> bool {
        let Some(alert) = self.state.alerts.iter_mut().find(|a| a.id == id) else {
            tracing::warn!("Alert not found: {}", id);
            return false;
        };
        alert.is_active = !alert.is_active;
        self.save();
        true
    }

    /// Append a location; duplicates are allowed.
    pub fn add_saved_location(&mut self, location: &Location) -> Result<SavedLocation> {
        if self.state.saved_locations.len() >= MAX_SAVED_LOCATIONS {
            return Err(StoreError::LimitReached {
                kind: "saved locations",
                max: MAX_SAVED_LOCATIONS,
            });
        }

        let saved = SavedLocation {
            id: new_id(),
            name: location.name.clone(),
            region: location.region.clone(),
            country: location.country.clone(),
            lat: Some(location.latitude),
            lon: Some(location.longitude),
            is_favorite: false,
        };
        self.state.saved_locations.push(saved.clone());
        self.save();
        Ok(saved)
    }

    pub fn remove_saved_location(&mut self, id: &str) {
        self.state.saved_locations.retain(|l| l.id != id);
        self.save();
    }

    /// Flip `is_favorite`. Returns false, without writing, for an unknown id.
    pub fn toggle_favorite(&mut self, id: &str) -> bool {
        let Some(location) = self.state.saved_locations.iter_mut().find(|l| l.id == id) else {
            tracing::warn!("Location not found with id: {}", id);
            return false;
        };
        location.is_favorite = !location.is_favorite;
        self.save();
        true
    }

    /// Make a saved entry the current location. Returns the new query string.
    pub fn select_saved_location(&mut self, id: &str) -> Option<String> {
        let query = self
            .state
            .saved_locations
            .iter()
            .find(|l| l.id == id)
            .map(SavedLocation::query)?;
        self.set_current_location(&query);
        Some(query)
    }

    pub fn set_current_location(&mut self, location: &str) {
        self.state.current_location = location.to_string();
        self.save();
    }

    pub fn set_api_key(&mut self, key: &str) {
        self.state.api_key = key.to_string();
        self.save();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> (DashboardStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (DashboardStore::load(storage.clone()), storage)
    }

    fn alert(location: &str) -> NewAlert {
        NewAlert {
            location: location.to_string(),
            alert_type: AlertType::Temperature,
            condition: AlertCondition::Above,
            threshold: 30.0,
            message: "Hot".to_string(),
            is_active: true,
        }
    }

    #[test]
    fn test_defaults() {
        let (store, storage) = store();
        assert!(store.alerts().is_empty());
        assert!(store.saved_locations().is_empty());
        assert_eq!(store.current_location(), "London, UK");
        assert_eq!(store.api_key(), "");
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn test_add_alert_assigns_id_and_persists() {
        let (mut store, storage) = store();
        let a = store.add_alert(alert("Madrid")).unwrap();
        let b = store.add_alert(alert("Oslo")).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.alerts().len(), 2);
        assert_eq!(storage.write_count(), 2);
    }

    #[test]
    fn test_alert_limit() {
        let (mut store, storage) = store();
        for _ in 0..MAX_ALERTS {
            store.add_alert(alert("Madrid")).unwrap();
        }
        let err = store.add_alert(alert("Madrid")).unwrap_err();

        assert!(matches!(err, StoreError::LimitReached { max: MAX_ALERTS, .. }));
        assert_eq!(store.alerts().len(), MAX_ALERTS);
        assert_eq!(storage.write_count(), MAX_ALERTS);
    }

    #[test]
    fn test_remove_unknown_alert_still_persists() {
        let (mut store, storage) = store();
        store.add_alert(alert("Madrid")).unwrap();

        store.remove_alert("nope");

        assert_eq!(store.alerts().len(), 1);
        assert_eq!(storage.write_count(), 2);
    }

    #[test]
    fn test_toggle_alert() {
        let (mut store, storage) = store();
        let a = store.add_alert(alert("Madrid")).unwrap();

        assert!(store.toggle_alert(&a.id));
        assert!(!store.alerts()[0].is_active);
        assert!(!store.toggle_alert("missing"));
        assert_eq!(storage.write_count(), 2);
    }

    #[test]
    fn test_toggle_favorite_twice_restores() {
        let (mut store, storage) = store();
        let saved = store
            .add_saved_location(&Location::new("Paris", "Ile-de-France", "France", 48.87, 2.33))
            .unwrap();
        let writes_before = storage.write_count();

        assert!(store.toggle_favorite(&saved.id));
        assert!(store.saved_locations()[0].is_favorite);
        assert!(store.toggle_favorite(&saved.id));
        assert!(!store.saved_locations()[0].is_favorite);

        assert_eq!(storage.write_count() - writes_before, 2);
    }

    #[test]
    fn test_favorites_only_lists_starred() {
        let (mut store, _storage) = store();
        let paris = store
            .add_saved_location(&Location::new("Paris", "", "France", 48.87, 2.33))
            .unwrap();
        store
            .add_saved_location(&Location::new("Oslo", "", "Norway", 59.91, 10.75))
            .unwrap();
        assert_eq!(store.favorites().count(), 0);

        store.toggle_favorite(&paris.id);

        let names: Vec<_> = store.favorites().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Paris"]);
    }

    #[test]
    fn test_toggle_favorite_unknown_id_does_not_write() {
        let (mut store, storage) = store();
        assert!(!store.toggle_favorite("ghost"));
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn test_saved_location_limit() {
        let (mut store, _storage) = store();
        let paris = Location::new("Paris", "", "France", 48.87, 2.33);
        for _ in 0..MAX_SAVED_LOCATIONS {
            store.add_saved_location(&paris).unwrap();
        }
        assert!(matches!(
            store.add_saved_location(&paris),
            Err(StoreError::LimitReached { .. })
        ));
    }

    #[test]
    fn test_select_saved_location() {
        let (mut store, _storage) = store();
        let saved = store
            .add_saved_location(&Location::new("Paris", "Ile-de-France", "France", 48.87, 2.33))
            .unwrap();

        assert_eq!(store.select_saved_location(&saved.id).as_deref(), Some("Paris, Ile-de-France"));
        assert_eq!(store.current_location(), "Paris, Ile-de-France");
        assert_eq!(store.select_saved_location("ghost"), None);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let (mut store, storage) = store();
        storage.set_fail_writes(true);

        store.set_current_location("Lisbon");
        let added = store.add_alert(alert("Lisbon"));

        assert!(added.is_ok());
        assert_eq!(store.current_location(), "Lisbon");
        assert!(!store.save());
    }

    #[test]
    fn test_alert_json_shape() {
        let (mut store, storage) = store();
        store.add_alert(alert("Madrid")).unwrap();

        let raw = storage.get(DASHBOARD_KEY).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &json["alerts"][0];
        assert_eq!(first["type"], "temperature");
        assert_eq!(first["condition"], "above");
        assert_eq!(first["isActive"], true);
        assert!(first["createdAt"].is_string());
        assert_eq!(json["currentLocation"], "London, UK");
        assert_eq!(json["apiKey"], "");
    }

    #[test]
    fn test_alert_type_parsing() {
        assert_eq!("UV".parse::<AlertType>().unwrap(), AlertType::Uv);
        assert_eq!("below".parse::<AlertCondition>().unwrap(), AlertCondition::Below);
        assert!("snow".parse::<AlertType>().is_err());
        assert_eq!(AlertType::Rain.unit(), "mm");
    }
}
