//! Persisted dashboard state and user preferences.
//!
//! Both stores load once at startup and write their whole document after
//! every mutation. Reads never fail (bad data yields defaults) and write
//! failures are logged, not propagated.

pub mod dashboard;
pub mod error;
pub mod preferences;
pub mod storage;

pub use dashboard::{
    AlertCondition, AlertType, DashboardState, DashboardStore, NewAlert, SavedLocation,
    WeatherAlert, DASHBOARD_KEY, DEFAULT_LOCATION, MAX_ALERTS, MAX_SAVED_LOCATIONS,
};
pub use error::{Result, StoreError};
pub use preferences::{
    Feature, Features, Preferences, PreferencesState, PreferencesStore, PreferencesUpdate, Theme,
    Units, PREFERENCES_KEY,
};
pub use storage::{FileStorage, MemoryStorage, StateStorage};
