//! Dashboard session: the weather client, cache and stores behind one handle.
//!
//! A session is created once by the application root and shared as
//! `Arc<WeatherSession>`. All state sits behind short-lived locks that are
//! never held across an `.await`.
//!
//! Concurrent fetches for the same location are not merged; whichever
//! finishes last overwrites the view state, even if it started first.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use skycast_core::Config;
use skycast_store::{
    DashboardStore, Feature, NewAlert, PreferencesState, PreferencesStore, PreferencesUpdate,
    SavedLocation, StateStorage, StoreError, Theme, WeatherAlert,
};
use skycast_weather::client::DEFAULT_FORECAST_DAYS;
use skycast_weather::{
    classify_condition, Clock, ConditionType, DataKind, ForecastSnapshot, Location, SystemClock,
    WeatherCache, WeatherClient, WeatherError, WeatherSnapshot, DEFAULT_CACHE_DURATION,
};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub forecast_days: u8,
    /// Auto-refresh period; data older than this counts as stale
    pub refresh_interval: Duration,
    pub cache_ttl: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            forecast_days: DEFAULT_FORECAST_DAYS,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            cache_ttl: DEFAULT_CACHE_DURATION,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        let minutes = |m: u32| Duration::from_secs(u64::from(m) * 60);
        Self {
            forecast_days: config.weather.forecast_days,
            refresh_interval: minutes(config.weather.refresh_minutes),
            cache_ttl: minutes(config.weather.cache_minutes),
        }
    }
}

/// Display-ready figures derived from the current snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSummary {
    pub temperature: i64,
    pub condition: String,
    pub humidity: u8,
    pub wind_speed: i64,
    pub wind_direction: String,
    pub pressure: i64,
    pub visibility: i64,
    pub uv: f64,
    pub feels_like: i64,
}

impl WeatherSummary {
    fn from_snapshot(snapshot: &WeatherSnapshot) -> Self {
        let current = &snapshot.current;
        Self {
            temperature: current.temp_c.round() as i64,
            condition: current.condition.text.clone(),
            humidity: current.humidity,
            wind_speed: current.wind_kph.round() as i64,
            wind_direction: current.wind_dir.clone(),
            pressure: current.pressure_mb.round() as i64,
            visibility: current.vis_km.round() as i64,
            uv: current.uv,
            feels_like: current.feelslike_c.round() as i64,
        }
    }
}

#[derive(Debug, Default)]
struct ViewState {
    current: Option<WeatherSnapshot>,
    forecast: Option<ForecastSnapshot>,
    last_updated: Option<DateTime<Utc>>,
    error: Option<String>,
}

/// Marks a request in flight for as long as it is alive.
pub(crate) struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct WeatherSession {
    client: WeatherClient,
    cache: Mutex<WeatherCache>,
    dashboard: Mutex<DashboardStore>,
    preferences: Mutex<PreferencesStore>,
    view: Mutex<ViewState>,
    /// Publishes `last_updated` each time fresh current conditions arrive
    updates: watch::Sender<Option<DateTime<Utc>>>,
    in_flight: AtomicUsize,
    clock: Arc<dyn Clock>,
    options: SessionOptions,
}

impl WeatherSession {
    pub fn new(client: WeatherClient, storage: Arc<dyn StateStorage>, options: SessionOptions) -> Self {
        Self::with_clock(client, storage, options, Arc::new(SystemClock))
    }

    pub fn with_clock(
        client: WeatherClient,
        storage: Arc<dyn StateStorage>,
        options: SessionOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let dashboard = DashboardStore::load(storage.clone());
        let preferences = PreferencesStore::load(storage);

        // A key saved from a previous run wins over the configured one
        if !dashboard.api_key().is_empty() {
            tracing::info!("Using saved API key");
            client.set_api_key(dashboard.api_key());
        }

        Self {
            client,
            cache: Mutex::new(WeatherCache::new(options.cache_ttl, clock.clone())),
            dashboard: Mutex::new(dashboard),
            preferences: Mutex::new(preferences),
            view: Mutex::new(ViewState::default()),
            updates: watch::channel(None).0,
            in_flight: AtomicUsize::new(0),
            clock,
            options,
        }
    }

    pub fn from_config(config: &Config, storage: Arc<dyn StateStorage>) -> Result<Self, WeatherError> {
        let client = WeatherClient::from_config(&config.weather, &config.maps)?;
        Ok(Self::new(client, storage, SessionOptions::from_config(config)))
    }

    pub fn client(&self) -> &WeatherClient {
        &self.client
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Receiver that changes whenever fresh current conditions are fetched.
    ///
    /// Cache hits do not count. A new receiver starts with the latest value marked as seen.
    pub fn subscribe_updates(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.updates.subscribe()
    }

    pub(crate) fn begin_request(&self) -> InFlight<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    fn resolve_location(&self, location: Option<&str>) -> String {
        match location {
            Some(l) => l.to_string(),
            None => self.dashboard.lock().current_location().to_string(),
        }
    }

    fn record_error(&self, context: &str, err: &WeatherError) {
        tracing::error!("{} failed: {}", context, err);
        self.view.lock().error = Some(err.user_message().to_string());
    }

    /// Current conditions, from cache when allowed and fresh.
    ///
    /// On success the location becomes the persisted current location.
    pub async fn fetch_current(
        &self,
        location: Option<&str>,
        use_cache: bool,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let location = self.resolve_location(location);

        if use_cache {
            let cached = self.cache.lock().get_current(&location);
            if let Some(snapshot) = cached {
                self.view.lock().current = Some(snapshot.clone());
                return Ok(snapshot);
            }
        }

        let _busy = self.begin_request();
        self.view.lock().error = None;

        match self.client.fetch_current(&location).await {
            Ok(snapshot) => {
                let now = self.clock.now();
                {
                    let mut view = self.view.lock();
                    view.current = Some(snapshot.clone());
                    view.last_updated = Some(now);
                }
                self.updates.send_replace(Some(now));
                self.dashboard.lock().set_current_location(&location);
                self.cache
                    .lock()
                    .put(DataKind::Current, &location, snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                self.record_error("Current weather fetch", &e);
                Err(e)
            }
        }
    }

    /// Forecast for `days` days (configured default when `None`).
    pub async fn fetch_forecast(
        &self,
        location: Option<&str>,
        days: Option<u8>,
        use_cache: bool,
    ) -> Result<ForecastSnapshot, WeatherError> {
        let location = self.resolve_location(location);
        let days = days.unwrap_or(self.options.forecast_days);

        if use_cache {
            let cached = self.cache.lock().get_forecast(&location);
            if let Some(snapshot) = cached {
                self.view.lock().forecast = Some(snapshot.clone());
                return Ok(snapshot);
            }
        }

        let _busy = self.begin_request();
        self.view.lock().error = None;

        match self.client.fetch_forecast(&location, days).await {
            Ok(snapshot) => {
                {
                    let mut view = self.view.lock();
                    view.forecast = Some(snapshot.clone());
                    view.last_updated = Some(self.clock.now());
                }
                self.cache
                    .lock()
                    .put(DataKind::Forecast, &location, snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                self.record_error("Forecast fetch", &e);
                Err(e)
            }
        }
    }

    /// Fetch current conditions and forecast together, skipping the cache.
    pub async fn refresh(&self, location: Option<&str>) -> Result<(), WeatherError> {
        let location = self.resolve_location(location);
        tracing::debug!("Refreshing weather for {}", location);

        let (current, forecast) = tokio::join!(
            self.fetch_current(Some(&location), false),
            self.fetch_forecast(Some(&location), None, false)
        );
        current?;
        forecast?;
        Ok(())
    }

    /// Failures are recorded as the session error and yield no results.
    pub async fn search_locations(&self, query: &str) -> Vec<Location> {
        match self.client.search_locations(query).await {
            Ok(locations) => locations,
            Err(e) => {
                self.record_error("Location search", &e);
                Vec::new()
            }
        }
    }

    /// Replace the credential. Cached data always goes, even if the key is unchanged.
    pub fn set_api_key(&self, key: &str) {
        self.dashboard.lock().set_api_key(key);
        self.client.set_api_key(key);
        self.cache.lock().invalidate_all();
        tracing::info!("API key updated, demo mode: {}", !self.client.is_configured());
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// True before the first fetch and once data is older than the refresh interval.
    pub fn is_data_stale(&self) -> bool {
        let Some(last) = self.view.lock().last_updated else {
            return true;
        };
        match (self.clock.now() - last).to_std() {
            Ok(age) => age > self.options.refresh_interval,
            Err(_) => false,
        }
    }

    pub fn current(&self) -> Option<WeatherSnapshot> {
        self.view.lock().current.clone()
    }

    pub fn forecast(&self) -> Option<ForecastSnapshot> {
        self.view.lock().forecast.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.view.lock().last_updated
    }

    pub fn current_condition(&self) -> Option<ConditionType> {
        self.view
            .lock()
            .current
            .as_ref()
            .map(|s| classify_condition(s.current.condition.code))
    }

    pub fn weather_summary(&self) -> Option<WeatherSummary> {
        self.view.lock().current.as_ref().map(WeatherSummary::from_snapshot)
    }

    pub fn last_error(&self) -> Option<String> {
        self.view.lock().error.clone()
    }

    pub fn clear_error(&self) {
        self.view.lock().error = None;
    }

    // Dashboard store

    pub fn current_location(&self) -> String {
        self.dashboard.lock().current_location().to_string()
    }

    pub fn set_current_location(&self, location: &str) {
        self.dashboard.lock().set_current_location(location);
    }

    pub fn alerts(&self) -> Vec<WeatherAlert> {
        self.dashboard.lock().alerts().to_vec()
    }

    pub fn add_alert(&self, alert: NewAlert) -> Result<WeatherAlert, StoreError> {
        self.dashboard.lock().add_alert(alert)
    }

    pub fn remove_alert(&self, id: &str) {
        self.dashboard.lock().remove_alert(id);
    }

    pub fn toggle_alert(&self, id: &str) -> bool {
        self.dashboard.lock().toggle_alert(id)
    }

    pub fn saved_locations(&self) -> Vec<SavedLocation> {
        self.dashboard.lock().saved_locations().to_vec()
    }

    pub fn favorites(&self) -> Vec<SavedLocation> {
        self.dashboard.lock().favorites().cloned().collect()
    }

    pub fn add_saved_location(&self, location: &Location) -> Result<SavedLocation, StoreError> {
        self.dashboard.lock().add_saved_location(location)
    }

    pub fn remove_saved_location(&self, id: &str) {
        self.dashboard.lock().remove_saved_location(id);
    }

    pub fn toggle_favorite(&self, id: &str) -> bool {
        self.dashboard.lock().toggle_favorite(id)
    }

    pub fn select_saved_location(&self, id: &str) -> Option<String> {
        self.dashboard.lock().select_saved_location(id)
    }

    // Preferences store

    pub fn preferences(&self) -> PreferencesState {
        self.preferences.lock().state().clone()
    }

    pub fn auto_refresh_enabled(&self) -> bool {
        self.preferences.lock().auto_refresh()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.preferences.lock().set_theme(theme);
    }

    pub fn resolved_theme(&self, system_prefers_dark: bool) -> Theme {
        self.preferences.lock().resolved_theme(system_prefers_dark)
    }

    pub fn update_preferences(&self, update: PreferencesUpdate) {
        self.preferences.lock().update_preferences(update);
    }

    pub fn toggle_feature(&self, feature: Feature) -> bool {
        self.preferences.lock().toggle_feature(feature)
    }
}
