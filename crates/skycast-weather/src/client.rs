//! WeatherAPI HTTP client.
//!
//! Without a real credential every fetch is answered from [`crate::demo`]
//! and no request leaves the process.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::Client;
use serde::de::DeserializeOwned;
use skycast_core::config::{is_real_credential, MAX_FORECAST_DAYS, MIN_FORECAST_DAYS};
use skycast_core::{MapsConfig, WeatherConfig};
use url::Url;

use crate::demo;
use crate::error::WeatherError;
use crate::retry::{with_retry, RetryConfig};
use crate::types::{ForecastSnapshot, Location, MapLayer, WeatherSnapshot};

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";
pub const DEFAULT_TILE_URL: &str = "https://maps.weatherapi.com/v1/statics";
pub const DEFAULT_FORECAST_DAYS: u8 = 7;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct WeatherClient {
    http: Arc<Client>,
    base_url: String,
    tile_url: String,
    tile_key: Option<String>,
    api_key: RwLock<String>,
    retry: RetryConfig,
}

fn parse_base(raw: &str, field: &str) -> Result<String, WeatherError> {
    let url = Url::parse(raw)
        .map_err(|e| WeatherError::InvalidRequest(format!("invalid {} '{}': {}", field, raw, e)))?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Clamp a requested forecast length into the supported range.
pub fn clamp_days(days: u8) -> u8 {
    days.clamp(MIN_FORECAST_DAYS, MAX_FORECAST_DAYS)
}

impl WeatherClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, WeatherError> {
        Self::build(base_url, api_key.into(), DEFAULT_TIMEOUT)
    }

    fn build(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http: Arc::new(http),
            base_url: parse_base(base_url, "base_url")?,
            tile_url: DEFAULT_TILE_URL.to_string(),
            tile_key: None,
            api_key: RwLock::new(api_key),
            retry: RetryConfig::default(),
        })
    }

    pub fn from_config(weather: &WeatherConfig, maps: &MapsConfig) -> Result<Self, WeatherError> {
        let client = Self::build(
            &weather.base_url,
            weather.api_key.clone(),
            Duration::from_millis(weather.timeout_ms),
        )?
        .with_retry(RetryConfig::from_config(weather))
        .with_tile_url(&maps.tile_url, maps.api_key.clone())?;

        tracing::info!(
            "Weather client ready (base: {}, demo mode: {})",
            client.base_url,
            !client.is_configured()
        );
        Ok(client)
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Tile endpoint and an optional tile-specific key. Without one, the
    /// weather credential is used.
    pub fn with_tile_url(mut self, tile_url: &str, tile_key: Option<String>) -> Result<Self, WeatherError> {
        self.tile_url = parse_base(tile_url, "tile_url")?;
        self.tile_key = tile_key.filter(|k| !k.is_empty());
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> String {
        self.api_key.read().clone()
    }

    pub fn set_api_key(&self, key: impl Into<String>) {
        *self.api_key.write() = key.into();
    }

    /// True when requests go to the network rather than demo data
    pub fn is_configured(&self) -> bool {
        is_real_credential(&self.api_key.read())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let key = self.api_key();

        tracing::debug!("GET {}", url);
        let response = with_retry(&self.retry, || {
            self.http
                .get(&url)
                .query(&[("key", key.as_str())])
                .query(params)
                .send()
        })
        .await
        .map_err(WeatherError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(WeatherError::from_transport)?;

        if !status.is_success() {
            let err = WeatherError::from_api_response(status.as_u16(), &body);
            tracing::warn!("{} failed: {}", endpoint, err);
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::Parse(format!("{}: {}", endpoint, e)))
    }

    fn require_query(location: &str) -> Result<(), WeatherError> {
        if location.trim().is_empty() {
            return Err(WeatherError::InvalidRequest("location must not be empty".to_string()));
        }
        Ok(())
    }

    /// Current conditions for `location`.
    pub async fn fetch_current(&self, location: &str) -> Result<WeatherSnapshot, WeatherError> {
        if !self.is_configured() {
            tracing::debug!("No credential, serving demo current conditions");
            return Ok(demo::current_snapshot());
        }
        Self::require_query(location)?;

        self.get_json(
            "current.json",
            &[("q", location.to_string()), ("aqi", "yes".to_string())],
        )
        .await
    }

    /// Forecast for `location`; `days` is clamped to 1..=14.
    pub async fn fetch_forecast(&self, location: &str, days: u8) -> Result<ForecastSnapshot, WeatherError> {
        let days = clamp_days(days);
        if !self.is_configured() {
            tracing::debug!("No credential, synthesizing {}-day demo forecast", days);
            return Ok(demo::forecast_snapshot(days));
        }
        Self::require_query(location)?;

        self.get_json(
            "forecast.json",
            &[
                ("q", location.to_string()),
                ("days", days.to_string()),
                ("aqi", "yes".to_string()),
                ("alerts", "yes".to_string()),
            ],
        )
        .await
    }

    pub async fn search_locations(&self, query: &str) -> Result<Vec<Location>, WeatherError> {
        if !self.is_configured() {
            return Ok(demo::locations());
        }
        Self::require_query(query)?;

        self.get_json("search.json", &[("q", query.to_string())]).await
    }

    /// URL of a single raster overlay tile.
    pub fn map_tile_url(&self, layer: MapLayer, zoom: u8, x: u32, y: u32) -> Result<String, WeatherError> {
        let raw = format!("{}/{}/{}/{}/{}.png", self.tile_url, layer.as_str(), zoom, x, y);
        let mut url = Url::parse(&raw).map_err(|e| WeatherError::InvalidRequest(e.to_string()))?;
        let key = self.tile_key.clone().unwrap_or_else(|| self.api_key());
        url.query_pairs_mut().append_pair("key", &key);
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_clamp_days() {
        assert_eq!(clamp_days(0), 1);
        assert_eq!(clamp_days(7), 7);
        assert_eq!(clamp_days(30), 14);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = WeatherClient::new("not a url", "demo").unwrap_err();
        assert!(matches!(err, WeatherError::InvalidRequest(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = WeatherClient::new("https://api.example.com/v1/", "demo").unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/v1");
    }

    #[test]
    fn test_is_configured_tracks_key() {
        let client = WeatherClient::new(DEFAULT_BASE_URL, "demo").unwrap();
        assert!(!client.is_configured());

        client.set_api_key("YOUR_API_KEY");
        assert!(!client.is_configured());

        client.set_api_key("abc123");
        assert!(client.is_configured());
        assert_eq!(client.api_key(), "abc123");
    }

    #[tokio::test]
    async fn test_demo_mode_current_is_fixed() {
        let client = WeatherClient::new(DEFAULT_BASE_URL, "").unwrap();
        let snapshot = client.fetch_current("Anywhere").await.unwrap();
        assert_eq!(snapshot, demo::current_snapshot());
    }

    #[tokio::test]
    async fn test_demo_mode_forecast_days_clamped() {
        let client = WeatherClient::new(DEFAULT_BASE_URL, "demo").unwrap();
        let forecast = client.fetch_forecast("Madrid", 30).await.unwrap();
        assert_eq!(forecast.forecast.forecast_day.len(), 14);

        let forecast = client.fetch_forecast("Madrid", 0).await.unwrap();
        assert_eq!(forecast.forecast.forecast_day.len(), 1);
    }

    #[tokio::test]
    async fn test_demo_mode_search_ignores_query() {
        let client = WeatherClient::new(DEFAULT_BASE_URL, "demo").unwrap();
        let results = client.search_locations("zzzz").await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].name, "London");
    }

    #[tokio::test]
    async fn test_empty_location_rejected_when_configured() {
        let client = WeatherClient::new(DEFAULT_BASE_URL, "real-key").unwrap();
        let err = client.fetch_current("  ").await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidRequest(_)));
    }

    #[test]
    fn test_map_tile_url_uses_weather_key() {
        let client = WeatherClient::new(DEFAULT_BASE_URL, "k1").unwrap();
        let url = client.map_tile_url(MapLayer::Temperature, 3, 4, 2).unwrap();
        assert_eq!(url, "https://maps.weatherapi.com/v1/statics/temp_new/3/4/2.png?key=k1");
    }

    #[test]
    fn test_map_tile_url_prefers_tile_key() {
        let client = WeatherClient::new(DEFAULT_BASE_URL, "k1")
            .unwrap()
            .with_tile_url("https://tiles.example.com/", Some("tiles-key".to_string()))
            .unwrap();
        let url = client.map_tile_url(MapLayer::Wind, 1, 0, 0).unwrap();
        assert_eq!(url, "https://tiles.example.com/wind_new/1/0/0.png?key=tiles-key");
    }
}
