//! Weather data model.
//!
//! Snapshot shapes mirror the WeatherAPI JSON so real responses deserialize
//! directly; fields the upstream sometimes omits fall back to defaults.

use serde::{Deserialize, Deserializer, Serialize};

/// A place, as returned by location search and stored as a saved location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    #[serde(rename = "lat", default)]
    pub latitude: f64,
    #[serde(rename = "lon", default)]
    pub longitude: f64,
}

impl Location {
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        country: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            country: country.into(),
            latitude,
            longitude,
        }
    }

    /// "Name, Region" label used as the query string for this place
    pub fn display_name(&self) -> String {
        if self.region.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.region)
        }
    }
}

/// Location metadata attached to every snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationInfo {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub tz_id: String,
    pub localtime_epoch: i64,
    pub localtime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub text: String,
    pub icon: String,
    pub code: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentConditions {
    pub last_updated_epoch: i64,
    pub last_updated: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub is_day: u8,
    pub condition: Condition,
    pub wind_mph: f64,
    pub wind_kph: f64,
    pub wind_degree: i32,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub pressure_in: f64,
    pub precip_mm: f64,
    pub precip_in: f64,
    pub humidity: u8,
    pub cloud: u8,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub vis_km: f64,
    pub vis_miles: f64,
    pub uv: f64,
    pub gust_mph: f64,
    pub gust_kph: f64,
}

/// Current conditions payload (`current.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: LocationInfo,
    pub current: CurrentConditions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaySummary {
    pub maxtemp_c: f64,
    pub maxtemp_f: f64,
    pub mintemp_c: f64,
    pub mintemp_f: f64,
    pub avgtemp_c: f64,
    pub avgtemp_f: f64,
    pub maxwind_mph: f64,
    pub maxwind_kph: f64,
    pub totalprecip_mm: f64,
    pub totalprecip_in: f64,
    pub totalsnow_cm: f64,
    pub avgvis_km: f64,
    pub avgvis_miles: f64,
    pub avghumidity: f64,
    pub daily_will_it_rain: u8,
    pub daily_chance_of_rain: u8,
    pub daily_will_it_snow: u8,
    pub daily_chance_of_snow: u8,
    pub condition: Condition,
    pub uv: f64,
}

/// Astronomical data for one day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Astro {
    pub sunrise: String,
    pub sunset: String,
    pub moonrise: String,
    pub moonset: String,
    pub moon_phase: String,
    /// Percentage; older API versions send it as a string
    #[serde(deserialize_with = "number_or_string")]
    pub moon_illumination: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourForecast {
    pub time_epoch: i64,
    pub time: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub is_day: u8,
    pub condition: Condition,
    pub wind_mph: f64,
    pub wind_kph: f64,
    pub wind_degree: i32,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub precip_mm: f64,
    pub humidity: u8,
    pub cloud: u8,
    pub feelslike_c: f64,
    pub dewpoint_c: f64,
    pub will_it_rain: u8,
    pub chance_of_rain: u8,
    pub will_it_snow: u8,
    pub chance_of_snow: u8,
    pub vis_km: f64,
    pub gust_kph: f64,
    pub uv: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastDay {
    pub date: String,
    pub date_epoch: i64,
    pub day: DaySummary,
    pub astro: Astro,
    pub hour: Vec<HourForecast>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(rename = "forecastday", default)]
    pub forecast_day: Vec<ForecastDay>,
}

/// Multi-day forecast payload (`forecast.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub location: LocationInfo,
    pub current: CurrentConditions,
    pub forecast: Forecast,
}

/// Kind of data held under a cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Current,
    Forecast,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Forecast => "forecast",
        }
    }
}

/// Opaque payload stored by the cache
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Current(WeatherSnapshot),
    Forecast(ForecastSnapshot),
}

impl From<WeatherSnapshot> for Snapshot {
    fn from(snapshot: WeatherSnapshot) -> Self {
        Self::Current(snapshot)
    }
}

impl From<ForecastSnapshot> for Snapshot {
    fn from(snapshot: ForecastSnapshot) -> Self {
        Self::Forecast(snapshot)
    }
}

/// Raster map overlay layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapLayer {
    Temperature,
    Precipitation,
    Clouds,
    Pressure,
    Wind,
}

impl MapLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temp_new",
            Self::Precipitation => "precipitation_new",
            Self::Clouds => "clouds_new",
            Self::Pressure => "pressure_new",
            Self::Wind => "wind_new",
        }
    }
}

impl std::str::FromStr for MapLayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "temperature" | "temp" | "temp_new" => Ok(Self::Temperature),
            "precipitation" | "precipitation_new" => Ok(Self::Precipitation),
            "clouds" | "clouds_new" => Ok(Self::Clouds),
            "pressure" | "pressure_new" => Ok(Self::Pressure),
            "wind" | "wind_new" => Ok(Self::Wind),
            other => Err(format!("unknown map layer: {}", other)),
        }
    }
}

fn number_or_string<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n.clamp(0.0, 100.0).round() as u8),
        Raw::Text(s) => s.trim().parse::<u8>().map_err(serde::de::Error::custom),
    }
}
