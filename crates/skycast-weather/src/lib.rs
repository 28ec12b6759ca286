//! Weather data for SkyCast
//!
//! Provides current conditions, forecasts and location search via WeatherAPI,
//! with demo data when no credential is configured and a time-bounded cache.

pub mod cache;
pub mod client;
pub mod condition;
pub mod demo;
pub mod error;
pub mod retry;
pub mod types;

pub use cache::{Clock, ManualClock, SystemClock, WeatherCache, DEFAULT_CACHE_DURATION};
pub use client::WeatherClient;
pub use condition::{classify_condition, ConditionType};
pub use error::WeatherError;
pub use retry::RetryConfig;
pub use types::*;
