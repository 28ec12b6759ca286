//! SkyCast dashboard session
//!
//! Ties the weather client, snapshot cache and persisted stores into a
//! single shared session, plus the background auto-refresh loop.

pub mod refresh;
pub mod session;

pub use refresh::{AutoRefresh, MIN_REFRESH_INTERVAL};
pub use session::{SessionOptions, WeatherSession, WeatherSummary, DEFAULT_REFRESH_INTERVAL};
