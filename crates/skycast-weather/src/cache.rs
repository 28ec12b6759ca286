//! In-memory snapshot cache with a time-to-live.
//!
//! Keys are `"{kind}:{location}"` with the location used verbatim, so
//! "London" and "london" are separate entries. Expired entries are never
//! evicted; they are ignored on lookup and overwritten by the next `put`.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::types::{DataKind, ForecastSnapshot, Snapshot, WeatherSnapshot};

/// Snapshots stay valid for ten minutes.
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(10 * 60);

/// Source of "now" for staleness checks
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::days(36_500));
        *self.now.lock() += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Snapshot,
    stored_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct WeatherCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl WeatherCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    fn key(kind: DataKind, location: &str) -> String {
        format!("{}:{}", kind.as_str(), location)
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        match (self.clock.now() - entry.stored_at).to_std() {
            Ok(age) => age < self.ttl,
            // Clock moved backwards; treat as just stored
            Err(_) => true,
        }
    }

    /// Returns the stored snapshot if it is younger than the TTL.
    pub fn get(&self, kind: DataKind, location: &str) -> Option<Snapshot> {
        let key = Self::key(kind, location);
        match self.entries.get(&key) {
            Some(entry) if self.is_fresh(entry) => {
                tracing::debug!("Cache hit for {}", key);
                Some(entry.snapshot.clone())
            }
            Some(_) => {
                tracing::debug!("Cache entry for {} is stale", key);
                None
            }
            None => {
                tracing::debug!("Cache miss for {}", key);
                None
            }
        }
    }

    pub fn get_current(&self, location: &str) -> Option<WeatherSnapshot> {
        match self.get(DataKind::Current, location)? {
            Snapshot::Current(snapshot) => Some(snapshot),
            Snapshot::Forecast(_) => None,
        }
    }

    pub fn get_forecast(&self, location: &str) -> Option<ForecastSnapshot> {
        match self.get(DataKind::Forecast, location)? {
            Snapshot::Forecast(snapshot) => Some(snapshot),
            Snapshot::Current(_) => None,
        }
    }

    /// Store `snapshot` under `(kind, location)`, replacing any previous entry.
    pub fn put(&mut self, kind: DataKind, location: &str, snapshot: impl Into<Snapshot>) {
        let entry = CacheEntry {
            snapshot: snapshot.into(),
            stored_at: self.clock.now(),
        };
        self.entries.insert(Self::key(kind, location), entry);
    }

    /// Drop every entry, fresh or stale.
    pub fn invalidate_all(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        tracing::debug!("Invalidated {} cache entries", count);
    }

    /// Physical entry count, including stale entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for WeatherCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_CACHE_DURATION)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::demo;

    fn cache_with_clock() -> (WeatherCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = WeatherCache::new(DEFAULT_CACHE_DURATION, clock.clone());
        (cache, clock)
    }

    fn snapshot_named(name: &str) -> WeatherSnapshot {
        let mut snapshot = demo::current_snapshot();
        snapshot.location.name = name.to_string();
        snapshot
    }

    #[test]
    fn test_put_then_get_within_ttl() {
        let (mut cache, clock) = cache_with_clock();
        let snapshot_a = snapshot_named("Madrid");

        cache.put(DataKind::Current, "Madrid", snapshot_a.clone());
        clock.advance(Duration::from_secs(1));

        assert_eq!(cache.get_current("Madrid"), Some(snapshot_a));
    }

    #[test]
    fn test_entry_expires_but_is_not_evicted() {
        let (mut cache, clock) = cache_with_clock();
        cache.put(DataKind::Current, "Madrid", snapshot_named("Madrid"));

        clock.advance(DEFAULT_CACHE_DURATION);

        assert!(cache.get(DataKind::Current, "Madrid").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_valid_just_before_ttl() {
        let (mut cache, clock) = cache_with_clock();
        cache.put(DataKind::Current, "Madrid", snapshot_named("Madrid"));

        clock.advance(DEFAULT_CACHE_DURATION - Duration::from_millis(1));

        assert!(cache.get(DataKind::Current, "Madrid").is_some());
    }

    #[test]
    fn test_put_overwrites_and_restamps() {
        let (mut cache, clock) = cache_with_clock();
        cache.put(DataKind::Current, "Madrid", snapshot_named("Old"));
        clock.advance(Duration::from_secs(9 * 60));
        cache.put(DataKind::Current, "Madrid", snapshot_named("New"));
        clock.advance(Duration::from_secs(9 * 60));

        let hit = cache.get_current("Madrid").unwrap();
        assert_eq!(hit.location.name, "New");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_kinds_are_separate_keys() {
        let (mut cache, _clock) = cache_with_clock();
        cache.put(DataKind::Current, "Madrid", snapshot_named("Madrid"));

        assert!(cache.get(DataKind::Forecast, "Madrid").is_none());
        assert!(cache.get_forecast("Madrid").is_none());

        cache.put(DataKind::Forecast, "Madrid", demo::forecast_snapshot(1));
        assert!(cache.get_forecast("Madrid").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clock_moving_backwards_keeps_entry_fresh() {
        let (mut cache, clock) = cache_with_clock();
        let stored_at = clock.now();
        cache.put(DataKind::Current, "Madrid", snapshot_named("Madrid"));

        clock.set(stored_at - chrono::Duration::hours(1));

        assert!(cache.get_current("Madrid").is_some());
    }

    #[test]
    fn test_default_ttl() {
        assert_eq!(WeatherCache::default().ttl(), DEFAULT_CACHE_DURATION);
        assert_eq!(WeatherCache::with_ttl(Duration::from_secs(30)).ttl(), Duration::from_secs(30));
    }

    #[test]
    fn test_location_is_not_normalized() {
        let (mut cache, _clock) = cache_with_clock();
        cache.put(DataKind::Current, "London", snapshot_named("London"));

        assert!(cache.get(DataKind::Current, "london").is_none());
        assert!(cache.get(DataKind::Current, "London ").is_none());
        assert!(cache.get(DataKind::Current, "London").is_some());
    }

    #[test]
    fn test_invalidate_all() {
        let (mut cache, _clock) = cache_with_clock();
        cache.put(DataKind::Current, "Madrid", snapshot_named("Madrid"));
        cache.put(DataKind::Forecast, "Oslo", demo::forecast_snapshot(2));

        cache.invalidate_all();

        assert!(cache.is_empty());
        assert!(cache.get(DataKind::Current, "Madrid").is_none());
    }
}
