//! Periodic background refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::session::WeatherSession;

/// Shortest period accepted; `tokio::time::interval` rejects zero.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to a running refresh loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct AutoRefresh {
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl AutoRefresh {
    /// Refresh `session` every `interval`, starting one interval from now.
    ///
    /// A tick is skipped when auto-refresh is disabled in preferences or a
    /// fetch is already in flight. Must be called inside a tokio runtime.
    pub fn start(session: Arc<WeatherSession>, interval: Duration) -> Self {
        let period = interval.max(MIN_REFRESH_INTERVAL);
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!("Auto-refresh started, every {:?}", period);

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                if !session.auto_refresh_enabled() {
                    tracing::debug!("Auto-refresh disabled, skipping tick");
                    continue;
                }
                if session.is_loading() {
                    tracing::debug!("Fetch in flight, skipping tick");
                    continue;
                }

                tokio::select! {
                    () = token.cancelled() => break,
                    result = session.refresh(None) => {
                        if let Err(e) = result {
                            tracing::warn!("Auto-refresh failed: {}", e);
                        }
                    }
                }
            }

            tracing::info!("Auto-refresh stopped");
        });

        Self {
            cancel_token,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn stop(mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("Auto-refresh task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
