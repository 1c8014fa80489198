use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use super::{QueryCache, QueryData, QueryKey};
use crate::client::{ApiClient, ClientError, Result};

/// Fetches queries through [`ApiClient`] and records results in [`QueryCache`].
#[derive(Clone)]
pub struct QueryClient {
    api: ApiClient,
    cache: QueryCache,
}

impl QueryClient {
    pub fn new(api: ApiClient, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Run one fetch for `key` and store the outcome.
    pub async fn fetch(&self, key: QueryKey) -> Result<QueryData> {
        let started = self.cache.begin_fetch(key).await;
        let result = load(&self.api, key).await;
        let stored = match &result {
            Ok(data) => self.cache.store_success(key, started, data.clone()).await,
            Err(e) => self.cache.store_error(key, started, e).await,
        };
        if !stored {
            debug!(query = %key, "Cache cleared during fetch; result dropped");
        }
        result
    }

    /// Fetch `key` now, typically right after a mutation. Failures are
    /// already visible through the cache entry, so they are only logged.
    pub async fn refetch(&self, key: QueryKey) {
        if let Err(e) = self.fetch(key).await {
            warn!(query = %key, error = %e, "Refetch failed");
        }
    }

    /// Poll `key` every `interval`, starting immediately.
    ///
    /// The poller lives until the returned handle is dropped.
    pub fn watch(&self, key: QueryKey, interval: Duration) -> PollHandle {
        let client = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(query = %key, interval_ms = interval.as_millis() as u64, "Query polling started");

            loop {
                ticker.tick().await;
                match client.fetch(key).await {
                    Ok(_) => debug!(query = %key, "Query refreshed"),
                    // Expected while logged out; keep it out of the default log level.
                    Err(ClientError::NotAuthenticated) => {
                        debug!(query = %key, "Skipping fetch: not authenticated")
                    }
                    Err(e) => warn!(query = %key, error = %e, "Query fetch failed"),
                }
            }
        });
        PollHandle { key, task }
    }
}

async fn load(api: &ApiClient, key: QueryKey) -> Result<QueryData> {
    Ok(match key {
        QueryKey::SensorSnapshot => QueryData::Snapshot(api.sensor_snapshot().await?),
        QueryKey::DailyReadings(metric) => QueryData::Readings(api.daily_readings(metric).await?),
        QueryKey::Prediction(metric) => QueryData::Prediction(api.predict_next(metric).await?),
        QueryKey::Alarms => QueryData::Alarms(api.list_alarms().await?),
        QueryKey::Notifications => QueryData::Notifications(api.list_notifications().await?),
        QueryKey::CurrentUser => QueryData::User(api.current_user().await?),
    })
}

/// Owns a running poller. Dropping it stops the polling task.
pub struct PollHandle {
    key: QueryKey,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn key(&self) -> QueryKey {
        self.key
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        debug!(query = %self.key, "Query polling stopped");
        self.task.abort();
    }
}
