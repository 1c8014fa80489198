use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{QueryData, QueryKey};
use crate::{
    client::ClientError,
    models::{Alarm, Notification, SensorReading, SensorSnapshot, User},
};

/// State of one query as last observed.
///
/// A failed fetch records the error but keeps `data` from the last success,
/// so views can keep showing stale values next to the error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryEntry {
    pub data: Option<QueryData>,
    pub error: Option<String>,
    /// The last failure was a missing or rejected token.
    pub unauthenticated: bool,
    pub is_fetching: bool,
    /// Time of the last successful fetch.
    pub updated_at: Option<DateTime<Utc>>,
}

impl QueryEntry {
    /// No data and no error yet.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }

    pub fn snapshot(&self) -> Option<&SensorSnapshot> {
        match &self.data {
            Some(QueryData::Snapshot(s)) => Some(s),
            _ => None,
        }
    }

    pub fn readings(&self) -> Option<&[SensorReading]> {
        match &self.data {
            Some(QueryData::Readings(r)) => Some(r),
            _ => None,
        }
    }

    pub fn prediction(&self) -> Option<f64> {
        match self.data {
            Some(QueryData::Prediction(v)) => Some(v),
            _ => None,
        }
    }

    pub fn alarms(&self) -> Option<&[Alarm]> {
        match &self.data {
            Some(QueryData::Alarms(a)) => Some(a),
            _ => None,
        }
    }

    pub fn notifications(&self) -> Option<&[Notification]> {
        match &self.data {
            Some(QueryData::Notifications(n)) => Some(n),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match &self.data {
            Some(QueryData::User(u)) => Some(u),
            _ => None,
        }
    }
}

/// Cache epoch a fetch started in. [`QueryCache::clear`] starts a new one,
/// and results from an older epoch are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Default)]
struct Entries {
    map: HashMap<QueryKey, QueryEntry>,
    generation: u64,
}

/// Shared map of query results keyed by [`QueryKey`].
///
/// Wrapped in `Arc` so pollers, mutation handlers and views share one copy.
#[derive(Clone, Default)]
pub struct QueryCache {
    inner: Arc<RwLock<Entries>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as in flight, creating the entry if needed. The returned
    /// generation must be handed back when storing the result.
    pub async fn begin_fetch(&self, key: QueryKey) -> Generation {
        let mut entries = self.inner.write().await;
        entries.map.entry(key).or_default().is_fetching = true;
        Generation(entries.generation)
    }

    /// Record a successful fetch. Returns `false` if the cache was cleared
    /// after the fetch began, in which case nothing is stored.
    pub async fn store_success(&self, key: QueryKey, started: Generation, data: QueryData) -> bool {
        let mut entries = self.inner.write().await;
        if entries.generation != started.0 {
            return false;
        }
        let entry = entries.map.entry(key).or_default();
        entry.data = Some(data);
        entry.error = None;
        entry.unauthenticated = false;
        entry.is_fetching = false;
        entry.updated_at = Some(Utc::now());
        true
    }

    /// Record a failed fetch, keeping any earlier data. Same generation rule
    /// as [`store_success`](Self::store_success).
    pub async fn store_error(&self, key: QueryKey, started: Generation, error: &ClientError) -> bool {
        let mut entries = self.inner.write().await;
        if entries.generation != started.0 {
            return false;
        }
        let entry = entries.map.entry(key).or_default();
        entry.error = Some(error.to_string());
        entry.unauthenticated = error.is_unauthenticated();
        entry.is_fetching = false;
        true
    }

    /// Snapshot of one entry. Keys never fetched read as loading.
    pub async fn get(&self, key: QueryKey) -> QueryEntry {
        self.inner
            .read()
            .await
            .map
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop every cached result, e.g. when the session ends. Fetches still in
    /// flight will not repopulate it.
    pub async fn clear(&self) {
        let mut entries = self.inner.write().await;
        entries.map.clear();
        entries.generation += 1;
    }
}
