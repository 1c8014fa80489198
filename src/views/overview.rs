use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{error_message, format_clock};
use crate::{
    control::FanStatus,
    models::{Metric, User},
    query::{QueryCache, QueryEntry, QueryKey},
};

/// Prediction widget with its own loading/error state.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PredictionView {
    pub loading: bool,
    pub error: Option<String>,
    pub value: Option<f64>,
    /// Two decimals, no unit.
    pub display: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MetricTile {
    pub metric: Metric,
    pub label: String,
    pub unit: String,
    pub value: Option<f64>,
    /// Two decimals, no unit.
    pub display: Option<String>,
    pub predicted: PredictionView,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FanView {
    pub on: bool,
    pub pending: bool,
    pub action_label: String,
}

impl From<FanStatus> for FanView {
    fn from(status: FanStatus) -> Self {
        Self {
            on: status.on,
            pending: status.pending,
            action_label: status.action_label().to_owned(),
        }
    }
}

/// Landing page of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardOverview {
    pub greeting: String,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_updated_display: Option<String>,
    pub metrics: Vec<MetricTile>,
    pub fan: FanView,
}

/// Name to greet the user by: the full name, else the part of the email
/// before `@`.
pub fn display_name(user: &User) -> String {
    match user.full_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => user
            .email
            .split_once('@')
            .map_or(user.email.as_str(), |(local, _)| local)
            .to_owned(),
    }
}

pub fn greeting(user: Option<&User>) -> String {
    match user {
        Some(user) => format!("Welcome, {}", display_name(user)),
        None => "Welcome".to_owned(),
    }
}

fn prediction_view(entry: &QueryEntry) -> PredictionView {
    let value = entry.prediction();
    PredictionView {
        loading: entry.is_loading(),
        error: error_message(entry, "prediction"),
        value,
        display: value.map(|v| format!("{v:.2}")),
    }
}

/// `predictions` holds one entry per metric in [`Metric::ALL`] order.
pub fn build<Tz: TimeZone>(
    snapshot: &QueryEntry,
    predictions: &[QueryEntry; 3],
    user: &QueryEntry,
    fan: FanStatus,
    tz: &Tz,
) -> DashboardOverview
where
    Tz::Offset: std::fmt::Display,
{
    let current = snapshot.snapshot();
    let last_updated = current.and_then(|s| s.timestamp);

    let metrics = Metric::ALL
        .iter()
        .zip(predictions)
        .map(|(&metric, prediction)| {
            let value = current.and_then(|s| s.value(metric));
            MetricTile {
                metric,
                label: metric.label().to_owned(),
                unit: metric.unit().to_owned(),
                value,
                display: value.map(|v| format!("{v:.2}")),
                predicted: prediction_view(prediction),
            }
        })
        .collect();

    DashboardOverview {
        greeting: greeting(user.user()),
        loading: snapshot.is_loading(),
        error: error_message(snapshot, "sensor data"),
        last_updated,
        last_updated_display: last_updated.as_ref().map(|ts| format_clock(ts, tz)),
        metrics,
        fan: fan.into(),
    }
}

pub async fn load(cache: &QueryCache, fan: FanStatus) -> DashboardOverview {
    let snapshot = cache.get(QueryKey::SensorSnapshot).await;
    let user = cache.get(QueryKey::CurrentUser).await;
    let predictions = [
        cache.get(QueryKey::Prediction(Metric::Temperature)).await,
        cache.get(QueryKey::Prediction(Metric::Humidity)).await,
        cache.get(QueryKey::Prediction(Metric::Light)).await,
    ];
    build(&snapshot, &predictions, &user, fan, &Local)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{client::ClientError, models::SensorSnapshot, query::QueryData};

    fn entry(data: QueryData) -> QueryEntry {
        QueryEntry {
            data: Some(data),
            ..Default::default()
        }
    }

    fn user(full_name: Option<&str>) -> User {
        User {
            id: Uuid::nil(),
            email: "jane.doe@example.com".into(),
            full_name: full_name.map(str::to_owned),
            is_active: true,
            coreiot_access_token: None,
        }
    }

    fn snapshot() -> QueryEntry {
        entry(QueryData::Snapshot(SensorSnapshot {
            temperature: Some(24.457),
            humidity: Some(61.0),
            light: Some(812.0),
            timestamp: Some(Utc.with_ymd_and_hms(2025, 5, 1, 7, 3, 0).unwrap()),
        }))
    }

    fn no_predictions() -> [QueryEntry; 3] {
        Default::default()
    }

    #[test]
    fn greeting_prefers_full_name() {
        assert_eq!(greeting(Some(&user(Some("Jane Doe")))), "Welcome, Jane Doe");
        assert_eq!(greeting(Some(&user(None))), "Welcome, jane.doe");
        assert_eq!(greeting(Some(&user(Some(" ")))), "Welcome, jane.doe");
        assert_eq!(greeting(None), "Welcome");
    }

    #[test]
    fn tiles_show_two_decimals_in_metric_order() {
        let view = build(
            &snapshot(),
            &no_predictions(),
            &QueryEntry::default(),
            FanStatus::default(),
            &Utc,
        );

        let displays: Vec<_> = view.metrics.iter().map(|t| t.display.as_deref()).collect();
        assert_eq!(displays, vec![Some("24.46"), Some("61.00"), Some("812.00")]);
        assert_eq!(view.metrics[2].unit, "lux");
        assert_eq!(view.last_updated_display.as_deref(), Some("07:03"));
        assert!(!view.loading);
    }

    #[test]
    fn each_prediction_has_its_own_state() {
        let mut failed = QueryEntry::default();
        failed.error = Some(ClientError::NotAuthenticated.to_string());
        failed.unauthenticated = true;
        let predictions = [
            entry(QueryData::Prediction(25.0)),
            QueryEntry::default(),
            failed,
        ];

        let view = build(
            &snapshot(),
            &predictions,
            &QueryEntry::default(),
            FanStatus::default(),
            &Utc,
        );

        let temp = &view.metrics[0].predicted;
        assert_eq!(temp.display.as_deref(), Some("25.00"));
        assert!(!temp.loading);

        assert!(view.metrics[1].predicted.loading);
        assert!(view.metrics[1].predicted.value.is_none());

        let light = &view.metrics[2].predicted;
        assert!(!light.loading);
        assert_eq!(light.error.as_deref(), Some("Not authenticated"));
    }

    #[test]
    fn fan_label_follows_status() {
        let view = build(
            &QueryEntry::default(),
            &no_predictions(),
            &QueryEntry::default(),
            FanStatus { on: true, pending: false },
            &Utc,
        );
        assert!(view.loading);
        assert!(view.fan.on);
        assert_eq!(view.fan.action_label, "Turn Fan Off");
    }

    #[tokio::test]
    async fn load_reads_from_cache() {
        let cache = QueryCache::new();
        let g = cache.begin_fetch(QueryKey::CurrentUser).await;
        cache
            .store_success(QueryKey::CurrentUser, g, QueryData::User(user(Some("Jane"))))
            .await;
        cache
            .store_success(QueryKey::Prediction(Metric::Humidity), g, QueryData::Prediction(55.5))
            .await;

        let view = load(&cache, FanStatus::default()).await;
        assert_eq!(view.greeting, "Welcome, Jane");
        assert!(view.loading);
        assert_eq!(view.metrics[1].predicted.value, Some(55.5));
    }
}
