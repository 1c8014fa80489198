use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{
    chart::{self, ChartView},
    error_message, format_clock, format_measurement,
};
use crate::{
    models::Metric,
    query::{QueryCache, QueryEntry, QueryKey},
};

/// Lowest and highest value of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
}

/// Min/max over the finite values, or `None` for an empty series.
pub fn series_stats(values: impl IntoIterator<Item = f64>) -> Option<SeriesStats> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| {
            Some(match acc {
                None => SeriesStats { min: v, max: v },
                Some(s) => SeriesStats {
                    min: s.min.min(v),
                    max: s.max.max(v),
                },
            })
        })
}

/// Per-metric detail page: live value, daily chart and statistics.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MetricPage {
    pub metric: Metric,
    pub title: String,
    pub unit: String,
    pub loading: bool,
    pub error: Option<String>,
    pub current_value: Option<f64>,
    /// e.g. `24.50°C`; `None` while there is no reading.
    pub current_display: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    /// `HH:MM` local time of `last_updated`.
    pub last_updated_display: Option<String>,
    /// Highest value of the day; 0 when the series is empty.
    pub highest: f64,
    /// Lowest value of the day; 0 when the series is empty.
    pub lowest: f64,
    pub predicted: Option<f64>,
    pub history_error: Option<String>,
    pub chart: ChartView,
}

pub fn build<Tz: TimeZone>(
    metric: Metric,
    snapshot: &QueryEntry,
    daily: &QueryEntry,
    prediction: &QueryEntry,
    tz: &Tz,
) -> MetricPage
where
    Tz::Offset: std::fmt::Display,
{
    let reading = snapshot.snapshot().and_then(|s| s.reading(metric));
    let readings = daily.readings().unwrap_or_default();
    let stats = series_stats(readings.iter().map(|r| r.value));
    let last_updated = reading.as_ref().and_then(|r| r.timestamp);

    MetricPage {
        metric,
        title: match metric {
            Metric::Light => "Light Level Details".to_owned(),
            other => format!("{} Details", other.label()),
        },
        unit: metric.unit().to_owned(),
        loading: snapshot.is_loading() || daily.is_loading(),
        error: error_message(snapshot, "sensor data"),
        current_value: reading.as_ref().map(|r| r.value),
        current_display: reading.as_ref().map(|r| format_measurement(metric, r.value)),
        last_updated,
        last_updated_display: last_updated.as_ref().map(|ts| format_clock(ts, tz)),
        highest: stats.map_or(0.0, |s| s.max),
        lowest: stats.map_or(0.0, |s| s.min),
        predicted: prediction.prediction(),
        history_error: error_message(daily, "history"),
        chart: chart::build(metric, readings, tz),
    }
}

pub async fn load(cache: &QueryCache, metric: Metric) -> MetricPage {
    let snapshot = cache.get(QueryKey::SensorSnapshot).await;
    let daily = cache.get(QueryKey::DailyReadings(metric)).await;
    let prediction = cache.get(QueryKey::Prediction(metric)).await;
    build(metric, &snapshot, &daily, &prediction, &Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{SensorReading, SensorSnapshot},
        query::QueryData,
    };

    fn entry(data: QueryData) -> QueryEntry {
        QueryEntry {
            data: Some(data),
            ..Default::default()
        }
    }

    fn daily(values: &[f64]) -> QueryEntry {
        let readings = values
            .iter()
            .enumerate()
            .map(|(i, v)| SensorReading {
                metric: Metric::Temperature,
                value: *v,
                timestamp: Some(Utc.with_ymd_and_hms(2025, 5, 1, 8, i as u32, 0).unwrap()),
            })
            .collect();
        entry(QueryData::Readings(readings))
    }

    fn snapshot(temperature: f64) -> QueryEntry {
        entry(QueryData::Snapshot(SensorSnapshot {
            temperature: Some(temperature),
            humidity: Some(50.0),
            light: None,
            timestamp: Some(Utc.with_ymd_and_hms(2025, 5, 1, 9, 15, 0).unwrap()),
        }))
    }

    #[test]
    fn stats_over_series() {
        let s = series_stats([22.0, 19.5, 26.0, 21.0]).unwrap();
        assert_eq!(s.min, 19.5);
        assert_eq!(s.max, 26.0);
    }

    #[test]
    fn stats_single_value() {
        let s = series_stats([3.0]).unwrap();
        assert_eq!((s.min, s.max), (3.0, 3.0));
    }

    #[test]
    fn stats_empty_and_non_finite() {
        assert!(series_stats(Vec::<f64>::new()).is_none());
        assert!(series_stats([f64::NAN]).is_none());
        let s = series_stats([f64::NAN, -4.0, f64::INFINITY, 2.0]).unwrap();
        assert_eq!((s.min, s.max), (-4.0, 2.0));
    }

    #[test]
    fn page_combines_live_value_and_daily_stats() {
        let page = build(
            Metric::Temperature,
            &snapshot(24.5),
            &daily(&[22.0, 19.0, 26.0]),
            &entry(QueryData::Prediction(25.1)),
            &Utc,
        );

        assert_eq!(page.title, "Temperature Details");
        assert_eq!(page.current_display.as_deref(), Some("24.50°C"));
        assert_eq!(page.last_updated_display.as_deref(), Some("09:15"));
        assert_eq!(page.highest, 26.0);
        assert_eq!(page.lowest, 19.0);
        assert_eq!(page.predicted, Some(25.1));
        assert_eq!(page.chart.points.len(), 3);
        assert!(!page.loading);
        assert!(page.error.is_none());
    }

    #[test]
    fn empty_history_reports_zero_extremes() {
        let page = build(
            Metric::Temperature,
            &snapshot(20.0),
            &daily(&[]),
            &QueryEntry::default(),
            &Utc,
        );
        assert_eq!(page.highest, 0.0);
        assert_eq!(page.lowest, 0.0);
        assert!(page.chart.empty_notice.is_some());
        assert!(page.predicted.is_none());
    }

    #[test]
    fn missing_metric_in_snapshot_has_no_current_value() {
        let page = build(
            Metric::Light,
            &snapshot(20.0),
            &daily(&[]),
            &QueryEntry::default(),
            &Utc,
        );
        assert_eq!(page.title, "Light Level Details");
        assert!(page.current_value.is_none());
        assert!(page.current_display.is_none());
    }

    #[test]
    fn nothing_fetched_yet_is_loading() {
        let empty = QueryEntry::default();
        let page = build(Metric::Humidity, &empty, &empty, &empty, &Utc);
        assert!(page.loading);
        assert!(page.error.is_none());
    }
}
