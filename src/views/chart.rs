use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::format_clock;
use crate::models::{Metric, SensorReading};

pub const NO_DATA_NOTICE: &str = "No data available for the last 24 hours.";

/// Line-chart series for one metric over the last day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartView {
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
    pub points: Vec<ChartPoint>,
    /// Set when there is nothing to plot.
    pub empty_notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartPoint {
    /// `HH:MM` in the dashboard's local zone.
    pub label: String,
    pub value: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

pub fn title(metric: Metric) -> String {
    match metric {
        Metric::Light => "Light Level Over Last 24 Hours".to_owned(),
        other => format!("{} Over Last 24 Hours", other.label()),
    }
}

pub fn y_axis(metric: Metric) -> String {
    format!("{} ({})", metric.label(), metric.unit())
}

/// Build the series in server order; readings without a timestamp get an
/// empty label rather than being dropped.
pub fn build<Tz: TimeZone>(metric: Metric, readings: &[SensorReading], tz: &Tz) -> ChartView
where
    Tz::Offset: std::fmt::Display,
{
    let points: Vec<ChartPoint> = readings
        .iter()
        .map(|r| ChartPoint {
            label: r
                .timestamp
                .as_ref()
                .map(|ts| format_clock(ts, tz))
                .unwrap_or_default(),
            value: r.value,
            timestamp: r.timestamp,
        })
        .collect();

    ChartView {
        title: title(metric),
        x_axis: "Time".to_owned(),
        y_axis: y_axis(metric),
        empty_notice: points.is_empty().then(|| NO_DATA_NOTICE.to_owned()),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(hour: u32, minute: u32, value: f64) -> SensorReading {
        SensorReading {
            metric: Metric::Light,
            value,
            timestamp: Some(Utc.with_ymd_and_hms(2025, 5, 1, hour, minute, 0).unwrap()),
        }
    }

    #[test]
    fn labels_are_clock_times_in_order() {
        let readings = vec![reading(9, 0, 100.0), reading(9, 5, 120.0), reading(13, 45, 90.0)];
        let chart = build(Metric::Light, &readings, &Utc);

        let labels: Vec<&str> = chart.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["09:00", "09:05", "13:45"]);
        let values: Vec<f64> = chart.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![100.0, 120.0, 90.0]);
        assert!(chart.empty_notice.is_none());
    }

    #[test]
    fn empty_series_carries_notice() {
        let chart = build(Metric::Humidity, &[], &Utc);
        assert!(chart.points.is_empty());
        assert_eq!(chart.empty_notice.as_deref(), Some(NO_DATA_NOTICE));
    }

    #[test]
    fn titles_and_axes() {
        assert_eq!(title(Metric::Temperature), "Temperature Over Last 24 Hours");
        assert_eq!(title(Metric::Light), "Light Level Over Last 24 Hours");
        assert_eq!(y_axis(Metric::Temperature), "Temperature (°C)");
        assert_eq!(y_axis(Metric::Light), "Light (lux)");
    }
}
