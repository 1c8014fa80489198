use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{utc_timestamp, Metric, SensorReading};

// ---------------------------------------------------------------------------
// List envelope
//
// Collection endpoints wrap their rows:
//   { "data": [ ... ], "count": 3 }
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub count: Option<usize>,
}

// ---------------------------------------------------------------------------
// Daily history: GET /api/v1/coreiot/daily-data?type=<metric>
//
// Rows are whole stored snapshots ordered by timestamp ascending. Newer
// backends also send a pre-selected `value`; it wins when present.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DailyRow {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub light: Option<f64>,
    #[serde(with = "utc_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl DailyRow {
    /// Select this row's value for `metric`, or `None` if the row lacks it.
    pub fn into_reading(self, metric: Metric) -> Option<SensorReading> {
        let value = self.value.or(match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::Light => self.light,
        })?;
        Some(SensorReading {
            metric,
            value,
            timestamp: Some(self.timestamp),
        })
    }
}

// ---------------------------------------------------------------------------
// Prediction: GET /api/v1/coreiot/predict-next?type=<metric>
//
// The model service is opaque: it answers either with a bare number or with
// an object carrying a single scalar under one of a few names.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PredictionBody {
    Scalar(f64),
    Wrapped {
        #[serde(alias = "prediction", alias = "predicted_value", alias = "value")]
        predicted: f64,
    },
}

impl PredictionBody {
    pub fn value(&self) -> f64 {
        match self {
            PredictionBody::Scalar(v) => *v,
            PredictionBody::Wrapped { predicted } => *predicted,
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Body of `POST /api/v1/coreiot/control-fan`.
#[derive(Debug, Serialize)]
pub struct FanCommand {
    /// Target state; `true` switches the fan on.
    pub state: bool,
}

/// Body of `PATCH /api/v1/users/me/coreiot-token`.
#[derive(Debug, Serialize)]
pub struct CoreiotTokenUpdate<'a> {
    pub coreiot_access_token: &'a str,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn daily_row_selects_requested_metric() {
        let row: DailyRow = serde_json::from_value(json!({
            "id": "9d6a1c1e-0000-4000-8000-000000000001",
            "temperature": 21.5,
            "humidity": 48.0,
            "timestamp": "2025-05-01T08:30:00"
        }))
        .unwrap();

        let reading = row.into_reading(Metric::Humidity).unwrap();
        assert_eq!(reading.value, 48.0);
        assert_eq!(reading.metric, Metric::Humidity);
    }

    #[test]
    fn daily_row_prefers_explicit_value() {
        let row: DailyRow = serde_json::from_value(json!({
            "value": 812.0,
            "temperature": 21.5,
            "timestamp": "2025-05-01T08:30:00Z"
        }))
        .unwrap();
        assert_eq!(row.into_reading(Metric::Light).unwrap().value, 812.0);
    }

    #[test]
    fn daily_row_without_metric_is_skipped() {
        let row: DailyRow = serde_json::from_value(json!({
            "temperature": 21.5,
            "timestamp": "2025-05-01T08:30:00"
        }))
        .unwrap();
        assert!(row.into_reading(Metric::Light).is_none());
    }

    #[test]
    fn prediction_accepts_scalar_and_object() {
        let bare: PredictionBody = serde_json::from_value(json!(23.4)).unwrap();
        assert_eq!(bare.value(), 23.4);

        let wrapped: PredictionBody =
            serde_json::from_value(json!({ "predicted_value": 55.1 })).unwrap();
        assert_eq!(wrapped.value(), 55.1);

        let named: PredictionBody = serde_json::from_value(json!({ "prediction": 7.0 })).unwrap();
        assert_eq!(named.value(), 7.0);
    }

    #[test]
    fn list_envelope_count_is_optional() {
        let env: ListEnvelope<u32> = serde_json::from_value(json!({ "data": [1, 2] })).unwrap();
        assert_eq!(env.data, vec![1, 2]);
        assert!(env.count.is_none());
    }
}
