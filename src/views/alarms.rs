use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{error_message, FormError};
use crate::{
    models::{Alarm, AlarmCreate, AlarmUpdate, Metric, ThresholdType},
    query::{QueryCache, QueryEntry, QueryKey},
};

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// Alarm form as submitted by the browser. `value` is kept as typed text
/// until validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlarmForm {
    #[serde(rename = "type", default = "default_metric")]
    pub metric: Metric,
    #[serde(default = "default_threshold")]
    pub threshold_type: ThresholdType,
    #[serde(default, deserialize_with = "text_or_number")]
    pub value: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Default for AlarmForm {
    fn default() -> Self {
        Self {
            metric: default_metric(),
            threshold_type: default_threshold(),
            value: String::new(),
            is_active: default_active(),
        }
    }
}

/// What a valid form turns into: a create for a new alarm, a partial update
/// for one being edited.
#[derive(Debug, Clone, PartialEq)]
pub enum AlarmSubmission {
    Create(AlarmCreate),
    Update { id: Uuid, body: AlarmUpdate },
}

impl AlarmSubmission {
    pub fn method(&self) -> &'static str {
        match self {
            AlarmSubmission::Create(_) => "POST",
            AlarmSubmission::Update { .. } => "PATCH",
        }
    }

    /// Confirmation shown after the backend accepts the submission.
    pub fn success_message(&self) -> &'static str {
        match self {
            AlarmSubmission::Create(_) => "Alarm created!",
            AlarmSubmission::Update { .. } => "Alarm updated!",
        }
    }
}

impl AlarmForm {
    /// Prefill the form from an existing alarm, as when pressing "edit".
    pub fn from_alarm(alarm: &Alarm) -> Self {
        Self {
            metric: alarm.metric,
            threshold_type: alarm.threshold_type,
            value: alarm.value.to_string(),
            is_active: alarm.is_active,
        }
    }

    /// The threshold value: required, and must parse as a finite number.
    pub fn parse_value(&self) -> Result<f64, FormError> {
        let raw = self.value.trim();
        if raw.is_empty() {
            return Err(FormError::ValueRequired);
        }
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(FormError::ValueNotNumeric)
    }

    /// Validate and turn the form into the request the backend expects.
    /// `editing` is the id of the alarm being edited, if any.
    pub fn submission(&self, editing: Option<Uuid>) -> Result<AlarmSubmission, FormError> {
        let value = self.parse_value()?;
        Ok(match editing {
            None => AlarmSubmission::Create(AlarmCreate {
                metric: self.metric,
                threshold_type: self.threshold_type,
                value,
                is_active: self.is_active,
            }),
            Some(id) => AlarmSubmission::Update {
                id,
                body: AlarmUpdate {
                    metric: Some(self.metric),
                    threshold_type: Some(self.threshold_type),
                    value: Some(value),
                    is_active: Some(self.is_active),
                },
            },
        })
    }
}

fn default_metric() -> Metric {
    Metric::Temperature
}

fn default_threshold() -> ThresholdType {
    ThresholdType::Above
}

fn default_active() -> bool {
    true
}

/// Number inputs may arrive as JSON strings or numbers.
fn text_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
        Null(()),
    }

    Ok(match Raw::deserialize(d)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AlarmRow {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub metric: Metric,
    pub type_label: String,
    pub threshold_type: ThresholdType,
    pub threshold_label: String,
    pub value: f64,
    pub is_active: bool,
    pub status_label: String,
    /// Form prefilled for editing this alarm.
    pub edit_form: AlarmForm,
}

impl From<&Alarm> for AlarmRow {
    fn from(a: &Alarm) -> Self {
        Self {
            id: a.id,
            metric: a.metric,
            type_label: a.metric.label().to_owned(),
            threshold_type: a.threshold_type,
            threshold_label: capitalize(a.threshold_type.as_str()),
            value: a.value,
            is_active: a.is_active,
            status_label: if a.is_active { "Active" } else { "Inactive" }.to_owned(),
            edit_form: AlarmForm::from_alarm(a),
        }
    }
}

/// Alarm settings panel: the table plus a blank form for new alarms.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AlarmSettings {
    pub loading: bool,
    pub error: Option<String>,
    pub rows: Vec<AlarmRow>,
    pub new_form: AlarmForm,
}

pub fn build(entry: &QueryEntry) -> AlarmSettings {
    AlarmSettings {
        loading: entry.is_loading(),
        error: error_message(entry, "alarms"),
        rows: entry
            .alarms()
            .unwrap_or_default()
            .iter()
            .map(AlarmRow::from)
            .collect(),
        new_form: AlarmForm::default(),
    }
}

pub async fn load(cache: &QueryCache) -> AlarmSettings {
    build(&cache.get(QueryKey::Alarms).await)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
