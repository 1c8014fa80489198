//! View models: what each dashboard widget shows, computed from the query cache.
//!
//! Builders are plain functions over cache entries so they can be tested
//! without a network; the `load` helpers read the entries they need.

pub mod account;
pub mod alarms;
pub mod chart;
pub mod metric;
pub mod notifications;
pub mod overview;

use chrono::{DateTime, TimeZone, Utc};

use crate::{models::Metric, query::QueryEntry};

/// Validation failures for dashboard forms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Value is required")]
    ValueRequired,

    #[error("Value must be a number")]
    ValueNotNumeric,

    #[error("Email is required")]
    EmailRequired,

    #[error("Invalid email address")]
    EmailInvalid,

    #[error("Full name must be at most {max} characters")]
    FullNameTooLong { max: usize },

    #[error("Nothing to save")]
    Unchanged,
}

/// Inline error text for a widget whose query failed.
pub(crate) fn error_message(entry: &QueryEntry, what: &str) -> Option<String> {
    entry.error.as_ref().map(|_| {
        if entry.unauthenticated {
            "Not authenticated".to_owned()
        } else {
            format!("Error loading {what}")
        }
    })
}

/// `24.50°C`, `55.00%`, `812.00 lux`.
pub(crate) fn format_measurement(metric: Metric, value: f64) -> String {
    match metric {
        Metric::Light => format!("{value:.2} {}", metric.unit()),
        _ => format!("{value:.2}{}", metric.unit()),
    }
}

/// 24-hour `HH:MM` in the given zone.
pub(crate) fn format_clock<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.with_timezone(tz).format("%H:%M").to_string()
}
