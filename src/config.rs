use std::time::Duration;

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the smart-home REST API, without a trailing slash.
    pub api_base_url: String,
    /// Bearer token to start with. Can be replaced later through `/session`.
    pub access_token: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub intervals: PollIntervals,
}

/// Refetch intervals for the background pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    /// Live sensor snapshot.
    pub live: Duration,
    /// Daily history per metric.
    pub history: Duration,
    /// Predicted next value per metric.
    pub prediction: Duration,
    /// Alarms, notifications and the current user.
    pub lists: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            live: Duration::from_millis(1000),
            history: Duration::from_millis(5000),
            prediction: Duration::from_millis(5000),
            lists: Duration::from_millis(30_000),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_base_url: optional("API_BASE_URL", "http://localhost:8000")
                .trim_end_matches('/')
                .to_owned(),
            access_token: std::env::var("ACCESS_TOKEN")
                .ok()
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty()),
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "3000")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            intervals: PollIntervals {
                live: interval_ms("LIVE_POLL_INTERVAL_MS", "1000")?,
                history: interval_ms("HISTORY_POLL_INTERVAL_MS", "5000")?,
                prediction: interval_ms("PREDICTION_POLL_INTERVAL_MS", "5000")?,
                lists: interval_ms("LIST_POLL_INTERVAL_MS", "30000")?,
            },
        })
    }
}

fn interval_ms(key: &str, default: &str) -> Result<Duration> {
    parse_interval_ms(&optional(key, default))
        .with_context(|| format!("{key} must be a positive integer (milliseconds)"))
}

/// Parse a millisecond count. Zero is rejected: `tokio::time::interval` panics on it.
fn parse_interval_ms(raw: &str) -> Result<Duration> {
    let ms: u64 = raw.trim().parse()?;
    anyhow::ensure!(ms > 0, "interval must be greater than zero");
    Ok(Duration::from_millis(ms))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_interval_ms_accepts_positive() {
        assert_eq!(parse_interval_ms("1000").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_interval_ms(" 250 ").unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn parse_interval_ms_rejects_zero() {
        let err = parse_interval_ms("0").unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn parse_interval_ms_rejects_garbage() {
        assert!(parse_interval_ms("soon").is_err());
        assert!(parse_interval_ms("-5").is_err());
    }

    #[test]
    fn default_intervals_match_dashboard_cadence() {
        let d = PollIntervals::default();
        assert_eq!(d.live, Duration::from_secs(1));
        assert_eq!(d.history, Duration::from_secs(5));
        assert_eq!(d.prediction, Duration::from_secs(5));
        assert_eq!(d.lists, Duration::from_secs(30));
    }
}
