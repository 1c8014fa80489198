//! Polling queries and the cache that backs every dashboard view.

pub mod cache;
pub mod client;

use std::{fmt, time::Duration};

use crate::{
    config::PollIntervals,
    models::{Alarm, Metric, Notification, SensorReading, SensorSnapshot, User},
};

pub use self::{
    cache::{Generation, QueryCache, QueryEntry},
    client::{PollHandle, QueryClient},
};

/// Identifies one cached GET endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    SensorSnapshot,
    DailyReadings(Metric),
    Prediction(Metric),
    Alarms,
    Notifications,
    CurrentUser,
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::SensorSnapshot => f.write_str("coreiot-data"),
            QueryKey::DailyReadings(m) => write!(f, "daily-data/{m}"),
            QueryKey::Prediction(m) => write!(f, "predict-next/{m}"),
            QueryKey::Alarms => f.write_str("alarms"),
            QueryKey::Notifications => f.write_str("notifications"),
            QueryKey::CurrentUser => f.write_str("current-user"),
        }
    }
}

/// Payload of a successful query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Snapshot(SensorSnapshot),
    Readings(Vec<SensorReading>),
    Prediction(f64),
    Alarms(Vec<Alarm>),
    Notifications(Vec<Notification>),
    User(User),
}

/// Every query the dashboard keeps live, with its refetch interval.
pub fn dashboard_queries(intervals: &PollIntervals) -> Vec<(QueryKey, Duration)> {
    let mut queries = vec![(QueryKey::SensorSnapshot, intervals.live)];
    for metric in Metric::ALL {
        queries.push((QueryKey::DailyReadings(metric), intervals.history));
        queries.push((QueryKey::Prediction(metric), intervals.prediction));
    }
    queries.extend([
        (QueryKey::Alarms, intervals.lists),
        (QueryKey::Notifications, intervals.lists),
        (QueryKey::CurrentUser, intervals.lists),
    ]);
    queries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_display_like_endpoint_names() {
        assert_eq!(QueryKey::SensorSnapshot.to_string(), "coreiot-data");
        assert_eq!(
            QueryKey::DailyReadings(Metric::Light).to_string(),
            "daily-data/light"
        );
        assert_eq!(
            QueryKey::Prediction(Metric::Humidity).to_string(),
            "predict-next/humidity"
        );
    }

    #[test]
    fn dashboard_queries_cover_every_metric_once() {
        let intervals = PollIntervals::default();
        let queries = dashboard_queries(&intervals);
        assert_eq!(queries.len(), 10);

        let live: Vec<_> = queries
            .iter()
            .filter(|(_, every)| *every == intervals.live)
            .collect();
        assert_eq!(live, vec![&(QueryKey::SensorSnapshot, intervals.live)]);

        for metric in Metric::ALL {
            assert!(queries.contains(&(QueryKey::DailyReadings(metric), intervals.history)));
            assert!(queries.contains(&(QueryKey::Prediction(metric), intervals.prediction)));
        }
    }
}
