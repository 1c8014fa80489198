pub mod error;
pub mod models;

use std::sync::Arc;

use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    models::{
        Alarm, AlarmCreate, AlarmUpdate, Metric, Notification, ProfileUpdate, SensorReading,
        SensorSnapshot, User,
    },
    session::Session,
};

pub use self::error::{ClientError, Result};
use self::models::{CoreiotTokenUpdate, DailyRow, FanCommand, ListEnvelope, PredictionBody};

/// Authenticated client for the smart-home REST API.
///
/// Every call reads the bearer token from the shared [`Session`] at send
/// time. Without a token the call fails with [`ClientError::NotAuthenticated`]
/// and nothing goes out on the wire.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Session) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: Client::new(),
                base_url: base_url.trim_end_matches('/').to_owned(),
                session,
            }),
        }
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    // -----------------------------------------------------------------------
    // Sensors
    // -----------------------------------------------------------------------

    /// Latest temperature / humidity / light values.
    pub async fn sensor_snapshot(&self) -> Result<SensorSnapshot> {
        self.get_json("/api/v1/coreiot/coreiot-data").await
    }

    /// Readings for `metric` over the last day, oldest first.
    pub async fn daily_readings(&self, metric: Metric) -> Result<Vec<SensorReading>> {
        let path = format!("/api/v1/coreiot/daily-data?type={metric}");
        let rows: Vec<DailyRow> = self.get_json(&path).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_reading(metric))
            .collect())
    }

    /// Predicted next value for `metric` from the backend's model service.
    pub async fn predict_next(&self, metric: Metric) -> Result<f64> {
        let path = format!("/api/v1/coreiot/predict-next?type={metric}");
        let body: PredictionBody = self.get_json(&path).await?;
        Ok(body.value())
    }

    /// Ask the backend to switch the fan to `on`. Success only means the
    /// backend accepted the command, not that the device changed state.
    pub async fn control_fan(&self, on: bool) -> Result<()> {
        self.send(
            Method::POST,
            "/api/v1/coreiot/control-fan",
            Some(&FanCommand { state: on }),
        )
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Alarms
    // -----------------------------------------------------------------------

    pub async fn list_alarms(&self) -> Result<Vec<Alarm>> {
        let env: ListEnvelope<Alarm> = self.get_json("/api/v1/alarms").await?;
        Ok(env.data)
    }

    pub async fn get_alarm(&self, id: Uuid) -> Result<Alarm> {
        self.get_json(&format!("/api/v1/alarms/{id}")).await
    }

    pub async fn create_alarm(&self, body: &AlarmCreate) -> Result<Alarm> {
        self.send_json(Method::POST, "/api/v1/alarms", Some(body)).await
    }

    pub async fn update_alarm(&self, id: Uuid, body: &AlarmUpdate) -> Result<Alarm> {
        self.send_json(Method::PATCH, &format!("/api/v1/alarms/{id}"), Some(body))
            .await
    }

    pub async fn delete_alarm(&self, id: Uuid) -> Result<()> {
        self.send::<()>(Method::DELETE, &format!("/api/v1/alarms/{id}"), None)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    pub async fn list_notifications(&self) -> Result<Vec<Notification>> {
        let env: ListEnvelope<Notification> = self.get_json("/api/v1/notifications").await?;
        Ok(env.data)
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> Result<Notification> {
        self.send_json::<(), _>(
            Method::POST,
            &format!("/api/v1/notifications/{id}/read"),
            None,
        )
        .await
    }

    pub async fn delete_notification(&self, id: Uuid) -> Result<()> {
        self.send::<()>(Method::DELETE, &format!("/api/v1/notifications/{id}"), None)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Account
    // -----------------------------------------------------------------------

    pub async fn current_user(&self) -> Result<User> {
        self.get_json("/api/v1/users/me").await
    }

    pub async fn update_profile(&self, body: &ProfileUpdate) -> Result<User> {
        self.send_json(Method::PATCH, "/api/v1/users/me", Some(body))
            .await
    }

    pub async fn update_coreiot_token(&self, token: &str) -> Result<User> {
        self.send_json(
            Method::PATCH,
            "/api/v1/users/me/coreiot-token",
            Some(&CoreiotTokenUpdate {
                coreiot_access_token: token,
            }),
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json::<(), T>(Method::GET, path, None).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let bytes = self.send(method, path, body).await?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
            path: path.to_owned(),
            source,
        })
    }

    /// Send one request and return the raw body of a 2xx response.
    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Vec<u8>> {
        let token = self
            .inner
            .session
            .token()
            .await
            .ok_or(ClientError::NotAuthenticated)?;

        let url = format!("{}{}", self.inner.base_url, path);
        debug!(method = %method, url = %url, "Calling smart-home API");

        let mut request = self
            .inner
            .http
            .request(method.clone(), &url)
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let transport = |source| ClientError::Transport {
            path: path.to_owned(),
            source,
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport)?;

        debug!(method = %method, url = %url, status = status.as_u16(), bytes = bytes.len(), "Smart-home API responded");

        if !status.is_success() {
            return Err(ClientError::Status {
                method: method.to_string(),
                path: path.to_owned(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
