use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::client::{ApiClient, ClientError};

/// Local view of the fan toggle.
///
/// `on` reflects the last command the backend accepted. The device itself is
/// never queried, so this can drift from the real fan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FanStatus {
    pub on: bool,
    /// A toggle request is in flight.
    pub pending: bool,
}

impl FanStatus {
    /// Caption for the toggle button.
    pub fn action_label(&self) -> &'static str {
        match (self.pending, self.on) {
            (true, _) => "Processing...",
            (false, true) => "Turn Fan Off",
            (false, false) => "Turn Fan On",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FanError {
    #[error("a fan command is already in progress")]
    Busy,

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Clone)]
pub struct FanController {
    api: ApiClient,
    status: Arc<Mutex<FanStatus>>,
}

impl FanController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            status: Arc::default(),
        }
    }

    pub fn status(&self) -> FanStatus {
        *lock(&self.status)
    }

    /// Ask the backend for the opposite of the current state. The local
    /// state flips only if the backend accepts the command.
    pub async fn toggle(&self) -> Result<FanStatus, FanError> {
        let target = {
            let mut status = lock(&self.status);
            if status.pending {
                return Err(FanError::Busy);
            }
            status.pending = true;
            !status.on
        };
        // Clears `pending` even if this future is dropped mid-request.
        let pending = PendingGuard(&self.status);

        info!(target_on = target, "Sending fan command");
        match self.api.control_fan(target).await {
            Ok(()) => {
                lock(&self.status).on = target;
                info!(on = target, "Fan command accepted");
            }
            Err(e) => {
                warn!(target_on = target, error = %e, "Fan command failed");
                return Err(e.into());
            }
        }
        drop(pending);
        Ok(self.status())
    }
}

struct PendingGuard<'a>(&'a Mutex<FanStatus>);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(self.0).pending = false;
    }
}

fn lock(status: &Mutex<FanStatus>) -> MutexGuard<'_, FanStatus> {
    status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
