use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::views::{account::AccountView, alarms::AlarmSettings, notifications::NotificationTab};

#[derive(Debug, Default, Deserialize)]
pub struct TabParams {
    #[serde(default)]
    pub tab: NotificationTab,
}

/// Result of an alarm mutation: confirmation text plus the refreshed table.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlarmActionDto {
    pub message: String,
    pub alarms: AlarmSettings,
}

/// Result of an account mutation.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountActionDto {
    pub message: String,
    pub account: AccountView,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SessionRequest {
    /// Bearer token for the smart-home API. Blank clears the session.
    pub access_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatus {
    pub authenticated: bool,
}
