use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error_message;
use crate::{
    models::Notification,
    query::{QueryCache, QueryEntry, QueryKey},
};

pub const ALL_CAUGHT_UP: &str = "You're all caught up!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTab {
    #[default]
    All,
    Unread,
    /// Messages that ask the user to do something.
    Action,
}

pub fn is_unread(n: &Notification) -> bool {
    !n.is_read
}

/// Case-insensitive match on "action" anywhere in the message.
pub fn requires_action(n: &Notification) -> bool {
    n.message.to_lowercase().contains("action")
}

/// Notifications shown under `tab`, in server order.
pub fn filter(list: &[Notification], tab: NotificationTab) -> Vec<&Notification> {
    list.iter()
        .filter(|n| match tab {
            NotificationTab::All => true,
            NotificationTab::Unread => is_unread(n),
            NotificationTab::Action => requires_action(n),
        })
        .collect()
}

/// `42s ago`, `5m ago`, `3h ago`, then the calendar date.
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - created_at).num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{s}s ago"),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        _ => created_at.with_timezone(&Local).format("%Y-%m-%d").to_string(),
    }
}

/// Remembers the unread count from the previous bell render so the bell can
/// ring when it grows.
#[derive(Clone, Default)]
pub struct BellTracker {
    last_unread: Arc<Mutex<Option<usize>>>,
}

impl BellTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `unread` and report whether it grew since the last call.
    /// The first observation never rings.
    pub fn observe(&self, unread: usize) -> bool {
        let mut last = self
            .last_unread
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let ring = matches!(*last, Some(prev) if unread > prev);
        *last = Some(unread);
        ring
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NotificationItem {
    pub id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub alarm_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub time_ago: String,
}

/// The notification bell and its popover.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NotificationBell {
    pub tab: NotificationTab,
    pub loading: bool,
    pub error: Option<String>,
    pub total: usize,
    pub unread_count: usize,
    pub action_count: usize,
    /// Unread count grew since the bell was last rendered.
    pub ring: bool,
    pub can_mark_all_read: bool,
    pub items: Vec<NotificationItem>,
    pub empty_message: Option<String>,
}

pub fn build(
    entry: &QueryEntry,
    tab: NotificationTab,
    now: DateTime<Utc>,
    tracker: &BellTracker,
) -> NotificationBell {
    let list = entry.notifications().unwrap_or_default();
    let unread_count = list.iter().filter(|n| is_unread(n)).count();
    let items: Vec<NotificationItem> = filter(list, tab)
        .into_iter()
        .map(|n| NotificationItem {
            id: n.id,
            message: n.message.clone(),
            is_read: n.is_read,
            alarm_id: n.alarm_id,
            created_at: n.created_at,
            time_ago: time_ago(n.created_at, now),
        })
        .collect();
    let loading = entry.is_loading();

    NotificationBell {
        tab,
        loading,
        error: error_message(entry, "notifications"),
        total: list.len(),
        unread_count,
        action_count: list.iter().filter(|n| requires_action(n)).count(),
        ring: entry.data.is_some() && tracker.observe(unread_count),
        can_mark_all_read: unread_count > 0,
        empty_message: (!loading && items.is_empty()).then(|| ALL_CAUGHT_UP.to_owned()),
        items,
    }
}

pub async fn load(cache: &QueryCache, tab: NotificationTab, tracker: &BellTracker) -> NotificationBell {
    let entry = cache.get(QueryKey::Notifications).await;
    build(&entry, tab, Utc::now(), tracker)
}

/// Ids of every unread notification, in server order.
pub fn unread_ids(entry: &QueryEntry) -> Vec<Uuid> {
    entry
        .notifications()
        .unwrap_or_default()
        .iter()
        .filter(|n| is_unread(n))
        .map(|n| n.id)
        .collect()
}
