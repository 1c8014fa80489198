use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

use super::{
    dto::{AccountActionDto, AlarmActionDto, SessionRequest, SessionStatus, TabParams},
    errors::AppError,
    AppState,
};
use crate::{
    control::FanStatus,
    models::{Metric, ThresholdType},
    query::QueryKey,
    views::{
        self,
        account::{AccountView, ProfileForm, TokenForm, TOKEN_SAVED, TOKEN_SAVE_FAILED},
        alarms::{AlarmForm, AlarmRow, AlarmSettings, AlarmSubmission},
        chart::{ChartPoint, ChartView},
        metric::MetricPage,
        notifications::{NotificationBell, NotificationItem, NotificationTab},
        overview::{DashboardOverview, FanView, MetricTile, PredictionView},
    },
};

const ALARM_SAVE_FAILED: &str = "Error saving alarm";

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Overview page: live values, predictions, greeting and fan state.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard overview", body = DashboardOverview),
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardOverview> {
    Json(views::overview::load(state.cache(), state.fan.status()).await)
}

/// Detail page for one metric: current value, daily chart and extremes.
#[utoipa::path(
    get,
    path = "/dashboard/{metric}",
    params(
        ("metric" = Metric, Path, description = "temperature, humidity or light"),
    ),
    responses(
        (status = 200, description = "Metric detail page", body = MetricPage),
        (status = 400, description = "Unknown metric"),
    ),
    tag = "dashboard"
)]
pub async fn get_metric_page(
    State(state): State<AppState>,
    metric: Result<Path<Metric>, PathRejection>,
) -> Result<Json<MetricPage>, AppError> {
    let Path(metric) = metric?;
    Ok(Json(views::metric::load(state.cache(), metric).await))
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

async fn bell(state: &AppState, tab: NotificationTab) -> NotificationBell {
    views::notifications::load(state.cache(), tab, &state.bell).await
}

/// Notification bell contents for the selected tab.
#[utoipa::path(
    get,
    path = "/notifications",
    params(
        ("tab" = Option<NotificationTab>, Query, description = "all (default), unread or action"),
    ),
    responses(
        (status = 200, description = "Notification bell", body = NotificationBell),
    ),
    tag = "notifications"
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    params: Result<Query<TabParams>, QueryRejection>,
) -> Result<Json<NotificationBell>, AppError> {
    let Query(params) = params?;
    Ok(Json(bell(&state, params.tab).await))
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Refreshed notification bell", body = NotificationBell),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Upstream API failed"),
    ),
    tag = "notifications"
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<TabParams>, QueryRejection>,
) -> Result<Json<NotificationBell>, AppError> {
    let (Path(id), Query(params)) = (id?, params?);
    state.queries.api().mark_notification_read(id).await?;
    state.queries.refetch(QueryKey::Notifications).await;
    Ok(Json(bell(&state, params.tab).await))
}

/// Mark every unread notification as read, one request at a time.
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    responses(
        (status = 200, description = "Refreshed notification bell", body = NotificationBell),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Upstream API failed"),
    ),
    tag = "notifications"
)]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    params: Result<Query<TabParams>, QueryRejection>,
) -> Result<Json<NotificationBell>, AppError> {
    let Query(params) = params?;
    let entry = state.cache().get(QueryKey::Notifications).await;
    let ids = views::notifications::unread_ids(&entry);
    info!(count = ids.len(), "Marking all notifications read");

    for id in ids {
        if let Err(e) = state.queries.api().mark_notification_read(id).await {
            state.queries.refetch(QueryKey::Notifications).await;
            return Err(e.into());
        }
    }
    state.queries.refetch(QueryKey::Notifications).await;
    Ok(Json(bell(&state, params.tab).await))
}

#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Refreshed notification bell", body = NotificationBell),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Upstream API failed"),
    ),
    tag = "notifications"
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<TabParams>, QueryRejection>,
) -> Result<Json<NotificationBell>, AppError> {
    let (Path(id), Query(params)) = (id?, params?);
    state.queries.api().delete_notification(id).await?;
    state.queries.refetch(QueryKey::Notifications).await;
    Ok(Json(bell(&state, params.tab).await))
}

// ---------------------------------------------------------------------------
// Alarms
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/alarms",
    responses(
        (status = 200, description = "Alarm table", body = AlarmSettings),
    ),
    tag = "alarms"
)]
pub async fn get_alarms(State(state): State<AppState>) -> Json<AlarmSettings> {
    Json(views::alarms::load(state.cache()).await)
}

async fn submit_alarm(state: &AppState, submission: AlarmSubmission) -> Result<AlarmActionDto, AppError> {
    let message = submission.success_message();
    let result = match &submission {
        AlarmSubmission::Create(body) => state.queries.api().create_alarm(body).await,
        AlarmSubmission::Update { id, body } => state.queries.api().update_alarm(*id, body).await,
    };
    let alarm = result.map_err(|e| AppError::from(e).with_message(ALARM_SAVE_FAILED))?;
    info!(alarm_id = %alarm.id, method = submission.method(), "Alarm saved");

    state.queries.refetch(QueryKey::Alarms).await;
    Ok(AlarmActionDto {
        message: message.to_owned(),
        alarms: views::alarms::load(state.cache()).await,
    })
}

/// Validate the form and create a new alarm.
#[utoipa::path(
    post,
    path = "/alarms",
    request_body = AlarmForm,
    responses(
        (status = 201, description = "Alarm created", body = AlarmActionDto),
        (status = 401, description = "Not authenticated"),
        (status = 422, description = "Invalid form"),
        (status = 502, description = "Upstream API failed"),
    ),
    tag = "alarms"
)]
pub async fn create_alarm(
    State(state): State<AppState>,
    form: Result<Json<AlarmForm>, JsonRejection>,
) -> Result<(StatusCode, Json<AlarmActionDto>), AppError> {
    let Json(form) = form?;
    let submission = form.submission(None)?;
    let dto = submit_alarm(&state, submission).await?;
    Ok((StatusCode::CREATED, Json(dto)))
}

/// Validate the form and update an existing alarm.
#[utoipa::path(
    put,
    path = "/alarms/{id}",
    params(("id" = Uuid, Path, description = "Alarm id")),
    request_body = AlarmForm,
    responses(
        (status = 200, description = "Alarm updated", body = AlarmActionDto),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such alarm"),
        (status = 422, description = "Invalid form"),
        (status = 502, description = "Upstream API failed"),
    ),
    tag = "alarms"
)]
pub async fn update_alarm(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    form: Result<Json<AlarmForm>, JsonRejection>,
) -> Result<Json<AlarmActionDto>, AppError> {
    let (Path(id), Json(form)) = (id?, form?);
    let submission = form.submission(Some(id))?;
    Ok(Json(submit_alarm(&state, submission).await?))
}

#[utoipa::path(
    delete,
    path = "/alarms/{id}",
    params(("id" = Uuid, Path, description = "Alarm id")),
    responses(
        (status = 200, description = "Alarm deleted", body = AlarmActionDto),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such alarm"),
        (status = 502, description = "Upstream API failed"),
    ),
    tag = "alarms"
)]
pub async fn delete_alarm(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AlarmActionDto>, AppError> {
    let Path(id) = id?;
    state.queries.api().delete_alarm(id).await?;
    info!(alarm_id = %id, "Alarm deleted");
    state.queries.refetch(QueryKey::Alarms).await;
    Ok(Json(AlarmActionDto {
        message: "Alarm deleted".to_owned(),
        alarms: views::alarms::load(state.cache()).await,
    }))
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/account",
    responses(
        (status = 200, description = "Account page", body = AccountView),
    ),
    tag = "account"
)]
pub async fn get_account(State(state): State<AppState>) -> Json<AccountView> {
    Json(views::account::load(state.cache()).await)
}

/// Save profile changes; only changed fields are sent upstream.
#[utoipa::path(
    put,
    path = "/account/profile",
    request_body = ProfileForm,
    responses(
        (status = 200, description = "Profile saved", body = AccountActionDto),
        (status = 401, description = "Not authenticated"),
        (status = 422, description = "Invalid or unchanged form"),
        (status = 502, description = "Upstream API failed"),
    ),
    tag = "account"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    form: Result<Json<ProfileForm>, JsonRejection>,
) -> Result<Json<AccountActionDto>, AppError> {
    let Json(form) = form?;
    let current = state.cache().get(QueryKey::CurrentUser).await;
    let update = form.validate(current.user())?;
    state.queries.api().update_profile(&update).await?;
    state.queries.refetch(QueryKey::CurrentUser).await;

    Ok(Json(AccountActionDto {
        message: "User updated successfully.".to_owned(),
        account: views::account::load(state.cache()).await,
    }))
}

#[utoipa::path(
    put,
    path = "/account/coreiot-token",
    request_body = TokenForm,
    responses(
        (status = 200, description = "Token saved", body = AccountActionDto),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Failed to save token"),
    ),
    tag = "account"
)]
pub async fn update_coreiot_token(
    State(state): State<AppState>,
    form: Result<Json<TokenForm>, JsonRejection>,
) -> Result<Json<AccountActionDto>, AppError> {
    let Json(form) = form?;
    state
        .queries
        .api()
        .update_coreiot_token(form.coreiot_access_token.trim())
        .await
        .map_err(|e| AppError::from(e).with_message(TOKEN_SAVE_FAILED))?;
    state.queries.refetch(QueryKey::CurrentUser).await;

    Ok(Json(AccountActionDto {
        message: TOKEN_SAVED.to_owned(),
        account: views::account::load(state.cache()).await,
    }))
}

// ---------------------------------------------------------------------------
// Fan
// ---------------------------------------------------------------------------

/// Send the opposite of the last accepted fan state.
#[utoipa::path(
    post,
    path = "/fan/toggle",
    responses(
        (status = 200, description = "Command accepted", body = FanView),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "A fan command is already in progress"),
        (status = 502, description = "Upstream API failed"),
    ),
    tag = "fan"
)]
pub async fn toggle_fan(State(state): State<AppState>) -> Result<Json<FanView>, AppError> {
    let status = state.fan.toggle().await?;
    Ok(Json(status.into()))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Store the bearer token used for every upstream call and refresh the lists
/// that otherwise wait for their next poll.
#[utoipa::path(
    post,
    path = "/session",
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Session state", body = SessionStatus),
        (status = 422, description = "Malformed request body"),
    ),
    tag = "session"
)]
pub async fn start_session(
    State(state): State<AppState>,
    req: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<SessionStatus>, AppError> {
    let Json(req) = req?;
    state.session.set(&req.access_token).await;
    let authenticated = state.session.is_authenticated().await;
    info!(authenticated, "Session updated");

    if authenticated {
        let queries = state.queries.clone();
        tokio::spawn(async move {
            for key in [QueryKey::CurrentUser, QueryKey::Alarms, QueryKey::Notifications] {
                queries.refetch(key).await;
            }
        });
    }
    Ok(Json(SessionStatus { authenticated }))
}

/// Log out: forget the token and every cached result.
#[utoipa::path(
    delete,
    path = "/session",
    responses(
        (status = 200, description = "Session cleared", body = SessionStatus),
    ),
    tag = "session"
)]
pub async fn end_session(State(state): State<AppState>) -> Json<SessionStatus> {
    state.session.clear().await;
    state.cache().clear().await;
    info!("Session cleared");
    Json(SessionStatus {
        authenticated: false,
    })
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        get_dashboard,
        get_metric_page,
        get_notifications,
        mark_notification_read,
        mark_all_notifications_read,
        delete_notification,
        get_alarms,
        create_alarm,
        update_alarm,
        delete_alarm,
        get_account,
        update_profile,
        update_coreiot_token,
        toggle_fan,
        start_session,
        end_session,
        health,
    ),
    components(schemas(
        Metric,
        ThresholdType,
        DashboardOverview,
        MetricTile,
        PredictionView,
        FanView,
        FanStatus,
        MetricPage,
        ChartView,
        ChartPoint,
        NotificationTab,
        NotificationBell,
        NotificationItem,
        AlarmForm,
        AlarmRow,
        AlarmSettings,
        AlarmActionDto,
        ProfileForm,
        TokenForm,
        AccountView,
        AccountActionDto,
        SessionRequest,
        SessionStatus,
    )),
    tags(
        (name = "dashboard",     description = "Live sensor views"),
        (name = "notifications", description = "Notification bell"),
        (name = "alarms",        description = "Alarm settings"),
        (name = "account",       description = "User account"),
        (name = "fan",           description = "Fan control"),
        (name = "session",       description = "Bearer token management"),
        (name = "system",        description = "System endpoints"),
    ),
    info(
        title = "Smart Home Dashboard API",
        version = "0.1.0",
        description = "View models and actions for the smart home dashboard"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
