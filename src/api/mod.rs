pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    control::FanController,
    query::{QueryCache, QueryClient},
    session::Session,
    views::notifications::BellTracker,
};

use handlers::ApiDoc;

/// Shared handles every route works from. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub queries: QueryClient,
    pub fan: FanController,
    pub session: Session,
    pub bell: BellTracker,
}

impl AppState {
    pub fn new(queries: QueryClient, fan: FanController) -> Self {
        Self {
            session: queries.api().session().clone(),
            queries,
            fan,
            bell: BellTracker::new(),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        self.queries.cache()
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/dashboard/{metric}", get(handlers::get_metric_page))
        .route("/notifications", get(handlers::get_notifications))
        .route("/notifications/read-all", post(handlers::mark_all_notifications_read))
        .route("/notifications/{id}/read", post(handlers::mark_notification_read))
        .route("/notifications/{id}", delete(handlers::delete_notification))
        .route(
            "/alarms",
            get(handlers::get_alarms).post(handlers::create_alarm),
        )
        .route(
            "/alarms/{id}",
            put(handlers::update_alarm).delete(handlers::delete_alarm),
        )
        .route("/account", get(handlers::get_account))
        .route("/account/profile", put(handlers::update_profile))
        .route("/account/coreiot-token", put(handlers::update_coreiot_token))
        .route("/fan/toggle", post(handlers::toggle_fan))
        .route(
            "/session",
            post(handlers::start_session).delete(handlers::end_session),
        )
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
