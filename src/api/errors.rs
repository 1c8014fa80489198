use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::{client::ClientError, control::FanError, views::FormError};

/// Failed dashboard action, rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Keep the status but show `message` instead of the underlying error.
    /// Authentication failures keep their own message.
    pub fn with_message(self, message: &str) -> Self {
        if self.status == StatusCode::UNAUTHORIZED {
            return self;
        }
        Self {
            message: message.to_owned(),
            ..self
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<ClientError> for AppError {
    fn from(e: ClientError) -> Self {
        if e.is_unauthenticated() {
            return Self::new(StatusCode::UNAUTHORIZED, "Not authenticated");
        }
        warn!(error = %e, "Upstream request failed");
        match e {
            ClientError::Status { status: 404, .. } => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            other => Self::new(StatusCode::BAD_GATEWAY, other.to_string()),
        }
    }
}

impl From<FormError> for AppError {
    fn from(e: FormError) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    }
}

impl From<FanError> for AppError {
    fn from(e: FanError) -> Self {
        match e {
            FanError::Busy => Self::new(StatusCode::CONFLICT, e.to_string()),
            FanError::Client(inner) => inner.into(),
        }
    }
}

// Extractor rejections keep axum's status (400 for bad paths and queries,
// 415/422 for bodies) but use the same JSON error body as everything else.

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        Self::new(e.status(), e.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        Self::new(e.status(), e.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        Self::new(e.status(), e.body_text())
    }
}
