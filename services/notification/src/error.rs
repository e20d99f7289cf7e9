use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Notification service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum NotificationServiceError {
    #[error("notification not found")]
    NotificationNotFound,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl NotificationServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotificationNotFound => "NOTIFICATION_NOT_FOUND",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for NotificationServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotificationNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
