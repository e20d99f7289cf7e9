use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Report service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum ReportServiceError {
    #[error("report not found")]
    ReportNotFound,
    #[error("missing data")]
    MissingData,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ReportServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReportNotFound => "REPORT_NOT_FOUND",
            Self::MissingData => "MISSING_DATA",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ReportServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ReportNotFound => StatusCode::NOT_FOUND,
            Self::MissingData => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Log 500s only — tower-http TraceLayer already records method/uri/status for all
        // requests. 4xx are expected client errors; logging them here would be noise.
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
