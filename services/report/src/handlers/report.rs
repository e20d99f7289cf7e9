use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cityconnect_core::identity::UserContext;
use cityconnect_domain::report::{PrivacyLevel, ReportStatus};

use crate::domain::types::Report;
use crate::error::ReportServiceError;
use crate::state::AppState;
use crate::usecase::report::{CreateReportInput, CreateReportUseCase, UpdateReportStatusUseCase};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ReportResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category_id: i32,
    pub privacy_level: PrivacyLevel,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_name: Option<String>,
    pub vote_score: i32,
    #[serde(serialize_with = "cityconnect_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "cityconnect_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

fn report_response(report: Report) -> ReportResponse {
    ReportResponse {
        id: report.id.to_string(),
        title: report.title,
        description: report.description,
        category_id: report.category_id,
        privacy_level: report.privacy_level,
        status: report.status,
        reporter_id: report.reporter_id.map(|id| id.to_string()),
        reporter_name: report.reporter_name,
        vote_score: report.vote_score,
        created_at: report.created_at,
        updated_at: report.updated_at,
    }
}

// ── POST /reports ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateReportRequest {
    pub title: String,
    pub description: String,
    pub category_id: i32,
    pub privacy_level: PrivacyLevel,
}

pub async fn create_report(
    ctx: UserContext,
    State(state): State<AppState>,
    Json(req): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<ReportResponse>), ReportServiceError> {
    let usecase = CreateReportUseCase {
        reports: state.report_repo(),
    };
    let report = usecase
        .execute(CreateReportInput {
            title: req.title,
            description: req.description,
            category_id: req.category_id,
            privacy_level: req.privacy_level,
            reporter_id: ctx.user_id,
            reporter_name: ctx.user_name,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(report_response(report))))
}

// ── PATCH /reports/{id}/status ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ReportStatus,
}

// Role checks (only staff may change status) live in the upstream gateway.
pub async fn update_report_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ReportResponse>, ReportServiceError> {
    let usecase = UpdateReportStatusUseCase {
        reports: state.report_repo(),
    };
    let report = usecase.execute(id, req.status).await?;
    Ok(Json(report_response(report)))
}
