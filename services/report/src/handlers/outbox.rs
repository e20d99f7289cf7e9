use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::domain::repository::OutboxRepository as _;
use crate::error::ReportServiceError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct OutboxStatsResponse {
    pub pending: u64,
    pub published: u64,
    pub failed: u64,
}

// ── GET /internal/outbox/stats ───────────────────────────────────────────────

pub async fn outbox_stats(
    State(state): State<AppState>,
) -> Result<Json<OutboxStatsResponse>, ReportServiceError> {
    let stats = state.outbox_repo().stats().await?;
    Ok(Json(OutboxStatsResponse {
        pending: stats.pending,
        published: stats.published,
        failed: stats.failed,
    }))
}
