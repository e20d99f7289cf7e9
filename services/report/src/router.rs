use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use cityconnect_core::health::{healthz, readyz};
use cityconnect_core::middleware::request_id_layer;

use crate::handlers::{
    outbox::outbox_stats,
    report::{create_report, update_report_status},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Reports
        .route("/reports", post(create_report))
        .route("/reports/{id}/status", patch(update_report_status))
        // Operational
        .route("/internal/outbox/stats", get(outbox_stats))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
