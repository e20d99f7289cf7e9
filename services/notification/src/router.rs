use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use cityconnect_core::health::{healthz, readyz};
use cityconnect_core::middleware::request_id_layer;

use crate::handlers::{
    notification::{get_notifications, mark_all_read, mark_read},
    stream::stream_notifications,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Notifications
        .route("/notifications", get(get_notifications))
        .route("/notifications/stream", get(stream_notifications))
        .route("/notifications/{id}/read", patch(mark_read))
        .route("/notifications/read-all", post(mark_all_read))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
