use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use futures::stream::{self, StreamExt};

use cityconnect_core::identity::UserContext;

use crate::handlers::notification::notification_response;
use crate::state::AppState;

// ── GET /notifications/stream ────────────────────────────────────────────────

/// Long-lived SSE stream of live pushes for the authenticated user.
///
/// Sends one `connected` event, then a `notification` event per hub
/// delivery. The hub subscription travels inside the stream, so a client
/// disconnect drops it and unregisters the subscriber. Missed pushes are not
/// replayed here; clients refetch `/notifications` on reconnect.
pub async fn stream_notifications(
    ctx: UserContext,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = state.hub.subscribe(ctx.user_id).await;

    let connected = stream::once(async move {
        Event::default()
            .event("connected")
            .json_data(serde_json::json!({ "status": "connected" }))
    });

    let pushes = stream::unfold(subscription, |mut subscription| async move {
        let notification = subscription.recv().await?;
        let event = Event::default()
            .event("notification")
            .json_data(notification_response(notification));
        Some((event, subscription))
    });

    Sse::new(connected.chain(pushes)).keep_alive(KeepAlive::default())
}
