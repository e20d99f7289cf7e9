//! Typed handlers, one per event kind.
//!
//! Every handler persists before it pushes: the durable record in the
//! notifications table exists before the hub sees the live copy.

use tracing::info;
use uuid::Uuid;

use cityconnect_domain::event::{ReportCreatedEvent, StatusUpdatedEvent, VoteReceivedEvent};

use crate::consumer::processor::HandlerError;
use crate::domain::repository::NotificationRepository;
use crate::domain::types::Notification;
use crate::error::NotificationServiceError;
use crate::hub::HubHandle;

fn poison(context: &str, err: impl std::fmt::Display) -> HandlerError {
    HandlerError::Poison(format!("{context}: {err}"))
}

fn transient(err: NotificationServiceError) -> HandlerError {
    HandlerError::Transient(anyhow::Error::new(err))
}

pub(crate) async fn handle_status_updated<N: NotificationRepository>(
    notifications: &N,
    hub: &HubHandle,
    payload: &[u8],
) -> Result<(), HandlerError> {
    let event: StatusUpdatedEvent =
        serde_json::from_slice(payload).map_err(|e| poison("unparseable status payload", e))?;
    let report_id =
        Uuid::parse_str(&event.report_id).map_err(|e| poison("invalid report_id", e))?;

    let notification = match event.reporter_id.as_deref().filter(|id| !id.is_empty()) {
        Some(reporter) => {
            let user_id =
                Uuid::parse_str(reporter).map_err(|e| poison("invalid reporter_id", e))?;
            let notification = Notification::status_update(
                user_id,
                report_id,
                &event.report_title,
                event.new_status,
            );
            notifications.create(&notification).await.map_err(transient)?;
            Some(notification)
        }
        // The producer did not know the reporter; derive it from the report row.
        None => notifications
            .create_status_notification(report_id, event.new_status, &event.report_title)
            .await
            .map_err(transient)?,
    };

    if let Some(notification) = notification {
        hub.broadcast(notification).await;
    }
    Ok(())
}

pub(crate) async fn handle_report_created(payload: &[u8]) -> Result<(), HandlerError> {
    let event: ReportCreatedEvent =
        serde_json::from_slice(payload).map_err(|e| poison("unparseable report payload", e))?;

    // TODO(admin routing): fan out to department admins once an admin
    // recipient model exists. Until then the event is consumed and logged.
    info!(
        report_id = %event.report_id,
        title = %event.report_title,
        "report created"
    );
    Ok(())
}

pub(crate) async fn handle_vote_received<N: NotificationRepository>(
    notifications: &N,
    hub: &HubHandle,
    payload: &[u8],
) -> Result<(), HandlerError> {
    let event: VoteReceivedEvent =
        serde_json::from_slice(payload).map_err(|e| poison("unparseable vote payload", e))?;

    // Self-votes and anonymous reports notify nobody.
    if event.reporter_id.is_empty() || event.reporter_id == event.voter_id {
        return Ok(());
    }

    let report_id =
        Uuid::parse_str(&event.report_id).map_err(|e| poison("invalid report_id", e))?;
    let user_id =
        Uuid::parse_str(&event.reporter_id).map_err(|e| poison("invalid reporter_id", e))?;

    let notification = Notification::vote_received(
        user_id,
        report_id,
        &event.report_title,
        event.vote_type,
        event.new_score,
    );
    notifications.create(&notification).await.map_err(transient)?;
    hub.broadcast(notification).await;
    Ok(())
}
