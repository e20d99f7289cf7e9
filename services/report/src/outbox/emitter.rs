//! The only way report-side code records a domain event: an outbox row
//! inserted as part of the caller's transaction. Domain code never talks to
//! the broker directly.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};

use cityconnect_report_schema::outbox_messages;

use crate::domain::types::{OutboxEvent, OutboxStatus};

/// Queue `event` for publication. `db` is typically an open transaction
/// holding the business write that produced the event; the caller commits
/// (or rolls back) both together.
pub async fn enqueue<C: ConnectionTrait>(db: &C, event: &OutboxEvent) -> Result<(), DbErr> {
    outbox_messages::ActiveModel {
        id: Set(event.id),
        routing_key: Set(event.kind.routing_key().to_owned()),
        payload: Set(event.payload.clone()),
        status: Set(OutboxStatus::Pending.as_str().to_owned()),
        retry_count: Set(0),
        last_error: Set(None),
        created_at: Set(Utc::now()),
        published_at: Set(None),
    }
    .insert(db)
    .await?;
    Ok(())
}
