#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use cityconnect_domain::report::ReportStatus;

use crate::domain::types::{OutboxEvent, OutboxMessage, OutboxStats, Report};
use crate::error::ReportServiceError;

/// Repository for citizen reports.
///
/// The `*_with_event` methods perform the business write and the outbox
/// enqueue inside one transaction; either both commit or neither does.
pub trait ReportRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>, ReportServiceError>;

    async fn create_with_event(
        &self,
        report: &Report,
        event: &OutboxEvent,
    ) -> Result<(), ReportServiceError>;

    /// Update a report's status. Returns `ReportNotFound` (and commits
    /// nothing) when the report does not exist.
    async fn update_status_with_event(
        &self,
        id: Uuid,
        status: ReportStatus,
        event: &OutboxEvent,
    ) -> Result<(), ReportServiceError>;
}

/// Repository for the transactional outbox.
pub trait OutboxRepository: Send + Sync {
    /// Up to `limit` pending rows in insertion order. On Postgres the rows
    /// are row-locked with skip-locked semantics so concurrent relays never
    /// pick the same batch.
    async fn fetch_pending(&self, limit: u64) -> Result<Vec<OutboxMessage>, ReportServiceError>;

    async fn mark_published(&self, id: Uuid) -> Result<(), ReportServiceError>;

    /// Record a failed publish attempt; the row flips to `failed` once the
    /// attempt count reaches `MAX_PUBLISH_ATTEMPTS`, else stays pending.
    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), ReportServiceError>;

    /// Delete published rows older than `cutoff`. Returns the deleted count.
    async fn delete_published_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, ReportServiceError>;

    async fn stats(&self) -> Result<OutboxStats, ReportServiceError>;
}

/// Port to the broker, implemented over the AMQP client in `infra`.
/// `message_id` travels as the broker message-id and must equal the outbox
/// row id so de-duplication is stable across publish retries.
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        routing_key: &str,
        payload: &[u8],
        message_id: Uuid,
    ) -> anyhow::Result<()>;
}
