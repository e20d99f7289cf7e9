use tracing::{debug, error, warn};

use cityconnect_domain::event::EventKind;

use crate::consumer::handlers;
use crate::consumer::retry::RetryPolicy;
use crate::domain::repository::{NotificationRepository, ProcessedMessageRepository};
use crate::hub::HubHandle;

/// What the queue worker should do with a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Acknowledge: handled, duplicate, or poison.
    Ack,
    /// Negative-acknowledge without requeue; the broker dead-letters it.
    DeadLetter,
}

/// Handler outcome classification.
#[derive(Debug)]
pub enum HandlerError {
    /// The message can never succeed (bad JSON, malformed identifier
    /// fields): acked and discarded, never dead-lettered.
    Poison(String),
    /// Worth retrying (database unreachable, dependency timeout).
    Transient(anyhow::Error),
}

/// Runs one delivery through the idempotency check, the typed handler under
/// the retry policy, and the processed-mark, yielding the ack/DLQ decision.
pub struct MessageProcessor<N, P> {
    pub notifications: N,
    pub processed: P,
    pub hub: HubHandle,
    pub retry: RetryPolicy,
}

impl<N, P> MessageProcessor<N, P>
where
    N: NotificationRepository,
    P: ProcessedMessageRepository,
{
    pub async fn process(
        &self,
        kind: EventKind,
        message_id: &str,
        payload: &[u8],
    ) -> Disposition {
        match self.processed.is_processed(message_id).await {
            Ok(true) => {
                debug!(message_id, "message already processed, skipping");
                return Disposition::Ack;
            }
            Ok(false) => {}
            // Best-effort check: prefer a possible duplicate over dropping
            // the message.
            Err(err) => warn!(message_id, error = %err, "idempotency check failed"),
        }

        let mut attempt = 1;
        loop {
            match self.dispatch(kind, payload).await {
                Ok(()) => break,
                Err(HandlerError::Poison(reason)) => {
                    warn!(message_id, kind = %kind, reason, "poison message discarded");
                    return Disposition::Ack;
                }
                Err(HandlerError::Transient(err)) => {
                    if attempt >= self.retry.max_attempts {
                        error!(
                            message_id,
                            kind = %kind,
                            attempts = attempt,
                            error = %err,
                            "handler exhausted retries, dead-lettering"
                        );
                        return Disposition::DeadLetter;
                    }
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        message_id,
                        kind = %kind,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "handler failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }

        // Non-fatal: an unrecorded id means a later duplicate runs the
        // handler again, which the next mark then absorbs.
        if let Err(err) = self.processed.mark_processed(message_id).await {
            warn!(message_id, error = %err, "failed to record processed message");
        }
        Disposition::Ack
    }

    async fn dispatch(&self, kind: EventKind, payload: &[u8]) -> Result<(), HandlerError> {
        match kind {
            EventKind::StatusUpdated => {
                handlers::handle_status_updated(&self.notifications, &self.hub, payload).await
            }
            EventKind::ReportCreated => handlers::handle_report_created(payload).await,
            EventKind::VoteReceived => {
                handlers::handle_vote_received(&self.notifications, &self.hub, payload).await
            }
        }
    }
}
