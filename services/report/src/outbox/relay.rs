//! Drains pending outbox rows to the broker.
//!
//! Two cooperating loops: the process loop publishes pending batches every
//! second, the cleanup loop deletes old published rows hourly. Both observe
//! the service shutdown watch; `run` returns once both have drained.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::domain::repository::{EventPublisher, OutboxRepository};

const PROCESS_INTERVAL: Duration = Duration::from_secs(1);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);
const BATCH_SIZE: u64 = 50;
const PUBLISHED_RETENTION_HOURS: i64 = 24;

pub struct OutboxRelay<O, P> {
    outbox: O,
    publisher: P,
}

impl<O, P> OutboxRelay<O, P>
where
    O: OutboxRepository,
    P: EventPublisher,
{
    pub fn new(outbox: O, publisher: P) -> Self {
        Self { outbox, publisher }
    }

    /// Drive both loops until `shutdown` flips to true; returns once they
    /// have drained. Callers spawn this onto its own task.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        info!("outbox relay started");
        tokio::join!(
            self.process_loop(shutdown.clone()),
            self.cleanup_loop(shutdown),
        );
        info!("outbox relay stopped");
    }

    async fn process_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(PROCESS_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("outbox relay process loop stopping");
                        return;
                    }
                }
                _ = tick.tick() => self.drain_pending().await,
            }
        }
    }

    /// Publish one batch of pending rows. Each row's outcome is recorded
    /// individually; a failing row never blocks the rest of the batch.
    pub async fn drain_pending(&self) {
        let batch = match self.outbox.fetch_pending(BATCH_SIZE).await {
            Ok(batch) => batch,
            Err(err) => {
                error!(error = %err, "failed to fetch pending outbox batch");
                return;
            }
        };
        if batch.is_empty() {
            return;
        }
        debug!(count = batch.len(), "publishing pending outbox rows");

        for row in batch {
            match self
                .publisher
                .publish(&row.routing_key, &row.payload, row.id)
                .await
            {
                Ok(()) => {
                    if let Err(err) = self.outbox.mark_published(row.id).await {
                        error!(id = %row.id, error = %err, "failed to mark outbox row published");
                    }
                }
                Err(err) => {
                    warn!(id = %row.id, error = %err, "outbox publish failed");
                    if let Err(err) = self.outbox.mark_failed(row.id, &err.to_string()).await {
                        error!(id = %row.id, error = %err, "failed to mark outbox row failed");
                    }
                }
            }
        }
    }

    async fn cleanup_loop(&self, mut shutdown: watch::Receiver<bool>) {
        // First cleanup after a full interval, not at startup.
        let mut tick = tokio::time::interval_at(
            tokio::time::Instant::now() + CLEANUP_INTERVAL,
            CLEANUP_INTERVAL,
        );
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("outbox relay cleanup loop stopping");
                        return;
                    }
                }
                _ = tick.tick() => self.cleanup_published().await,
            }
        }
    }

    /// Delete rows that were published longer than the retention window ago.
    pub async fn cleanup_published(&self) {
        let cutoff = Utc::now() - chrono::Duration::hours(PUBLISHED_RETENTION_HOURS);
        match self.outbox.delete_published_before(cutoff).await {
            Ok(0) => {}
            Ok(deleted) => info!(deleted, "cleaned up old published outbox rows"),
            Err(err) => error!(error = %err, "outbox cleanup failed"),
        }
    }
}
