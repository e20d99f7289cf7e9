//! Per-queue event consumer workers.
//!
//! One long-lived task per event kind. Each worker requests a delivery
//! stream from the broker, processes deliveries until the stream ends (a
//! channel closure), then re-requests a stream after a short pause. The
//! ack/DLQ decision per delivery comes from [`processor::MessageProcessor`].

pub mod handlers;
pub mod processor;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::future::join_all;
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicNackOptions};
use tokio::sync::watch;
use tracing::{error, info, warn};

use cityconnect_broker::{Broker, EVENT_QUEUES, QueueSpec};

use crate::consumer::processor::{Disposition, MessageProcessor};
use crate::domain::repository::{NotificationRepository, ProcessedMessageRepository};

const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);
const CONSUMER_TAG: &str = "notification-consumer";

pub struct EventConsumer<N, P> {
    broker: Arc<Broker>,
    processor: MessageProcessor<N, P>,
}

impl<N, P> EventConsumer<N, P>
where
    N: NotificationRepository,
    P: ProcessedMessageRepository,
{
    pub fn new(broker: Arc<Broker>, processor: MessageProcessor<N, P>) -> Self {
        Self { broker, processor }
    }

    /// Drive one worker per event queue until `shutdown` flips to true;
    /// in-flight deliveries finish their retry/ack cycle before workers
    /// return. Callers spawn this onto its own task.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        info!("all queue consumers started");
        join_all(
            EVENT_QUEUES
                .iter()
                .map(|spec| self.run_queue(spec, shutdown.clone())),
        )
        .await;
        info!("all queue consumers stopped");
    }

    async fn run_queue(&self, spec: &'static QueueSpec, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                info!(queue = spec.queue, "consumer stopping");
                return;
            }

            let mut deliveries = match self.broker.consume(spec.queue, CONSUMER_TAG).await {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(queue = spec.queue, error = %err, "consume failed, retrying in 5s");
                    if wait_or_shutdown(&mut shutdown).await {
                        info!(queue = spec.queue, "consumer stopping");
                        return;
                    }
                    continue;
                }
            };
            info!(queue = spec.queue, "listening for deliveries");

            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            info!(queue = spec.queue, "consumer stopping");
                            return;
                        }
                    }
                    next = deliveries.next() => match next {
                        Some(Ok(delivery)) => self.handle_delivery(spec, delivery).await,
                        Some(Err(err)) => {
                            warn!(queue = spec.queue, error = %err, "delivery stream error, re-subscribing");
                            break;
                        }
                        None => {
                            warn!(queue = spec.queue, "delivery stream closed, re-subscribing");
                            break;
                        }
                    }
                }
            }

            if wait_or_shutdown(&mut shutdown).await {
                info!(queue = spec.queue, "consumer stopping");
                return;
            }
        }
    }

    async fn handle_delivery(&self, spec: &QueueSpec, delivery: Delivery) {
        let message_id = stable_message_id(&delivery);
        let disposition = self
            .processor
            .process(spec.kind, &message_id, &delivery.data)
            .await;

        let result = match disposition {
            Disposition::Ack => delivery.acker.ack(BasicAckOptions::default()).await,
            Disposition::DeadLetter => {
                delivery
                    .acker
                    .nack(BasicNackOptions {
                        requeue: false,
                        ..Default::default()
                    })
                    .await
            }
        };
        if let Err(err) = result {
            error!(queue = spec.queue, message_id, error = %err, "failed to settle delivery");
        }
    }
}

/// Broker message-id when present, else a hex prefix of the payload bytes.
/// Deterministic so redeliveries map onto the same idempotency key.
fn stable_message_id(delivery: &Delivery) -> String {
    delivery
        .properties
        .message_id()
        .as_ref()
        .map(|id| id.to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| hex::encode(&delivery.data[..delivery.data.len().min(32)]))
}

/// Sleep out the re-subscribe delay; returns true when shutdown fired.
async fn wait_or_shutdown(shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(RESUBSCRIBE_DELAY) => *shutdown.borrow(),
        _ = shutdown.changed() => *shutdown.borrow(),
    }
}
