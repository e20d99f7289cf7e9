//! Authoritative broker topology: one topic exchange, one dead-letter
//! exchange, and per-event-kind durable queue + DLQ pairs.

use lapin::options::{
    BasicQosOptions, ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{Channel, ExchangeKind};

use cityconnect_domain::event::EventKind;

/// Main topic exchange all domain events are published to.
pub const EXCHANGE: &str = "cityconnect.notifications";

/// Dead-letter exchange; queues dead-letter into it on nack-without-requeue.
pub const DLX_EXCHANGE: &str = "cityconnect.notifications.dlx";

/// Per-consumer limit on unacknowledged deliveries.
pub const PREFETCH_COUNT: u16 = 10;

/// Messages parked in a DLQ expire after 24 hours.
pub const DLQ_MESSAGE_TTL_MS: i64 = 86_400_000;

/// One durable queue + DLQ pair per event kind.
#[derive(Debug, Clone, Copy)]
pub struct QueueSpec {
    pub kind: EventKind,
    pub queue: &'static str,
    pub routing_key: &'static str,
    pub dlq: &'static str,
    pub dlq_routing_key: &'static str,
}

pub static EVENT_QUEUES: [QueueSpec; 3] = [
    QueueSpec {
        kind: EventKind::StatusUpdated,
        queue: "queue.status_updates",
        routing_key: EventKind::StatusUpdated.routing_key(),
        dlq: "queue.status_updates.dlq",
        dlq_routing_key: "dlq.status_updates",
    },
    QueueSpec {
        kind: EventKind::ReportCreated,
        queue: "queue.report_created",
        routing_key: EventKind::ReportCreated.routing_key(),
        dlq: "queue.report_created.dlq",
        dlq_routing_key: "dlq.report_created",
    },
    QueueSpec {
        kind: EventKind::VoteReceived,
        queue: "queue.vote_received",
        routing_key: EventKind::VoteReceived.routing_key(),
        dlq: "queue.vote_received.dlq",
        dlq_routing_key: "dlq.vote_received",
    },
];

/// Look up the queue pair for an event kind.
pub fn spec_for_kind(kind: EventKind) -> &'static QueueSpec {
    EVENT_QUEUES
        .iter()
        .find(|spec| spec.kind == kind)
        .expect("every event kind has a queue spec")
}

/// Declare the complete topology on `channel` and configure QoS and
/// publisher confirms. Idempotent against an already-declared broker;
/// errors out on an argument mismatch with existing declarations.
pub(crate) async fn declare_topology(channel: &Channel) -> Result<(), lapin::Error> {
    channel
        .basic_qos(PREFETCH_COUNT, BasicQosOptions::default())
        .await?;
    channel.confirm_select(ConfirmSelectOptions::default()).await?;

    let durable_exchange = ExchangeDeclareOptions {
        durable: true,
        ..Default::default()
    };
    channel
        .exchange_declare(
            EXCHANGE,
            ExchangeKind::Topic,
            durable_exchange,
            FieldTable::default(),
        )
        .await?;
    channel
        .exchange_declare(
            DLX_EXCHANGE,
            ExchangeKind::Topic,
            durable_exchange,
            FieldTable::default(),
        )
        .await?;

    let durable_queue = QueueDeclareOptions {
        durable: true,
        ..Default::default()
    };

    for spec in &EVENT_QUEUES {
        // DLQ first so the main queue's dead-letter target always exists.
        let mut dlq_args = FieldTable::default();
        dlq_args.insert("x-message-ttl".into(), AMQPValue::LongLongInt(DLQ_MESSAGE_TTL_MS));
        channel.queue_declare(spec.dlq, durable_queue, dlq_args).await?;
        channel
            .queue_bind(
                spec.dlq,
                DLX_EXCHANGE,
                spec.dlq_routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        let mut queue_args = FieldTable::default();
        queue_args.insert(
            "x-dead-letter-exchange".into(),
            AMQPValue::LongString(DLX_EXCHANGE.into()),
        );
        queue_args.insert(
            "x-dead-letter-routing-key".into(),
            AMQPValue::LongString(spec.dlq_routing_key.into()),
        );
        channel
            .queue_declare(spec.queue, durable_queue, queue_args)
            .await?;
        channel
            .queue_bind(
                spec.queue,
                EXCHANGE,
                spec.routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
    }

    Ok(())
}
