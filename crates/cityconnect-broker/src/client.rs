use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use lapin::options::{BasicConsumeOptions, BasicPublishOptions};
use lapin::publisher_confirm::Confirmation;
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tokio::sync::{RwLock, mpsc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::topology::{self, EXCHANGE};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("broker transport error")]
    Transport(#[from] lapin::Error),
    #[error("publish timed out")]
    PublishTimeout,
    #[error("message was not acknowledged by the broker")]
    Nacked,
}

struct Link {
    // Dropping the connection closes the channel; keep both alive together.
    _conn: Connection,
    channel: Channel,
}

/// Supervised AMQP client.
///
/// One connection, one channel. Topology is declared on every (re)dial, so a
/// declaration mismatch fails `connect` — that is a deployment error and
/// fatal to startup. After startup, transport errors only trigger the
/// reconnect supervisor: it holds the write lock and re-dials every 5 s
/// until the broker is back, while publishers and consumers block on the
/// read lock instead of racing a dead channel.
pub struct Broker {
    url: String,
    link: RwLock<Link>,
    closed_tx: mpsc::Sender<()>,
}

impl Broker {
    pub async fn connect(url: &str) -> Result<Arc<Self>, BrokerError> {
        let (closed_tx, closed_rx) = mpsc::channel(1);
        let link = Self::dial(url, closed_tx.clone()).await?;
        let broker = Arc::new(Self {
            url: url.to_owned(),
            link: RwLock::new(link),
            closed_tx,
        });
        tokio::spawn(Self::supervise(Arc::downgrade(&broker), closed_rx));
        info!(exchange = EXCHANGE, "broker connected, topology declared");
        Ok(broker)
    }

    async fn dial(url: &str, closed_tx: mpsc::Sender<()>) -> Result<Link, BrokerError> {
        let conn = Connection::connect(url, ConnectionProperties::default()).await?;
        // Capacity-1 channel: overlapping error notifications collapse into
        // one pending reconnect.
        conn.on_error(move |err| {
            warn!(error = %err, "broker connection error");
            let _ = closed_tx.try_send(());
        });
        let channel = conn.create_channel().await?;
        topology::declare_topology(&channel).await?;
        Ok(Link {
            _conn: conn,
            channel,
        })
    }

    async fn supervise(broker: Weak<Self>, mut closed_rx: mpsc::Receiver<()>) {
        while closed_rx.recv().await.is_some() {
            let Some(broker) = broker.upgrade() else {
                return;
            };
            let mut link = broker.link.write().await;
            // Stale notification from a connection we already replaced.
            if link.channel.status().connected() {
                continue;
            }
            loop {
                match Self::dial(&broker.url, broker.closed_tx.clone()).await {
                    Ok(new_link) => {
                        *link = new_link;
                        info!("broker reconnected, topology redeclared");
                        break;
                    }
                    Err(err) => {
                        error!(error = %err, "broker reconnect failed, retrying in 5s");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        }
    }

    /// Publish one persistent JSON message and wait for the publisher
    /// confirm, bounded by a 5 s deadline. `message_id` must be the stable
    /// identifier consumers de-duplicate on (the outbox row id).
    pub async fn publish(
        &self,
        routing_key: &str,
        payload: &[u8],
        message_id: Uuid,
    ) -> Result<(), BrokerError> {
        let link = self.link.read().await;
        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_delivery_mode(2)
            .with_message_id(message_id.to_string().into())
            .with_timestamp(Utc::now().timestamp() as u64);

        let confirmation = tokio::time::timeout(PUBLISH_TIMEOUT, async {
            link.channel
                .basic_publish(
                    EXCHANGE,
                    routing_key,
                    BasicPublishOptions::default(),
                    payload,
                    properties,
                )
                .await?
                .await
        })
        .await
        .map_err(|_| BrokerError::PublishTimeout)??;

        match confirmation {
            Confirmation::Nack(_) => Err(BrokerError::Nacked),
            _ => Ok(()),
        }
    }

    /// Start a manual-ack consumer on `queue`. The returned stream ends when
    /// the channel dies; callers re-request a stream after the supervisor
    /// has reconnected.
    pub async fn consume(
        &self,
        queue: &str,
        consumer_tag: &str,
    ) -> Result<lapin::Consumer, BrokerError> {
        let link = self.link.read().await;
        let consumer = link
            .channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        Ok(consumer)
    }
}
