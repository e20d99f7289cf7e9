use std::sync::Arc;

use uuid::Uuid;

use cityconnect_broker::Broker;

use crate::domain::repository::EventPublisher;

/// Publishes outbox rows through the shared AMQP client.
#[derive(Clone)]
pub struct BrokerPublisher {
    pub broker: Arc<Broker>,
}

impl EventPublisher for BrokerPublisher {
    async fn publish(
        &self,
        routing_key: &str,
        payload: &[u8],
        message_id: Uuid,
    ) -> anyhow::Result<()> {
        self.broker.publish(routing_key, payload, message_id).await?;
        Ok(())
    }
}
