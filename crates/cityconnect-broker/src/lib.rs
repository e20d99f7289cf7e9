//! AMQP (RabbitMQ) client for the notification pipeline.
//!
//! Owns one connection and one channel, declares the full exchange/queue/DLQ
//! topology at startup, and supervises reconnection. Publishing and consuming
//! take the read half of a lock; the reconnect supervisor takes the write
//! half, so callers wait out an outage instead of failing on a dead channel.

pub mod client;
pub mod topology;

pub use client::{Broker, BrokerError};
pub use topology::{DLX_EXCHANGE, EVENT_QUEUES, EXCHANGE, PREFETCH_COUNT, QueueSpec};
