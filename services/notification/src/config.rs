use serde::Deserialize;

use cityconnect_core::config::Config;

/// Notification service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct NotificationConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// AMQP connection URL. Env var: `AMQP_URL`.
    pub amqp_url: String,
    /// TCP port for the HTTP server (default 3002). Env var: `NOTIFICATION_PORT`.
    #[serde(default = "default_notification_port")]
    pub notification_port: u16,
}

fn default_notification_port() -> u16 {
    3002
}

impl Config for NotificationConfig {}
