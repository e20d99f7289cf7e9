use chrono::{DateTime, Utc};
use uuid::Uuid;

use cityconnect_domain::event::EventKind;
use cityconnect_domain::report::{PrivacyLevel, ReportStatus};

/// Citizen report owned by the report service.
#[derive(Debug, Clone)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: i32,
    pub privacy_level: PrivacyLevel,
    pub status: ReportStatus,
    pub reporter_id: Option<Uuid>,
    pub reporter_name: Option<String>,
    pub vote_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A domain event queued for publication. Its `id` doubles as the broker
/// message-id, which downstream consumers de-duplicate on.
#[derive(Debug, Clone)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

impl OutboxEvent {
    pub fn new<T: serde::Serialize>(kind: EventKind, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            payload: serde_json::to_value(payload)?,
        })
    }
}

/// Publication state of an outbox row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxStatus {
    Pending,
    Published,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "published" => Some(Self::Published),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// An outbox row drains to `failed` once this many publish attempts failed.
pub const MAX_PUBLISH_ATTEMPTS: i32 = 5;

/// An outbox row as the relay sees it: payload already serialized.
#[derive(Debug, Clone)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub routing_key: String,
    pub payload: Vec<u8>,
    pub status: OutboxStatus,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Outbox row counts grouped by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutboxStats {
    pub pending: u64,
    pub published: u64,
    pub failed: u64,
}
