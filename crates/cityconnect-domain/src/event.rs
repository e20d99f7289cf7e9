//! Wire-level domain events carried through the notification pipeline.
//!
//! Every event is serialized as JSON and published to the topic exchange
//! under its kind's routing key. Identifier fields are UUID *strings* on the
//! wire; consumers parse and reject malformed ones as poison.

use serde::{Deserialize, Serialize};

use crate::report::{PrivacyLevel, ReportStatus, VoteType};

/// The three event kinds the pipeline moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ReportCreated,
    StatusUpdated,
    VoteReceived,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::StatusUpdated,
        EventKind::ReportCreated,
        EventKind::VoteReceived,
    ];

    /// Broker routing key for this kind.
    pub const fn routing_key(self) -> &'static str {
        match self {
            Self::StatusUpdated => "report.status.updated",
            Self::ReportCreated => "report.created",
            Self::VoteReceived => "report.vote.received",
        }
    }

    pub fn from_routing_key(key: &str) -> Option<Self> {
        match key {
            "report.status.updated" => Some(Self::StatusUpdated),
            "report.created" => Some(Self::ReportCreated),
            "report.vote.received" => Some(Self::VoteReceived),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.routing_key())
    }
}

/// Published when a report's status changes.
///
/// `reporter_id` is present when the producer already knows the recipient;
/// consumers fall back to a `reports` lookup when it is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdatedEvent {
    pub report_id: String,
    pub report_title: String,
    pub new_status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_id: Option<String>,
    /// Unix seconds at publish decision time.
    pub timestamp: i64,
}

/// Published when a new report is filed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCreatedEvent {
    pub report_id: String,
    pub report_title: String,
    pub category_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_name: Option<String>,
    pub privacy_level: PrivacyLevel,
    pub timestamp: i64,
}

/// Published when a report receives a vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteReceivedEvent {
    pub report_id: String,
    pub report_title: String,
    pub reporter_id: String,
    pub voter_id: String,
    pub vote_type: VoteType,
    pub new_score: i32,
    pub timestamp: i64,
}
