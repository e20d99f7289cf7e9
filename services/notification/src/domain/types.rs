use chrono::{DateTime, Utc};
use uuid::Uuid;

use cityconnect_domain::report::{ReportStatus, VoteType};

/// Durable per-user notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Notification for a status change on the recipient's report.
    pub fn status_update(
        user_id: Uuid,
        report_id: Uuid,
        report_title: &str,
        new_status: ReportStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            report_id: Some(report_id),
            title: "Status Laporan Diperbarui".to_owned(),
            message: format!(
                "Laporan \"{report_title}\" telah diubah statusnya menjadi: {new_status}"
            ),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    /// Notification for a vote on the recipient's report.
    pub fn vote_received(
        user_id: Uuid,
        report_id: Uuid,
        report_title: &str,
        vote_type: VoteType,
        new_score: i32,
    ) -> Self {
        let vote = vote_type.as_str();
        Self {
            id: Uuid::new_v4(),
            user_id,
            report_id: Some(report_id),
            title: format!("Laporan Mendapat {vote}"),
            message: format!("Laporan \"{report_title}\" mendapat {vote}. Skor: {new_score}"),
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
