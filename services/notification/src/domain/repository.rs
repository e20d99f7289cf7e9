#![allow(async_fn_in_trait)]

use uuid::Uuid;

use cityconnect_domain::report::ReportStatus;

use crate::domain::types::Notification;
use crate::error::NotificationServiceError;

/// Repository for durable notifications.
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<(), NotificationServiceError>;

    /// Newest-first, capped at 50.
    async fn list_by_user(&self, user_id: Uuid)
    -> Result<Vec<Notification>, NotificationServiceError>;

    async fn count_unread(&self, user_id: Uuid) -> Result<u64, NotificationServiceError>;

    /// Mark one notification read, scoped to its owner. Returns
    /// `NotificationNotFound` when the id/user pair does not exist.
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<(), NotificationServiceError>;

    async fn mark_all_read(&self, user_id: Uuid) -> Result<(), NotificationServiceError>;

    /// Create a status notification when the producer did not name the
    /// recipient: join `reports` to find the reporter. Returns the created
    /// notification, or `None` when the report is missing or anonymous.
    async fn create_status_notification(
        &self,
        report_id: Uuid,
        new_status: ReportStatus,
        report_title: &str,
    ) -> Result<Option<Notification>, NotificationServiceError>;
}

/// Persistent set of handled broker message ids.
pub trait ProcessedMessageRepository: Send + Sync {
    async fn is_processed(&self, message_id: &str) -> Result<bool, NotificationServiceError>;

    /// Idempotent: recording the same id twice is silently absorbed.
    async fn mark_processed(&self, message_id: &str) -> Result<(), NotificationServiceError>;
}
