use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use cityconnect_domain::report::ReportStatus;
use cityconnect_notification_schema::{notifications, processed_messages};
use cityconnect_report_schema::reports;

use crate::domain::repository::{NotificationRepository, ProcessedMessageRepository};
use crate::domain::types::Notification;
use crate::error::NotificationServiceError;

/// Newest-first listing cap.
const LIST_LIMIT: u64 = 50;

// ── Notification repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbNotificationRepository {
    pub db: DatabaseConnection,
}

impl NotificationRepository for DbNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<(), NotificationServiceError> {
        notifications::ActiveModel {
            id: Set(notification.id),
            user_id: Set(notification.user_id),
            report_id: Set(notification.report_id),
            title: Set(notification.title.clone()),
            message: Set(notification.message.clone()),
            is_read: Set(notification.is_read),
            created_at: Set(notification.created_at),
        }
        .insert(&self.db)
        .await
        .context("create notification")?;
        Ok(())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Notification>, NotificationServiceError> {
        let models = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .order_by_desc(notifications::Column::CreatedAt)
            .limit(LIST_LIMIT)
            .all(&self.db)
            .await
            .context("list notifications")?;
        Ok(models.into_iter().map(notification_from_model).collect())
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<u64, NotificationServiceError> {
        let count = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.db)
            .await
            .context("count unread notifications")?;
        Ok(count)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<(), NotificationServiceError> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::Id.eq(id))
            .filter(notifications::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("mark notification read")?;
        if result.rows_affected == 0 {
            return Err(NotificationServiceError::NotificationNotFound);
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<(), NotificationServiceError> {
        notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.db)
            .await
            .context("mark all notifications read")?;
        Ok(())
    }

    async fn create_status_notification(
        &self,
        report_id: Uuid,
        new_status: ReportStatus,
        report_title: &str,
    ) -> Result<Option<Notification>, NotificationServiceError> {
        let report = reports::Entity::find_by_id(report_id)
            .one(&self.db)
            .await
            .context("load report for status notification")?;
        // A vanished report or an anonymous reporter means nobody to notify.
        let Some(report) = report else {
            return Ok(None);
        };
        let Some(reporter_id) = report.reporter_id else {
            return Ok(None);
        };

        let notification =
            Notification::status_update(reporter_id, report_id, report_title, new_status);
        self.create(&notification).await?;
        Ok(Some(notification))
    }
}

fn notification_from_model(model: notifications::Model) -> Notification {
    Notification {
        id: model.id,
        user_id: model.user_id,
        report_id: model.report_id,
        title: model.title,
        message: model.message,
        is_read: model.is_read,
        created_at: model.created_at,
    }
}

// ── Processed-message repository ─────────────────────────────────────────────

#[derive(Clone)]
pub struct DbProcessedMessageRepository {
    pub db: DatabaseConnection,
}

impl ProcessedMessageRepository for DbProcessedMessageRepository {
    async fn is_processed(&self, message_id: &str) -> Result<bool, NotificationServiceError> {
        let found = processed_messages::Entity::find_by_id(message_id)
            .one(&self.db)
            .await
            .context("idempotency lookup")?;
        Ok(found.is_some())
    }

    async fn mark_processed(&self, message_id: &str) -> Result<(), NotificationServiceError> {
        let active = processed_messages::ActiveModel {
            message_id: Set(message_id.to_owned()),
            processed_at: Set(Utc::now()),
        };
        processed_messages::Entity::insert(active)
            .on_conflict(
                OnConflict::column(processed_messages::Column::MessageId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("record processed message")?;
        Ok(())
    }
}
