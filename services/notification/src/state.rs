use sea_orm::DatabaseConnection;

use crate::hub::HubHandle;
use crate::infra::db::{DbNotificationRepository, DbProcessedMessageRepository};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub hub: HubHandle,
}

impl AppState {
    pub fn notification_repo(&self) -> DbNotificationRepository {
        DbNotificationRepository {
            db: self.db.clone(),
        }
    }

    pub fn processed_repo(&self) -> DbProcessedMessageRepository {
        DbProcessedMessageRepository {
            db: self.db.clone(),
        }
    }
}
