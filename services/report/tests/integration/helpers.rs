use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use cityconnect_domain::event::EventKind;
use cityconnect_report::domain::repository::{EventPublisher, OutboxRepository};
use cityconnect_report::domain::types::{OutboxMessage, OutboxStats, OutboxStatus};
use cityconnect_report::error::ReportServiceError;

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    cityconnect_report_migration::Migrator::up(&db, None)
        .await
        .unwrap();
    db
}

pub fn pending_message(kind: EventKind, payload: serde_json::Value) -> OutboxMessage {
    OutboxMessage {
        id: Uuid::new_v4(),
        routing_key: kind.routing_key().to_owned(),
        payload: serde_json::to_vec(&payload).unwrap(),
        status: OutboxStatus::Pending,
        retry_count: 0,
        last_error: None,
        created_at: Utc::now(),
        published_at: None,
    }
}

// ── MockOutboxRepo ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockOutboxRepo {
    pub rows: Mutex<Vec<OutboxMessage>>,
    pub published: Arc<Mutex<Vec<Uuid>>>,
    pub failed: Arc<Mutex<Vec<(Uuid, String)>>>,
    pub delete_cutoffs: Arc<Mutex<Vec<DateTime<Utc>>>>,
}

impl MockOutboxRepo {
    pub fn new(rows: Vec<OutboxMessage>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn published_handle(&self) -> Arc<Mutex<Vec<Uuid>>> {
        Arc::clone(&self.published)
    }

    pub fn failed_handle(&self) -> Arc<Mutex<Vec<(Uuid, String)>>> {
        Arc::clone(&self.failed)
    }

    pub fn delete_cutoffs_handle(&self) -> Arc<Mutex<Vec<DateTime<Utc>>>> {
        Arc::clone(&self.delete_cutoffs)
    }
}

impl OutboxRepository for MockOutboxRepo {
    async fn fetch_pending(&self, limit: u64) -> Result<Vec<OutboxMessage>, ReportServiceError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.status == OutboxStatus::Pending)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn mark_published(&self, id: Uuid) -> Result<(), ReportServiceError> {
        self.published.lock().unwrap().push(id);
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|row| row.id == id) {
            row.status = OutboxStatus::Published;
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), ReportServiceError> {
        self.failed.lock().unwrap().push((id, error.to_owned()));
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|row| row.id == id) {
            row.retry_count += 1;
        }
        Ok(())
    }

    async fn delete_published_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, ReportServiceError> {
        self.delete_cutoffs.lock().unwrap().push(cutoff);
        Ok(0)
    }

    async fn stats(&self) -> Result<OutboxStats, ReportServiceError> {
        Ok(OutboxStats::default())
    }
}

// ── MockPublisher ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockPublisher {
    pub published: Arc<Mutex<Vec<(String, Vec<u8>, Uuid)>>>,
    pub fail_ids: HashSet<Uuid>,
}

impl MockPublisher {
    pub fn failing_for(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            fail_ids: ids.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn published_handle(&self) -> Arc<Mutex<Vec<(String, Vec<u8>, Uuid)>>> {
        Arc::clone(&self.published)
    }
}

impl EventPublisher for MockPublisher {
    async fn publish(
        &self,
        routing_key: &str,
        payload: &[u8],
        message_id: Uuid,
    ) -> anyhow::Result<()> {
        if self.fail_ids.contains(&message_id) {
            anyhow::bail!("simulated transport failure");
        }
        self.published.lock().unwrap().push((
            routing_key.to_owned(),
            payload.to_vec(),
            message_id,
        ));
        Ok(())
    }
}
