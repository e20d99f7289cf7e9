use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, LockBehavior, LockType};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbBackend, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use cityconnect_domain::report::{PrivacyLevel, ReportStatus};
use cityconnect_report_schema::{outbox_messages, reports};

use crate::domain::repository::{OutboxRepository, ReportRepository};
use crate::domain::types::{
    MAX_PUBLISH_ATTEMPTS, OutboxEvent, OutboxMessage, OutboxStats, OutboxStatus, Report,
};
use crate::error::ReportServiceError;
use crate::outbox::emitter;

// ── Report repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbReportRepository {
    pub db: DatabaseConnection,
}

impl ReportRepository for DbReportRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>, ReportServiceError> {
        let model = reports::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find report by id")?;
        model.map(report_from_model).transpose()
    }

    async fn create_with_event(
        &self,
        report: &Report,
        event: &OutboxEvent,
    ) -> Result<(), ReportServiceError> {
        let txn = self.db.begin().await.context("begin transaction")?;

        reports::ActiveModel {
            id: Set(report.id),
            title: Set(report.title.clone()),
            description: Set(report.description.clone()),
            category_id: Set(report.category_id),
            privacy_level: Set(report.privacy_level.as_str().to_owned()),
            status: Set(report.status.as_str().to_owned()),
            reporter_id: Set(report.reporter_id),
            reporter_name: Set(report.reporter_name.clone()),
            vote_score: Set(report.vote_score),
            created_at: Set(report.created_at),
            updated_at: Set(report.updated_at),
        }
        .insert(&txn)
        .await
        .context("create report")?;

        emitter::enqueue(&txn, event)
            .await
            .context("enqueue report event")?;

        txn.commit().await.context("commit report create")?;
        Ok(())
    }

    async fn update_status_with_event(
        &self,
        id: Uuid,
        status: ReportStatus,
        event: &OutboxEvent,
    ) -> Result<(), ReportServiceError> {
        let txn = self.db.begin().await.context("begin transaction")?;

        let result = reports::Entity::update_many()
            .col_expr(reports::Column::Status, Expr::value(status.as_str()))
            .col_expr(reports::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(reports::Column::Id.eq(id))
            .exec(&txn)
            .await
            .context("update report status")?;
        if result.rows_affected == 0 {
            // Dropping the transaction rolls it back.
            return Err(ReportServiceError::ReportNotFound);
        }

        emitter::enqueue(&txn, event)
            .await
            .context("enqueue status event")?;

        txn.commit().await.context("commit status update")?;
        Ok(())
    }
}

fn report_from_model(model: reports::Model) -> Result<Report, ReportServiceError> {
    let status = ReportStatus::from_str(&model.status)
        .with_context(|| format!("unknown report status {:?}", model.status))?;
    let privacy_level = PrivacyLevel::from_str(&model.privacy_level)
        .with_context(|| format!("unknown privacy level {:?}", model.privacy_level))?;
    Ok(Report {
        id: model.id,
        title: model.title,
        description: model.description,
        category_id: model.category_id,
        privacy_level,
        status,
        reporter_id: model.reporter_id,
        reporter_name: model.reporter_name,
        vote_score: model.vote_score,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Outbox repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOutboxRepository {
    pub db: DatabaseConnection,
}

impl OutboxRepository for DbOutboxRepository {
    async fn fetch_pending(&self, limit: u64) -> Result<Vec<OutboxMessage>, ReportServiceError> {
        let mut query = outbox_messages::Entity::find()
            .filter(outbox_messages::Column::Status.eq(OutboxStatus::Pending.as_str()))
            .order_by_asc(outbox_messages::Column::CreatedAt)
            .limit(limit);

        // Row locks keep concurrent relays off the same batch; sqlite (tests)
        // has no row-level locking.
        if self.db.get_database_backend() == DbBackend::Postgres {
            query = query.lock_with_behavior(LockType::Update, LockBehavior::SkipLocked);
        }

        let models = query
            .all(&self.db)
            .await
            .context("fetch pending outbox batch")?;
        models.into_iter().map(outbox_from_model).collect()
    }

    async fn mark_published(&self, id: Uuid) -> Result<(), ReportServiceError> {
        outbox_messages::Entity::update_many()
            .col_expr(
                outbox_messages::Column::Status,
                Expr::value(OutboxStatus::Published.as_str()),
            )
            .col_expr(
                outbox_messages::Column::PublishedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(outbox_messages::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("mark outbox row published")?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), ReportServiceError> {
        let record = outbox_messages::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("load outbox row")?
            .with_context(|| format!("outbox row {id} not found"))?;

        let attempts = record.retry_count + 1;
        let status = if attempts >= MAX_PUBLISH_ATTEMPTS {
            OutboxStatus::Failed
        } else {
            OutboxStatus::Pending
        };

        let mut active: outbox_messages::ActiveModel = record.into();
        active.retry_count = Set(attempts);
        active.last_error = Set(Some(error.to_owned()));
        active.status = Set(status.as_str().to_owned());
        active
            .update(&self.db)
            .await
            .context("mark outbox row failed")?;
        Ok(())
    }

    async fn delete_published_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, ReportServiceError> {
        let result = outbox_messages::Entity::delete_many()
            .filter(outbox_messages::Column::Status.eq(OutboxStatus::Published.as_str()))
            .filter(outbox_messages::Column::PublishedAt.lt(cutoff))
            .exec(&self.db)
            .await
            .context("delete published outbox rows")?;
        Ok(result.rows_affected)
    }

    async fn stats(&self) -> Result<OutboxStats, ReportServiceError> {
        #[derive(Debug, FromQueryResult)]
        struct StatusCount {
            status: String,
            count: i64,
        }

        let rows = outbox_messages::Entity::find()
            .select_only()
            .column(outbox_messages::Column::Status)
            .column_as(outbox_messages::Column::Id.count(), "count")
            .group_by(outbox_messages::Column::Status)
            .into_model::<StatusCount>()
            .all(&self.db)
            .await
            .context("outbox stats")?;

        let mut stats = OutboxStats::default();
        for row in rows {
            match OutboxStatus::from_str(&row.status) {
                Some(OutboxStatus::Pending) => stats.pending = row.count as u64,
                Some(OutboxStatus::Published) => stats.published = row.count as u64,
                Some(OutboxStatus::Failed) => stats.failed = row.count as u64,
                None => {}
            }
        }
        Ok(stats)
    }
}

fn outbox_from_model(model: outbox_messages::Model) -> Result<OutboxMessage, ReportServiceError> {
    let status = OutboxStatus::from_str(&model.status)
        .with_context(|| format!("unknown outbox status {:?}", model.status))?;
    let payload = serde_json::to_vec(&model.payload).context("serialize outbox payload")?;
    Ok(OutboxMessage {
        id: model.id,
        routing_key: model.routing_key,
        payload,
        status,
        retry_count: model.retry_count,
        last_error: model.last_error,
        created_at: model.created_at,
        published_at: model.published_at,
    })
}
