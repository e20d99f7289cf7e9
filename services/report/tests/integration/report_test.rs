use uuid::Uuid;

use cityconnect_domain::event::{ReportCreatedEvent, StatusUpdatedEvent};
use cityconnect_domain::report::{PrivacyLevel, ReportStatus};
use cityconnect_report::domain::repository::{OutboxRepository, ReportRepository};
use cityconnect_report::error::ReportServiceError;
use cityconnect_report::infra::db::{DbOutboxRepository, DbReportRepository};
use cityconnect_report::usecase::report::{
    CreateReportInput, CreateReportUseCase, UpdateReportStatusUseCase,
};

use crate::helpers::setup_db;

fn create_input(privacy_level: PrivacyLevel, reporter_id: Uuid) -> CreateReportInput {
    CreateReportInput {
        title: "Jalan berlubang di depan pasar".to_owned(),
        description: "Lubang besar membahayakan pengendara motor".to_owned(),
        category_id: 2,
        privacy_level,
        reporter_id,
        reporter_name: Some("Budi".to_owned()),
    }
}

#[tokio::test]
async fn should_create_report_and_enqueue_report_created_event() {
    let db = setup_db().await;
    let reporter_id = Uuid::new_v4();

    let uc = CreateReportUseCase {
        reports: DbReportRepository { db: db.clone() },
    };
    let report = uc
        .execute(create_input(PrivacyLevel::Public, reporter_id))
        .await
        .unwrap();

    assert_eq!(report.status, ReportStatus::Pending);
    assert_eq!(report.vote_score, 0);
    assert_eq!(report.reporter_id, Some(reporter_id));

    let outbox = DbOutboxRepository { db };
    let pending = outbox.fetch_pending(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].routing_key, "report.created");

    let event: ReportCreatedEvent = serde_json::from_slice(&pending[0].payload).unwrap();
    assert_eq!(event.report_id, report.id.to_string());
    assert_eq!(event.report_title, report.title);
    assert_eq!(event.reporter_id.as_deref(), Some(reporter_id.to_string().as_str()));
    assert_eq!(event.reporter_name.as_deref(), Some("Budi"));
}

#[tokio::test]
async fn should_omit_reporter_from_anonymous_report_and_event() {
    let db = setup_db().await;

    let uc = CreateReportUseCase {
        reports: DbReportRepository { db: db.clone() },
    };
    let report = uc
        .execute(create_input(PrivacyLevel::Anonymous, Uuid::new_v4()))
        .await
        .unwrap();

    assert!(report.reporter_id.is_none());
    assert!(report.reporter_name.is_none());

    let stored = DbReportRepository { db: db.clone() }
        .find_by_id(report.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.reporter_id.is_none());

    let outbox = DbOutboxRepository { db };
    let pending = outbox.fetch_pending(10).await.unwrap();
    let event: ReportCreatedEvent = serde_json::from_slice(&pending[0].payload).unwrap();
    assert!(event.reporter_id.is_none());
    assert!(event.reporter_name.is_none());
    assert_eq!(event.privacy_level, PrivacyLevel::Anonymous);
}

#[tokio::test]
async fn should_reject_blank_title_without_writing_anything() {
    let db = setup_db().await;

    let uc = CreateReportUseCase {
        reports: DbReportRepository { db: db.clone() },
    };
    let mut input = create_input(PrivacyLevel::Public, Uuid::new_v4());
    input.title = "   ".to_owned();

    let result = uc.execute(input).await;
    assert!(
        matches!(result, Err(ReportServiceError::MissingData)),
        "expected MissingData, got {result:?}"
    );

    let outbox = DbOutboxRepository { db };
    assert!(outbox.fetch_pending(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn should_update_status_and_enqueue_status_updated_event() {
    let db = setup_db().await;
    let reporter_id = Uuid::new_v4();

    let create = CreateReportUseCase {
        reports: DbReportRepository { db: db.clone() },
    };
    let report = create
        .execute(create_input(PrivacyLevel::Public, reporter_id))
        .await
        .unwrap();

    let update = UpdateReportStatusUseCase {
        reports: DbReportRepository { db: db.clone() },
    };
    let updated = update
        .execute(report.id, ReportStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(updated.status, ReportStatus::Accepted);

    let stored = DbReportRepository { db: db.clone() }
        .find_by_id(report.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ReportStatus::Accepted);

    let outbox = DbOutboxRepository { db };
    let pending = outbox.fetch_pending(10).await.unwrap();
    assert_eq!(pending.len(), 2, "create + status update events");

    let status_row = pending
        .iter()
        .find(|row| row.routing_key == "report.status.updated")
        .expect("status event row");
    let event: StatusUpdatedEvent = serde_json::from_slice(&status_row.payload).unwrap();
    assert_eq!(event.new_status, ReportStatus::Accepted);
    assert_eq!(event.report_id, report.id.to_string());
    assert_eq!(event.reporter_id.as_deref(), Some(reporter_id.to_string().as_str()));
}

#[tokio::test]
async fn should_return_not_found_updating_missing_report() {
    let db = setup_db().await;

    let update = UpdateReportStatusUseCase {
        reports: DbReportRepository { db: db.clone() },
    };
    let result = update.execute(Uuid::new_v4(), ReportStatus::Accepted).await;
    assert!(
        matches!(result, Err(ReportServiceError::ReportNotFound)),
        "expected ReportNotFound, got {result:?}"
    );

    let outbox = DbOutboxRepository { db };
    assert!(outbox.fetch_pending(10).await.unwrap().is_empty());
}
