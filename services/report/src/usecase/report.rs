use anyhow::Context as _;
use chrono::Utc;
use uuid::Uuid;

use cityconnect_domain::event::{EventKind, ReportCreatedEvent, StatusUpdatedEvent};
use cityconnect_domain::report::{PrivacyLevel, ReportStatus};

use crate::domain::repository::ReportRepository;
use crate::domain::types::{OutboxEvent, Report};
use crate::error::ReportServiceError;

// ── CreateReport ─────────────────────────────────────────────────────────────

pub struct CreateReportInput {
    pub title: String,
    pub description: String,
    pub category_id: i32,
    pub privacy_level: PrivacyLevel,
    pub reporter_id: Uuid,
    pub reporter_name: Option<String>,
}

pub struct CreateReportUseCase<R: ReportRepository> {
    pub reports: R,
}

impl<R: ReportRepository> CreateReportUseCase<R> {
    /// Create a report and enqueue the matching `report.created` event in the
    /// same transaction. Anonymous reports carry no reporter columns and omit
    /// the reporter fields from the event.
    pub async fn execute(&self, input: CreateReportInput) -> Result<Report, ReportServiceError> {
        if input.title.trim().is_empty() || input.description.trim().is_empty() {
            return Err(ReportServiceError::MissingData);
        }

        let now = Utc::now();
        let (reporter_id, reporter_name) = match input.privacy_level {
            PrivacyLevel::Anonymous => (None, None),
            _ => (Some(input.reporter_id), input.reporter_name),
        };

        let report = Report {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            category_id: input.category_id,
            privacy_level: input.privacy_level,
            status: ReportStatus::Pending,
            reporter_id,
            reporter_name,
            vote_score: 0,
            created_at: now,
            updated_at: now,
        };

        let payload = ReportCreatedEvent {
            report_id: report.id.to_string(),
            report_title: report.title.clone(),
            category_id: report.category_id,
            category_name: None,
            reporter_id: report.reporter_id.map(|id| id.to_string()),
            reporter_name: report.reporter_name.clone(),
            privacy_level: report.privacy_level,
            timestamp: now.timestamp(),
        };
        let event = OutboxEvent::new(EventKind::ReportCreated, &payload)
            .context("serialize report.created event")?;

        self.reports.create_with_event(&report, &event).await?;
        Ok(report)
    }
}

// ── UpdateReportStatus ───────────────────────────────────────────────────────

pub struct UpdateReportStatusUseCase<R: ReportRepository> {
    pub reports: R,
}

impl<R: ReportRepository> UpdateReportStatusUseCase<R> {
    /// Update a report's status and enqueue the matching
    /// `report.status.updated` event in the same transaction. The reporter is
    /// included in the event when the report is not anonymous, so the
    /// consumer can notify without a lookup.
    pub async fn execute(
        &self,
        report_id: Uuid,
        new_status: ReportStatus,
    ) -> Result<Report, ReportServiceError> {
        let mut report = self
            .reports
            .find_by_id(report_id)
            .await?
            .ok_or(ReportServiceError::ReportNotFound)?;

        let now = Utc::now();
        let payload = StatusUpdatedEvent {
            report_id: report.id.to_string(),
            report_title: report.title.clone(),
            new_status,
            reporter_id: report.reporter_id.map(|id| id.to_string()),
            timestamp: now.timestamp(),
        };
        let event = OutboxEvent::new(EventKind::StatusUpdated, &payload)
            .context("serialize report.status.updated event")?;

        self.reports
            .update_status_with_event(report_id, new_status, &event)
            .await?;

        report.status = new_status;
        report.updated_at = now;
        Ok(report)
    }
}
