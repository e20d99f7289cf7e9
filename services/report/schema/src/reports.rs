use sea_orm::entity::prelude::*;

/// Citizen report. Written by the report service; the notification service
/// reads it to resolve a report's reporter.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category_id: i32,
    pub privacy_level: String,
    pub status: String,
    /// Absent for anonymous reports.
    pub reporter_id: Option<Uuid>,
    pub reporter_name: Option<String>,
    pub vote_score: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
