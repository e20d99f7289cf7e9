use sea_orm::entity::prelude::*;

/// Transactional outbox row, written in the same transaction as the domain
/// write that produced the event and drained to the broker by the relay.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "outbox_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub routing_key: String,
    pub payload: Json,
    /// One of `pending`, `published`, `failed`.
    pub status: String,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Set exactly when `status` becomes `published`.
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
