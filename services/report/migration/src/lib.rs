use sea_orm_migration::prelude::*;

mod m20260601_000001_create_reports;
mod m20260601_000002_create_outbox_messages;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260601_000001_create_reports::Migration),
            Box::new(m20260601_000002_create_outbox_messages::Migration),
        ]
    }
}
