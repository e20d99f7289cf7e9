use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(cityconnect_report_migration::Migrator).await;
}
