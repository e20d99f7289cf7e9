use sea_orm::Database;
use tokio::sync::watch;
use tracing::info;

use cityconnect_broker::Broker;
use cityconnect_core::config::Config;
use cityconnect_core::shutdown::shutdown_signal;

use cityconnect_report::config::ReportConfig;
use cityconnect_report::infra::broker::BrokerPublisher;
use cityconnect_report::infra::db::DbOutboxRepository;
use cityconnect_report::outbox::relay::OutboxRelay;
use cityconnect_report::router::build_router;
use cityconnect_report::state::AppState;

#[tokio::main]
async fn main() {
    cityconnect_core::tracing::init_tracing();

    let config = ReportConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");
    db.ping().await.expect("database ping failed");

    let broker = Broker::connect(&config.amqp_url)
        .await
        .expect("failed to connect to broker");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let relay = OutboxRelay::new(
        DbOutboxRepository { db: db.clone() },
        BrokerPublisher { broker },
    );
    let relay_task = tokio::spawn(relay.run(shutdown_rx));

    let state = AppState { db };
    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.report_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("report service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // Drain the relay loops before exiting.
    let _ = shutdown_tx.send(true);
    let _ = relay_task.await;
    info!("report service stopped");
}
