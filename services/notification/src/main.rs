use sea_orm::Database;
use tokio::sync::watch;
use tracing::info;

use cityconnect_broker::Broker;
use cityconnect_core::config::Config;
use cityconnect_core::shutdown::shutdown_signal;

use cityconnect_notification::config::NotificationConfig;
use cityconnect_notification::consumer::EventConsumer;
use cityconnect_notification::consumer::processor::MessageProcessor;
use cityconnect_notification::consumer::retry::RetryPolicy;
use cityconnect_notification::hub::Hub;
use cityconnect_notification::infra::db::{
    DbNotificationRepository, DbProcessedMessageRepository,
};
use cityconnect_notification::router::build_router;
use cityconnect_notification::state::AppState;

#[tokio::main]
async fn main() {
    cityconnect_core::tracing::init_tracing();

    let config = NotificationConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");
    db.ping().await.expect("database ping failed");

    let broker = Broker::connect(&config.amqp_url)
        .await
        .expect("failed to connect to broker");

    let hub = Hub::start();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer = EventConsumer::new(
        broker,
        MessageProcessor {
            notifications: DbNotificationRepository { db: db.clone() },
            processed: DbProcessedMessageRepository { db: db.clone() },
            hub: hub.clone(),
            retry: RetryPolicy::default(),
        },
    );
    let consumer_task = tokio::spawn(consumer.run(shutdown_rx));

    let state = AppState { db, hub };
    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.notification_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("notification service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // Let in-flight deliveries finish their retry/ack cycle before exiting.
    let _ = shutdown_tx.send(true);
    let _ = consumer_task.await;
    info!("notification service stopped");
}
