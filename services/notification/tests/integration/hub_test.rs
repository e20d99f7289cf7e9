use std::time::Duration;

use uuid::Uuid;

use cityconnect_domain::report::ReportStatus;
use cityconnect_notification::domain::types::Notification;
use cityconnect_notification::hub::{Hub, SUBSCRIBER_BUFFER};

fn notification_for(user_id: Uuid, tag: usize) -> Notification {
    Notification::status_update(
        user_id,
        Uuid::new_v4(),
        &format!("laporan-{tag}"),
        ReportStatus::Accepted,
    )
}

#[tokio::test]
async fn should_deliver_broadcast_to_registered_subscriber() {
    let hub = Hub::start();
    let user = Uuid::new_v4();
    let mut subscription = hub.subscribe(user).await;

    hub.broadcast(notification_for(user, 1)).await;

    let received = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
        .await
        .expect("delivery expected")
        .expect("subscription open");
    assert_eq!(received.user_id, user);
    assert!(received.message.contains("laporan-1"));
}

#[tokio::test(start_paused = true)]
async fn should_not_deliver_to_other_users() {
    let hub = Hub::start();
    let mut subscription = hub.subscribe(Uuid::new_v4()).await;

    hub.broadcast(notification_for(Uuid::new_v4(), 1)).await;

    assert!(
        tokio::time::timeout(Duration::from_millis(100), subscription.recv())
            .await
            .is_err(),
        "subscriber of another user must not receive the push"
    );
}

#[tokio::test(start_paused = true)]
async fn should_cap_undrained_subscriber_at_buffer_size() {
    let hub = Hub::start();
    let user = Uuid::new_v4();
    let mut subscription = hub.subscribe(user).await;

    // Never drained while 20 pushes arrive: ten buffer, ten drop.
    for tag in 0..20 {
        hub.broadcast(notification_for(user, tag)).await;
    }

    let mut received = Vec::new();
    while let Ok(Some(notification)) =
        tokio::time::timeout(Duration::from_millis(100), subscription.recv()).await
    {
        received.push(notification);
    }

    assert_eq!(received.len(), SUBSCRIBER_BUFFER);
    // Oldest-first: the drops were the latest pushes, not the buffered ones.
    assert!(received[0].message.contains("laporan-0"));
    assert!(received[9].message.contains("laporan-9"));
}

#[tokio::test]
async fn should_isolate_overflowing_subscriber_from_healthy_one() {
    let hub = Hub::start();
    let user = Uuid::new_v4();
    let mut draining = hub.subscribe(user).await;
    let mut undrained = hub.subscribe(user).await;

    for tag in 0..15 {
        hub.broadcast(notification_for(user, tag)).await;
        // Draining between pushes keeps this subscriber's outbox empty.
        let received = tokio::time::timeout(Duration::from_secs(1), draining.recv())
            .await
            .expect("delivery expected")
            .expect("subscription open");
        assert!(received.message.contains(&format!("laporan-{tag}")));
    }

    let mut undrained_count = 0;
    while tokio::time::timeout(Duration::from_millis(100), undrained.recv())
        .await
        .ok()
        .flatten()
        .is_some()
    {
        undrained_count += 1;
    }
    assert_eq!(undrained_count, SUBSCRIBER_BUFFER);
}

#[tokio::test]
async fn should_unregister_on_subscription_drop() {
    let hub = Hub::start();
    let user = Uuid::new_v4();

    let subscription = hub.subscribe(user).await;
    drop(subscription);

    // The map entry is cleaned up; a fresh subscription still works.
    let mut replacement = hub.subscribe(user).await;
    hub.broadcast(notification_for(user, 1)).await;

    let received = tokio::time::timeout(Duration::from_secs(1), replacement.recv())
        .await
        .expect("delivery expected")
        .expect("subscription open");
    assert_eq!(received.user_id, user);
}

#[tokio::test]
async fn should_deliver_to_every_subscriber_of_a_user() {
    let hub = Hub::start();
    let user = Uuid::new_v4();
    let mut first = hub.subscribe(user).await;
    let mut second = hub.subscribe(user).await;

    hub.broadcast(notification_for(user, 1)).await;

    for subscription in [&mut first, &mut second] {
        let received = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
            .await
            .expect("delivery expected")
            .expect("subscription open");
        assert_eq!(received.user_id, user);
    }
}
