use std::time::Duration;

use uuid::Uuid;

use cityconnect_domain::event::{EventKind, ReportCreatedEvent};
use cityconnect_domain::report::PrivacyLevel;
use cityconnect_notification::consumer::processor::{Disposition, MessageProcessor};
use cityconnect_notification::consumer::retry::RetryPolicy;
use cityconnect_notification::hub::Hub;

use crate::helpers::{MockNotificationRepo, MockProcessedRepo, status_payload, vote_payload};

fn processor(
    notifications: MockNotificationRepo,
    processed: MockProcessedRepo,
) -> MessageProcessor<MockNotificationRepo, MockProcessedRepo> {
    MessageProcessor {
        notifications,
        processed,
        hub: Hub::start(),
        retry: RetryPolicy::default(),
    }
}

#[tokio::test]
async fn should_create_notification_and_push_on_status_update() {
    let reporter = Uuid::new_v4();
    let report_id = Uuid::new_v4();

    let notifications = MockNotificationRepo::default();
    let created = notifications.created_handle();
    let processed = MockProcessedRepo::default();
    let processed_ids = processed.processed_handle();

    let processor = processor(notifications, processed);
    let mut subscription = processor.hub.subscribe(reporter).await;

    let disposition = processor
        .process(
            EventKind::StatusUpdated,
            "msg-1",
            &status_payload(report_id, Some(reporter)),
        )
        .await;
    assert_eq!(disposition, Disposition::Ack);

    let created = created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].user_id, reporter);
    assert_eq!(created[0].title, "Status Laporan Diperbarui");
    assert!(created[0].message.contains("Jalan berlubang"));
    assert!(created[0].message.contains("accepted"));
    drop(created);

    assert!(processed_ids.lock().unwrap().contains("msg-1"));

    // The live copy arrives on the subscriber's outbox.
    let pushed = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
        .await
        .expect("push should arrive")
        .expect("subscription open");
    assert_eq!(pushed.user_id, reporter);
    assert_eq!(pushed.title, "Status Laporan Diperbarui");
}

#[tokio::test]
async fn should_skip_duplicate_delivery_without_side_effects() {
    let reporter = Uuid::new_v4();

    let notifications = MockNotificationRepo::default();
    let created = notifications.created_handle();
    let processed = MockProcessedRepo::with(["msg-dup"]);

    let processor = processor(notifications, processed);
    let disposition = processor
        .process(
            EventKind::StatusUpdated,
            "msg-dup",
            &status_payload(Uuid::new_v4(), Some(reporter)),
        )
        .await;

    assert_eq!(disposition, Disposition::Ack);
    assert!(created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_process_once_when_delivered_twice_with_same_message_id() {
    let reporter = Uuid::new_v4();
    let payload = status_payload(Uuid::new_v4(), Some(reporter));

    let notifications = MockNotificationRepo::default();
    let created = notifications.created_handle();
    let processed = MockProcessedRepo::default();
    let processed_ids = processed.processed_handle();

    let processor = processor(notifications, processed);
    let first = processor
        .process(EventKind::StatusUpdated, "msg-2", &payload)
        .await;
    let second = processor
        .process(EventKind::StatusUpdated, "msg-2", &payload)
        .await;

    assert_eq!(first, Disposition::Ack);
    assert_eq!(second, Disposition::Ack);
    assert_eq!(created.lock().unwrap().len(), 1);
    assert_eq!(processed_ids.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_ack_poison_payload_without_side_effects() {
    let notifications = MockNotificationRepo::default();
    let created = notifications.created_handle();
    let processed = MockProcessedRepo::default();
    let processed_ids = processed.processed_handle();

    let processor = processor(notifications, processed);
    let disposition = processor
        .process(
            EventKind::StatusUpdated,
            "msg-3",
            br#"{"not":"json-for-this-schema"}"#,
        )
        .await;

    // Poison is acked and discarded, never dead-lettered.
    assert_eq!(disposition, Disposition::Ack);
    assert!(created.lock().unwrap().is_empty());
    assert!(processed_ids.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_ack_malformed_report_id_as_poison() {
    let reporter = Uuid::new_v4();
    let payload = serde_json::to_vec(&serde_json::json!({
        "report_id": "not-a-uuid",
        "report_title": "t",
        "new_status": "accepted",
        "reporter_id": reporter.to_string(),
        "timestamp": 0,
    }))
    .unwrap();

    let notifications = MockNotificationRepo::default();
    let created = notifications.created_handle();

    let processor = processor(notifications, MockProcessedRepo::default());
    let disposition = processor
        .process(EventKind::StatusUpdated, "msg-4", &payload)
        .await;

    assert_eq!(disposition, Disposition::Ack);
    assert!(created.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn should_retry_transient_failures_with_backoff_then_succeed() {
    let reporter = Uuid::new_v4();

    // First two create attempts fail, the third succeeds.
    let notifications = MockNotificationRepo::failing_times(2);
    let created = notifications.created_handle();
    let processed = MockProcessedRepo::default();
    let processed_ids = processed.processed_handle();

    let processor = processor(notifications, processed);
    let started = tokio::time::Instant::now();
    let disposition = processor
        .process(
            EventKind::StatusUpdated,
            "msg-5",
            &status_payload(Uuid::new_v4(), Some(reporter)),
        )
        .await;
    let elapsed = started.elapsed();

    assert_eq!(disposition, Disposition::Ack);
    assert_eq!(created.lock().unwrap().len(), 1);
    assert!(processed_ids.lock().unwrap().contains("msg-5"));
    // 1s after the first failure, 2s after the second.
    assert!(
        elapsed >= Duration::from_secs(3),
        "expected backoff of at least 3s, got {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn should_dead_letter_after_exhausted_retries() {
    let reporter = Uuid::new_v4();

    let notifications = MockNotificationRepo::failing_times(3);
    let created = notifications.created_handle();
    let processed = MockProcessedRepo::default();
    let processed_ids = processed.processed_handle();

    let processor = processor(notifications, processed);
    let disposition = processor
        .process(
            EventKind::StatusUpdated,
            "msg-6",
            &status_payload(Uuid::new_v4(), Some(reporter)),
        )
        .await;

    assert_eq!(disposition, Disposition::DeadLetter);
    assert!(created.lock().unwrap().is_empty());
    // An unprocessed message stays unrecorded so a redelivery can succeed.
    assert!(processed_ids.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn should_suppress_self_votes() {
    let voter = Uuid::new_v4();

    let notifications = MockNotificationRepo::default();
    let created = notifications.created_handle();

    let processor = processor(notifications, MockProcessedRepo::default());
    let mut subscription = processor.hub.subscribe(voter).await;

    let voter_str = voter.to_string();
    let disposition = processor
        .process(
            EventKind::VoteReceived,
            "msg-7",
            &vote_payload(Uuid::new_v4(), &voter_str, &voter_str),
        )
        .await;

    assert_eq!(disposition, Disposition::Ack);
    assert!(created.lock().unwrap().is_empty());
    assert!(
        tokio::time::timeout(Duration::from_millis(100), subscription.recv())
            .await
            .is_err(),
        "no push expected for a self-vote"
    );
}

#[tokio::test]
async fn should_notify_reporter_on_foreign_vote() {
    let reporter = Uuid::new_v4();
    let voter = Uuid::new_v4();

    let notifications = MockNotificationRepo::default();
    let created = notifications.created_handle();

    let processor = processor(notifications, MockProcessedRepo::default());
    let mut subscription = processor.hub.subscribe(reporter).await;

    let disposition = processor
        .process(
            EventKind::VoteReceived,
            "msg-8",
            &vote_payload(Uuid::new_v4(), &reporter.to_string(), &voter.to_string()),
        )
        .await;

    assert_eq!(disposition, Disposition::Ack);
    let created = created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "Laporan Mendapat upvote");
    assert!(created[0].message.contains("Skor: 2"));
    drop(created);

    let pushed = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
        .await
        .expect("push should arrive")
        .expect("subscription open");
    assert_eq!(pushed.user_id, reporter);
}

#[tokio::test]
async fn should_derive_reporter_from_report_when_event_names_none() {
    let derived = Uuid::new_v4();

    let notifications = MockNotificationRepo::with_derived_reporter(derived);
    let created = notifications.created_handle();

    let processor = processor(notifications, MockProcessedRepo::default());
    let mut subscription = processor.hub.subscribe(derived).await;

    let disposition = processor
        .process(
            EventKind::StatusUpdated,
            "msg-9",
            &status_payload(Uuid::new_v4(), None),
        )
        .await;

    assert_eq!(disposition, Disposition::Ack);
    assert_eq!(created.lock().unwrap().len(), 1);

    let pushed = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
        .await
        .expect("push should arrive")
        .expect("subscription open");
    assert_eq!(pushed.user_id, derived);
}

#[tokio::test]
async fn should_ack_report_created_without_notifying() {
    let payload = serde_json::to_vec(&ReportCreatedEvent {
        report_id: Uuid::new_v4().to_string(),
        report_title: "Lampu jalan mati".to_owned(),
        category_id: 1,
        category_name: None,
        reporter_id: Some(Uuid::new_v4().to_string()),
        reporter_name: Some("Budi".to_owned()),
        privacy_level: PrivacyLevel::Public,
        timestamp: 0,
    })
    .unwrap();

    let notifications = MockNotificationRepo::default();
    let created = notifications.created_handle();
    let processed = MockProcessedRepo::default();
    let processed_ids = processed.processed_handle();

    let processor = processor(notifications, processed);
    let disposition = processor
        .process(EventKind::ReportCreated, "msg-10", &payload)
        .await;

    assert_eq!(disposition, Disposition::Ack);
    assert!(created.lock().unwrap().is_empty());
    assert!(processed_ids.lock().unwrap().contains("msg-10"));
}

#[tokio::test]
async fn should_continue_processing_when_idempotency_lookup_fails() {
    let reporter = Uuid::new_v4();

    let notifications = MockNotificationRepo::default();
    let created = notifications.created_handle();
    let processed = MockProcessedRepo {
        fail_lookup: true,
        ..Default::default()
    };

    let processor = processor(notifications, processed);
    let disposition = processor
        .process(
            EventKind::StatusUpdated,
            "msg-11",
            &status_payload(Uuid::new_v4(), Some(reporter)),
        )
        .await;

    // A failed duplicate check must not lose the message.
    assert_eq!(disposition, Disposition::Ack);
    assert_eq!(created.lock().unwrap().len(), 1);
}
