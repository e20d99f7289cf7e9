//! Live push hub: fans notifications in from the event consumer and out to
//! long-lived per-user subscriber streams.
//!
//! The hub is an event loop owning a `user_id → subscribers` map. All state
//! is touched only inside the loop task; the rest of the process reaches it
//! through the three channels behind [`HubHandle`]. Delivery is best-effort —
//! a subscriber with a full outbox loses the push, the durable copy in the
//! notifications table does not.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::types::Notification;

/// Per-subscriber outbox capacity; pushes beyond it are dropped.
pub const SUBSCRIBER_BUFFER: usize = 10;

/// Hub inbox capacity; a producer outrunning the hub blocks here, which is
/// acceptable backpressure because the producer is the event consumer,
/// already rate-limited by broker prefetch.
const BROADCAST_BUFFER: usize = 100;

const REGISTER_BUFFER: usize = 16;

struct Subscriber {
    id: Uuid,
    user_id: Uuid,
    outbox: mpsc::Sender<Notification>,
}

struct Unregister {
    user_id: Uuid,
    subscriber_id: Uuid,
}

/// Cloneable handle to a running hub.
#[derive(Clone)]
pub struct HubHandle {
    register_tx: mpsc::Sender<Subscriber>,
    unregister_tx: mpsc::UnboundedSender<Unregister>,
    broadcast_tx: mpsc::Sender<Notification>,
}

impl HubHandle {
    /// Attach a live stream for `user_id`. Dropping the returned
    /// [`Subscription`] unregisters it, so a closed HTTP stream always
    /// cleans up after itself.
    pub async fn subscribe(&self, user_id: Uuid) -> Subscription {
        let (outbox, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);
        let subscriber_id = Uuid::new_v4();
        let _ = self
            .register_tx
            .send(Subscriber {
                id: subscriber_id,
                user_id,
                outbox,
            })
            .await;
        Subscription {
            user_id,
            receiver,
            _guard: UnregisterGuard {
                user_id,
                subscriber_id,
                unregister_tx: self.unregister_tx.clone(),
            },
        }
    }

    /// Deliver `notification` to every live subscriber of its user.
    pub async fn broadcast(&self, notification: Notification) {
        let _ = self.broadcast_tx.send(notification).await;
    }
}

/// A registered live stream; yields pushes until dropped.
pub struct Subscription {
    pub user_id: Uuid,
    receiver: mpsc::Receiver<Notification>,
    _guard: UnregisterGuard,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<Notification> {
        self.receiver.recv().await
    }
}

struct UnregisterGuard {
    user_id: Uuid,
    subscriber_id: Uuid,
    unregister_tx: mpsc::UnboundedSender<Unregister>,
}

impl Drop for UnregisterGuard {
    fn drop(&mut self) {
        let _ = self.unregister_tx.send(Unregister {
            user_id: self.user_id,
            subscriber_id: self.subscriber_id,
        });
    }
}

pub struct Hub {
    subscribers: HashMap<Uuid, Vec<Subscriber>>,
    register_rx: mpsc::Receiver<Subscriber>,
    unregister_rx: mpsc::UnboundedReceiver<Unregister>,
    broadcast_rx: mpsc::Receiver<Notification>,
}

impl Hub {
    /// Spawn the hub event loop and return its handle. The loop exits once
    /// every handle clone is gone.
    pub fn start() -> HubHandle {
        let (register_tx, register_rx) = mpsc::channel(REGISTER_BUFFER);
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, broadcast_rx) = mpsc::channel(BROADCAST_BUFFER);

        let hub = Hub {
            subscribers: HashMap::new(),
            register_rx,
            unregister_rx,
            broadcast_rx,
        };
        tokio::spawn(hub.run());

        HubHandle {
            register_tx,
            unregister_tx,
            broadcast_tx,
        }
    }

    async fn run(mut self) {
        loop {
            // Biased: registrations and unregistrations drain before pushes,
            // so a subscriber attached before a broadcast never misses it.
            tokio::select! {
                biased;

                Some(subscriber) = self.register_rx.recv() => {
                    debug!(user_id = %subscriber.user_id, "subscriber registered");
                    self.subscribers
                        .entry(subscriber.user_id)
                        .or_default()
                        .push(subscriber);
                }
                Some(unregister) = self.unregister_rx.recv() => {
                    self.remove(unregister);
                }
                Some(notification) = self.broadcast_rx.recv() => {
                    self.route(&notification);
                }
                else => {
                    info!("hub channels closed, stopping");
                    return;
                }
            }
        }
    }

    fn remove(&mut self, unregister: Unregister) {
        if let Some(list) = self.subscribers.get_mut(&unregister.user_id) {
            // Dropping the subscriber drops its sender, closing the outbox.
            list.retain(|subscriber| subscriber.id != unregister.subscriber_id);
            if list.is_empty() {
                self.subscribers.remove(&unregister.user_id);
            }
            debug!(user_id = %unregister.user_id, "subscriber unregistered");
        }
    }

    fn route(&self, notification: &Notification) {
        let Some(list) = self.subscribers.get(&notification.user_id) else {
            return;
        };
        for subscriber in list {
            // Non-blocking: a slow subscriber loses this push, never the
            // other subscribers.
            if subscriber.outbox.try_send(notification.clone()).is_err() {
                debug!(user_id = %notification.user_id, "subscriber outbox full, push dropped");
            }
        }
    }
}
