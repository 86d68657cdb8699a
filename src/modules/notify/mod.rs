/// Fan-out seam for the real-time transport.
///
/// The core only guarantees that every successful friendship transition
/// and presence change is published here; pushing the event to connected
/// peers is the transport layer's job. Publishing never fails an
/// operation that already committed.
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::modules::friend::schema::FriendshipEntity;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FanoutEvent {
    RequestCreated { friendship_id: Uuid, requester_id: Uuid, receiver_id: Uuid },
    RequestAccepted { friendship_id: Uuid, requester_id: Uuid, receiver_id: Uuid },
    RequestDeclined { friendship_id: Uuid, requester_id: Uuid, receiver_id: Uuid },
    RequestCanceled { friendship_id: Uuid, requester_id: Uuid, receiver_id: Uuid },
    FriendRemoved { friendship_id: Uuid, requester_id: Uuid, receiver_id: Uuid },
    PresenceChanged { user_id: Uuid, is_online: bool },
}

impl FanoutEvent {
    pub fn request_created(f: &FriendshipEntity) -> Self {
        Self::RequestCreated {
            friendship_id: f.id,
            requester_id: f.requester_id,
            receiver_id: f.receiver_id,
        }
    }

    pub fn request_accepted(f: &FriendshipEntity) -> Self {
        Self::RequestAccepted {
            friendship_id: f.id,
            requester_id: f.requester_id,
            receiver_id: f.receiver_id,
        }
    }

    pub fn request_declined(f: &FriendshipEntity) -> Self {
        Self::RequestDeclined {
            friendship_id: f.id,
            requester_id: f.requester_id,
            receiver_id: f.receiver_id,
        }
    }

    pub fn request_canceled(f: &FriendshipEntity) -> Self {
        Self::RequestCanceled {
            friendship_id: f.id,
            requester_id: f.requester_id,
            receiver_id: f.receiver_id,
        }
    }

    pub fn friend_removed(f: &FriendshipEntity) -> Self {
        Self::FriendRemoved {
            friendship_id: f.id,
            requester_id: f.requester_id,
            receiver_id: f.receiver_id,
        }
    }

    /// The identities a transport should push this event to.
    #[allow(dead_code)]
    pub fn audience(&self) -> Vec<Uuid> {
        match *self {
            FanoutEvent::RequestCreated { requester_id, receiver_id, .. }
            | FanoutEvent::RequestAccepted { requester_id, receiver_id, .. }
            | FanoutEvent::RequestDeclined { requester_id, receiver_id, .. }
            | FanoutEvent::RequestCanceled { requester_id, receiver_id, .. }
            | FanoutEvent::FriendRemoved { requester_id, receiver_id, .. } => {
                vec![requester_id, receiver_id]
            }
            FanoutEvent::PresenceChanged { user_id, .. } => vec![user_id],
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: FanoutEvent);
}

/// Broadcast-channel sink. A websocket (or any other) transport holds a
/// `subscribe()` receiver and fans events out to its connections.
pub struct BroadcastSink {
    tx: broadcast::Sender<FanoutEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    #[allow(dead_code)]
    pub fn subscribe(&self) -> broadcast::Receiver<FanoutEvent> {
        self.tx.subscribe()
    }
}

impl NotificationSink for BroadcastSink {
    fn publish(&self, event: FanoutEvent) {
        // send only fails when nobody is subscribed; the transition itself
        // already committed
        if self.tx.send(event).is_err() {
            log::debug!("fan-out event dropped: no subscribers");
        }
    }
}
