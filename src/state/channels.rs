use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::dao::models::RoomRecord;

/// Notification pushed to the subscribers of a single room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomUpdate {
    /// Full state of the room right after a committed mutation.
    Snapshot(RoomRecord),
    /// The room was deleted; no further snapshot will follow.
    Gone {
        /// Identifier of the deleted room.
        room_id: String,
    },
}

/// Per-room broadcast hubs delivering [`RoomUpdate`]s to connected client sessions.
pub struct RoomChannels {
    hubs: DashMap<String, RoomHub>,
    capacity: usize,
}

impl RoomChannels {
    /// Build an empty registry whose hubs buffer `capacity` updates each.
    pub fn new(capacity: usize) -> Self {
        Self {
            hubs: DashMap::new(),
            capacity,
        }
    }

    /// Register a new subscriber for `room_id`, creating the hub on first use.
    pub fn subscribe(&self, room_id: &str) -> broadcast::Receiver<RoomUpdate> {
        self.hubs
            .entry(room_id.to_string())
            .or_insert_with(|| RoomHub::new(self.capacity))
            .subscribe()
    }

    /// Push a snapshot to the current subscribers of the room, if any.
    pub fn publish(&self, record: &RoomRecord) {
        if let Some(hub) = self.hubs.get(&record.room.id) {
            hub.broadcast(RoomUpdate::Snapshot(record.clone()));
        }
    }

    /// Tell every subscriber the room is gone and drop its hub.
    pub fn close(&self, room_id: &str) {
        if let Some((_, hub)) = self.hubs.remove(room_id) {
            hub.broadcast(RoomUpdate::Gone {
                room_id: room_id.to_string(),
            });
        }
    }

    /// Drop the hub of a room once its last subscriber disconnected.
    pub fn release(&self, room_id: &str) {
        let removed = self
            .hubs
            .remove_if(room_id, |_, hub| hub.sender.receiver_count() == 0);
        if removed.is_some() {
            debug!(room_id, "released idle room channel");
        }
    }

    /// Number of subscribers currently attached to a room.
    pub fn subscriber_count(&self, room_id: &str) -> usize {
        self.hubs
            .get(room_id)
            .map(|hub| hub.sender.receiver_count())
            .unwrap_or(0)
    }
}

/// Simple broadcast hub wrapper used for a single room.
struct RoomHub {
    sender: broadcast::Sender<RoomUpdate>,
}

impl RoomHub {
    fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    fn subscribe(&self) -> broadcast::Receiver<RoomUpdate> {
        self.sender.subscribe()
    }

    /// Send an update to all current subscribers, ignoring delivery errors.
    fn broadcast(&self, update: RoomUpdate) {
        let _ = self.sender.send(update);
    }
}
