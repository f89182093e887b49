use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{self, BoxFuture};

use crate::{
    dao::{
        models::{RoomRecord, RoomVersion, SwapOutcome},
        room_store::RoomStore,
        storage::StorageResult,
    },
    state::room::Room,
};

/// Process-local room store backed by a sharded concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryRoomStore {
    rooms: Arc<DashMap<String, RoomRecord>>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn swap(&self, room_id: &str, expected: RoomVersion, next: Option<Room>) -> SwapOutcome {
        match next {
            Some(room) => {
                let Some(mut record) = self.rooms.get_mut(room_id) else {
                    return SwapOutcome::Missing;
                };
                if record.version != expected {
                    return SwapOutcome::Conflict;
                }
                record.version += 1;
                record.room = room;
                SwapOutcome::Stored(record.version)
            }
            None => {
                if self
                    .rooms
                    .remove_if(room_id, |_, record| record.version == expected)
                    .is_some()
                {
                    SwapOutcome::Deleted
                } else if self.rooms.contains_key(room_id) {
                    SwapOutcome::Conflict
                } else {
                    SwapOutcome::Missing
                }
            }
        }
    }
}

impl RoomStore for MemoryRoomStore {
    fn get(&self, room_id: &str) -> BoxFuture<'static, StorageResult<Option<RoomRecord>>> {
        let record = self.rooms.get(room_id).map(|entry| entry.value().clone());
        Box::pin(future::ready(Ok(record)))
    }

    fn insert(&self, room: Room) -> BoxFuture<'static, StorageResult<bool>> {
        let inserted = match self.rooms.entry(room.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(RoomRecord { room, version: 1 });
                true
            }
        };
        Box::pin(future::ready(Ok(inserted)))
    }

    fn compare_and_swap(
        &self,
        room_id: &str,
        expected: RoomVersion,
        next: Option<Room>,
    ) -> BoxFuture<'static, StorageResult<SwapOutcome>> {
        let outcome = self.swap(room_id, expected, next);
        Box::pin(future::ready(Ok(outcome)))
    }

    fn count(&self) -> BoxFuture<'static, StorageResult<usize>> {
        Box::pin(future::ready(Ok(self.rooms.len())))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }
}
