use serde::{Deserialize, Serialize};

use crate::state::room::Room;

/// Version of a stored room; bumped on every committed write.
pub type RoomVersion = u64;

/// Room state as persisted by a [`RoomStore`](crate::dao::room_store::RoomStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Full room state.
    pub room: Room,
    /// Version of this record, starting at 1 on insertion.
    pub version: RoomVersion,
}

/// Outcome of a compare-and-swap against the room store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The new state was written under the returned version.
    Stored(RoomVersion),
    /// The room was removed from the store.
    Deleted,
    /// Another writer committed first; the caller must reload and retry.
    Conflict,
    /// The room no longer exists.
    Missing,
}
