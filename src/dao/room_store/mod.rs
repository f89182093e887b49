mod memory;

pub use self::memory::MemoryRoomStore;

use futures::future::BoxFuture;

use crate::dao::models::{RoomRecord, RoomVersion, SwapOutcome};
use crate::dao::storage::StorageResult;
use crate::state::room::Room;

/// Abstraction over the persistence layer holding live rooms.
///
/// Implementations must make `insert` and `compare_and_swap` atomic per room id so the
/// coordinator can run optimistic read-modify-write cycles against any key-value backend.
pub trait RoomStore: Send + Sync {
    /// Load the current record for `room_id`.
    fn get(&self, room_id: &str) -> BoxFuture<'static, StorageResult<Option<RoomRecord>>>;
    /// Insert a brand-new room; returns `false` when the id is already taken.
    fn insert(&self, room: Room) -> BoxFuture<'static, StorageResult<bool>>;
    /// Replace (`Some`) or delete (`None`) the room if its version still equals `expected`.
    fn compare_and_swap(
        &self,
        room_id: &str,
        expected: RoomVersion,
        next: Option<Room>,
    ) -> BoxFuture<'static, StorageResult<SwapOutcome>>;
    /// Number of live rooms.
    fn count(&self) -> BoxFuture<'static, StorageResult<usize>>;
    /// Verify the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
