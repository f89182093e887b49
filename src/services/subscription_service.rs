//! Per-room update streams consumed by client sessions.

use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::{
    dao::models::RoomVersion,
    state::{RoomUpdate, SharedState, codes::normalize_room_code},
};

/// Stream the updates of a room: the current snapshot first, then every committed change.
///
/// Snapshots arrive in commit order and never go back in version. A subscriber that falls
/// behind the channel buffer is resynchronised with a freshly loaded snapshot. The stream ends
/// right after yielding [`RoomUpdate::Gone`].
pub fn room_updates(state: SharedState, room_id: &str) -> impl Stream<Item = RoomUpdate> + use<> {
    let room_id = normalize_room_code(room_id);
    // Subscribe before loading so no commit can slip between the initial read and the feed.
    let mut receiver = state.channels().subscribe(&room_id);

    async_stream::stream! {
        let mut last_version: RoomVersion = 0;

        match state.load_room(&room_id).await {
            Ok(Some(record)) => {
                last_version = record.version;
                yield RoomUpdate::Snapshot(record);
            }
            Ok(None) => {
                drop(receiver);
                state.channels().release(&room_id);
                yield RoomUpdate::Gone { room_id: room_id.clone() };
                return;
            }
            Err(err) => warn!(room_id = %room_id, error = %err, "initial room load failed"),
        }

        loop {
            match receiver.recv().await {
                Ok(RoomUpdate::Snapshot(record)) => {
                    if record.version <= last_version {
                        continue;
                    }
                    last_version = record.version;
                    yield RoomUpdate::Snapshot(record);
                }
                Ok(gone @ RoomUpdate::Gone { .. }) => {
                    yield gone;
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(room_id = %room_id, skipped, "subscriber lagged; reloading room");
                    match state.load_room(&room_id).await {
                        Ok(Some(record)) if record.version > last_version => {
                            last_version = record.version;
                            yield RoomUpdate::Snapshot(record);
                        }
                        Ok(Some(_)) => {}
                        Ok(None) => {
                            yield RoomUpdate::Gone { room_id: room_id.clone() };
                            break;
                        }
                        Err(err) => warn!(room_id = %room_id, error = %err, "room reload failed"),
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }

        debug!(room_id = %room_id, "room update stream finished");
    }
}
