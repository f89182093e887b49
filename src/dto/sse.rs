use serde::Serialize;
use utoipa::ToSchema;

use crate::{dao::models::RoomRecord, dto::room::RoomSnapshot, state::RoomUpdate};

/// SSE event name carrying a [`RoomSnapshot`].
pub const EVENT_ROOM_SNAPSHOT: &str = "room.snapshot";
/// SSE event name carrying a [`RoomGoneEvent`]; always the last event of a stream.
pub const EVENT_ROOM_GONE: &str = "room.gone";

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Encode a room update as the matching SSE event.
    pub fn from_update(update: &RoomUpdate) -> serde_json::Result<Self> {
        match update {
            RoomUpdate::Snapshot(record) => Self::snapshot(record),
            RoomUpdate::Gone { room_id } => Self::json(
                Some(EVENT_ROOM_GONE.to_string()),
                &RoomGoneEvent {
                    room_id: room_id.clone(),
                },
            ),
        }
    }

    fn snapshot(record: &RoomRecord) -> serde_json::Result<Self> {
        Self::json(
            Some(EVENT_ROOM_SNAPSHOT.to_string()),
            &RoomSnapshot::from(record),
        )
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a room has been deleted while clients were subscribed.
pub struct RoomGoneEvent {
    pub room_id: String,
}
