use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    services::sse_service::{self, Listener},
    state::SharedState,
};

/// Optional identity of the subscriber.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreamQuery {
    /// When set, closing the stream removes this player from the room.
    pub player_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/rooms/{id}/events",
    tag = "sse",
    params(("id" = String, Path, description = "Room code"), StreamQuery),
    responses((status = 200, description = "Room snapshot stream", content_type = "text/event-stream", body = String))
)]
/// Stream every committed snapshot of a room, starting with the current one.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let listener = match query.player_id {
        Some(player_id) => Listener::Player(player_id),
        None => Listener::Observer,
    };
    info!(room_id = %id, listener = ?listener, "new room SSE connection");
    sse_service::room_sse_stream(state, &id, listener)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms/{id}/events", get(room_stream))
}
