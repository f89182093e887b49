use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::ServerEvent,
    services::{room_service, subscription_service},
    state::{SharedState, codes::normalize_room_code, room::PlayerId},
};

/// Identifies who is listening so teardown can perform the matching bookkeeping.
#[derive(Clone, Copy, Debug)]
pub enum Listener {
    /// Read-only observer; disconnecting has no effect on the room.
    Observer,
    /// A participating player; disconnecting counts as leaving the room.
    Player(PlayerId),
}

/// Convert a room's update stream into an SSE response, forwarding events and cleaning up
/// once the client disconnects.
pub fn room_sse_stream(
    state: SharedState,
    room_id: &str,
    listener: Listener,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    let room_id = normalize_room_code(room_id);
    let keep_alive = state.config().keep_alive();
    let updates = subscription_service::room_updates(state.clone(), &room_id);

    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads room updates and pushes them into mpsc
    tokio::spawn(async move {
        let mut updates = Box::pin(updates);
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                next = updates.next() => {
                    let Some(update) = next else { break };
                    let payload = match ServerEvent::from_update(&update) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(room_id = %room_id, error = %err, "failed to serialize room update");
                            continue;
                        }
                    };

                    let mut event = Event::default().data(payload.data);
                    if let Some(name) = payload.event {
                        event = event.event(name);
                    }

                    if tx.send(Ok(event)).await.is_err() {
                        break;
                    }
                }
            }
        }

        drop(updates);
        let remaining = state.channels().subscriber_count(&room_id);
        if remaining == 0 {
            state.channels().release(&room_id);
        } else {
            debug!(room_id = %room_id, remaining, "room channel still has subscribers");
        }

        match listener {
            Listener::Observer => info!(room_id = %room_id, "room observer disconnected"),
            Listener::Player(player_id) => {
                info!(room_id = %room_id, player_id = %player_id, "player stream disconnected");
                if let Err(err) = room_service::leave_room(&state, &room_id, player_id).await {
                    warn!(
                        room_id = %room_id,
                        player_id = %player_id,
                        error = %err,
                        "failed to remove disconnected player"
                    );
                }
            }
        }
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(KeepAlive::new().interval(keep_alive).text("keep-alive"))
}
