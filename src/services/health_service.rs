use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the room store and report how many rooms are live.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let store = state.store();
    if let Err(err) = store.health_check().await {
        warn!(error = %err, "room store health check failed");
        return HealthResponse::degraded();
    }

    match store.count().await {
        Ok(rooms) => HealthResponse::ok(rooms),
        Err(err) => {
            warn!(error = %err, "failed to count live rooms");
            HealthResponse::degraded()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{services::room_service, state::AppState};

    #[tokio::test]
    async fn reports_live_room_count() {
        let state = AppState::in_memory();
        assert_eq!(health_status(&state).await.rooms, Some(0));

        room_service::create_room(&state, "Host", 1).await.unwrap();
        let status = health_status(&state).await;
        assert_eq!(status.status, "ok");
        assert_eq!(status.rooms, Some(1));
    }
}
