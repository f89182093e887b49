//! Room coordinator. Every command is validated and then applied to the room store as a single
//! atomic transaction; committed changes are pushed to the room's subscribers by
//! [`AppState::run_room_transaction`](crate::state::AppState::run_room_transaction).

use tracing::{debug, info};

use crate::{
    dao::models::RoomRecord,
    dto::{
        room::{
            LeaderboardResponse, PlayerSummary, QuestionStatsResponse, RoomJoinedResponse,
            RoomSnapshot, SubmitAnswersResponse, leaderboard_entries,
        },
        validation::{validate_player_name, validate_room_code},
    },
    error::ServiceError,
    state::{
        RoomState, SharedState,
        codes::{generate_room_code, normalize_room_code},
        room::{Player, PlayerId, Room, Submission, UserAnswers},
        state_machine::RoomStatus,
    },
};

/// Open a new room in the waiting status with the caller as host.
pub async fn create_room(
    state: &SharedState,
    player_name: &str,
    question_count: usize,
) -> Result<RoomJoinedResponse, ServiceError> {
    let name = sanitize_player_name(player_name)?;

    let available = state.question_bank().len();
    if question_count == 0 || question_count > available {
        return Err(ServiceError::InvalidCount {
            requested: question_count,
            available,
        });
    }

    let host = Player::new(name, true);
    let questions = state.question_bank().sample(question_count);
    let config = state.config();

    for attempt in 1..=config.room_code_attempts {
        let code = generate_room_code(config.room_code_length);
        let room = Room::new(code.clone(), host.clone(), questions.clone());

        match state.insert_room(room).await? {
            Some(record) => {
                info!(
                    room_id = %code,
                    player_id = %host.id,
                    question_count,
                    "room created"
                );
                return Ok(joined_response(&record, &host));
            }
            None => debug!(room_id = %code, attempt, "room code already in use"),
        }
    }

    Err(ServiceError::RoomCodesExhausted)
}

/// Add a player to an existing room.
///
/// The room status is not checked: joining a room that already started is accepted here and the
/// client is expected to treat it as an error state.
pub async fn join_room(
    state: &SharedState,
    room_id: &str,
    player_name: &str,
) -> Result<RoomJoinedResponse, ServiceError> {
    let name = sanitize_player_name(player_name)?;
    let room_id = resolve_room_id(state, room_id)?;
    let capacity = state.config().room_capacity;

    let committed = state
        .run_room_transaction(&room_id, |room| {
            if room.players.len() >= capacity {
                return Err(ServiceError::RoomFull {
                    room_id: room.id.clone(),
                    capacity,
                });
            }
            Ok(room.add_player(name.clone()))
        })
        .await?;

    let player = committed.value;
    let record = committed
        .state
        .record()
        .ok_or_else(|| ServiceError::RoomNotFound(room_id.clone()))?;

    info!(
        room_id = %room_id,
        player_id = %player.id,
        players = record.room.players.len(),
        status = ?record.room.status,
        "player joined room"
    );

    Ok(joined_response(record, &player))
}

/// Move a waiting room to in progress on behalf of its host.
///
/// Returns the status after the command. Starting a room that already left the waiting status
/// is a no-op.
pub async fn start_game(
    state: &SharedState,
    room_id: &str,
    player_id: PlayerId,
) -> Result<RoomStatus, ServiceError> {
    let room_id = resolve_room_id(state, room_id)?;

    let committed = state
        .run_room_transaction(&room_id, |room| {
            let caller = find_player(room, &player_id)?;
            if !caller.is_host {
                return Err(ServiceError::NotAuthorized(
                    "only the host can start the game".into(),
                ));
            }
            if room.status != RoomStatus::Waiting {
                return Ok(false);
            }
            room.start()?;
            Ok(true)
        })
        .await?;

    if committed.value {
        info!(room_id = %room_id, player_id = %player_id, "game started");
    } else {
        debug!(room_id = %room_id, "start ignored; game already started");
    }

    Ok(status_of(&committed.state))
}

/// Record the final answers of a player and score the room once everyone submitted.
///
/// Submissions are write-once: a second submission, or one arriving after the room finished,
/// is acknowledged with `accepted: false` and changes nothing.
pub async fn submit_answers(
    state: &SharedState,
    room_id: &str,
    player_id: PlayerId,
    answers: UserAnswers,
) -> Result<SubmitAnswersResponse, ServiceError> {
    let room_id = resolve_room_id(state, room_id)?;

    let committed = state
        .run_room_transaction(&room_id, |room| {
            find_player(room, &player_id)?;
            match room.status {
                RoomStatus::Waiting => Err(ServiceError::GameNotStarted(room.id.clone())),
                RoomStatus::Finished => Ok((false, false)),
                RoomStatus::InProgress => match room.record_answers(player_id, answers.clone()) {
                    Submission::AlreadySubmitted => Ok((false, false)),
                    Submission::Recorded => Ok((true, room.finish_if_complete()?)),
                },
            }
        })
        .await?;

    let (accepted, finished) = committed.value;
    if accepted {
        info!(room_id = %room_id, player_id = %player_id, "answers submitted");
    } else {
        debug!(room_id = %room_id, player_id = %player_id, "duplicate submission ignored");
    }
    if finished {
        log_finished(&committed.state);
    }

    Ok(SubmitAnswersResponse {
        accepted,
        status: status_of(&committed.state),
    })
}

/// Remove a player from a room. Unknown rooms and players are ignored.
///
/// A departing host hands the role to the earliest remaining joiner; the room is deleted once
/// the last player left. If the departure leaves only players who already submitted, the room
/// is scored and finished.
pub async fn leave_room(
    state: &SharedState,
    room_id: &str,
    player_id: PlayerId,
) -> Result<(), ServiceError> {
    let Ok(room_id) = resolve_room_id(state, room_id) else {
        return Ok(());
    };

    let result = state
        .run_room_transaction(&room_id, |room| {
            let Some(removed) = room.remove_player(&player_id) else {
                return Ok(None);
            };
            let finished = room.finish_if_complete()?;
            let new_host = if removed.is_host {
                room.host().map(|host| host.id)
            } else {
                None
            };
            Ok(Some((new_host, finished)))
        })
        .await;

    let committed = match result {
        Ok(committed) => committed,
        Err(ServiceError::RoomNotFound(_)) => {
            debug!(room_id = %room_id, "leave ignored; room not found");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    match committed.value {
        None => debug!(room_id = %room_id, player_id = %player_id, "leave ignored; not a member"),
        Some((new_host, finished)) => {
            info!(room_id = %room_id, player_id = %player_id, "player left room");
            if let Some(host_id) = new_host {
                info!(room_id = %room_id, player_id = %host_id, "host role reassigned");
            }
            if finished {
                log_finished(&committed.state);
            }
        }
    }

    Ok(())
}

/// Current snapshot of a room, or `None` when no such room is live.
pub async fn get_room_snapshot(
    state: &SharedState,
    room_id: &str,
) -> Result<Option<RoomSnapshot>, ServiceError> {
    let Ok(room_id) = resolve_room_id(state, room_id) else {
        return Ok(None);
    };
    let record = state.load_room(&room_id).await?;
    Ok(record.as_ref().map(RoomSnapshot::from))
}

/// Final ranking of a finished room.
pub async fn get_leaderboard(
    state: &SharedState,
    room_id: &str,
) -> Result<LeaderboardResponse, ServiceError> {
    let room_id = resolve_room_id(state, room_id)?;
    let record = state
        .load_room(&room_id)
        .await?
        .ok_or_else(|| ServiceError::RoomNotFound(room_id.clone()))?;

    if record.room.status != RoomStatus::Finished {
        return Err(ServiceError::NotFinished(room_id));
    }

    Ok(LeaderboardResponse {
        room_id,
        total_questions: record.room.questions.len(),
        entries: leaderboard_entries(&record.room),
    })
}

/// Size of the question bank.
pub fn question_stats(state: &SharedState) -> QuestionStatsResponse {
    QuestionStatsResponse {
        total: state.question_bank().len(),
    }
}

fn sanitize_player_name(name: &str) -> Result<String, ServiceError> {
    validate_player_name(name).map_err(|err| {
        ServiceError::Validation(
            err.message
                .map(|message| message.to_string())
                .unwrap_or_else(|| err.code.to_string()),
        )
    })?;
    Ok(name.trim().to_string())
}

/// Normalize a user-typed room code; malformed codes cannot name a live room.
fn resolve_room_id(state: &SharedState, input: &str) -> Result<String, ServiceError> {
    let room_id = normalize_room_code(input);
    validate_room_code(&room_id, state.config().room_code_length)
        .map_err(|_| ServiceError::RoomNotFound(room_id.clone()))?;
    Ok(room_id)
}

fn find_player<'a>(room: &'a Room, player_id: &PlayerId) -> Result<&'a Player, ServiceError> {
    room.players
        .get(player_id)
        .ok_or_else(|| ServiceError::PlayerNotFound {
            room_id: room.id.clone(),
            player_id: player_id.to_string(),
        })
}

fn status_of(state: &RoomState) -> RoomStatus {
    state
        .record()
        .map(|record| record.room.status)
        .unwrap_or(RoomStatus::Finished)
}

fn joined_response(record: &RoomRecord, player: &Player) -> RoomJoinedResponse {
    RoomJoinedResponse {
        room: RoomSnapshot::from(record),
        player: PlayerSummary::from(player),
    }
}

fn log_finished(state: &RoomState) {
    if let Some(record) = state.record() {
        info!(
            room_id = %record.room.id,
            players = record.room.players.len(),
            version = record.version,
            "all answers in; room scored and finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[tokio::test]
    async fn create_rejects_blank_name_and_bad_counts() {
        let state = AppState::in_memory();
        let available = state.question_bank().len();

        assert!(matches!(
            create_room(&state, "   ", 3).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            create_room(&state, "Host", 0).await,
            Err(ServiceError::InvalidCount { requested: 0, .. })
        ));
        assert!(matches!(
            create_room(&state, "Host", available + 1).await,
            Err(ServiceError::InvalidCount { .. })
        ));
        assert_eq!(state.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn create_trims_name_and_marks_host() {
        let state = AppState::in_memory();
        let created = create_room(&state, "  Ada ", 3).await.unwrap();
        assert_eq!(created.player.name, "Ada");
        assert!(created.player.is_host);
        assert_eq!(created.room.status, RoomStatus::Waiting);
        assert_eq!(created.room.questions.len(), 3);
        assert_eq!(created.room.id.len(), state.config().room_code_length);
    }

    #[tokio::test]
    async fn long_player_names_are_accepted() {
        let state = AppState::in_memory();
        let long_name = "A".repeat(33);
        let created = create_room(&state, &long_name, 1).await.unwrap();
        assert_eq!(created.player.name, long_name);

        let joined = join_room(&state, &created.room.id, &"B".repeat(120))
            .await
            .unwrap();
        assert_eq!(joined.player.name.len(), 120);
    }

    #[tokio::test]
    async fn codes_of_wrong_length_are_not_found() {
        let state = AppState::in_memory();
        let created = create_room(&state, "Host", 1).await.unwrap();
        let padded = format!("{}X", created.room.id);

        assert!(matches!(
            join_room(&state, &padded, "Guest").await,
            Err(ServiceError::RoomNotFound(_))
        ));
        assert!(get_room_snapshot(&state, &padded).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn join_accepts_lowercase_code() {
        let state = AppState::in_memory();
        let created = create_room(&state, "Host", 2).await.unwrap();
        let code = format!(" {} ", created.room.id.to_lowercase());

        let joined = join_room(&state, &code, "Guest").await.unwrap();
        assert!(!joined.player.is_host);
        assert_eq!(joined.room.players.len(), 2);
    }

    #[tokio::test]
    async fn only_host_can_start() {
        let state = AppState::in_memory();
        let created = create_room(&state, "Host", 2).await.unwrap();
        let joined = join_room(&state, &created.room.id, "Guest").await.unwrap();

        assert!(matches!(
            start_game(&state, &created.room.id, joined.player.id).await,
            Err(ServiceError::NotAuthorized(_))
        ));
        assert!(matches!(
            start_game(&state, &created.room.id, uuid::Uuid::new_v4()).await,
            Err(ServiceError::PlayerNotFound { .. })
        ));
        assert_eq!(
            start_game(&state, &created.room.id, created.player.id)
                .await
                .unwrap(),
            RoomStatus::InProgress
        );
        // Idempotent.
        assert_eq!(
            start_game(&state, &created.room.id, created.player.id)
                .await
                .unwrap(),
            RoomStatus::InProgress
        );
    }

    #[tokio::test]
    async fn submit_before_start_is_rejected() {
        let state = AppState::in_memory();
        let created = create_room(&state, "Solo", 2).await.unwrap();

        let result =
            submit_answers(&state, &created.room.id, created.player.id, UserAnswers::new()).await;
        assert!(matches!(result, Err(ServiceError::GameNotStarted(_))));

        let snapshot = get_room_snapshot(&state, &created.room.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.status, RoomStatus::Waiting);
        assert!(snapshot.submitted.is_empty());
    }

    #[tokio::test]
    async fn leaderboard_requires_finished_room() {
        let state = AppState::in_memory();
        let created = create_room(&state, "Solo", 2).await.unwrap();
        assert!(matches!(
            get_leaderboard(&state, &created.room.id).await,
            Err(ServiceError::NotFinished(_))
        ));
        assert!(matches!(
            get_leaderboard(&state, "ZZZZ").await,
            Err(ServiceError::RoomNotFound(_))
        ));
    }

    #[tokio::test]
    async fn leave_unknown_room_is_silent() {
        let state = AppState::in_memory();
        leave_room(&state, "ZZZZ", uuid::Uuid::new_v4())
            .await
            .unwrap();
        leave_room(&state, "!!", uuid::Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn departure_of_last_pending_player_finishes_room() {
        let state = AppState::in_memory();
        let created = create_room(&state, "Host", 2).await.unwrap();
        let room_id = created.room.id.clone();
        let guest = join_room(&state, &room_id, "Guest").await.unwrap();
        start_game(&state, &room_id, created.player.id).await.unwrap();

        let response = submit_answers(&state, &room_id, created.player.id, UserAnswers::new())
            .await
            .unwrap();
        assert_eq!(response.status, RoomStatus::InProgress);

        leave_room(&state, &room_id, guest.player.id).await.unwrap();
        let snapshot = get_room_snapshot(&state, &room_id).await.unwrap().unwrap();
        assert_eq!(snapshot.status, RoomStatus::Finished);
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].score, Some(0));
    }
}
