use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::room::{
        ActionResponse, CreateRoomRequest, JoinRoomRequest, LeaderboardResponse,
        QuestionStatsResponse, RoomJoinedResponse, RoomSnapshot, StartGameRequest,
        SubmitAnswersRequest, SubmitAnswersResponse,
    },
    error::{AppError, ServiceError},
    routes::extract::AppJson,
    services::room_service,
    state::SharedState,
};

/// Routes driving the room lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{id}", get(get_room))
        .route("/rooms/{id}/players", post(join_room))
        .route("/rooms/{id}/players/{player_id}", delete(leave_room))
        .route("/rooms/{id}/start", post(start_game))
        .route("/rooms/{id}/answers", post(submit_answers))
        .route("/rooms/{id}/leaderboard", get(get_leaderboard))
        .route("/questions/stats", get(question_stats))
}

/// Open a room with the caller as host.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = RoomJoinedResponse),
        (status = 400, description = "Malformed body, blank name, or question count out of range")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    AppJson(payload): AppJson<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomJoinedResponse>), AppError> {
    payload.validate()?;
    let response =
        room_service::create_room(&state, &payload.player_name, payload.question_count).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Join an existing room.
#[utoipa::path(
    post,
    path = "/rooms/{id}/players",
    tag = "rooms",
    params(("id" = String, Path, description = "Room code")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Player joined", body = RoomJoinedResponse),
        (status = 400, description = "Malformed body"),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Room is full")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<JoinRoomRequest>,
) -> Result<Json<RoomJoinedResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        room_service::join_room(&state, &id, &payload.player_name).await?,
    ))
}

/// Start the game; only the host may do this.
#[utoipa::path(
    post,
    path = "/rooms/{id}/start",
    tag = "rooms",
    params(("id" = String, Path, description = "Room code")),
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Game started", body = ActionResponse),
        (status = 400, description = "Malformed body"),
        (status = 403, description = "Caller is not the host"),
        (status = 404, description = "Room or player not found")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<StartGameRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let status = room_service::start_game(&state, &id, payload.player_id).await?;
    Ok(Json(ActionResponse {
        message: format!("room is {}", status.as_str()),
    }))
}

/// Submit a player's final answers.
#[utoipa::path(
    post,
    path = "/rooms/{id}/answers",
    tag = "rooms",
    params(("id" = String, Path, description = "Room code")),
    request_body = SubmitAnswersRequest,
    responses(
        (status = 200, description = "Submission processed", body = SubmitAnswersResponse),
        (status = 400, description = "Malformed body"),
        (status = 404, description = "Room or player not found"),
        (status = 409, description = "Game has not started")
    )
)]
pub async fn submit_answers(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<SubmitAnswersRequest>,
) -> Result<Json<SubmitAnswersResponse>, AppError> {
    Ok(Json(
        room_service::submit_answers(&state, &id, payload.player_id, payload.answers).await?,
    ))
}

/// Leave a room. Unknown rooms and players are ignored.
#[utoipa::path(
    delete,
    path = "/rooms/{id}/players/{player_id}",
    tag = "rooms",
    params(
        ("id" = String, Path, description = "Room code"),
        ("player_id" = Uuid, Path, description = "Departing player")
    ),
    responses((status = 200, description = "Player left", body = ActionResponse))
)]
pub async fn leave_room(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(String, Uuid)>,
) -> Result<Json<ActionResponse>, AppError> {
    room_service::leave_room(&state, &id, player_id).await?;
    Ok(Json(ActionResponse {
        message: "left room".into(),
    }))
}

/// Fetch the current snapshot of a room.
#[utoipa::path(
    get,
    path = "/rooms/{id}",
    tag = "rooms",
    params(("id" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Current room snapshot", body = RoomSnapshot),
        (status = 404, description = "Room not found")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let snapshot = room_service::get_room_snapshot(&state, &id)
        .await?
        .ok_or(ServiceError::RoomNotFound(id))?;
    Ok(Json(snapshot))
}

/// Fetch the final ranking of a finished room.
#[utoipa::path(
    get,
    path = "/rooms/{id}/leaderboard",
    tag = "rooms",
    params(("id" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Final ranking", body = LeaderboardResponse),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Room has not finished")
    )
)]
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(room_service::get_leaderboard(&state, &id).await?))
}

/// Report the size of the question bank.
#[utoipa::path(
    get,
    path = "/questions/stats",
    tag = "rooms",
    responses((status = 200, description = "Question bank size", body = QuestionStatsResponse))
)]
pub async fn question_stats(State(state): State<SharedState>) -> Json<QuestionStatsResponse> {
    Json(room_service::question_stats(&state))
}
