use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the quiz room backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::join_room,
        crate::routes::rooms::start_game,
        crate::routes::rooms::submit_answers,
        crate::routes::rooms::leave_room,
        crate::routes::rooms::get_room,
        crate::routes::rooms::get_leaderboard,
        crate::routes::rooms::question_stats,
        crate::routes::sse::room_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::StartGameRequest,
            crate::dto::room::SubmitAnswersRequest,
            crate::dto::room::RoomJoinedResponse,
            crate::dto::room::SubmitAnswersResponse,
            crate::dto::room::ActionResponse,
            crate::dto::room::QuestionStatsResponse,
            crate::dto::room::RoomSnapshot,
            crate::dto::room::PlayerSummary,
            crate::dto::room::QuestionView,
            crate::dto::room::PlayerAnswers,
            crate::dto::room::LeaderboardEntry,
            crate::dto::room::LeaderboardResponse,
            crate::dto::sse::RoomGoneEvent,
            crate::state::state_machine::RoomStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room lifecycle commands and queries"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
