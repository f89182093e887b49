use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of live rooms, when the store could be queried.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rooms: Option<usize>,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(rooms: usize) -> Self {
        Self {
            status: "ok".to_string(),
            rooms: Some(rooms),
        }
    }

    /// Create a health response indicating the room store cannot be reached.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
            rooms: None,
        }
    }
}
