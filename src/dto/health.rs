use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of registered players.
    pub players: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(players: usize) -> Self {
        Self {
            status: "ok".to_string(),
            players,
        }
    }

    /// Create a health response indicating the board store is unreachable.
    pub fn degraded(players: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            players,
        }
    }
}
