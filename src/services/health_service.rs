use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report the player count, degraded when the board store fails its health check.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let players = state.game().lock().await.players().len();

    match state.board_store().health_check().await {
        Ok(()) => HealthResponse::ok(players),
        Err(err) => {
            warn!(error = %err, "board store health check failed");
            HealthResponse::degraded(players)
        }
    }
}
