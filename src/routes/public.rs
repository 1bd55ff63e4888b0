use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::public::PublicSnapshot, services::game_service, state::SharedState};

/// Public read-only endpoints that expose the current game state.
pub fn router() -> Router<SharedState> {
    Router::new().route("/public/state", get(get_state))
}

#[utoipa::path(
    get,
    path = "/public/state",
    tag = "public",
    responses((status = 200, description = "Current public snapshot", body = PublicSnapshot))
)]
/// Return the snapshot every player and display sees.
pub async fn get_state(State(state): State<SharedState>) -> Json<PublicSnapshot> {
    Json(game_service::public_snapshot(&state).await)
}
