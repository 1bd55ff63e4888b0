//! Host REST operations: request DTOs in, acknowledgement DTOs out.

use crate::{
    dto::{
        admin::{
            ActionResponse, AddPlayerRequest, BoardListResponse, ScoreAdjustmentRequest,
            ScoreUpdateResponse, SelectTileRequest, StartGameRequest,
        },
        public::HostSnapshot,
    },
    error::ServiceError,
    services::game_service,
    state::SharedState,
};

/// Current host snapshot.
pub async fn host_state(state: &SharedState) -> HostSnapshot {
    game_service::host_snapshot(state).await
}

/// Boards the store can load; storage failures are reported.
pub async fn list_boards(state: &SharedState) -> Result<BoardListResponse, ServiceError> {
    let boards = state.board_store().list_boards().await?;
    Ok(BoardListResponse { boards })
}

pub async fn start_game(
    state: &SharedState,
    request: StartGameRequest,
) -> Result<ActionResponse, ServiceError> {
    game_service::start_game(state, request.board).await?;
    Ok(ActionResponse::new("game started"))
}

pub async fn select_tile(
    state: &SharedState,
    request: SelectTileRequest,
) -> Result<ActionResponse, ServiceError> {
    game_service::select_tile(state, request.col, request.row).await?;
    Ok(ActionResponse::new(format!(
        "tile ({}, {}) revealed",
        request.col, request.row
    )))
}

pub async fn mark_correct(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    game_service::mark_correct(state).await?;
    Ok(ActionResponse::new("answer marked correct"))
}

pub async fn mark_wrong(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    game_service::mark_wrong(state).await?;
    Ok(ActionResponse::new("answer marked wrong"))
}

pub async fn skip_tile(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    game_service::skip_tile(state).await?;
    Ok(ActionResponse::new("tile skipped"))
}

pub async fn reset_game(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    game_service::reset_game(state).await?;
    Ok(ActionResponse::new("game reset"))
}

pub async fn add_player(
    state: &SharedState,
    request: AddPlayerRequest,
) -> Result<ActionResponse, ServiceError> {
    let name = game_service::add_player(state, &request.name).await?;
    Ok(ActionResponse::new(format!("player `{name}` added")))
}

pub async fn remove_player(state: &SharedState, name: &str) -> Result<(), ServiceError> {
    game_service::remove_player(state, name).await
}

pub async fn adjust_score(
    state: &SharedState,
    name: &str,
    request: ScoreAdjustmentRequest,
) -> Result<ScoreUpdateResponse, ServiceError> {
    let score = game_service::adjust_score(state, name, request.delta).await?;
    Ok(ScoreUpdateResponse {
        name: name.to_string(),
        score,
    })
}
