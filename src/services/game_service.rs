//! Commands driving the live session, shared by the WebSocket and host REST surfaces.

use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    dto::public::{HostSnapshot, PublicSnapshot},
    error::ServiceError,
    services::broadcast::broadcast_state,
    state::{
        SharedState,
        board::TilePosition,
        game::{BuzzOutcome, TimerEvent},
        players::{ConnectionId, JoinOutcome},
        transitions::run_with_broadcast,
    },
};

/// Join (or reconnect) the player bound to `connection`, returning the registered name.
pub async fn join(
    state: &SharedState,
    connection: ConnectionId,
    name: &str,
) -> Result<String, ServiceError> {
    let (name, outcome) =
        run_with_broadcast(state, "player:join", |session| session.join(name, connection)).await?;
    match outcome {
        JoinOutcome::Created => info!(%connection, player = %name, "player joined"),
        JoinOutcome::Reconnected => info!(%connection, player = %name, "player reconnected"),
    }
    Ok(name)
}

/// Check `secret` and grant host privileges to `connection`.
pub fn authenticate_host(
    state: &SharedState,
    connection: ConnectionId,
    secret: &str,
) -> Result<(), ServiceError> {
    if !state.verify_host_secret(secret) {
        warn!(%connection, "host authentication failed");
        return Err(ServiceError::Unauthorized("invalid host secret".into()));
    }
    state.promote_host(connection);
    info!(%connection, "host authenticated");
    Ok(())
}

/// Record a buzz from the player bound to `connection`.
///
/// Buzzes are buffered until the window closes, so nothing is broadcast here.
pub async fn buzz(
    state: &SharedState,
    connection: ConnectionId,
    received_at: Instant,
) -> Result<BuzzOutcome, ServiceError> {
    let mut session = state.game().lock().await;
    match session.buzz(connection, received_at) {
        Ok(outcome) => {
            debug!(%connection, ?outcome, "buzz accepted");
            Ok(outcome)
        }
        Err(err) => {
            debug!(%connection, error = %err, "buzz rejected");
            Err(err.into())
        }
    }
}

/// Load a board and leave the lobby. Without `board`, the last used board is started.
pub async fn start_game(state: &SharedState, board: Option<String>) -> Result<(), ServiceError> {
    let board_id = match board {
        Some(board) => board,
        None => state.game().lock().await.board_id().to_string(),
    };
    let entity = state
        .board_store()
        .load_board(&board_id)
        .await
        .inspect_err(|err| warn!(board = %board_id, error = %err, "failed to load board"))?;

    run_with_broadcast(state, "host:start", |session| {
        session.start(&board_id, entity)
    })
    .await
}

/// Reveal the clue at (`col`, `row`).
pub async fn select_tile(state: &SharedState, col: usize, row: usize) -> Result<(), ServiceError> {
    run_with_broadcast(state, "host:select_tile", |session| {
        session.select_tile(TilePosition::new(col, row))
    })
    .await
}

/// Judge the current answer as correct.
pub async fn mark_correct(state: &SharedState) -> Result<(), ServiceError> {
    run_with_broadcast(state, "host:correct", |session| session.mark_correct()).await
}

/// Judge the current answer as wrong.
pub async fn mark_wrong(state: &SharedState) -> Result<(), ServiceError> {
    run_with_broadcast(state, "host:wrong", |session| session.mark_wrong()).await
}

/// Close the tile in play without scoring.
pub async fn skip_tile(state: &SharedState) -> Result<(), ServiceError> {
    run_with_broadcast(state, "host:skip", |session| session.skip_tile()).await
}

/// Return to the lobby with zeroed scores.
pub async fn reset_game(state: &SharedState) -> Result<(), ServiceError> {
    run_with_broadcast(state, "host:reset", |session| session.reset()).await
}

/// Register a player on behalf of the host.
pub async fn add_player(state: &SharedState, name: &str) -> Result<String, ServiceError> {
    let name =
        run_with_broadcast(state, "host:add_player", |session| session.add_player_by_host(name))
            .await?;
    info!(player = %name, "player added by host");
    Ok(name)
}

/// Delete a player and its score.
pub async fn remove_player(state: &SharedState, name: &str) -> Result<(), ServiceError> {
    let removed =
        run_with_broadcast(state, "host:remove_player", |session| session.remove_player(name))
            .await?;
    info!(player = %removed.name, score = removed.score, "player removed");
    Ok(())
}

/// Add `delta` to a player's score, returning the new score.
pub async fn adjust_score(
    state: &SharedState,
    name: &str,
    delta: i64,
) -> Result<i64, ServiceError> {
    let score = run_with_broadcast(state, "host:adjust_score", |session| {
        session.adjust_score(name, delta)
    })
    .await?;
    info!(player = %name, delta, score, "score adjusted");
    Ok(score)
}

/// Forget a closed connection, marking its player disconnected.
pub async fn disconnect(state: &SharedState, connection: ConnectionId) {
    state.drop_connection(connection);

    let available_boards = if state.has_hosts() {
        state.available_boards().await
    } else {
        Vec::new()
    };
    let mut session = state.game().lock().await;
    if let Some(name) = session.disconnect(connection) {
        info!(%connection, player = %name, "player disconnected");
        broadcast_state(state, &session, &available_boards);
    }
}

/// Current public snapshot.
pub async fn public_snapshot(state: &SharedState) -> PublicSnapshot {
    let session = state.game().lock().await;
    PublicSnapshot::from(&*session)
}

/// Current host snapshot, including the boards the store can load.
pub async fn host_snapshot(state: &SharedState) -> HostSnapshot {
    let available_boards = state.available_boards().await;
    let session = state.game().lock().await;
    HostSnapshot::new(&session, available_boards)
}

/// Apply one timer expiry and broadcast when it changed the session.
pub async fn handle_timer_event(state: &SharedState, event: TimerEvent) {
    let available_boards = if state.has_hosts() {
        state.available_boards().await
    } else {
        Vec::new()
    };
    let mut session = state.game().lock().await;
    if session.handle_timer(event) {
        debug!(?event, phase = %session.phase(), "timer applied");
        broadcast_state(state, &session, &available_boards);
    }
}

/// Drain timer expiries until every session timer sender is gone.
pub async fn run_timer_events(state: SharedState, mut events: mpsc::UnboundedReceiver<TimerEvent>) {
    while let Some(event) = events.recv().await {
        handle_timer_event(&state, event).await;
    }
    info!("timer event channel closed");
}
