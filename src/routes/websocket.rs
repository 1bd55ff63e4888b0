use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};

use crate::{services::websocket_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/ws",
    tag = "websocket",
    responses((status = 101, description = "Switching protocols; JSON frames tagged by `type` (`player:*`, `host:*` in, `game:state`, `game:host_state`, `result` out)"))
)]
/// Upgrade the HTTP connection into a game WebSocket session.
///
/// Players, hosts and passive displays share this endpoint; the role is set by the first
/// `player:join` or `host:join` command.
pub async fn ws_handler(
    State(state): State<SharedState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| websocket_service::handle_socket(state, socket))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws", get(ws_handler))
}
