use axum::extract::ws::{Message, Utf8Bytes};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    dto::{
        public::{HostSnapshot, PublicSnapshot},
        sse::ServerEvent,
        ws::ServerMessage,
    },
    state::{AppState, game::GameSession},
};

/// SSE event name carrying the public snapshot.
pub const GAME_STATE_EVENT: &str = "game.state";

/// Push the current snapshots to every WebSocket connection and the public SSE stream.
///
/// Every connection receives `game:state`; host connections additionally receive
/// `game:host_state`. Called with the session lock held so frames leave in mutation order.
pub fn broadcast_state(state: &AppState, session: &GameSession, available_boards: &[String]) {
    let public = PublicSnapshot::from(session);

    match ServerEvent::json(Some(GAME_STATE_EVENT.to_string()), &public) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(error = %err, "failed to serialize public snapshot for SSE"),
    }

    let Some(public_frame) = encode(&ServerMessage::State { state: public }) else {
        return;
    };
    let host_frame = if state.has_hosts() {
        encode(&ServerMessage::HostState {
            state: Box::new(HostSnapshot::new(session, available_boards.to_vec())),
        })
    } else {
        None
    };

    let mut delivered = 0usize;
    for connection in state.connections().iter() {
        if connection.tx.send(Message::Text(public_frame.clone())).is_ok() {
            delivered += 1;
        }
        if let Some(frame) = host_frame.as_ref()
            && state.is_host(connection.id)
        {
            let _ = connection.tx.send(Message::Text(frame.clone()));
        }
    }
    debug!(
        version = session.version(),
        phase = %session.phase(),
        delivered,
        "state broadcast"
    );
}

/// The writer task of a connection has stopped.
#[derive(Debug, Error)]
#[error("connection closed")]
pub struct ConnectionClosed;

/// Serialize a payload and push it onto a single connection.
///
/// Serialization failures are logged and swallowed; only a closed writer is reported.
pub fn send_message<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), ConnectionClosed>
where
    T: ?Sized + Serialize + std::fmt::Debug,
{
    let Some(frame) = encode(value) else {
        return Ok(());
    };
    tx.send(Message::Text(frame))
        .map_err(|_| ConnectionClosed)
}

fn encode<T>(value: &T) -> Option<Utf8Bytes>
where
    T: ?Sized + Serialize + std::fmt::Debug,
{
    match serde_json::to_string(value) {
        Ok(payload) => Some(payload.into()),
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            None
        }
    }
}
