use std::time::Instant;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientMessage, CommandResult, ServerMessage},
    error::ServiceError,
    services::{broadcast::send_message, game_service},
    state::{ClientConnection, SharedState, players::ConnectionId},
};

/// Handle the full lifecycle of a player, host or display WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let id = Uuid::new_v4();
    state.connections().insert(
        id,
        ClientConnection {
            id,
            tx: outbound_tx.clone(),
        },
    );
    info!(%id, "connection opened");

    let initial = ServerMessage::State {
        state: game_service::public_snapshot(&state).await,
    };
    if send_message(&outbound_tx, &initial).is_err() {
        info!(%id, "connection closed before the initial snapshot");
        game_service::disconnect(&state, id).await;
        finalize(writer_task, outbound_tx).await;
        return;
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let received_at = Instant::now();
                debug!(%id, payload = %text, "received message");

                let result = match ClientMessage::from_json_str(&text) {
                    Ok(command) => {
                        let name = command.command();
                        match dispatch(&state, id, &outbound_tx, command, received_at).await {
                            Ok(()) => CommandResult::ok(name),
                            Err(err) => {
                                debug!(%id, command = name, error = %err, "command failed");
                                CommandResult::failed(name, err.reason())
                            }
                        }
                    }
                    Err(err) => {
                        warn!(%id, error = %err, "failed to parse client message");
                        CommandResult::failed("unknown", format!("malformed message: {err}"))
                    }
                };

                if send_message(&outbound_tx, &ServerMessage::Result(result)).is_err() {
                    info!(%id, "connection closed while replying, terminating");
                    break;
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%id, error = %err, "websocket error");
                break;
            }
        }
    }

    game_service::disconnect(&state, id).await;
    info!(%id, "connection closed");

    finalize(writer_task, outbound_tx).await;
}

/// Route one parsed command to the game service.
async fn dispatch(
    state: &SharedState,
    id: ConnectionId,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    message: ClientMessage,
    received_at: Instant,
) -> Result<(), ServiceError> {
    if message.requires_host() && !state.is_host(id) {
        return Err(ServiceError::Unauthorized("host privileges required".into()));
    }

    match message {
        ClientMessage::PlayerJoin { name } => {
            game_service::join(state, id, &name).await?;
        }
        ClientMessage::PlayerBuzz => {
            game_service::buzz(state, id, received_at).await?;
        }
        ClientMessage::HostJoin { secret } => {
            game_service::authenticate_host(state, id, &secret)?;
            let snapshot = game_service::host_snapshot(state).await;
            let _ = send_message(
                outbound_tx,
                &ServerMessage::HostState {
                    state: Box::new(snapshot),
                },
            );
        }
        ClientMessage::HostStart { board } => game_service::start_game(state, board).await?,
        ClientMessage::HostSelectTile { col, row } => {
            game_service::select_tile(state, col, row).await?
        }
        ClientMessage::HostCorrect => game_service::mark_correct(state).await?,
        ClientMessage::HostWrong => game_service::mark_wrong(state).await?,
        ClientMessage::HostSkip => game_service::skip_tile(state).await?,
        ClientMessage::HostReset => game_service::reset_game(state).await?,
        ClientMessage::HostAddPlayer { name } => {
            game_service::add_player(state, &name).await?;
        }
        ClientMessage::HostRemovePlayer { name } => {
            game_service::remove_player(state, &name).await?
        }
        ClientMessage::HostAdjustScore { name, delta } => {
            game_service::adjust_score(state, &name, delta).await?;
        }
    }
    Ok(())
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
