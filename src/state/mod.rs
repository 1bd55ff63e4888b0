pub mod board;
pub mod buzz;
pub mod game;
pub mod players;
mod sse;
pub mod state_machine;
pub mod timer;
pub mod transitions;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::{DashMap, DashSet};
use tokio::sync::{Mutex, mpsc};
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::board_store::BoardStore,
    state::{
        game::{GameSession, TimerEvent},
        players::ConnectionId,
    },
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

const PUBLIC_SSE_CAPACITY: usize = 16;

#[derive(Clone)]
/// Handle used to push messages to a connected client.
pub struct ClientConnection {
    pub id: ConnectionId,
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state: the game session, live connections and the board store.
pub struct AppState {
    config: AppConfig,
    board_store: Arc<dyn BoardStore>,
    game: Mutex<GameSession>,
    connections: DashMap<ConnectionId, ClientConnection>,
    hosts: DashSet<ConnectionId>,
    public_sse: SseHub,
}

impl AppState {
    /// Construct the shared state and the receiving end of the session timer channel.
    ///
    /// The receiver must be drained by [`crate::services::game_service::run_timer_events`]
    /// for timers to have any effect.
    pub fn new(
        config: AppConfig,
        board_store: Arc<dyn BoardStore>,
    ) -> (SharedState, mpsc::UnboundedReceiver<TimerEvent>) {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let session = GameSession::new(
            config.rules.clone(),
            config.default_board.clone(),
            config.daily_double_seed,
            timer_tx,
        );

        let state = Arc::new(Self {
            config,
            board_store,
            game: Mutex::new(session),
            connections: DashMap::new(),
            hosts: DashSet::new(),
            public_sse: SseHub::new(PUBLIC_SSE_CAPACITY),
        });
        (state, timer_rx)
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Source of board definitions.
    pub fn board_store(&self) -> Arc<dyn BoardStore> {
        self.board_store.clone()
    }

    /// The single game session. Every mutation happens under this lock.
    pub fn game(&self) -> &Mutex<GameSession> {
        &self.game
    }

    /// Registry of open WebSocket connections.
    pub fn connections(&self) -> &DashMap<ConnectionId, ClientConnection> {
        &self.connections
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.public_sse
    }

    /// Whether `secret` matches the configured host secret.
    pub fn verify_host_secret(&self, secret: &str) -> bool {
        secret == self.config.host_secret
    }

    /// Grant host privileges to a connection.
    pub fn promote_host(&self, id: ConnectionId) {
        self.hosts.insert(id);
    }

    /// Whether the connection authenticated as host.
    pub fn is_host(&self, id: ConnectionId) -> bool {
        self.hosts.contains(&id)
    }

    /// Whether any host connection is open.
    pub fn has_hosts(&self) -> bool {
        !self.hosts.is_empty()
    }

    /// Forget a closed connection and any host privileges it held.
    pub fn drop_connection(&self, id: ConnectionId) {
        self.connections.remove(&id);
        self.hosts.remove(&id);
    }

    /// Identifiers of the boards the store can load; empty when the store fails.
    pub async fn available_boards(&self) -> Vec<String> {
        match self.board_store.list_boards().await {
            Ok(boards) => boards,
            Err(err) => {
                warn!(error = %err, "failed to list boards");
                Vec::new()
            }
        }
    }
}
