use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Game phase exposed to clients (WebSocket, REST, SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Waiting for the host to start a board.
    Lobby,
    /// Host is picking a tile.
    Board,
    /// Clue on screen, buzzers open.
    ClueRevealed,
    /// A player is answering.
    Answering,
    /// Second chance after a miss, buzzers open.
    SecondChance,
    /// All tiles played.
    GameOver,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Lobby => VisibleGamePhase::Lobby,
            GamePhase::Board => VisibleGamePhase::Board,
            GamePhase::ClueRevealed => VisibleGamePhase::ClueRevealed,
            GamePhase::Answering => VisibleGamePhase::Answering,
            GamePhase::SecondChance => VisibleGamePhase::SecondChance,
            GamePhase::GameOver => VisibleGamePhase::GameOver,
        }
    }
}
