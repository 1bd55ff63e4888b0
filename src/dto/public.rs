//! Snapshots of the session broadcast to players, hosts and public displays.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::{format_system_time, phase::VisibleGamePhase},
    state::{
        board::{TilePosition, TileState},
        game::GameSession,
        players::Player,
    },
};

/// Column/row reference to a tile.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
pub struct TilePositionDto {
    pub col: usize,
    pub row: usize,
}

impl From<TilePosition> for TilePositionDto {
    fn from(value: TilePosition) -> Self {
        Self {
            col: value.col,
            row: value.row,
        }
    }
}

/// Publicly visible state of one tile.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct TileSummary {
    pub value: i64,
    pub used: bool,
    pub is_daily_double: bool,
}

impl From<TileState> for TileSummary {
    fn from(value: TileState) -> Self {
        Self {
            value: value.value,
            used: value.used,
            is_daily_double: value.daily_double,
        }
    }
}

/// Scoreboard entry.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
    pub name: String,
    pub score: i64,
    pub connected: bool,
}

impl From<&Player> for PlayerSummary {
    fn from(value: &Player) -> Self {
        Self {
            name: value.name.clone(),
            score: value.score,
            connected: value.is_connected(),
        }
    }
}

/// State shared with every connection. Never carries answer text.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct PublicSnapshot {
    pub phase: VisibleGamePhase,
    /// Category names, empty in the lobby.
    pub categories: Vec<String>,
    /// Tiles indexed `[col][row]`, empty in the lobby.
    pub tiles: Vec<Vec<TileSummary>>,
    /// Players in registration order.
    pub players: Vec<PlayerSummary>,
    pub current_tile: Option<TilePositionDto>,
    pub current_clue: Option<String>,
    /// Face value of the tile in play, 0 when none.
    pub current_value: i64,
    pub is_daily_double: bool,
    pub buzzed_player: Option<String>,
    /// RFC 3339 expiry of the running answer countdown.
    pub timer_ends_at: Option<String>,
    pub timer_remaining_ms: Option<u64>,
    /// Name of the loaded board, empty in the lobby.
    pub board_name: String,
}

impl From<&GameSession> for PublicSnapshot {
    fn from(session: &GameSession) -> Self {
        let board = session.board();
        let round = session.round();

        Self {
            phase: session.phase().into(),
            categories: board
                .map(|board| board.categories().to_vec())
                .unwrap_or_default(),
            tiles: board
                .map(|board| {
                    board
                        .tile_states()
                        .into_iter()
                        .map(|column| column.into_iter().map(Into::into).collect())
                        .collect()
                })
                .unwrap_or_default(),
            players: session.players().iter().map(Into::into).collect(),
            current_tile: round.map(|round| round.position.into()),
            current_clue: round.map(|round| round.clue.clone()),
            current_value: round.map(|round| round.value).unwrap_or_default(),
            is_daily_double: round.is_some_and(|round| round.daily_double),
            buzzed_player: round.and_then(|round| round.buzzed_player.clone()),
            timer_ends_at: session.timer_ends_at().map(format_system_time),
            timer_remaining_ms: session
                .timer_remaining()
                .map(|left| u64::try_from(left.as_millis()).unwrap_or(u64::MAX)),
            board_name: board
                .map(|board| board.name().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Public snapshot plus host-only details.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct HostSnapshot {
    #[serde(flatten)]
    pub public: PublicSnapshot,
    pub current_answer: Option<String>,
    /// Board identifiers the host can start.
    pub available_boards: Vec<String>,
}

impl HostSnapshot {
    /// Project `session` for hosts.
    pub fn new(session: &GameSession, available_boards: Vec<String>) -> Self {
        Self {
            public: session.into(),
            current_answer: session.round().map(|round| round.answer.clone()),
            available_boards,
        }
    }
}
