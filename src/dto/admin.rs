//! DTO definitions used by the host REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dto::validation::validate_board_id;

/// Request to start a game, optionally naming the board to load.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartGameRequest {
    /// Board identifier; the last used board when omitted.
    #[serde(default)]
    pub board: Option<String>,
}

impl Validate for StartGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref board) = self.board
            && let Err(e) = validate_board_id(board)
        {
            errors.add("board", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Request to reveal the clue of a tile.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SelectTileRequest {
    #[validate(range(max = 4))]
    pub col: usize,
    #[validate(range(max = 4))]
    pub row: usize,
}

/// Request to register a player without a connection.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddPlayerRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// Request to adjust a player's score by a delta.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScoreAdjustmentRequest {
    pub delta: i64,
}

/// Generic action acknowledgement used by host endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

impl ActionResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of a score adjustment, returning the updated tally.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreUpdateResponse {
    pub name: String,
    pub score: i64,
}

/// Boards the store can load.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardListResponse {
    pub boards: Vec<String>,
}
