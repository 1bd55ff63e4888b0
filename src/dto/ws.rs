use serde::{Deserialize, Serialize};

use crate::dto::public::{HostSnapshot, PublicSnapshot};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
/// Commands accepted on the `/ws` socket.
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "player:join")]
    PlayerJoin { name: String },
    #[serde(rename = "player:buzz")]
    PlayerBuzz,
    #[serde(rename = "host:join")]
    HostJoin { secret: String },
    #[serde(rename = "host:start")]
    HostStart {
        #[serde(default)]
        board: Option<String>,
    },
    #[serde(rename = "host:select_tile")]
    HostSelectTile { col: usize, row: usize },
    #[serde(rename = "host:correct")]
    HostCorrect,
    #[serde(rename = "host:wrong")]
    HostWrong,
    #[serde(rename = "host:skip")]
    HostSkip,
    #[serde(rename = "host:reset")]
    HostReset,
    #[serde(rename = "host:add_player")]
    HostAddPlayer { name: String },
    #[serde(rename = "host:remove_player")]
    HostRemovePlayer { name: String },
    #[serde(rename = "host:adjust_score")]
    HostAdjustScore { name: String, delta: i64 },
}

impl ClientMessage {
    /// Parse a text frame.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Wire name of the command, echoed back in its `result`.
    pub fn command(&self) -> &'static str {
        match self {
            Self::PlayerJoin { .. } => "player:join",
            Self::PlayerBuzz => "player:buzz",
            Self::HostJoin { .. } => "host:join",
            Self::HostStart { .. } => "host:start",
            Self::HostSelectTile { .. } => "host:select_tile",
            Self::HostCorrect => "host:correct",
            Self::HostWrong => "host:wrong",
            Self::HostSkip => "host:skip",
            Self::HostReset => "host:reset",
            Self::HostAddPlayer { .. } => "host:add_player",
            Self::HostRemovePlayer { .. } => "host:remove_player",
            Self::HostAdjustScore { .. } => "host:adjust_score",
        }
    }

    /// Whether the sender must have authenticated with `host:join` first.
    pub fn requires_host(&self) -> bool {
        !matches!(
            self,
            Self::PlayerJoin { .. } | Self::PlayerBuzz | Self::HostJoin { .. }
        )
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
/// Outcome of a single command, sent to its originator only.
pub struct CommandResult {
    pub command: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CommandResult {
    pub fn ok(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            success: true,
            reason: None,
        }
    }

    pub fn failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            success: false,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
/// Frames pushed to `/ws` clients.
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "game:state")]
    State { state: PublicSnapshot },
    #[serde(rename = "game:host_state")]
    HostState { state: Box<HostSnapshot> },
    #[serde(rename = "result")]
    Result(CommandResult),
}
