use std::fmt;

use thiserror::Error;

/// Phases a trivia session moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// No board loaded; players gather and the host picks a board.
    Lobby,
    /// Board displayed, waiting for the host to pick a tile.
    Board,
    /// A clue is shown and players may buzz.
    ClueRevealed,
    /// One player holds the answer privilege and the answer timer runs.
    Answering,
    /// The first answer missed; remaining players may buzz once more.
    SecondChance,
    /// Every tile was played.
    GameOver,
}

impl GamePhase {
    /// Wire name of the phase.
    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::Lobby => "lobby",
            GamePhase::Board => "board",
            GamePhase::ClueRevealed => "clue_revealed",
            GamePhase::Answering => "answering",
            GamePhase::SecondChance => "second_chance",
            GamePhase::GameOver => "game_over",
        }
    }

    /// Whether players may buzz in this phase.
    pub fn accepts_buzz(self) -> bool {
        matches!(self, GamePhase::ClueRevealed | GamePhase::SecondChance)
    }

    /// Whether a tile is in play in this phase.
    pub fn has_tile_in_play(self) -> bool {
        matches!(
            self,
            GamePhase::ClueRevealed | GamePhase::Answering | GamePhase::SecondChance
        )
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Host starts a game with a freshly loaded board.
    StartGame,
    /// Host picks an unplayed tile.
    SelectTile,
    /// The buzz window closed with a winner.
    BuzzResolved,
    /// First wrong answer or answer timeout on the tile.
    OpenSecondChance,
    /// The tile is done (correct, second miss, timeout or skip).
    CloseTile {
        /// Whether every tile of the board has now been played.
        board_exhausted: bool,
    },
    /// Host resets the session.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: GamePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// Phase bookkeeping for one session. Pure: no timers, no I/O.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Lobby,
            version: 0,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine initialised in the lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Validate `event` against the current phase without applying it.
    pub fn check(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        self.compute_transition(event)
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (_, GameEvent::Reset) => GamePhase::Lobby,
            (GamePhase::Lobby, GameEvent::StartGame) => GamePhase::Board,
            (GamePhase::Board, GameEvent::SelectTile) => GamePhase::ClueRevealed,
            (GamePhase::ClueRevealed | GamePhase::SecondChance, GameEvent::BuzzResolved) => {
                GamePhase::Answering
            }
            (GamePhase::Answering, GameEvent::OpenSecondChance) => GamePhase::SecondChance,
            (phase, GameEvent::CloseTile { board_exhausted }) if phase.has_tile_in_play() => {
                if board_exhausted {
                    GamePhase::GameOver
                } else {
                    GamePhase::Board
                }
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut GameStateMachine, event: GameEvent) -> GamePhase {
        sm.apply(event).unwrap()
    }

    const CLOSE: GameEvent = GameEvent::CloseTile {
        board_exhausted: false,
    };

    #[test]
    fn initial_state_is_lobby() {
        let sm = GameStateMachine::new();
        assert_eq!(sm.phase(), GamePhase::Lobby);
        assert_eq!(sm.snapshot().version, 0);
    }

    #[test]
    fn full_happy_path_through_tile() {
        let mut sm = GameStateMachine::new();

        assert_eq!(apply(&mut sm, GameEvent::StartGame), GamePhase::Board);
        assert_eq!(apply(&mut sm, GameEvent::SelectTile), GamePhase::ClueRevealed);
        assert_eq!(apply(&mut sm, GameEvent::BuzzResolved), GamePhase::Answering);
        assert_eq!(
            apply(&mut sm, GameEvent::OpenSecondChance),
            GamePhase::SecondChance
        );
        assert_eq!(apply(&mut sm, GameEvent::BuzzResolved), GamePhase::Answering);
        assert_eq!(apply(&mut sm, CLOSE), GamePhase::Board);
        assert_eq!(sm.snapshot().version, 6);
    }

    #[test]
    fn closing_the_last_tile_ends_the_game() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::StartGame);
        apply(&mut sm, GameEvent::SelectTile);

        assert_eq!(
            apply(
                &mut sm,
                GameEvent::CloseTile {
                    board_exhausted: true
                }
            ),
            GamePhase::GameOver
        );
        assert!(sm.check(GameEvent::SelectTile).is_err());
    }

    #[test]
    fn tiles_close_from_every_in_play_phase() {
        for setup in [
            &[GameEvent::SelectTile][..],
            &[GameEvent::SelectTile, GameEvent::BuzzResolved][..],
            &[
                GameEvent::SelectTile,
                GameEvent::BuzzResolved,
                GameEvent::OpenSecondChance,
            ][..],
        ] {
            let mut sm = GameStateMachine::new();
            apply(&mut sm, GameEvent::StartGame);
            for event in setup {
                apply(&mut sm, *event);
            }
            assert_eq!(apply(&mut sm, CLOSE), GamePhase::Board);
        }
    }

    #[test]
    fn reset_is_valid_from_any_phase() {
        let mut sm = GameStateMachine::new();
        assert_eq!(apply(&mut sm, GameEvent::Reset), GamePhase::Lobby);

        apply(&mut sm, GameEvent::StartGame);
        apply(&mut sm, GameEvent::SelectTile);
        apply(&mut sm, GameEvent::BuzzResolved);
        assert_eq!(apply(&mut sm, GameEvent::Reset), GamePhase::Lobby);
    }

    #[test]
    fn invalid_transition_returns_error() {
        let mut sm = GameStateMachine::new();
        let err = sm.apply(GameEvent::SelectTile).unwrap_err();
        assert_eq!(err.from, GamePhase::Lobby);
        assert_eq!(err.event, GameEvent::SelectTile);
        assert_eq!(sm.phase(), GamePhase::Lobby);
        assert_eq!(sm.snapshot().version, 0);

        apply(&mut sm, GameEvent::StartGame);
        assert!(sm.apply(GameEvent::StartGame).is_err());
        assert!(sm.apply(CLOSE).is_err());
        assert!(sm.apply(GameEvent::BuzzResolved).is_err());
        assert!(sm.apply(GameEvent::OpenSecondChance).is_err());
    }

    #[test]
    fn second_chance_only_follows_answering() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::StartGame);
        apply(&mut sm, GameEvent::SelectTile);
        assert!(sm.check(GameEvent::OpenSecondChance).is_err());
    }

    #[test]
    fn buzz_acceptance_by_phase() {
        assert!(!GamePhase::Lobby.accepts_buzz());
        assert!(!GamePhase::Board.accepts_buzz());
        assert!(GamePhase::ClueRevealed.accepts_buzz());
        assert!(!GamePhase::Answering.accepts_buzz());
        assert!(GamePhase::SecondChance.accepts_buzz());
        assert!(!GamePhase::GameOver.accepts_buzz());
        assert_eq!(GamePhase::SecondChance.to_string(), "second_chance");
    }
}
