//! The session orchestrator: phase-guarded commands over the board, the players, the buzz
//! arbiter and the timers.

use std::time::{Duration, Instant, SystemTime};

use rand::{SeedableRng, rngs::StdRng};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    dao::models::BoardEntity,
    state::{
        board::{Board, BoardError, TilePosition},
        buzz::BuzzArbiter,
        players::{ConnectionId, JoinOutcome, Player, PlayerRegistry, RegistryError},
        state_machine::{GameEvent, GamePhase, GameStateMachine, InvalidTransition},
        timer::{Timer, TimerToken},
    },
};

/// Tunables of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRules {
    /// Registry capacity.
    pub max_players: usize,
    /// How long buzzes are collected after the first one.
    pub buzz_window: Duration,
    /// Answer time on the first attempt at a tile.
    pub answer_time: Duration,
    /// Time for the second-chance round, and for answering in it.
    pub second_chance_time: Duration,
    /// Daily Doubles placed on each board.
    pub daily_doubles: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_players: 20,
            buzz_window: Duration::from_millis(100),
            answer_time: Duration::from_secs(30),
            second_chance_time: Duration::from_secs(15),
            daily_doubles: 2,
        }
    }
}

/// Expiry notification sent by a session timer back into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The buzz collection window closed.
    BuzzWindowElapsed(TimerToken),
    /// The answer (or second-chance) countdown ran out.
    AnswerTimeExpired(TimerToken),
}

/// Context of the tile currently in play, copied from the board at selection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRound {
    /// Board coordinates of the tile.
    pub position: TilePosition,
    /// Clue text.
    pub clue: String,
    /// Expected answer (host only).
    pub answer: String,
    /// Face value.
    pub value: i64,
    /// Whether points are doubled.
    pub daily_double: bool,
    /// Player holding, or last holding, the answer privilege.
    pub buzzed_player: Option<String>,
    /// Set once a wrong answer or a timeout occurred on the tile.
    pub second_chance_used: bool,
}

impl TileRound {
    /// Points credited or debited on this tile.
    pub fn points(&self) -> i64 {
        if self.daily_double {
            self.value.saturating_mul(2)
        } else {
            self.value
        }
    }
}

/// Errors reported to the originator of a rejected command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The command is not allowed in the current phase.
    #[error("`{command}` is not allowed during {phase}")]
    WrongPhase {
        /// Rejected command.
        command: &'static str,
        /// Phase at the time of the command.
        phase: GamePhase,
    },
    /// The connection has not joined as a player.
    #[error("connection has not joined the game")]
    NotAPlayer,
    /// The player already missed this tile.
    #[error("`{0}` already answered this clue")]
    LockedOut(String),
    /// No board is loaded.
    #[error("no board loaded")]
    NoBoard,
    /// Player registry rejected the command.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Board rejected the command.
    #[error(transparent)]
    Board(#[from] BoardError),
    /// Phase bookkeeping rejected the command.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// Outcome of an accepted buzz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzOutcome {
    /// First buzz of the window; the window timer was armed.
    WindowOpened,
    /// Added to an already open window.
    Queued,
}

/// The single live game session.
#[derive(Debug)]
pub struct GameSession {
    rules: GameRules,
    machine: GameStateMachine,
    board: Option<Board>,
    board_id: String,
    players: PlayerRegistry,
    round: Option<TileRound>,
    arbiter: BuzzArbiter,
    buzz_window: Timer,
    answer_timer: Timer,
    timer_events: mpsc::UnboundedSender<TimerEvent>,
    rng: StdRng,
}

impl GameSession {
    /// Build a session in the lobby.
    ///
    /// `default_board` is used by [`GameSession::start`] callers when no board is named;
    /// `seed` fixes Daily Double placement. Timer expiries are delivered on `timer_events` and
    /// must be fed back through [`GameSession::handle_timer`].
    pub fn new(
        rules: GameRules,
        default_board: impl Into<String>,
        seed: Option<u64>,
        timer_events: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            players: PlayerRegistry::new(rules.max_players),
            rules,
            machine: GameStateMachine::new(),
            board: None,
            board_id: default_board.into(),
            round: None,
            arbiter: BuzzArbiter::new(),
            buzz_window: Timer::new(),
            answer_timer: Timer::new(),
            timer_events,
            rng,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    /// Number of transitions applied since the session was created.
    pub fn version(&self) -> usize {
        self.machine.snapshot().version
    }

    /// Loaded board, outside the lobby.
    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    /// Identifier of the last board started (or the configured default).
    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    /// Tile in play, if any.
    pub fn round(&self) -> Option<&TileRound> {
        self.round.as_ref()
    }

    /// Player registry.
    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    /// Expiry instant of the answer countdown.
    pub fn timer_ends_at(&self) -> Option<SystemTime> {
        self.answer_timer.ends_at()
    }

    /// Time left on the answer countdown.
    pub fn timer_remaining(&self) -> Option<Duration> {
        self.answer_timer.remaining()
    }

    /// Whether a buzz window is collecting buzzes.
    pub fn buzz_window_open(&self) -> bool {
        self.arbiter.is_pending()
    }

    /// Load `entity` as the board and enter the board phase.
    pub fn start(&mut self, board_id: &str, entity: BoardEntity) -> Result<(), GameError> {
        self.ensure_phase("start", &[GamePhase::Lobby])?;
        let board = Board::from_entity(entity, self.rules.daily_doubles, &mut self.rng)?;
        self.machine.check(GameEvent::StartGame)?;

        self.clear_tile_context();
        info!(
            board = board_id,
            name = board.name(),
            daily_doubles = ?board.daily_doubles(),
            "board loaded"
        );
        self.board = Some(board);
        self.board_id = board_id.to_string();
        self.machine.apply(GameEvent::StartGame)?;
        Ok(())
    }

    /// Reveal the clue of an unplayed tile.
    pub fn select_tile(&mut self, position: TilePosition) -> Result<(), GameError> {
        self.ensure_phase("select_tile", &[GamePhase::Board])?;
        let board = self.board.as_ref().ok_or(GameError::NoBoard)?;
        let tile = board.tile_state(position)?;
        if tile.used {
            return Err(BoardError::AlreadyUsed {
                col: position.col,
                row: position.row,
            }
            .into());
        }
        let content = board.content(position)?;
        let round = TileRound {
            position,
            clue: content.clue.clone(),
            answer: content.answer.clone(),
            value: content.value,
            daily_double: tile.daily_double,
            buzzed_player: None,
            second_chance_used: false,
        };
        self.machine.check(GameEvent::SelectTile)?;

        self.discard_buzz_window();
        self.round = Some(round);
        self.machine.apply(GameEvent::SelectTile)?;
        Ok(())
    }

    /// Record a buzz from `connection`, received at `received_at`.
    ///
    /// Accepted buzzes are only buffered; the winner is picked when the window elapses.
    pub fn buzz(
        &mut self,
        connection: ConnectionId,
        received_at: Instant,
    ) -> Result<BuzzOutcome, GameError> {
        let phase = self.phase();
        if !phase.accepts_buzz() {
            return Err(GameError::WrongPhase {
                command: "buzz",
                phase,
            });
        }
        let player = self
            .players
            .by_connection(connection)
            .ok_or(GameError::NotAPlayer)?;
        if phase == GamePhase::SecondChance && self.is_locked_out(&player.name) {
            return Err(GameError::LockedOut(player.name.clone()));
        }

        let name = player.name.clone();
        if !self.arbiter.record(name, received_at) {
            return Ok(BuzzOutcome::Queued);
        }

        let tx = self.timer_events.clone();
        let token = self.buzz_window.start(self.rules.buzz_window, move |token| async move {
            let _ = tx.send(TimerEvent::BuzzWindowElapsed(token));
        });
        debug!(?token, "buzz window opened");
        Ok(BuzzOutcome::WindowOpened)
    }

    /// Apply a timer expiry. Returns `true` when the session changed.
    ///
    /// Expiries of countdowns that were cancelled or replaced since they were armed are
    /// ignored.
    pub fn handle_timer(&mut self, event: TimerEvent) -> bool {
        match event {
            TimerEvent::BuzzWindowElapsed(token) => {
                if !self.buzz_window.expire(token) {
                    debug!(?token, "stale buzz window ignored");
                    return false;
                }
                self.resolve_buzz()
            }
            TimerEvent::AnswerTimeExpired(token) => {
                if !self.answer_timer.expire(token) {
                    debug!(?token, "stale answer timer ignored");
                    return false;
                }
                self.answer_time_expired()
            }
        }
    }

    /// Credit the answering player and close the tile.
    pub fn mark_correct(&mut self) -> Result<(), GameError> {
        self.ensure_phase("correct", &[GamePhase::Answering])?;
        let round = self.current_round()?;
        let (points, winner) = (round.points(), round.buzzed_player.clone());

        if let Some(name) = winner.filter(|name| self.players.contains(name)) {
            self.players.adjust_score(&name, points)?;
        }
        self.close_tile()
    }

    /// Debit the answering player; open the second chance or close the tile.
    pub fn mark_wrong(&mut self) -> Result<(), GameError> {
        self.ensure_phase("wrong", &[GamePhase::Answering])?;
        let round = self.current_round()?;
        let (points, loser, second_chance_used) = (
            round.points(),
            round.buzzed_player.clone(),
            round.second_chance_used,
        );

        if let Some(name) = loser.filter(|name| self.players.contains(name)) {
            self.players.adjust_score(&name, -points)?;
        }
        if second_chance_used {
            self.close_tile()
        } else {
            self.open_second_chance()
        }
    }

    /// Close the tile in play without scoring.
    pub fn skip_tile(&mut self) -> Result<(), GameError> {
        self.ensure_phase(
            "skip",
            &[
                GamePhase::ClueRevealed,
                GamePhase::Answering,
                GamePhase::SecondChance,
            ],
        )?;
        self.close_tile()
    }

    /// Return to the lobby, discard the board and zero every score.
    pub fn reset(&mut self) -> Result<(), GameError> {
        self.machine.check(GameEvent::Reset)?;
        self.clear_tile_context();
        self.board = None;
        self.players.reset_scores();
        self.machine.apply(GameEvent::Reset)?;
        Ok(())
    }

    /// Join or reconnect a player on `connection`.
    pub fn join(
        &mut self,
        name: &str,
        connection: ConnectionId,
    ) -> Result<(String, JoinOutcome), GameError> {
        Ok(self.players.add_player(name, connection)?)
    }

    /// Register a player without a connection.
    pub fn add_player_by_host(&mut self, name: &str) -> Result<String, GameError> {
        Ok(self.players.add_player_by_host(name)?)
    }

    /// Delete a player.
    pub fn remove_player(&mut self, name: &str) -> Result<Player, GameError> {
        Ok(self.players.remove_player(name)?)
    }

    /// Unbind `connection` from its player. Returns the player name when one was bound.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Option<String> {
        self.players.mark_disconnected(connection)
    }

    /// Add `delta` to a player's score, returning the new score.
    pub fn adjust_score(&mut self, name: &str, delta: i64) -> Result<i64, GameError> {
        Ok(self.players.adjust_score(name, delta)?)
    }

    fn resolve_buzz(&mut self) -> bool {
        let phase = self.phase();
        if !phase.accepts_buzz() {
            self.arbiter.clear();
            return false;
        }

        let players = &self.players;
        let locked_out = match phase {
            GamePhase::SecondChance => self
                .round
                .as_ref()
                .and_then(|round| round.buzzed_player.clone()),
            _ => None,
        };
        let Some(winner) = self.arbiter.resolve(|name| {
            players.contains(name) && locked_out.as_deref() != Some(name)
        }) else {
            return false;
        };

        let Some(round) = self.round.as_mut() else {
            return false;
        };
        if self.machine.apply(GameEvent::BuzzResolved).is_err() {
            return false;
        }
        round.buzzed_player = Some(winner.player.clone());
        let duration = if round.second_chance_used {
            self.rules.second_chance_time
        } else {
            self.rules.answer_time
        };
        info!(player = %winner.player, ?duration, "buzz won");
        self.start_answer_timer(duration);
        true
    }

    fn answer_time_expired(&mut self) -> bool {
        let second_chance_used = self
            .round
            .as_ref()
            .is_some_and(|round| round.second_chance_used);

        let result = match self.phase() {
            GamePhase::Answering if !second_chance_used => self.open_second_chance(),
            GamePhase::Answering | GamePhase::SecondChance => self.close_tile(),
            _ => return false,
        };
        info!(phase = %self.phase(), "answer time expired");
        result.is_ok()
    }

    fn open_second_chance(&mut self) -> Result<(), GameError> {
        self.machine.check(GameEvent::OpenSecondChance)?;
        let round = self.round.as_mut().ok_or(GameError::WrongPhase {
            command: "second_chance",
            phase: self.machine.phase(),
        })?;
        round.second_chance_used = true;
        self.discard_buzz_window();
        self.start_answer_timer(self.rules.second_chance_time);
        self.machine.apply(GameEvent::OpenSecondChance)?;
        Ok(())
    }

    fn close_tile(&mut self) -> Result<(), GameError> {
        let round = self.current_round()?;
        let position = round.position;
        let board = self.board.as_mut().ok_or(GameError::NoBoard)?;
        board.mark_used(position)?;
        let board_exhausted = board.all_used();

        self.clear_tile_context();
        let phase = self
            .machine
            .apply(GameEvent::CloseTile { board_exhausted })?;
        debug!(col = position.col, row = position.row, %phase, "tile closed");
        Ok(())
    }

    fn start_answer_timer(&mut self, duration: Duration) {
        let tx = self.timer_events.clone();
        self.answer_timer.start(duration, move |token| async move {
            let _ = tx.send(TimerEvent::AnswerTimeExpired(token));
        });
    }

    fn discard_buzz_window(&mut self) {
        self.buzz_window.cancel();
        self.arbiter.clear();
    }

    fn clear_tile_context(&mut self) {
        self.answer_timer.cancel();
        self.discard_buzz_window();
        self.round = None;
    }

    fn is_locked_out(&self, name: &str) -> bool {
        self.round
            .as_ref()
            .and_then(|round| round.buzzed_player.as_deref())
            == Some(name)
    }

    fn current_round(&self) -> Result<&TileRound, GameError> {
        self.round.as_ref().ok_or(GameError::WrongPhase {
            command: "tile",
            phase: self.machine.phase(),
        })
    }

    fn ensure_phase(&self, command: &'static str, allowed: &[GamePhase]) -> Result<(), GameError> {
        let phase = self.machine.phase();
        if allowed.contains(&phase) {
            Ok(())
        } else {
            Err(GameError::WrongPhase { command, phase })
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::state::board::{
        BOARD_COLUMNS, BOARD_ROWS,
        fixtures::{board_entity, board_entity_with},
    };

    fn session_with(rules: GameRules) -> (GameSession, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (GameSession::new(rules, "default", Some(42), tx), rx)
    }

    fn session() -> (GameSession, mpsc::UnboundedReceiver<TimerEvent>) {
        session_with(GameRules::default())
    }

    fn no_daily_doubles() -> GameRules {
        GameRules {
            daily_doubles: 0,
            ..GameRules::default()
        }
    }

    fn join(session: &mut GameSession, name: &str) -> ConnectionId {
        let connection = Uuid::new_v4();
        session.join(name, connection).unwrap();
        connection
    }

    fn score(session: &GameSession, name: &str) -> i64 {
        session.players().get(name).unwrap().score
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> TimerEvent {
        rx.recv().await.expect("timer channel closed")
    }

    /// Buzz alone and let the window resolve.
    async fn win_buzz(
        session: &mut GameSession,
        rx: &mut mpsc::UnboundedReceiver<TimerEvent>,
        connection: ConnectionId,
    ) {
        session.buzz(connection, Instant::now()).unwrap();
        let event = next_event(rx).await;
        assert!(matches!(event, TimerEvent::BuzzWindowElapsed(_)));
        assert!(session.handle_timer(event));
        assert_eq!(session.phase(), GamePhase::Answering);
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_correct_answer() {
        let (mut session, mut rx) = session_with(no_daily_doubles());
        let p1 = join(&mut session, "P1");

        session.start("default", board_entity()).unwrap();
        assert_eq!(session.phase(), GamePhase::Board);

        session.select_tile(TilePosition::new(0, 0)).unwrap();
        assert_eq!(session.phase(), GamePhase::ClueRevealed);
        assert_eq!(session.round().unwrap().value, 200);

        win_buzz(&mut session, &mut rx, p1).await;
        assert_eq!(
            session.round().unwrap().buzzed_player.as_deref(),
            Some("P1")
        );
        assert!(session.timer_ends_at().is_some());

        session.mark_correct().unwrap();
        assert_eq!(score(&session, "P1"), 200);
        assert_eq!(session.phase(), GamePhase::Board);
        assert!(session.round().is_none());
        assert!(session.timer_ends_at().is_none());

        let board = session.board().unwrap();
        assert!(board.tile_state(TilePosition::new(0, 0)).unwrap().used);
    }

    #[tokio::test(start_paused = true)]
    async fn earliest_buzz_in_window_wins() {
        let (mut session, mut rx) = session_with(no_daily_doubles());
        let p1 = join(&mut session, "P1");
        let p2 = join(&mut session, "P2");
        let p3 = join(&mut session, "P3");
        session.start("default", board_entity()).unwrap();
        session.select_tile(TilePosition::new(1, 1)).unwrap();

        let base = Instant::now();
        assert_eq!(
            session.buzz(p1, base + Duration::from_millis(50)),
            Ok(BuzzOutcome::WindowOpened)
        );
        assert_eq!(
            session.buzz(p2, base + Duration::from_millis(10)),
            Ok(BuzzOutcome::Queued)
        );
        assert_eq!(
            session.buzz(p3, base + Duration::from_millis(30)),
            Ok(BuzzOutcome::Queued)
        );
        assert!(session.buzz_window_open());

        let event = next_event(&mut rx).await;
        assert!(session.handle_timer(event));
        assert_eq!(
            session.round().unwrap().buzzed_player.as_deref(),
            Some("P2")
        );
        assert!(!session.buzz_window_open());
    }

    #[tokio::test(start_paused = true)]
    async fn daily_double_doubles_credit_and_debit() {
        let (mut session, mut rx) = session();
        let p1 = join(&mut session, "P1");
        let p2 = join(&mut session, "P2");
        session
            .start("default", board_entity_with(|_, _| 400))
            .unwrap();
        let daily_doubles = session.board().unwrap().daily_doubles().to_vec();
        assert_eq!(daily_doubles.len(), 2);

        session.select_tile(daily_doubles[0]).unwrap();
        assert!(session.round().unwrap().daily_double);
        win_buzz(&mut session, &mut rx, p1).await;
        session.mark_correct().unwrap();
        assert_eq!(score(&session, "P1"), 800);

        session.select_tile(daily_doubles[1]).unwrap();
        win_buzz(&mut session, &mut rx, p2).await;
        session.mark_wrong().unwrap();
        assert_eq!(score(&session, "P2"), -800);
        assert_eq!(session.phase(), GamePhase::SecondChance);
        assert!(
            !session
                .board()
                .unwrap()
                .tile_state(daily_doubles[1])
                .unwrap()
                .used
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_wrong_answer_closes_tile() {
        let (mut session, mut rx) = session_with(no_daily_doubles());
        let p1 = join(&mut session, "P1");
        let p2 = join(&mut session, "P2");
        session.start("default", board_entity()).unwrap();
        session.select_tile(TilePosition::new(0, 0)).unwrap();

        win_buzz(&mut session, &mut rx, p1).await;
        session.mark_wrong().unwrap();
        assert_eq!(session.phase(), GamePhase::SecondChance);
        assert_eq!(
            session.buzz(p1, Instant::now()),
            Err(GameError::LockedOut("P1".into()))
        );

        win_buzz(&mut session, &mut rx, p2).await;
        let remaining = session.timer_remaining().unwrap();
        assert!(remaining <= Duration::from_secs(15));

        session.mark_wrong().unwrap();
        assert_eq!(session.phase(), GamePhase::Board);
        assert_eq!(score(&session, "P1"), -200);
        assert_eq!(score(&session, "P2"), -200);
        assert!(
            session
                .board()
                .unwrap()
                .tile_state(TilePosition::new(0, 0))
                .unwrap()
                .used
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_open_second_chance_then_close() {
        let (mut session, mut rx) = session_with(no_daily_doubles());
        let p1 = join(&mut session, "P1");
        session.start("default", board_entity()).unwrap();
        session.select_tile(TilePosition::new(2, 0)).unwrap();
        win_buzz(&mut session, &mut rx, p1).await;

        let expiry = next_event(&mut rx).await;
        assert!(matches!(expiry, TimerEvent::AnswerTimeExpired(_)));
        assert!(session.handle_timer(expiry));
        assert_eq!(session.phase(), GamePhase::SecondChance);
        assert_eq!(score(&session, "P1"), 0);
        assert!(session.round().unwrap().second_chance_used);

        let expiry = next_event(&mut rx).await;
        assert!(session.handle_timer(expiry));
        assert_eq!(session.phase(), GamePhase::Board);
        assert_eq!(score(&session, "P1"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_chance_answer_timeout_closes_tile() {
        let (mut session, mut rx) = session_with(no_daily_doubles());
        let p1 = join(&mut session, "P1");
        let p2 = join(&mut session, "P2");
        session.start("default", board_entity()).unwrap();
        session.select_tile(TilePosition::new(0, 3)).unwrap();

        win_buzz(&mut session, &mut rx, p1).await;
        session.mark_wrong().unwrap();
        win_buzz(&mut session, &mut rx, p2).await;

        let expiry = next_event(&mut rx).await;
        assert!(session.handle_timer(expiry));
        assert_eq!(session.phase(), GamePhase::Board);
        assert_eq!(score(&session, "P2"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_racing_a_judgement_is_ignored() {
        let (mut session, mut rx) = session_with(no_daily_doubles());
        let p1 = join(&mut session, "P1");
        session.start("default", board_entity()).unwrap();
        session.select_tile(TilePosition::new(0, 0)).unwrap();
        win_buzz(&mut session, &mut rx, p1).await;

        let expiry = next_event(&mut rx).await;
        session.skip_tile().unwrap();
        assert!(!session.handle_timer(expiry));
        assert_eq!(session.phase(), GamePhase::Board);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_discards_pending_buzz_window() {
        let (mut session, mut rx) = session_with(no_daily_doubles());
        let p1 = join(&mut session, "P1");
        session.start("default", board_entity()).unwrap();
        session.select_tile(TilePosition::new(0, 0)).unwrap();

        session.buzz(p1, Instant::now()).unwrap();
        let window = next_event(&mut rx).await;
        session.skip_tile().unwrap();
        assert!(!session.buzz_window_open());

        session.select_tile(TilePosition::new(0, 1)).unwrap();
        assert!(!session.handle_timer(window));
        assert_eq!(session.phase(), GamePhase::ClueRevealed);

        session.buzz(p1, Instant::now()).unwrap();
        session.skip_tile().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn removed_buzzer_passes_to_next_in_window() {
        let (mut session, mut rx) = session_with(no_daily_doubles());
        let p1 = join(&mut session, "P1");
        let p2 = join(&mut session, "P2");
        session.start("default", board_entity()).unwrap();
        session.select_tile(TilePosition::new(0, 0)).unwrap();

        let base = Instant::now();
        session.buzz(p1, base).unwrap();
        session
            .buzz(p2, base + Duration::from_millis(5))
            .unwrap();
        session.remove_player("P1").unwrap();

        let event = next_event(&mut rx).await;
        assert!(session.handle_timer(event));
        assert_eq!(
            session.round().unwrap().buzzed_player.as_deref(),
            Some("P2")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn buzz_rejected_outside_clue_phases() {
        let (mut session, mut rx) = session_with(no_daily_doubles());
        let p1 = join(&mut session, "P1");
        let stranger = Uuid::new_v4();

        assert!(matches!(
            session.buzz(p1, Instant::now()),
            Err(GameError::WrongPhase {
                phase: GamePhase::Lobby,
                ..
            })
        ));

        session.start("default", board_entity()).unwrap();
        assert!(matches!(
            session.buzz(p1, Instant::now()),
            Err(GameError::WrongPhase {
                phase: GamePhase::Board,
                ..
            })
        ));

        session.select_tile(TilePosition::new(0, 0)).unwrap();
        assert_eq!(
            session.buzz(stranger, Instant::now()),
            Err(GameError::NotAPlayer)
        );
        win_buzz(&mut session, &mut rx, p1).await;
        assert!(matches!(
            session.buzz(p1, Instant::now()),
            Err(GameError::WrongPhase {
                phase: GamePhase::Answering,
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_the_board_ends_the_game() {
        let (mut session, _rx) = session();
        let p1 = join(&mut session, "P1");
        session.start("default", board_entity()).unwrap();

        for col in 0..BOARD_COLUMNS {
            for row in 0..BOARD_ROWS {
                assert_ne!(session.phase(), GamePhase::GameOver);
                session.select_tile(TilePosition::new(col, row)).unwrap();
                session.skip_tile().unwrap();
            }
        }

        assert_eq!(session.phase(), GamePhase::GameOver);
        assert!(session.board().unwrap().all_used());
        assert!(matches!(
            session.buzz(p1, Instant::now()),
            Err(GameError::WrongPhase {
                phase: GamePhase::GameOver,
                ..
            })
        ));
        assert!(session.select_tile(TilePosition::new(0, 0)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_from_second_chance_keeps_connections() {
        let (mut session, mut rx) = session_with(no_daily_doubles());
        let p1 = join(&mut session, "P1");
        session.start("default", board_entity()).unwrap();
        session.select_tile(TilePosition::new(0, 1)).unwrap();
        win_buzz(&mut session, &mut rx, p1).await;
        session.mark_wrong().unwrap();
        assert_eq!(score(&session, "P1"), -400);

        session.reset().unwrap();
        assert_eq!(session.phase(), GamePhase::Lobby);
        assert!(session.board().is_none());
        assert!(session.round().is_none());
        assert!(session.timer_ends_at().is_none());
        assert_eq!(score(&session, "P1"), 0);
        assert!(session.players().get("P1").unwrap().is_connected());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    /// Play a fresh session forward until it sits in `target`.
    async fn drive_to(
        session: &mut GameSession,
        rx: &mut mpsc::UnboundedReceiver<TimerEvent>,
        target: GamePhase,
        player: ConnectionId,
    ) {
        session.start("default", board_entity()).unwrap();
        match target {
            GamePhase::Board => {}
            GamePhase::ClueRevealed => {
                session.select_tile(TilePosition::new(0, 0)).unwrap();
                session.buzz(player, Instant::now()).unwrap();
                assert!(session.buzz_window_open());
            }
            GamePhase::Answering => {
                session.select_tile(TilePosition::new(0, 0)).unwrap();
                win_buzz(session, rx, player).await;
            }
            GamePhase::SecondChance => {
                session.select_tile(TilePosition::new(0, 0)).unwrap();
                win_buzz(session, rx, player).await;
                session.mark_wrong().unwrap();
            }
            GamePhase::GameOver => {
                for col in 0..BOARD_COLUMNS {
                    for row in 0..BOARD_ROWS {
                        session.select_tile(TilePosition::new(col, row)).unwrap();
                        session.skip_tile().unwrap();
                    }
                }
            }
            GamePhase::Lobby => unreachable!("sessions start in the lobby"),
        }
        assert_eq!(session.phase(), target);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_from_every_phase_returns_to_lobby() {
        for target in [
            GamePhase::Board,
            GamePhase::ClueRevealed,
            GamePhase::Answering,
            GamePhase::SecondChance,
            GamePhase::GameOver,
        ] {
            let (mut session, mut rx) = session_with(no_daily_doubles());
            let p1 = join(&mut session, "P1");
            join(&mut session, "P2");
            session.adjust_score("P2", 600).unwrap();
            drive_to(&mut session, &mut rx, target, p1).await;

            session.reset().unwrap();
            assert_eq!(session.phase(), GamePhase::Lobby, "reset from {target}");
            assert!(session.board().is_none(), "reset from {target}");
            assert!(session.round().is_none(), "reset from {target}");
            assert!(!session.buzz_window_open(), "reset from {target}");
            assert!(session.timer_ends_at().is_none(), "reset from {target}");
            assert!(
                session.players().iter().all(|player| player.score == 0),
                "reset from {target}"
            );

            tokio::time::sleep(Duration::from_secs(60)).await;
            assert!(rx.try_recv().is_err(), "timer fired after reset from {target}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_commands_leave_state_untouched() {
        let (mut session, _rx) = session_with(no_daily_doubles());
        let version = session.version();

        assert!(session.select_tile(TilePosition::new(0, 0)).is_err());
        assert!(session.mark_correct().is_err());
        assert!(session.mark_wrong().is_err());
        assert!(session.skip_tile().is_err());
        assert_eq!(session.version(), version);

        session.start("default", board_entity()).unwrap();
        let version = session.version();
        assert!(matches!(
            session.select_tile(TilePosition::new(7, 0)),
            Err(GameError::Board(BoardError::OutOfRange { col: 7, row: 0 }))
        ));
        assert!(session.start("other", board_entity()).is_err());
        assert_eq!(session.version(), version);
        assert_eq!(session.board_id(), "default");

        session.select_tile(TilePosition::new(0, 0)).unwrap();
        session.skip_tile().unwrap();
        assert_eq!(
            session.select_tile(TilePosition::new(0, 0)),
            Err(GameError::Board(BoardError::AlreadyUsed { col: 0, row: 0 }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_board_keeps_lobby() {
        let (mut session, _rx) = session();
        let mut entity = board_entity();
        entity.categories.truncate(3);

        assert!(matches!(
            session.start("broken", entity),
            Err(GameError::Board(BoardError::CategoryCount { .. }))
        ));
        assert_eq!(session.phase(), GamePhase::Lobby);
        assert!(session.board().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_keeps_score_across_disconnect() {
        let (mut session, _rx) = session();
        let first = join(&mut session, "Ada");
        session.adjust_score("Ada", 1000).unwrap();

        assert_eq!(session.disconnect(first), Some("Ada".into()));
        let second = Uuid::new_v4();
        let (_, outcome) = session.join("Ada", second).unwrap();
        assert_eq!(outcome, JoinOutcome::Reconnected);
        assert_eq!(score(&session, "Ada"), 1000);
        assert!(matches!(
            session.join("Ada", Uuid::new_v4()),
            Err(GameError::Registry(RegistryError::NameTaken(_)))
        ));
    }
}
