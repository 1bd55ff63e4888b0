//! Buzz arbitration: collect the buzzes received during one window and pick a single winner.

use std::time::Instant;

/// One buzz received while a window was open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuzzEvent {
    /// Name of the player who buzzed.
    pub player: String,
    /// Instant at which the buzz was received.
    pub received_at: Instant,
}

/// Buffer of buzzes for the window currently open.
#[derive(Debug, Default)]
pub struct BuzzArbiter {
    pending: Vec<BuzzEvent>,
}

impl BuzzArbiter {
    /// Create an empty arbiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a buzz to the window. A player already in the window keeps their first buzz.
    ///
    /// Returns `true` when this buzz opened the window (the buffer was empty), meaning the
    /// caller must arm the window timer. Later buzzes never re-arm it.
    pub fn record(&mut self, player: impl Into<String>, received_at: Instant) -> bool {
        let player = player.into();
        if self.pending.iter().any(|event| event.player == player) {
            return false;
        }
        let opened = self.pending.is_empty();
        self.pending.push(BuzzEvent {
            player,
            received_at,
        });
        opened
    }

    /// Whether a window is collecting buzzes.
    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Close the window and return the earliest buzz from a player accepted by `eligible`.
    ///
    /// Buzzes are ordered by reception time; equal timestamps keep their insertion order, so
    /// the first one recorded wins. The buffer is always emptied.
    pub fn resolve(&mut self, mut eligible: impl FnMut(&str) -> bool) -> Option<BuzzEvent> {
        let mut pending = std::mem::take(&mut self.pending);
        // stable sort
        pending.sort_by_key(|event| event.received_at);
        pending.into_iter().find(|event| eligible(&event.player))
    }

    /// Discard the open window without picking a winner.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
