//! Player identities keyed by display name, surviving disconnects and reconnects.

use std::collections::HashMap;

use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

/// Opaque identifier of a transport connection.
pub type ConnectionId = Uuid;

/// Longest accepted display name, in characters.
pub const MAX_NAME_CHARS: usize = 64;

/// A participant and their running score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Trimmed display name, unique in the registry.
    pub name: String,
    /// Current score; may go negative.
    pub score: i64,
    connection: Option<ConnectionId>,
}

impl Player {
    fn new(name: String, connection: Option<ConnectionId>) -> Self {
        Self {
            name,
            score: 0,
            connection,
        }
    }

    /// Whether a live connection is bound to this player.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

/// Errors raised by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Name is empty once trimmed.
    #[error("player name must not be empty")]
    EmptyName,
    /// Name exceeds [`MAX_NAME_CHARS`].
    #[error("player name must be at most {MAX_NAME_CHARS} characters")]
    NameTooLong,
    /// Name is held by a connected player (or already registered, for host additions).
    #[error("name `{0}` is already taken")]
    NameTaken(String),
    /// Registry reached its capacity.
    #[error("game is full (max {0} players)")]
    Full(usize),
    /// No player with that name.
    #[error("player `{0}` not found")]
    UnknownPlayer(String),
    /// The connection is already bound to a player.
    #[error("this connection already joined as `{0}`")]
    AlreadyJoined(String),
}

/// How a successful join was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new player record was created.
    Created,
    /// An existing disconnected record was bound to the connection.
    Reconnected,
}

/// Name-keyed player records plus a connection index.
///
/// The name-keyed map is the source of truth; `by_connection` only mirrors the connections
/// bound in it.
#[derive(Debug, Clone)]
pub struct PlayerRegistry {
    capacity: usize,
    players: IndexMap<String, Player>,
    by_connection: HashMap<ConnectionId, String>,
}

impl PlayerRegistry {
    /// Create an empty registry holding at most `capacity` players.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            players: IndexMap::new(),
            by_connection: HashMap::new(),
        }
    }

    /// Register a player for `connection`, or reconnect the disconnected player of that name.
    ///
    /// Returns the trimmed name together with how the join was handled.
    pub fn add_player(
        &mut self,
        name: &str,
        connection: ConnectionId,
    ) -> Result<(String, JoinOutcome), RegistryError> {
        let name = sanitize_name(name)?;

        if let Some(bound) = self.by_connection.get(&connection) {
            return Err(RegistryError::AlreadyJoined(bound.clone()));
        }

        if let Some(existing) = self.players.get_mut(&name) {
            if existing.is_connected() {
                return Err(RegistryError::NameTaken(name));
            }
            existing.connection = Some(connection);
            self.by_connection.insert(connection, name.clone());
            return Ok((name, JoinOutcome::Reconnected));
        }

        self.ensure_capacity()?;
        self.players
            .insert(name.clone(), Player::new(name.clone(), Some(connection)));
        self.by_connection.insert(connection, name.clone());
        Ok((name, JoinOutcome::Created))
    }

    /// Register a player on the host's behalf, without a live connection.
    pub fn add_player_by_host(&mut self, name: &str) -> Result<String, RegistryError> {
        let name = sanitize_name(name)?;
        if self.players.contains_key(&name) {
            return Err(RegistryError::NameTaken(name));
        }
        self.ensure_capacity()?;
        self.players
            .insert(name.clone(), Player::new(name.clone(), None));
        Ok(name)
    }

    /// Delete a player outright, whatever their connection state.
    pub fn remove_player(&mut self, name: &str) -> Result<Player, RegistryError> {
        let player = self
            .players
            .shift_remove(name)
            .ok_or_else(|| RegistryError::UnknownPlayer(name.to_string()))?;
        if let Some(connection) = player.connection {
            self.by_connection.remove(&connection);
        }
        Ok(player)
    }

    /// Unbind `connection`, keeping the player's identity and score.
    ///
    /// Returns the affected player name, if the connection had joined.
    pub fn mark_disconnected(&mut self, connection: ConnectionId) -> Option<String> {
        let name = self.by_connection.remove(&connection)?;
        if let Some(player) = self.players.get_mut(&name) {
            player.connection = None;
        }
        Some(name)
    }

    /// Add `delta` to a player's score, returning the new score.
    pub fn adjust_score(&mut self, name: &str, delta: i64) -> Result<i64, RegistryError> {
        let player = self
            .players
            .get_mut(name)
            .ok_or_else(|| RegistryError::UnknownPlayer(name.to_string()))?;
        player.score = player.score.saturating_add(delta);
        Ok(player.score)
    }

    /// Zero every score.
    pub fn reset_scores(&mut self) {
        for player in self.players.values_mut() {
            player.score = 0;
        }
    }

    /// Look a player up by name.
    pub fn get(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    /// Whether a player with that name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.players.contains_key(name)
    }

    /// Player bound to `connection`.
    pub fn by_connection(&self, connection: ConnectionId) -> Option<&Player> {
        self.by_connection
            .get(&connection)
            .and_then(|name| self.players.get(name))
    }

    /// Players in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Number of registered players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn ensure_capacity(&self) -> Result<(), RegistryError> {
        if self.players.len() >= self.capacity {
            Err(RegistryError::Full(self.capacity))
        } else {
            Ok(())
        }
    }
}

fn sanitize_name(name: &str) -> Result<String, RegistryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::EmptyName);
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(RegistryError::NameTooLong);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> ConnectionId {
        Uuid::new_v4()
    }

    #[test]
    fn join_trims_and_creates() {
        let mut registry = PlayerRegistry::new(20);
        let connection = conn();

        let (name, outcome) = registry.add_player("  Ada  ", connection).unwrap();
        assert_eq!(name, "Ada");
        assert_eq!(outcome, JoinOutcome::Created);

        let player = registry.by_connection(connection).unwrap();
        assert_eq!(player.name, "Ada");
        assert_eq!(player.score, 0);
        assert!(player.is_connected());
    }

    #[test]
    fn rejects_empty_and_oversized_names() {
        let mut registry = PlayerRegistry::new(20);
        assert_eq!(
            registry.add_player("   ", conn()),
            Err(RegistryError::EmptyName)
        );
        assert_eq!(
            registry.add_player_by_host(&"x".repeat(MAX_NAME_CHARS + 1)),
            Err(RegistryError::NameTooLong)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn reconnect_restores_score() {
        let mut registry = PlayerRegistry::new(20);
        let first = conn();
        registry.add_player("Ada", first).unwrap();
        registry.adjust_score("Ada", 600).unwrap();

        assert_eq!(registry.mark_disconnected(first), Some("Ada".to_string()));
        assert!(!registry.get("Ada").unwrap().is_connected());
        assert!(registry.by_connection(first).is_none());

        let second = conn();
        let (_, outcome) = registry.add_player("Ada", second).unwrap();
        assert_eq!(outcome, JoinOutcome::Reconnected);

        let player = registry.by_connection(second).unwrap();
        assert_eq!(player.score, 600);
        assert!(player.is_connected());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn connected_name_collision_is_rejected() {
        let mut registry = PlayerRegistry::new(20);
        registry.add_player("Ada", conn()).unwrap();
        assert_eq!(
            registry.add_player("Ada", conn()),
            Err(RegistryError::NameTaken("Ada".into()))
        );
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut registry = PlayerRegistry::new(20);
        registry.add_player("ada", conn()).unwrap();
        registry.add_player("Ada", conn()).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn connection_cannot_join_twice() {
        let mut registry = PlayerRegistry::new(20);
        let connection = conn();
        registry.add_player("Ada", connection).unwrap();
        assert_eq!(
            registry.add_player("Grace", connection),
            Err(RegistryError::AlreadyJoined("Ada".into()))
        );
    }

    #[test]
    fn capacity_is_enforced() {
        let mut registry = PlayerRegistry::new(2);
        registry.add_player("A", conn()).unwrap();
        registry.add_player_by_host("B").unwrap();
        assert_eq!(registry.add_player("C", conn()), Err(RegistryError::Full(2)));
        assert_eq!(registry.add_player_by_host("D"), Err(RegistryError::Full(2)));
    }

    #[test]
    fn reconnect_is_allowed_at_capacity() {
        let mut registry = PlayerRegistry::new(1);
        let first = conn();
        registry.add_player("A", first).unwrap();
        registry.mark_disconnected(first);
        assert!(registry.add_player("A", conn()).is_ok());
    }

    #[test]
    fn host_added_players_start_disconnected_and_can_be_claimed() {
        let mut registry = PlayerRegistry::new(20);
        registry.add_player_by_host("Table 3").unwrap();
        assert!(!registry.get("Table 3").unwrap().is_connected());
        assert_eq!(
            registry.add_player_by_host("Table 3"),
            Err(RegistryError::NameTaken("Table 3".into()))
        );

        let (_, outcome) = registry.add_player("Table 3", conn()).unwrap();
        assert_eq!(outcome, JoinOutcome::Reconnected);
    }

    #[test]
    fn removal_drops_connection_binding() {
        let mut registry = PlayerRegistry::new(20);
        let connection = conn();
        registry.add_player("Ada", connection).unwrap();
        registry.add_player_by_host("Grace").unwrap();

        registry.remove_player("Ada").unwrap();
        assert!(registry.by_connection(connection).is_none());
        assert_eq!(registry.mark_disconnected(connection), None);
        assert_eq!(
            registry.remove_player("Ada"),
            Err(RegistryError::UnknownPlayer("Ada".into()))
        );
        assert_eq!(
            registry.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["Grace"]
        );
    }

    #[test]
    fn scores_adjust_and_reset() {
        let mut registry = PlayerRegistry::new(20);
        registry.add_player_by_host("Ada").unwrap();
        assert_eq!(registry.adjust_score("Ada", -400), Ok(-400));
        assert_eq!(registry.adjust_score("Ada", 1000), Ok(600));
        assert!(registry.adjust_score("Nobody", 1).is_err());

        registry.reset_scores();
        assert_eq!(registry.get("Ada").unwrap().score, 0);
    }
}
