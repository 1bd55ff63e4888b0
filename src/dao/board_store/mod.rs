pub mod filesystem;

use crate::dao::models::BoardEntity;
use crate::dao::storage::{StorageError, StorageResult};
use futures::future::BoxFuture;

pub use self::filesystem::FileBoardStore;

/// Longest accepted board identifier.
pub const MAX_BOARD_ID_LEN: usize = 64;

/// Read-only source of board definitions.
pub trait BoardStore: Send + Sync {
    fn load_board(&self, id: &str) -> BoxFuture<'static, StorageResult<BoardEntity>>;
    fn list_boards(&self) -> BoxFuture<'static, StorageResult<Vec<String>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Whether `id` is a well-formed board identifier: 1 to 64 ASCII letters, digits, `-` or `_`.
pub fn is_valid_board_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_BOARD_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Reject malformed identifiers before they reach a backend.
pub fn ensure_board_id(id: &str) -> StorageResult<()> {
    if is_valid_board_id(id) {
        Ok(())
    } else {
        Err(StorageError::InvalidId { id: id.to_string() })
    }
}
