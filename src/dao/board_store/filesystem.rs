//! Board store reading `<root>/<id>.json` documents.

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tracing::debug;

use crate::dao::{
    board_store::{BoardStore, ensure_board_id, is_valid_board_id},
    models::BoardEntity,
    storage::{StorageError, StorageResult},
};

const BOARD_EXTENSION: &str = "json";

/// Board store backed by a directory of JSON files.
#[derive(Clone, Debug)]
pub struct FileBoardStore {
    root: Arc<PathBuf>,
}

impl FileBoardStore {
    /// Serve boards found under `root`. The directory is not checked until first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    /// Directory the boards are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn board_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.{BOARD_EXTENSION}"))
    }

    async fn read_board(&self, id: String) -> StorageResult<BoardEntity> {
        ensure_board_id(&id)?;
        let path = self.board_path(&id);
        let raw = tokio::fs::read(&path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StorageError::NotFound { id: id.clone() }
            } else {
                StorageError::unavailable(format!("failed to read {}", path.display()), err)
            }
        })?;
        debug!(board = %id, path = %path.display(), bytes = raw.len(), "board file read");

        serde_json::from_slice(&raw).map_err(|source| StorageError::Malformed { id, source })
    }

    async fn read_ids(&self) -> StorageResult<Vec<String>> {
        let unavailable = |err: io::Error| {
            StorageError::unavailable(
                format!("failed to list {}", self.root.display()),
                err,
            )
        };

        let mut entries = tokio::fs::read_dir(self.root.as_path())
            .await
            .map_err(unavailable)?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BOARD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
                && is_valid_board_id(stem)
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn check_root(&self) -> StorageResult<()> {
        let metadata = tokio::fs::metadata(self.root.as_path())
            .await
            .map_err(|err| {
                StorageError::unavailable(
                    format!("boards directory {} is not accessible", self.root.display()),
                    err,
                )
            })?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(StorageError::unavailable(
                format!("{} is not a directory", self.root.display()),
                io::Error::other("not a directory"),
            ))
        }
    }
}

impl BoardStore for FileBoardStore {
    fn load_board(&self, id: &str) -> BoxFuture<'static, StorageResult<BoardEntity>> {
        let store = self.clone();
        let id = id.to_string();
        Box::pin(async move { store.read_board(id).await })
    }

    fn list_boards(&self) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        let store = self.clone();
        Box::pin(async move { store.read_ids().await })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check_root().await })
    }
}
