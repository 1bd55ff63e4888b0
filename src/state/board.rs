//! Runtime board: immutable clue content plus per-tile play state.

use rand::{Rng, seq::SliceRandom};
use thiserror::Error;

use crate::dao::models::BoardEntity;

/// Number of categories (columns) on a board.
pub const BOARD_COLUMNS: usize = 5;
/// Number of tiles per category (rows).
pub const BOARD_ROWS: usize = 5;

/// Column/row coordinates of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePosition {
    /// Category index, left to right.
    pub col: usize,
    /// Tile index inside the category, top to bottom.
    pub row: usize,
}

impl TilePosition {
    /// Build a position from its coordinates.
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// Immutable content of a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileContent {
    /// Face value in points.
    pub value: i64,
    /// Clue text.
    pub clue: String,
    /// Expected answer (host only).
    pub answer: String,
}

/// Publicly visible state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileState {
    /// Face value in points.
    pub value: i64,
    /// Whether the tile has already been played.
    pub used: bool,
    /// Whether the tile doubles its points.
    pub daily_double: bool,
}

/// Errors raised while building or playing a board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// The board definition does not have the expected number of categories.
    #[error("board must have exactly {expected} categories (got {actual})")]
    CategoryCount {
        /// Required category count.
        expected: usize,
        /// Category count found in the definition.
        actual: usize,
    },
    /// A category does not have the expected number of tiles.
    #[error("category `{category}` must have exactly {expected} tiles (got {actual})")]
    TileCount {
        /// Offending category name.
        category: String,
        /// Required tile count.
        expected: usize,
        /// Tile count found in the definition.
        actual: usize,
    },
    /// More daily doubles were requested than the board has tiles.
    #[error("cannot place {requested} daily doubles on {available} tiles")]
    TooManyDailyDoubles {
        /// Daily doubles requested.
        requested: usize,
        /// Tiles available.
        available: usize,
    },
    /// Coordinates outside of the grid.
    #[error("tile ({col}, {row}) is outside the board")]
    OutOfRange {
        /// Requested column.
        col: usize,
        /// Requested row.
        row: usize,
    },
    /// The tile was already played.
    #[error("tile ({col}, {row}) has already been played")]
    AlreadyUsed {
        /// Requested column.
        col: usize,
        /// Requested row.
        row: usize,
    },
}

#[derive(Debug, Clone)]
struct Tile {
    content: TileContent,
    used: bool,
    daily_double: bool,
}

/// One loaded board. Replaced wholesale when a new game starts.
#[derive(Debug, Clone)]
pub struct Board {
    name: String,
    categories: Vec<String>,
    /// Indexed `[col][row]`.
    tiles: Vec<Vec<Tile>>,
    daily_doubles: Vec<TilePosition>,
}

impl Board {
    /// Validate a stored definition and place `daily_doubles` Daily Double tiles.
    ///
    /// Placement shuffles every position with `rng` (Fisher–Yates) and keeps the first
    /// `daily_doubles` entries, so each subset is equally likely and a seeded generator gives
    /// a reproducible layout.
    pub fn from_entity<R>(
        entity: BoardEntity,
        daily_doubles: usize,
        rng: &mut R,
    ) -> Result<Self, BoardError>
    where
        R: Rng + ?Sized,
    {
        if entity.categories.len() != BOARD_COLUMNS {
            return Err(BoardError::CategoryCount {
                expected: BOARD_COLUMNS,
                actual: entity.categories.len(),
            });
        }
        if let Some(category) = entity
            .categories
            .iter()
            .find(|category| category.tiles.len() != BOARD_ROWS)
        {
            return Err(BoardError::TileCount {
                category: category.name.clone(),
                expected: BOARD_ROWS,
                actual: category.tiles.len(),
            });
        }

        let available = BOARD_COLUMNS * BOARD_ROWS;
        if daily_doubles > available {
            return Err(BoardError::TooManyDailyDoubles {
                requested: daily_doubles,
                available,
            });
        }

        let mut positions: Vec<TilePosition> = (0..BOARD_COLUMNS)
            .flat_map(|col| (0..BOARD_ROWS).map(move |row| TilePosition::new(col, row)))
            .collect();
        positions.shuffle(rng);
        positions.truncate(daily_doubles);
        positions.sort();

        let mut categories = Vec::with_capacity(BOARD_COLUMNS);
        let mut tiles = Vec::with_capacity(BOARD_COLUMNS);
        for (col, category) in entity.categories.into_iter().enumerate() {
            categories.push(category.name);
            tiles.push(
                category
                    .tiles
                    .into_iter()
                    .enumerate()
                    .map(|(row, tile)| Tile {
                        content: TileContent {
                            value: tile.value,
                            clue: tile.clue,
                            answer: tile.answer,
                        },
                        used: false,
                        daily_double: positions.contains(&TilePosition::new(col, row)),
                    })
                    .collect(),
            );
        }

        Ok(Self {
            name: entity.name,
            categories,
            tiles,
            daily_doubles: positions,
        })
    }

    /// Display name of the board.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category names, left to right.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Positions flagged as Daily Double, sorted.
    pub fn daily_doubles(&self) -> &[TilePosition] {
        &self.daily_doubles
    }

    /// Public grid view indexed `[col][row]`.
    pub fn tile_states(&self) -> Vec<Vec<TileState>> {
        self.tiles
            .iter()
            .map(|column| column.iter().map(Tile::state).collect())
            .collect()
    }

    /// Public state of one tile.
    pub fn tile_state(&self, position: TilePosition) -> Result<TileState, BoardError> {
        self.get(position).map(Tile::state)
    }

    /// Clue and answer content of one tile.
    pub fn content(&self, position: TilePosition) -> Result<&TileContent, BoardError> {
        self.get(position).map(|tile| &tile.content)
    }

    /// Whether `position` is one of the Daily Doubles.
    pub fn is_daily_double(&self, position: TilePosition) -> bool {
        self.get(position).is_ok_and(|tile| tile.daily_double)
    }

    /// Flag the tile as played. Marking an already-played tile is a no-op.
    pub fn mark_used(&mut self, position: TilePosition) -> Result<(), BoardError> {
        let tile = self
            .tiles
            .get_mut(position.col)
            .and_then(|column| column.get_mut(position.row))
            .ok_or(BoardError::OutOfRange {
                col: position.col,
                row: position.row,
            })?;
        tile.used = true;
        Ok(())
    }

    /// Whether every tile has been played.
    pub fn all_used(&self) -> bool {
        self.tiles.iter().flatten().all(|tile| tile.used)
    }

    fn get(&self, position: TilePosition) -> Result<&Tile, BoardError> {
        self.tiles
            .get(position.col)
            .and_then(|column| column.get(position.row))
            .ok_or(BoardError::OutOfRange {
                col: position.col,
                row: position.row,
            })
    }
}

impl Tile {
    fn state(&self) -> TileState {
        TileState {
            value: self.content.value,
            used: self.used,
            daily_double: self.daily_double,
        }
    }
}

/// Board definitions shared by tests across the crate.
#[cfg(test)]
pub(crate) mod fixtures {
    use crate::dao::models::{BoardEntity, CategoryEntity, TileEntity};

    use super::{BOARD_COLUMNS, BOARD_ROWS};

    /// A 5×5 board whose tile values come from `value`.
    pub fn board_entity_with(value: impl Fn(usize, usize) -> i64) -> BoardEntity {
        BoardEntity {
            name: "Fixture Board".into(),
            categories: (0..BOARD_COLUMNS)
                .map(|col| CategoryEntity {
                    name: format!("Category {col}"),
                    tiles: (0..BOARD_ROWS)
                        .map(|row| TileEntity {
                            value: value(col, row),
                            clue: format!("clue {col}-{row}"),
                            answer: format!("answer {col}-{row}"),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Classic layout: rows are worth 200, 400, 600, 800 and 1000.
    pub fn board_entity() -> BoardEntity {
        board_entity_with(|_, row| (row as i64 + 1) * 200)
    }
}
