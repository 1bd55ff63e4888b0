use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

/// Board definition as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardEntity {
    /// Display name of the board.
    pub name: String,
    /// Ordered categories, one per board column.
    pub categories: Vec<CategoryEntity>,
}

/// One column of the board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryEntity {
    /// Category title shown above the column.
    pub name: String,
    /// Tiles of the column, top to bottom.
    pub tiles: Vec<TileEntity>,
}

/// Content of a single clue cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TileEntity {
    /// Face value in points. Any JSON number with no fractional part is accepted.
    #[serde(deserialize_with = "deserialize_points")]
    pub value: i64,
    /// Clue text revealed to everyone.
    pub clue: String,
    /// Expected answer, only shown to the host.
    pub answer: String,
}

fn deserialize_points<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(points) = number.as_i64() {
        return Ok(points);
    }
    match number.as_f64() {
        Some(points) if points.fract() == 0.0 && points.abs() <= i64::MAX as f64 => {
            Ok(points as i64)
        }
        _ => Err(D::Error::custom(format!(
            "tile value must be a whole number of points, got {number}"
        ))),
    }
}
