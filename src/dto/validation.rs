//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dao::board_store::{MAX_BOARD_ID_LEN, is_valid_board_id};

/// Validates that a board id is 1 to 64 ASCII letters, digits, `-` or `_`.
///
/// # Examples
///
/// ```ignore
/// validate_board_id("science-night") // Ok
/// validate_board_id("../etc/passwd") // Err - path characters
/// validate_board_id("")              // Err - empty
/// ```
pub fn validate_board_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_BOARD_ID_LEN {
        let mut err = ValidationError::new("board_id_length");
        err.message = Some(
            format!(
                "Board id must be between 1 and {MAX_BOARD_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !is_valid_board_id(id) {
        let mut err = ValidationError::new("board_id_format");
        err.message =
            Some("Board id must contain only ASCII letters, digits, `-` or `_`".into());
        return Err(err);
    }

    Ok(())
}
