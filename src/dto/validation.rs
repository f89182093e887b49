//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a player name is not blank once trimmed.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Alice")  // Ok
/// validate_player_name("   ")    // Err - blank
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a (normalized) room code has `length` characters, all uppercase letters or
/// digits.
pub fn validate_room_code(code: &str, length: usize) -> Result<(), ValidationError> {
    if code.len() != length
        || !code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some(
            format!("Room code must be {length} uppercase letters or digits").into(),
        );
        return Err(err);
    }

    Ok(())
}
