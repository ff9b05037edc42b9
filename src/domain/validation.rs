//! Text sanitization and the validation errors shared by all records.

/// Maximum number of characters kept in any free-text field.
pub const MAX_TEXT_LENGTH: usize = 5000;

/// Shortest allowed lesson duration, in minutes.
pub const MIN_DURATION: i64 = 1;

/// Longest allowed lesson duration, in minutes.
pub const MAX_DURATION: i64 = 600;

/// Trim surrounding whitespace and cap the text at [`MAX_TEXT_LENGTH`]
/// characters.
///
/// Over-long input is truncated rather than rejected.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() > MAX_TEXT_LENGTH {
        trimmed.chars().take(MAX_TEXT_LENGTH).collect()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn exceeds_limit(text: &str) -> bool {
    text.chars().count() > MAX_TEXT_LENGTH
}

/// A field constraint violated by a draft or patch.
///
/// A validation error blocks the write; nothing is sent to the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The game position is empty or whitespace-only.
    #[error("position is required")]
    PositionRequired,

    /// The game position is longer than [`MAX_TEXT_LENGTH`].
    #[error("position may contain at most 5000 characters")]
    PositionTooLong,

    /// The lesson name is empty or whitespace-only.
    #[error("lesson name is required")]
    NameRequired,

    /// The lesson name is longer than [`MAX_TEXT_LENGTH`].
    #[error("lesson name may contain at most 5000 characters")]
    NameTooLong,

    /// The lesson does not reference any game.
    #[error("a lesson needs at least one game")]
    NoGames,

    /// The lesson duration is not a whole number of minutes in range.
    #[error("duration must be between 1 and 600 minutes, got '{0}'")]
    DurationOutOfRange(String),
}
