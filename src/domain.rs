//! Domain models for the games catalog.
//!
//! This module contains the record types (games and lessons), their drafts
//! and patches, the validation rules applied before anything is persisted, and
//! the configuration.

/// Game records, drafts and patches.
pub mod game;
pub use game::{validate_game, Game, GameDraft, GamePatch};

/// Lesson records, drafts and patches.
pub mod lesson;
pub use lesson::{validate_lesson, Lesson, LessonDraft, LessonPatch};

mod config;
pub use config::Config;

pub mod record;
pub use record::{Record, RecordId};

pub mod validation;
pub use validation::{sanitize, ValidationError, MAX_TEXT_LENGTH};

mod lenient;
