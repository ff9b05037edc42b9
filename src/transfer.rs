//! Whole-collection export and import.
//!
//! The current export format is a single JSON object holding both
//! collections:
//!
//! ```json
//! { "games": [...], "lessons": [...], "exportDate": "2025-01-02T10:00:00Z", "version": "2.0" }
//! ```
//!
//! Older exports are a bare array of games. Both shapes can be imported.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    collection::{self, Games, Lessons},
    domain::{Game, GameDraft, Lesson, LessonDraft, Record, ValidationError},
};

/// Version tag written to combined exports.
pub const FORMAT_VERSION: &str = "2.0";

/// A snapshot of both collections, ready to be written out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    /// Every game.
    pub games: &'a [Game],
    /// Every lesson.
    pub lessons: &'a [Lesson],
    /// When the snapshot was taken.
    pub export_date: DateTime<Utc>,
    /// The format version, always [`FORMAT_VERSION`].
    pub version: &'static str,
}

impl<'a> ExportDocument<'a> {
    /// A snapshot of the given records taken at `export_date`.
    #[must_use]
    pub const fn new(games: &'a [Game], lessons: &'a [Lesson], export_date: DateTime<Utc>) -> Self {
        Self {
            games,
            lessons,
            export_date,
            version: FORMAT_VERSION,
        }
    }

    /// Renders the document as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be serialized.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Takes a snapshot of both collections.
#[must_use]
pub fn export_all<'a>(games: &'a Games, lessons: &'a Lessons) -> ExportDocument<'a> {
    ExportDocument::new(games.records(), lessons.records(), Utc::now())
}

/// Renders one collection as a bare JSON array.
///
/// # Errors
///
/// Returns an error if a record cannot be serialized.
pub fn export_collection<R: Record>(records: &[R]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

/// Why an import document was rejected.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The document is not JSON.
    #[error("import file is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    /// The document is JSON, but neither a combined export nor a list of
    /// games.
    #[error("import file is neither a full export nor a list of games")]
    UnrecognisedShape,

    /// An entry could not be read as a record.
    #[error("{collection} entry {index} is malformed: {source}")]
    InvalidEntry {
        /// The collection the entry belongs to.
        collection: &'static str,
        /// Position of the entry in its list, from 0.
        index: usize,
        /// The parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// A game in a legacy import breaks a constraint.
    #[error("game entry {index} is invalid: {source}")]
    InvalidGame {
        /// Position of the entry in the list, from 0.
        index: usize,
        /// The violated constraint.
        #[source]
        source: ValidationError,
    },
}

/// The content of an import file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportDocument {
    /// A combined export. Its records are added to both collections.
    Combined {
        /// The games to add.
        games: Vec<GameDraft>,
        /// The lessons to add.
        lessons: Vec<LessonDraft>,
    },
    /// A bare list of games. It replaces the games collection.
    LegacyGames(Vec<GameDraft>),
}

impl ImportDocument {
    /// Reads an import document.
    ///
    /// Identifiers and timestamps in the document are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON, has neither accepted shape,
    /// or holds an entry that is not a record.
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let value: Value = serde_json::from_str(text).map_err(FormatError::Json)?;

        match value {
            Value::Array(entries) => Ok(Self::LegacyGames(drafts(Game::COLLECTION, entries)?)),
            Value::Object(mut fields) => match (fields.remove("games"), fields.remove("lessons")) {
                (Some(Value::Array(games)), Some(Value::Array(lessons))) => Ok(Self::Combined {
                    games: drafts(Game::COLLECTION, games)?,
                    lessons: drafts(Lesson::COLLECTION, lessons)?,
                }),
                _ => Err(FormatError::UnrecognisedShape),
            },
            _ => Err(FormatError::UnrecognisedShape),
        }
    }

    /// The number of games in the document.
    #[must_use]
    pub fn game_count(&self) -> usize {
        match self {
            Self::Combined { games, .. } | Self::LegacyGames(games) => games.len(),
        }
    }

    /// The number of lessons in the document.
    #[must_use]
    pub fn lesson_count(&self) -> usize {
        match self {
            Self::Combined { lessons, .. } => lessons.len(),
            Self::LegacyGames(_) => 0,
        }
    }
}

fn drafts<D: DeserializeOwned>(
    collection: &'static str,
    entries: Vec<Value>,
) -> Result<Vec<D>, FormatError> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry).map_err(|source| FormatError::InvalidEntry {
                collection,
                index,
                source,
            })
        })
        .collect()
}

/// What an import is about to do, shown to the user for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportPlan {
    /// Games currently in the collection.
    pub current_games: usize,
    /// Lessons currently in the collection.
    pub current_lessons: usize,
    /// Games in the document.
    pub incoming_games: usize,
    /// Lessons in the document.
    pub incoming_lessons: usize,
    /// Whether the current games will be deleted first.
    pub replaces_games: bool,
}

/// The result of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The user declined. Nothing changed.
    Cancelled,
    /// The records were created.
    Imported {
        /// Games created.
        games: usize,
        /// Lessons created.
        lessons: usize,
    },
}

/// Hooks called while an import runs.
pub trait ImportObserver {
    /// Asks whether to go ahead with the import.
    fn confirm(&mut self, plan: &ImportPlan) -> bool;

    /// Called after each record is created.
    fn created(&mut self, _collection: &'static str) {}
}

impl<F> ImportObserver for F
where
    F: FnMut(&ImportPlan) -> bool,
{
    fn confirm(&mut self, plan: &ImportPlan) -> bool {
        self(plan)
    }
}

/// Why an import failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document was rejected before anything changed.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A record could not be created or deleted. Records created before the
    /// failure are kept.
    #[error(transparent)]
    Collection(#[from] collection::Error),
}

/// Applies an import document after asking the observer for confirmation.
///
/// A combined document is added to both collections: every record is created
/// afresh, with a new identifier and new timestamps, and both collections are
/// then reloaded. Lessons keep the game identifiers recorded in the document.
///
/// A legacy list of games replaces the games collection. Every entry is
/// checked before anything changes; lessons are left alone.
///
/// # Errors
///
/// Returns [`Error::Format`] if a legacy entry is invalid, in which case
/// nothing has changed. Returns [`Error::Collection`] if a write fails
/// partway through; changes made up to that point are not rolled back.
pub fn import_all(
    games: &mut Games,
    lessons: &mut Lessons,
    document: ImportDocument,
    observer: &mut impl ImportObserver,
) -> Result<ImportOutcome, Error> {
    let mut plan = ImportPlan {
        current_games: games.len(),
        current_lessons: lessons.len(),
        incoming_games: document.game_count(),
        incoming_lessons: document.lesson_count(),
        replaces_games: false,
    };

    match document {
        ImportDocument::Combined {
            games: game_drafts,
            lessons: lesson_drafts,
        } => {
            if !observer.confirm(&plan) {
                tracing::info!("Import cancelled");
                return Ok(ImportOutcome::Cancelled);
            }

            for draft in game_drafts {
                games.add(draft)?;
                observer.created(Game::COLLECTION);
            }
            for draft in lesson_drafts {
                lessons.add(draft)?;
                observer.created(Lesson::COLLECTION);
            }

            games.load();
            lessons.load();
            tracing::info!(
                "Imported {} games and {} lessons",
                plan.incoming_games,
                plan.incoming_lessons
            );
            Ok(ImportOutcome::Imported {
                games: plan.incoming_games,
                lessons: plan.incoming_lessons,
            })
        }
        ImportDocument::LegacyGames(drafts) => {
            let drafts = drafts
                .into_iter()
                .enumerate()
                .map(|(index, draft)| {
                    Game::prepare_draft(draft)
                        .map_err(|source| FormatError::InvalidGame { index, source })
                })
                .collect::<Result<Vec<_>, _>>()?;

            plan.replaces_games = true;
            if !observer.confirm(&plan) {
                tracing::info!("Import cancelled");
                return Ok(ImportOutcome::Cancelled);
            }

            let existing: Vec<_> = games.records().iter().map(|game| game.id.clone()).collect();
            games.delete_many(&existing)?;
            games.clear_undo();

            for draft in drafts {
                games.add(draft)?;
                observer.created(Game::COLLECTION);
            }

            games.load();
            tracing::info!("Replaced games with {} imported games", plan.incoming_games);
            Ok(ImportOutcome::Imported {
                games: plan.incoming_games,
                lessons: 0,
            })
        }
    }
}
