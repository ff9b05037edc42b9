use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    lenient,
    record::contains_lowercase,
    validation::exceeds_limit,
    Record, RecordId, sanitize, ValidationError,
};

/// A single training game.
///
/// A game is built around a starting position, the constraint that must hold
/// while it is played, and a task for each of the two players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// Optional display label.
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    /// The starting position. Never empty once persisted.
    #[serde(default, deserialize_with = "lenient::text")]
    pub position: String,
    /// The constraint that must hold while the game is played.
    #[serde(default, deserialize_with = "lenient::text")]
    pub invariant: String,
    /// Objective of the first player.
    #[serde(default, deserialize_with = "lenient::text")]
    pub task_player_a: String,
    /// Objective of the second player.
    #[serde(default, deserialize_with = "lenient::text")]
    pub task_player_b: String,
    /// How to make the game easier or harder.
    #[serde(default, deserialize_with = "lenient::text")]
    pub differentiation: String,
    /// Store-assigned creation time.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Store-assigned modification time.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// The content of a game, as supplied when creating one.
///
/// Any `id`, `createdAt` or `updatedAt` keys in a document are ignored when it
/// is read as a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameDraft {
    /// Optional display label.
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    /// The starting position (required).
    #[serde(deserialize_with = "lenient::text")]
    pub position: String,
    /// The constraint that must hold.
    #[serde(deserialize_with = "lenient::text")]
    pub invariant: String,
    /// Objective of the first player.
    #[serde(deserialize_with = "lenient::text")]
    pub task_player_a: String,
    /// Objective of the second player.
    #[serde(deserialize_with = "lenient::text")]
    pub task_player_b: String,
    /// How to make the game easier or harder.
    #[serde(deserialize_with = "lenient::text")]
    pub differentiation: String,
}

impl GameDraft {
    /// A draft with only the position set.
    #[must_use]
    pub fn new(position: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            ..Self::default()
        }
    }

    /// Returns a copy with every text field trimmed and length-capped.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            name: sanitize(&self.name),
            position: sanitize(&self.position),
            invariant: sanitize(&self.invariant),
            task_player_a: sanitize(&self.task_player_a),
            task_player_b: sanitize(&self.task_player_b),
            differentiation: sanitize(&self.differentiation),
        }
    }
}

/// A partial update to a game. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GamePatch {
    /// New display label.
    pub name: Option<String>,
    /// New position.
    pub position: Option<String>,
    /// New constraint.
    pub invariant: Option<String>,
    /// New objective for the first player.
    pub task_player_a: Option<String>,
    /// New objective for the second player.
    pub task_player_b: Option<String>,
    /// New differentiation notes.
    pub differentiation: Option<String>,
}

impl GamePatch {
    /// Returns a copy with every present text field trimmed and
    /// length-capped.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let clean = |field: Option<String>| field.as_deref().map(sanitize);
        Self {
            name: clean(self.name),
            position: clean(self.position),
            invariant: clean(self.invariant),
            task_player_a: clean(self.task_player_a),
            task_player_b: clean(self.task_player_b),
            differentiation: clean(self.differentiation),
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Checks the constraints a game must satisfy before it is persisted.
///
/// Only the position is required. It must contain something other than
/// whitespace and be at most [`MAX_TEXT_LENGTH`](crate::domain::MAX_TEXT_LENGTH)
/// characters long.
///
/// # Errors
///
/// Returns the violated constraint.
pub fn validate_game(draft: &GameDraft) -> Result<(), ValidationError> {
    validate_position(&draft.position)
}

fn validate_position(position: &str) -> Result<(), ValidationError> {
    if position.trim().is_empty() {
        return Err(ValidationError::PositionRequired);
    }
    if exceeds_limit(position) {
        return Err(ValidationError::PositionTooLong);
    }
    Ok(())
}

impl Record for Game {
    const COLLECTION: &'static str = "games";

    type Draft = GameDraft;
    type Patch = GamePatch;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: RecordId, draft: GameDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            position: draft.position,
            invariant: draft.invariant,
            task_player_a: draft.task_player_a,
            task_player_b: draft.task_player_b,
            differentiation: draft.differentiation,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: GamePatch, now: DateTime<Utc>) {
        let GamePatch {
            name,
            position,
            invariant,
            task_player_a,
            task_player_b,
            differentiation,
        } = patch;

        for (slot, value) in [
            (&mut self.name, name),
            (&mut self.position, position),
            (&mut self.invariant, invariant),
            (&mut self.task_player_a, task_player_a),
            (&mut self.task_player_b, task_player_b),
            (&mut self.differentiation, differentiation),
        ] {
            if let Some(value) = value {
                *slot = value;
            }
        }
        self.updated_at = now;
    }

    fn to_draft(&self) -> GameDraft {
        GameDraft {
            name: self.name.clone(),
            position: self.position.clone(),
            invariant: self.invariant.clone(),
            task_player_a: self.task_player_a.clone(),
            task_player_b: self.task_player_b.clone(),
            differentiation: self.differentiation.clone(),
        }
    }

    fn prepare_draft(draft: GameDraft) -> Result<GameDraft, ValidationError> {
        let draft = draft.sanitized();
        validate_game(&draft)?;
        Ok(draft)
    }

    fn prepare_patch(patch: GamePatch) -> Result<GamePatch, ValidationError> {
        let patch = patch.sanitized();
        if let Some(position) = &patch.position {
            validate_position(position)?;
        }
        Ok(patch)
    }

    fn matches(&self, needle: &str) -> bool {
        [
            &self.name,
            &self.position,
            &self.invariant,
            &self.task_player_a,
            &self.task_player_b,
            &self.differentiation,
        ]
        .into_iter()
        .any(|field| contains_lowercase(field, needle))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::MAX_TEXT_LENGTH;

    #[test_case("Closed Guard" => Ok(()); "plain position")]
    #[test_case("  Mount  " => Ok(()); "padded position")]
    #[test_case("" => Err(ValidationError::PositionRequired); "empty position")]
    #[test_case(" \t\n" => Err(ValidationError::PositionRequired); "whitespace only")]
    fn validate_game_checks_position(position: &str) -> Result<(), ValidationError> {
        validate_game(&GameDraft::new(position))
    }

    #[test]
    fn validate_game_rejects_overlong_position() {
        let draft = GameDraft::new("p".repeat(MAX_TEXT_LENGTH + 1));
        assert_eq!(validate_game(&draft), Err(ValidationError::PositionTooLong));
    }

    #[test]
    fn validate_game_accepts_position_at_limit() {
        let draft = GameDraft::new("p".repeat(MAX_TEXT_LENGTH));
        assert_eq!(validate_game(&draft), Ok(()));
    }

    #[test]
    fn prepare_draft_truncates_before_validating() {
        let draft = GameDraft::new(format!("  {}  ", "p".repeat(MAX_TEXT_LENGTH + 10)));
        let prepared = Game::prepare_draft(draft).unwrap();
        assert_eq!(prepared.position.chars().count(), MAX_TEXT_LENGTH);
    }

    #[test]
    fn prepare_patch_ignores_absent_position() {
        let patch = GamePatch {
            name: Some("  Renamed ".to_string()),
            ..GamePatch::default()
        };
        let prepared = Game::prepare_patch(patch).unwrap();
        assert_eq!(prepared.name.as_deref(), Some("Renamed"));
    }

    #[test]
    fn prepare_patch_rejects_blank_position() {
        let patch = GamePatch {
            position: Some("   ".to_string()),
            ..GamePatch::default()
        };
        assert_eq!(
            Game::prepare_patch(patch),
            Err(ValidationError::PositionRequired)
        );
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let game = Game::from_draft(
            RecordId::new("1"),
            GameDraft {
                task_player_a: "pass".to_string(),
                ..GameDraft::new("Guard Pass")
            },
            DateTime::<Utc>::default(),
        );
        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["taskPlayerA"], "pass");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn draft_ignores_identity_and_nulls() {
        let draft: GameDraft = serde_json::from_str(
            r#"{"id":"old","position":"Mount","invariant":null,"createdAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(draft.position, "Mount");
        assert_eq!(draft.invariant, "");
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let created = DateTime::<Utc>::default();
        let mut game = Game::from_draft(
            RecordId::new("1"),
            GameDraft {
                name: "Pass drill".to_string(),
                ..GameDraft::new("Guard")
            },
            created,
        );
        let later = created + chrono::TimeDelta::seconds(10);
        game.apply(
            GamePatch {
                position: Some("Half Guard".to_string()),
                ..GamePatch::default()
            },
            later,
        );
        assert_eq!(game.name, "Pass drill");
        assert_eq!(game.position, "Half Guard");
        assert_eq!(game.created_at, created);
        assert_eq!(game.updated_at, later);
    }

    #[test]
    fn matches_any_text_field() {
        let game = Game::from_draft(
            RecordId::new("1"),
            GameDraft {
                differentiation: "Add a Kimura grip".to_string(),
                ..GameDraft::new("Side Control")
            },
            DateTime::<Utc>::default(),
        );
        assert!(game.matches("kimura"));
        assert!(game.matches("side"));
        assert!(!game.matches("mount"));
    }
}
