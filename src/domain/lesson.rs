use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    lenient,
    record::contains_lowercase,
    validation::{exceeds_limit, MAX_DURATION, MIN_DURATION},
    Record, RecordId, sanitize, ValidationError,
};

/// A lesson plan: an ordered sequence of games plus metadata.
///
/// The game identifiers are not checked against the games collection. A game
/// deleted after the lesson was composed leaves a dangling identifier behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// The lesson name. Never empty once persisted.
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    /// Free-text description.
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    /// Planned duration in minutes.
    #[serde(default, deserialize_with = "lenient::minutes")]
    pub duration: Option<u32>,
    /// Target level (e.g. "beginner").
    #[serde(default, deserialize_with = "lenient::text")]
    pub level: String,
    /// Coaching notes.
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: String,
    /// The games in teaching order. Duplicates are allowed.
    #[serde(default, deserialize_with = "lenient::ids")]
    pub game_ids: Vec<RecordId>,
    /// Store-assigned creation time.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Store-assigned modification time.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// The content of a lesson, as supplied when creating one.
///
/// The duration is kept as entered so that validation can reject input that
/// is not a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonDraft {
    /// The lesson name (required).
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    /// Free-text description.
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
    /// Planned duration in minutes, as entered.
    #[serde(deserialize_with = "lenient::duration_input")]
    pub duration: Option<String>,
    /// Target level.
    #[serde(deserialize_with = "lenient::text")]
    pub level: String,
    /// Coaching notes.
    #[serde(deserialize_with = "lenient::text")]
    pub notes: String,
    /// The games in teaching order (at least one).
    #[serde(deserialize_with = "lenient::ids")]
    pub game_ids: Vec<RecordId>,
}

impl LessonDraft {
    /// A draft with a name and a game sequence.
    #[must_use]
    pub fn new(name: impl Into<String>, game_ids: Vec<RecordId>) -> Self {
        Self {
            name: name.into(),
            game_ids,
            ..Self::default()
        }
    }

    /// The duration in minutes, if one was entered and it parses.
    #[must_use]
    pub fn duration_minutes(&self) -> Option<u32> {
        parse_minutes(self.duration.as_deref()?)
    }

    /// Returns a copy with every text field trimmed and length-capped.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            name: sanitize(&self.name),
            description: sanitize(&self.description),
            duration: clean_duration(self.duration),
            level: sanitize(&self.level),
            notes: sanitize(&self.notes),
            game_ids: self.game_ids,
        }
    }
}

/// A partial update to a lesson. `None` fields are left untouched.
///
/// A present but empty `duration` clears the stored duration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonPatch {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New duration in minutes, as entered.
    pub duration: Option<String>,
    /// New level.
    pub level: Option<String>,
    /// New notes.
    pub notes: Option<String>,
    /// New game sequence, replacing the old one.
    pub game_ids: Option<Vec<RecordId>>,
}

impl LessonPatch {
    /// The new duration, if the patch sets one. `Some(None)` clears it.
    #[must_use]
    pub fn duration_minutes(&self) -> Option<Option<u32>> {
        self.duration.as_deref().map(parse_minutes)
    }

    /// Returns a copy with every present text field trimmed and
    /// length-capped.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let clean = |field: Option<String>| field.as_deref().map(sanitize);
        Self {
            name: clean(self.name),
            description: clean(self.description),
            duration: self.duration.map(|d| d.trim().to_string()),
            level: clean(self.level),
            notes: clean(self.notes),
            game_ids: self.game_ids,
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn clean_duration(duration: Option<String>) -> Option<String> {
    duration
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn parse_minutes(text: &str) -> Option<u32> {
    text.trim().parse().ok()
}

/// Checks the constraints a lesson must satisfy before it is persisted.
///
/// The name is required and capped at
/// [`MAX_TEXT_LENGTH`](crate::domain::MAX_TEXT_LENGTH) characters, at least
/// one game must be selected, and a duration (when given) must be a whole
/// number of minutes between 1 and 600.
///
/// # Errors
///
/// Returns the first violated constraint.
pub fn validate_lesson(draft: &LessonDraft) -> Result<(), ValidationError> {
    validate_name(&draft.name)?;
    if draft.game_ids.is_empty() {
        return Err(ValidationError::NoGames);
    }
    validate_duration(draft.duration.as_deref())
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if exceeds_limit(name) {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}

fn validate_duration(duration: Option<&str>) -> Result<(), ValidationError> {
    let Some(text) = duration.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(());
    };
    match text.parse::<i64>() {
        Ok(minutes) if (MIN_DURATION..=MAX_DURATION).contains(&minutes) => Ok(()),
        _ => Err(ValidationError::DurationOutOfRange(text.to_string())),
    }
}

impl Record for Lesson {
    const COLLECTION: &'static str = "lessons";

    type Draft = LessonDraft;
    type Patch = LessonPatch;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: RecordId, draft: LessonDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            duration: draft.duration_minutes(),
            name: draft.name,
            description: draft.description,
            level: draft.level,
            notes: draft.notes,
            game_ids: draft.game_ids,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: LessonPatch, now: DateTime<Utc>) {
        if let Some(duration) = patch.duration_minutes() {
            self.duration = duration;
        }

        let LessonPatch {
            name,
            description,
            level,
            notes,
            game_ids,
            duration: _,
        } = patch;

        for (slot, value) in [
            (&mut self.name, name),
            (&mut self.description, description),
            (&mut self.level, level),
            (&mut self.notes, notes),
        ] {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if let Some(game_ids) = game_ids {
            self.game_ids = game_ids;
        }
        self.updated_at = now;
    }

    fn to_draft(&self) -> LessonDraft {
        LessonDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            duration: self.duration.map(|minutes| minutes.to_string()),
            level: self.level.clone(),
            notes: self.notes.clone(),
            game_ids: self.game_ids.clone(),
        }
    }

    fn prepare_draft(draft: LessonDraft) -> Result<LessonDraft, ValidationError> {
        let draft = draft.sanitized();
        validate_lesson(&draft)?;
        Ok(draft)
    }

    fn prepare_patch(patch: LessonPatch) -> Result<LessonPatch, ValidationError> {
        let patch = patch.sanitized();
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if patch.game_ids.as_ref().is_some_and(Vec::is_empty) {
            return Err(ValidationError::NoGames);
        }
        validate_duration(patch.duration.as_deref())?;
        Ok(patch)
    }

    fn matches(&self, needle: &str) -> bool {
        [&self.name, &self.description, &self.level, &self.notes]
            .into_iter()
            .any(|field| contains_lowercase(field, needle))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::MAX_TEXT_LENGTH;

    fn ids(raw: &[&str]) -> Vec<RecordId> {
        raw.iter().copied().map(RecordId::new).collect()
    }

    fn draft(duration: Option<&str>) -> LessonDraft {
        LessonDraft {
            duration: duration.map(str::to_string),
            ..LessonDraft::new("Guard retention", ids(&["g1"]))
        }
    }

    #[test_case(None => Ok(()); "no duration")]
    #[test_case(Some("") => Ok(()); "empty duration")]
    #[test_case(Some("1") => Ok(()); "lower bound")]
    #[test_case(Some("600") => Ok(()); "upper bound")]
    #[test_case(Some(" 45 ") => Ok(()); "padded")]
    #[test_case(Some("0") => Err(ValidationError::DurationOutOfRange("0".into())); "zero")]
    #[test_case(Some("601") => Err(ValidationError::DurationOutOfRange("601".into())); "too long")]
    #[test_case(Some("-5") => Err(ValidationError::DurationOutOfRange("-5".into())); "negative")]
    #[test_case(Some("an hour") => Err(ValidationError::DurationOutOfRange("an hour".into())); "not a number")]
    fn validate_lesson_checks_duration(duration: Option<&str>) -> Result<(), ValidationError> {
        validate_lesson(&draft(duration))
    }

    #[test]
    fn validate_lesson_requires_name() {
        let lesson = LessonDraft::new("   ", ids(&["g1"]));
        assert_eq!(validate_lesson(&lesson), Err(ValidationError::NameRequired));
    }

    #[test]
    fn validate_lesson_rejects_overlong_name() {
        let lesson = LessonDraft::new("n".repeat(MAX_TEXT_LENGTH + 1), ids(&["g1"]));
        assert_eq!(validate_lesson(&lesson), Err(ValidationError::NameTooLong));
    }

    #[test]
    fn validate_lesson_requires_a_game() {
        let lesson = LessonDraft::new("Empty", Vec::new());
        assert_eq!(validate_lesson(&lesson), Err(ValidationError::NoGames));
    }

    #[test]
    fn duplicate_game_ids_are_allowed() {
        let lesson = LessonDraft::new("Repeat", ids(&["g1", "g2", "g1"]));
        assert_eq!(validate_lesson(&lesson), Ok(()));
    }

    #[test]
    fn draft_reads_duration_from_number_or_text() {
        let numeric: LessonDraft =
            serde_json::from_str(r#"{"name":"A","gameIds":["1"],"duration":45}"#).unwrap();
        let text: LessonDraft =
            serde_json::from_str(r#"{"name":"A","gameIds":["1"],"duration":"45"}"#).unwrap();
        let blank: LessonDraft =
            serde_json::from_str(r#"{"name":"A","gameIds":["1"],"duration":""}"#).unwrap();
        assert_eq!(numeric.duration_minutes(), Some(45));
        assert_eq!(text.duration_minutes(), Some(45));
        assert_eq!(blank.duration, None);
    }

    #[test]
    fn record_reads_legacy_text_duration() {
        let lesson: Lesson = serde_json::from_str(
            r#"{"id":"x","name":"A","duration":"90","gameIds":[1,2],"level":null}"#,
        )
        .unwrap();
        assert_eq!(lesson.duration, Some(90));
        assert_eq!(lesson.game_ids, ids(&["1", "2"]));
        assert_eq!(lesson.level, "");
    }

    #[test]
    fn game_order_is_preserved() {
        let lesson = Lesson::from_draft(
            RecordId::new("l1"),
            LessonDraft::new("Order", ids(&["c", "a", "b", "a"])),
            DateTime::<Utc>::default(),
        );
        assert_eq!(lesson.game_ids, ids(&["c", "a", "b", "a"]));
        assert_eq!(lesson.to_draft().game_ids, ids(&["c", "a", "b", "a"]));
    }

    #[test]
    fn patch_with_blank_duration_clears_it() {
        let mut lesson = Lesson::from_draft(
            RecordId::new("l1"),
            draft(Some("60")),
            DateTime::<Utc>::default(),
        );
        let patch = Lesson::prepare_patch(LessonPatch {
            duration: Some("  ".to_string()),
            ..LessonPatch::default()
        })
        .unwrap();
        lesson.apply(patch, DateTime::<Utc>::default());
        assert_eq!(lesson.duration, None);
    }

    #[test]
    fn patch_rejects_empty_game_list() {
        let patch = LessonPatch {
            game_ids: Some(Vec::new()),
            ..LessonPatch::default()
        };
        assert_eq!(
            Lesson::prepare_patch(patch),
            Err(ValidationError::NoGames)
        );
    }

    #[test]
    fn matches_searchable_fields_only() {
        let lesson = Lesson::from_draft(
            RecordId::new("l1"),
            LessonDraft {
                level: "Beginner".to_string(),
                ..LessonDraft::new("Escapes", ids(&["mount-escape"]))
            },
            DateTime::<Utc>::default(),
        );
        assert!(lesson.matches("begin"));
        assert!(lesson.matches("escapes"));
        assert!(!lesson.matches("mount-escape"));
    }
}
