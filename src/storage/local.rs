//! A directory-backed key-value store, and the local record store built on
//! top of it.
//!
//! [`LocalStorage`] holds opaque string values under fixed keys, one file per
//! key. [`LocalStore`] keeps a whole collection as a single JSON document
//! under the collection's key.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    domain::{Record, RecordId},
    storage::{Store, StoreError},
};

/// Opaque string values stored under fixed keys in a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Key holding the time of the most recent successful write.
    pub const LAST_SAVED_KEY: &'static str = "lastSaved";

    /// Key holding the display theme preference.
    pub const THEME_KEY: &'static str = "theme";

    /// Opens local storage rooted at the given directory.
    ///
    /// The directory is created on first write.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The directory values are stored in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Reads the value stored under `key`, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the value exists but cannot be read.
    pub fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the value cannot be written.
    pub fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        let staging = path.with_extension("tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)
    }

    /// Removes the value stored under `key`. Removing a missing key is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the value exists but cannot be removed.
    pub fn remove_item(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// The time of the most recent successful write, if recorded.
    #[must_use]
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        let raw = self
            .get_item(Self::LAST_SAVED_KEY)
            .inspect_err(|e| tracing::debug!("Failed to read last saved time: {e}"))
            .ok()
            .flatten()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|time| time.with_timezone(&Utc))
            .inspect_err(|e| tracing::debug!("Ignoring malformed last saved time: {e}"))
            .ok()
    }

    /// Records `now` as the most recent successful write.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    pub fn touch_last_saved(&self, now: DateTime<Utc>) -> io::Result<()> {
        self.set_item(Self::LAST_SAVED_KEY, &now.to_rfc3339())
    }

    /// The stored theme preference, or the default theme.
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.get_item(Self::THEME_KEY)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    /// Stores the theme preference.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    pub fn set_theme(&self, theme: Theme) -> io::Result<()> {
        self.set_item(Self::THEME_KEY, &theme.to_string())
    }
}

/// Display theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    /// Light background.
    #[default]
    Light,
    /// Dark background.
    Dark,
}

impl Theme {
    /// The other theme.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// The local fallback store.
///
/// Each collection is serialized as a single JSON array under its collection
/// key, newest record first.
#[derive(Debug, Clone)]
pub struct LocalStore {
    storage: LocalStorage,
}

impl LocalStore {
    /// Creates a store writing into the given local storage.
    #[must_use]
    pub const fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// The underlying key-value storage.
    #[must_use]
    pub const fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Reads the whole collection document.
    ///
    /// A missing document is an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the document is not a JSON array of
    /// records, or an I/O error if it cannot be read.
    pub fn read<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let Some(raw) = self.storage.get_item(R::COLLECTION)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            key: R::COLLECTION.to_string(),
            source,
        })
    }

    fn write<R: Record>(&self, records: &[R]) -> Result<(), StoreError> {
        let document = serde_json::to_string(records).map_err(io::Error::other)?;
        self.storage.set_item(R::COLLECTION, &document)?;
        Ok(())
    }
}

impl<R: Record> Store<R> for LocalStore {
    fn list(&self) -> Result<Vec<R>, StoreError> {
        self.read()
    }

    fn create(&self, draft: R::Draft) -> Result<R, StoreError> {
        let mut records: Vec<R> = self.read()?;
        let now = Utc::now();
        let record = R::from_draft(generate_id(now), draft, now);
        records.insert(0, record.clone());
        self.write(&records)?;
        tracing::debug!("Stored {} record {} locally", R::COLLECTION, record.id());
        Ok(record)
    }

    fn update(&self, id: &RecordId, patch: R::Patch) -> Result<R, StoreError> {
        let mut records: Vec<R> = self.read()?;
        let record = records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: R::COLLECTION,
                id: id.clone(),
            })?;
        record.apply(patch, Utc::now());
        let updated = record.clone();
        self.write(&records)?;
        Ok(updated)
    }

    fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        let mut records: Vec<R> = self.read()?;
        let before = records.len();
        records.retain(|record| record.id() != id);
        if records.len() == before {
            tracing::debug!("No local {} record {id} to delete", R::COLLECTION);
            return Ok(());
        }
        self.write(&records)
    }
}

/// Generates a local record identifier: the creation time in milliseconds
/// followed by a random suffix, both in base 36.
///
/// Uniqueness is not guaranteed, but collisions are negligible for a single
/// user on a single machine.
#[must_use]
pub fn generate_id(now: DateTime<Utc>) -> RecordId {
    const SUFFIX_LEN: usize = 11;

    let millis = u128::try_from(now.timestamp_millis()).unwrap_or_default();
    let mut suffix = base36(Uuid::new_v4().as_u128());
    suffix.truncate(SUFFIX_LEN);
    RecordId::new(format!("{}{suffix}", base36(millis)))
}

fn base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut digits = Vec::new();
    loop {
        digits.push(char::from(DIGITS[usize::try_from(value % 36).unwrap_or_default()]));
        value /= 36;
        if value == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::domain::{Game, GameDraft, GamePatch, Lesson, LessonDraft};

    fn store() -> (tempfile::TempDir, LocalStore) {
        let tmp = tempdir().unwrap();
        let store = LocalStore::new(LocalStorage::new(tmp.path().join("data")));
        (tmp, store)
    }

    #[test]
    fn missing_items_read_as_none() {
        let tmp = tempdir().unwrap();
        let storage = LocalStorage::new(tmp.path().to_path_buf());
        assert_eq!(storage.get_item("nothing").unwrap(), None);
        storage.remove_item("nothing").unwrap();
    }

    #[test]
    fn items_round_trip() {
        let tmp = tempdir().unwrap();
        let storage = LocalStorage::new(tmp.path().join("nested"));
        storage.set_item("key", "value").unwrap();
        assert_eq!(storage.get_item("key").unwrap().as_deref(), Some("value"));
        storage.remove_item("key").unwrap();
        assert_eq!(storage.get_item("key").unwrap(), None);
    }

    #[test]
    fn last_saved_is_recorded() {
        let tmp = tempdir().unwrap();
        let storage = LocalStorage::new(tmp.path().to_path_buf());
        assert_eq!(storage.last_saved(), None);

        let now = DateTime::parse_from_rfc3339("2025-03-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        storage.touch_last_saved(now).unwrap();
        assert_eq!(storage.last_saved(), Some(now));
    }

    #[test]
    fn theme_defaults_to_light_and_toggles() {
        let tmp = tempdir().unwrap();
        let storage = LocalStorage::new(tmp.path().to_path_buf());
        assert_eq!(storage.theme(), Theme::Light);

        storage.set_theme(storage.theme().toggled()).unwrap();
        assert_eq!(storage.theme(), Theme::Dark);

        storage.set_item(LocalStorage::THEME_KEY, "purple").unwrap();
        assert_eq!(storage.theme(), Theme::Light);
    }

    #[test]
    fn create_prepends_and_assigns_identity() {
        let (_tmp, store) = store();
        let first: Game = store.create(GameDraft::new("Closed Guard")).unwrap();
        let second: Game = store.create(GameDraft::new("Mount")).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.created_at, first.updated_at);

        let listed: Vec<Game> = store.list().unwrap();
        let positions: Vec<_> = listed.iter().map(|g| g.position.as_str()).collect();
        assert_eq!(positions, ["Mount", "Closed Guard"]);
    }

    #[test]
    fn collections_use_separate_documents() {
        let (_tmp, store) = store();
        let game: Game = store.create(GameDraft::new("Back Control")).unwrap();
        let _lesson: Lesson = store
            .create(LessonDraft::new("Back attacks", vec![game.id.clone()]))
            .unwrap();

        assert_eq!(Store::<Game>::list(&store).unwrap().len(), 1);
        assert_eq!(Store::<Lesson>::list(&store).unwrap().len(), 1);
        assert!(store.storage().get_item("games").unwrap().is_some());
        assert!(store.storage().get_item("lessons").unwrap().is_some());
    }

    #[test]
    fn update_merges_patch() {
        let (_tmp, store) = store();
        let game: Game = store.create(GameDraft::new("Guard")).unwrap();

        let updated: Game = store
            .update(
                &game.id,
                GamePatch {
                    invariant: Some("Stay on your back".to_string()),
                    ..GamePatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.position, "Guard");
        assert_eq!(updated.invariant, "Stay on your back");
        assert!(updated.updated_at >= game.updated_at);
        assert_eq!(Store::<Game>::list(&store).unwrap()[0], updated);
    }

    #[test]
    fn update_of_unknown_id_is_not_found() {
        let (_tmp, store) = store();
        let result: Result<Game, _> = store.update(&RecordId::new("nope"), GamePatch::default());
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn delete_removes_record_and_is_idempotent() {
        let (_tmp, store) = store();
        let game: Game = store.create(GameDraft::new("Guard")).unwrap();

        Store::<Game>::delete(&store, &game.id).unwrap();
        Store::<Game>::delete(&store, &game.id).unwrap();

        assert!(Store::<Game>::list(&store).unwrap().is_empty());
    }

    #[test]
    fn malformed_document_is_corrupt() {
        let (_tmp, store) = store();
        store.storage().set_item("games", "{not json").unwrap();
        let result: Result<Vec<Game>, _> = store.read();
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));

        store.storage().set_item("games", r#"{"games": []}"#).unwrap();
        let result: Result<Vec<Game>, _> = store.read();
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn generated_ids_start_with_timestamp() {
        let now = Utc::now();
        let id = generate_id(now);
        let prefix = base36(u128::try_from(now.timestamp_millis()).unwrap());
        assert!(id.as_str().starts_with(&prefix));
        assert!(id.as_str().len() > prefix.len());
    }

    #[test]
    fn base36_encodes_digits() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
    }
}
