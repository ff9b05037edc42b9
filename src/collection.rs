//! In-memory collections of games and lessons, kept in step with the
//! session's backend.
//!
//! A [`Collection`] owns the list that the rest of the program reads. Every
//! mutation is persisted first and only applied in memory once the backend
//! has accepted it, so a failed write never leaves the list out of step with
//! what was stored.

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    domain::{Game, Lesson, Record, RecordId, ValidationError},
    storage::{BackendKind, Gateway, LocalStorage, LocalStore, StoreError},
};

mod undo;
pub use undo::UndoSlot;

mod games;
pub use games::{unique_positions, SortBy};

mod lessons;
pub use lessons::{GameSlot, LessonView};

/// The games collection.
pub type Games = Collection<Game>;

/// The lessons collection.
pub type Lessons = Collection<Lesson>;

/// Default time a deleted record stays recoverable.
pub const DEFAULT_UNDO_WINDOW: TimeDelta = TimeDelta::seconds(5);

/// Why a collection operation failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input does not satisfy the record constraints. Nothing was sent
    /// to the backend.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend rejected or could not perform the write.
    #[error("failed to save changes: {0}")]
    Persistence(#[from] StoreError),
}

/// The records of one type, as the program currently sees them.
#[derive(Debug)]
pub struct Collection<R: Record> {
    gateway: Gateway<R>,
    storage: LocalStorage,
    records: Vec<R>,
    loading: bool,
    undo: UndoSlot<R>,
    undo_window: TimeDelta,
}

impl<R: Record> Collection<R> {
    /// Creates an empty collection. Call [`Collection::load`] to populate it.
    ///
    /// `storage` holds the local mirror read when the gateway cannot list
    /// records, and the `lastSaved` timestamp.
    #[must_use]
    pub fn new(gateway: Gateway<R>, storage: LocalStorage) -> Self {
        Self {
            gateway,
            storage,
            records: Vec::new(),
            loading: false,
            undo: UndoSlot::default(),
            undo_window: DEFAULT_UNDO_WINDOW,
        }
    }

    /// Sets how long a deleted record stays recoverable.
    #[must_use]
    pub const fn with_undo_window(mut self, window: TimeDelta) -> Self {
        self.undo_window = window;
        self
    }

    /// The backend this collection writes to.
    #[must_use]
    pub const fn backend(&self) -> BackendKind {
        self.gateway.kind()
    }

    /// The records, newest first unless a load returned another order.
    #[must_use]
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Looks up a record by identifier.
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&R> {
        self.records.iter().find(|record| record.id() == id)
    }

    /// The number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a load is in progress.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.loading
    }

    /// When anything was last saved, according to the local mirror.
    #[must_use]
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.storage.last_saved()
    }

    /// The record that [`Collection::undo_delete`] would restore, if the undo
    /// window is still open.
    #[must_use]
    pub fn undo_available(&self) -> Option<&R> {
        self.undo.peek(Utc::now())
    }

    /// Replaces the in-memory list with the backend's contents.
    ///
    /// If the backend cannot be read, the local mirror is used. If that is
    /// missing or malformed too, the collection becomes empty. Loading never
    /// fails.
    pub fn load(&mut self) {
        if self.loading {
            tracing::debug!("Load of {} already in progress", R::COLLECTION);
            return;
        }
        self.loading = true;

        self.records = match self.gateway.list() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Failed to load {} ({e}), reading local mirror", R::COLLECTION);
                self.read_mirror()
            }
        };
        tracing::debug!("Loaded {} {}", self.records.len(), R::COLLECTION);

        self.loading = false;
    }

    fn read_mirror(&self) -> Vec<R> {
        LocalStore::new(self.storage.clone())
            .read()
            .unwrap_or_else(|e| {
                tracing::warn!("Local {} mirror unusable ({e}), starting empty", R::COLLECTION);
                Vec::new()
            })
    }

    /// Validates and persists a new record, then prepends it.
    ///
    /// Returns the record as stored, with its assigned identifier and
    /// timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the draft breaks a constraint, or
    /// [`Error::Persistence`] if the backend rejects it. The collection is
    /// unchanged in both cases.
    pub fn add(&mut self, draft: R::Draft) -> Result<R, Error> {
        let draft = R::prepare_draft(draft)?;
        let record = self
            .gateway
            .create(draft)
            .inspect_err(|e| tracing::error!("Failed to add {} record: {e}", R::COLLECTION))?;

        self.records.insert(0, record.clone());
        self.touch_last_saved();
        tracing::info!("Added {} record {}", R::COLLECTION, record.id());
        Ok(record)
    }

    /// Validates and persists a partial update, then replaces the record in
    /// memory.
    ///
    /// Returns `Ok(None)` if the backend accepted the update but the record
    /// is not in the in-memory list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a present field breaks a constraint,
    /// or [`Error::Persistence`] if the backend rejects the update.
    pub fn update(&mut self, id: &RecordId, patch: R::Patch) -> Result<Option<R>, Error> {
        let patch = R::prepare_patch(patch)?;
        let updated = self
            .gateway
            .update(id, patch)
            .inspect_err(|e| tracing::error!("Failed to update {} record {id}: {e}", R::COLLECTION))?;
        self.touch_last_saved();

        let Some(slot) = self.records.iter_mut().find(|record| record.id() == id) else {
            tracing::debug!("Updated {} record {id} is not loaded", R::COLLECTION);
            return Ok(None);
        };
        *slot = updated.clone();
        Ok(Some(updated))
    }

    /// Persists a deletion, then removes the record and holds it for undo.
    ///
    /// A record held from an earlier deletion is discarded. Returns the
    /// removed record, or `None` if it was not in the in-memory list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the backend rejects the deletion.
    pub fn delete(&mut self, id: &RecordId) -> Result<Option<R>, Error> {
        self.gateway
            .delete(id)
            .inspect_err(|e| tracing::error!("Failed to delete {} record {id}: {e}", R::COLLECTION))?;
        self.touch_last_saved();

        let Some(index) = self.records.iter().position(|record| record.id() == id) else {
            return Ok(None);
        };
        let removed = self.records.remove(index);
        self.undo
            .hold(removed.clone(), Utc::now() + self.undo_window);
        tracing::info!("Deleted {} record {id}", R::COLLECTION);
        Ok(Some(removed))
    }

    /// Deletes several records in order.
    ///
    /// Stops at the first failure; records deleted before it stay deleted.
    /// Afterwards the undo slot holds the last record removed.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::Persistence`] encountered.
    pub fn delete_many(&mut self, ids: &[RecordId]) -> Result<Vec<R>, Error> {
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.delete(id)? {
                removed.push(record);
            }
        }
        Ok(removed)
    }

    /// Restores the most recently deleted record, if its undo window is
    /// still open.
    ///
    /// The record is created afresh, so it gets a new identifier and new
    /// timestamps. An expired record is discarded.
    ///
    /// # Errors
    ///
    /// Returns the error from re-creating the record. The record stays
    /// available for undo until its window closes.
    pub fn undo_delete(&mut self) -> Result<Option<R>, Error> {
        let Some(record) = self.undo.peek(Utc::now()) else {
            self.undo.clear();
            return Ok(None);
        };
        let draft = record.to_draft();

        let restored = self.add(draft)?;
        self.undo.clear();
        Ok(Some(restored))
    }

    /// Forgets the record held for undo.
    pub fn clear_undo(&mut self) {
        self.undo.clear();
    }

    fn touch_last_saved(&self) {
        if let Err(e) = self.storage.touch_last_saved(Utc::now()) {
            tracing::warn!("Failed to record save time: {e}");
        }
    }
}
