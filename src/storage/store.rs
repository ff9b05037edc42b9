use crate::{
    domain::{Record, RecordId},
    storage::StoreError,
};

/// CRUD access to one collection of records in a backend.
pub trait Store<R: Record> {
    /// All records, newest creation first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn list(&self) -> Result<Vec<R>, StoreError>;

    /// Persists a new record and returns the canonical copy, with the
    /// identifier and timestamps assigned by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects or cannot store the record.
    fn create(&self, draft: R::Draft) -> Result<R, StoreError>;

    /// Applies a partial update and returns the canonical record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not exist or the backend rejects
    /// the write.
    fn update(&self, id: &RecordId, patch: R::Patch) -> Result<R, StoreError>;

    /// Removes the record with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion.
    fn delete(&self, id: &RecordId) -> Result<(), StoreError>;
}
