use std::fmt;

use crate::{
    domain::{Config, Record, RecordId},
    storage::{LocalStorage, LocalStore, RemoteRecord, RemoteStore, Store, StoreError},
};

/// Which backend a session is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// The hosted table API.
    Remote,
    /// Files in the local data directory.
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => f.write_str("remote"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// The backend chosen for a session.
///
/// The choice is made once, by [`Backend::select`], and never revisited. A
/// remote backend that later fails is not demoted.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Records live in the hosted table API.
    Remote(RemoteStore),
    /// Records live in local storage.
    Local(LocalStore),
}

impl Backend {
    /// Picks the remote store when credentials are configured and usable,
    /// local storage otherwise.
    #[must_use]
    pub fn select(config: &Config, storage: &LocalStorage) -> Self {
        let Some((url, key)) = config.remote_credentials() else {
            tracing::info!("No remote credentials configured, using local storage");
            return Self::Local(LocalStore::new(storage.clone()));
        };

        match RemoteStore::connect(url, key) {
            Ok(remote) => {
                tracing::info!("Using remote store at {}", remote.endpoint());
                Self::Remote(remote)
            }
            Err(e) => {
                tracing::warn!("Remote store unavailable ({e}), using local storage");
                Self::Local(LocalStore::new(storage.clone()))
            }
        }
    }

    /// Which kind of backend this is.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Remote(_) => BackendKind::Remote,
            Self::Local(_) => BackendKind::Local,
        }
    }

    /// A gateway for one record type.
    ///
    /// A remote gateway keeps `storage` as a read fallback for when listing
    /// fails.
    #[must_use]
    pub fn gateway<R: RemoteRecord>(&self, storage: &LocalStorage) -> Gateway<R> {
        match self {
            Self::Remote(remote) => Gateway::new(
                Box::new(remote.clone()),
                BackendKind::Remote,
                Some(LocalStore::new(storage.clone())),
            ),
            Self::Local(local) => Gateway::local(local.clone()),
        }
    }
}

/// Persistence for one collection, through the session's backend.
pub struct Gateway<R: Record> {
    active: Box<dyn Store<R>>,
    kind: BackendKind,
    fallback: Option<LocalStore>,
}

impl<R: Record> fmt::Debug for Gateway<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("kind", &self.kind)
            .field("fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

impl<R: Record> Gateway<R> {
    /// Wraps an arbitrary store.
    #[must_use]
    pub fn new(active: Box<dyn Store<R>>, kind: BackendKind, fallback: Option<LocalStore>) -> Self {
        Self {
            active,
            kind,
            fallback,
        }
    }

    /// A gateway writing to local storage only.
    #[must_use]
    pub fn local(store: LocalStore) -> Self {
        Self::new(Box::new(store), BackendKind::Local, None)
    }

    /// The backend this gateway writes to.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Lists every record.
    ///
    /// If the active store fails and a local fallback exists, the fallback is
    /// read instead. The active store is still used for the next call.
    ///
    /// # Errors
    ///
    /// Returns the error of the active store when there is no fallback, or
    /// the fallback's own error.
    pub fn list(&self) -> Result<Vec<R>, StoreError> {
        match self.active.list() {
            Ok(records) => Ok(records),
            Err(e) => {
                let Some(fallback) = &self.fallback else {
                    return Err(e);
                };
                tracing::warn!(
                    "Failed to list {} from {} store ({e}), reading local copy",
                    R::COLLECTION,
                    self.kind
                );
                fallback.list()
            }
        }
    }

    /// Creates a record in the active store.
    ///
    /// # Errors
    ///
    /// Returns the active store's error.
    pub fn create(&self, draft: R::Draft) -> Result<R, StoreError> {
        self.active.create(draft)
    }

    /// Updates a record in the active store.
    ///
    /// # Errors
    ///
    /// Returns the active store's error.
    pub fn update(&self, id: &RecordId, patch: R::Patch) -> Result<R, StoreError> {
        self.active.update(id, patch)
    }

    /// Deletes a record from the active store.
    ///
    /// # Errors
    ///
    /// Returns the active store's error.
    pub fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        self.active.delete(id)
    }
}
