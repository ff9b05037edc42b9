//! One run of the program against a data directory.

use std::path::PathBuf;

use crate::{
    collection::{Games, Lessons},
    domain::Config,
    storage::{Backend, BackendKind, LocalStorage, StoreError},
};

/// The backend and both collections, loaded and ready to use.
#[derive(Debug)]
pub struct Session {
    backend: Backend,
    storage: LocalStorage,
    /// The games.
    pub games: Games,
    /// The lessons.
    pub lessons: Lessons,
}

impl Session {
    /// Picks the backend for `config` and loads both collections.
    ///
    /// Local storage lives in `data_dir`. Opening never fails: an unreachable
    /// or misconfigured remote store degrades to local data.
    #[must_use]
    pub fn open(config: &Config, data_dir: PathBuf) -> Self {
        let storage = LocalStorage::new(data_dir);
        let backend = Backend::select(config, &storage);

        let games = Games::new(backend.gateway(&storage), storage.clone())
            .with_undo_window(config.undo_window());
        let lessons = Lessons::new(backend.gateway(&storage), storage.clone())
            .with_undo_window(config.undo_window());

        let mut session = Self {
            backend,
            storage,
            games,
            lessons,
        };
        session.refresh();
        session
    }

    /// Reloads both collections from the backend.
    pub fn refresh(&mut self) {
        self.games.load();
        self.lessons.load();
    }

    /// Which backend the session writes to.
    #[must_use]
    pub const fn backend(&self) -> BackendKind {
        self.backend.kind()
    }

    /// The local key-value storage.
    #[must_use]
    pub const fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Checks the remote connection. Always succeeds for a local session.
    ///
    /// # Errors
    ///
    /// Returns the error the remote store answered with.
    pub fn probe(&self) -> Result<(), StoreError> {
        match &self.backend {
            Backend::Remote(remote) => remote.probe(),
            Backend::Local(_) => Ok(()),
        }
    }
}
