//! Persistence backends for games and lessons.
//!
//! Two interchangeable implementations of [`Store`] exist: the
//! [`RemoteStore`], which talks to a hosted table API, and the
//! [`LocalStore`], which keeps each collection as one JSON document in
//! [`LocalStorage`]. A [`Backend`] picks one of them once per session and
//! hands out a [`Gateway`] per record type.

mod error;
pub use error::StoreError;

mod store;
pub use store::Store;

/// Key-value local storage and the local fallback store.
pub mod local;
pub use local::{LocalStorage, LocalStore, Theme};

/// The hosted table API backend.
pub mod remote;
pub use remote::{RemoteRecord, RemoteStore};

mod gateway;
pub use gateway::{Backend, BackendKind, Gateway};
