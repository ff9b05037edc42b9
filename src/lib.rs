//! A catalog of training games and the lesson plans composed from them.
//!
//! Records live in a hosted table store when one is configured, and in a
//! local data directory otherwise.

pub mod domain;
pub use domain::{Config, Game, GameDraft, GamePatch, Lesson, LessonDraft, LessonPatch, RecordId};

/// Remote and local persistence.
pub mod storage;
pub use storage::{BackendKind, LocalStorage, StoreError, Theme};

pub mod collection;
pub use collection::{Games, Lessons, SortBy};

pub mod session;
pub use session::Session;

pub mod stats;

pub mod transfer;
