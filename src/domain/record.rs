//! The behaviour shared by every persisted record type.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use crate::domain::ValidationError;

/// An opaque record identifier.
///
/// Identifiers are assigned by whichever store creates the record. The remote
/// store may hand out numbers or UUIDs, the local store hands out base-36
/// strings; all of them are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wraps an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("record id must not be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Unsigned(n) => Self(n.to_string()),
            Raw::Signed(n) => Self(n.to_string()),
        })
    }
}

/// A record type owned by a collection.
///
/// Each record type has a *draft* form (everything the user supplies, no
/// identity or timestamps) used for creation, and a *patch* form (every field
/// optional) used for updates.
pub trait Record: Serialize + DeserializeOwned + Clone + fmt::Debug + 'static {
    /// Name of the collection.
    ///
    /// This is the remote table name and the local storage key.
    const COLLECTION: &'static str;

    /// The creation form of the record.
    type Draft: DeserializeOwned + Clone + fmt::Debug;

    /// The partial-update form of the record.
    type Patch: Clone + fmt::Debug + Default;

    /// The store-assigned identifier.
    fn id(&self) -> &RecordId;

    /// When the record was created.
    fn created_at(&self) -> DateTime<Utc>;

    /// When the record was last modified.
    fn updated_at(&self) -> DateTime<Utc>;

    /// Builds a record from a draft, as done by a store that assigns its own
    /// identifiers and timestamps.
    fn from_draft(id: RecordId, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Applies a patch in place and bumps the modification time.
    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    /// The user-supplied content of this record, without identity or
    /// timestamps.
    fn to_draft(&self) -> Self::Draft;

    /// Sanitizes and validates a draft before it is persisted.
    ///
    /// # Errors
    ///
    /// Returns the first violated field constraint.
    fn prepare_draft(draft: Self::Draft) -> Result<Self::Draft, ValidationError>;

    /// Sanitizes and validates the fields present in a patch.
    ///
    /// # Errors
    ///
    /// Returns the first violated field constraint.
    fn prepare_patch(patch: Self::Patch) -> Result<Self::Patch, ValidationError>;

    /// Whether any searchable text field contains `needle`.
    ///
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool;
}

pub(crate) fn contains_lowercase(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
