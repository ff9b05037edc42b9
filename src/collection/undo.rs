use chrono::{DateTime, Utc};

/// Holds the most recently deleted record until its undo window closes.
///
/// There is no timer: expiry is checked against the time passed in.
#[derive(Debug, Clone)]
pub struct UndoSlot<R> {
    pending: Option<(R, DateTime<Utc>)>,
}

impl<R> Default for UndoSlot<R> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<R> UndoSlot<R> {
    /// Holds `record` until `expires_at`, replacing anything held before.
    pub fn hold(&mut self, record: R, expires_at: DateTime<Utc>) {
        self.pending = Some((record, expires_at));
    }

    /// The held record, if it has not expired at `now`.
    #[must_use]
    pub fn peek(&self, now: DateTime<Utc>) -> Option<&R> {
        match &self.pending {
            Some((record, expires_at)) if now < *expires_at => Some(record),
            _ => None,
        }
    }

    /// Empties the slot, returning the record if it had not expired at `now`.
    pub fn take(&mut self, now: DateTime<Utc>) -> Option<R> {
        self.pending
            .take()
            .filter(|(_, expires_at)| now < *expires_at)
            .map(|(record, _)| record)
    }

    /// Empties the slot.
    pub fn clear(&mut self) {
        self.pending = None;
    }
}
