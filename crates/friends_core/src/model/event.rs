//! Social event record and its friend association.
//!
//! # Invariants
//! - `friend_ids` is a set: no duplicates, no ordering semantics.
//! - `starts_at` is Unix epoch milliseconds.

use super::friend::FriendId;
use super::ModelValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier of an event.
pub type EventId = Uuid;

/// Editable event fields. The friend set travels separately so callers
/// state the full association on every write.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventDraft {
    pub name: String,
    pub location: String,
    pub starts_at: i64,
}

impl EventDraft {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::BlankEventName);
        }
        Ok(())
    }
}

/// Canonical persisted event with its attendee set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub uuid: EventId,
    pub name: String,
    pub location: String,
    pub starts_at: i64,
    pub friend_ids: BTreeSet<FriendId>,
}

impl Event {
    pub fn new(draft: EventDraft, friend_ids: BTreeSet<FriendId>) -> Self {
        Self::from_draft(Uuid::new_v4(), draft, friend_ids)
    }

    pub fn from_draft(uuid: EventId, draft: EventDraft, friend_ids: BTreeSet<FriendId>) -> Self {
        Self {
            uuid,
            name: draft.name,
            location: draft.location,
            starts_at: draft.starts_at,
            friend_ids,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.uuid.is_nil() {
            return Err(ModelValidationError::NilUuid);
        }
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::BlankEventName);
        }
        Ok(())
    }

    pub fn attendee_count(&self) -> usize {
        self.friend_ids.len()
    }

    pub fn has_friend(&self, friend_id: &FriendId) -> bool {
        self.friend_ids.contains(friend_id)
    }

    /// Whether the event starts strictly before `now_ms`.
    pub fn is_past(&self, now_ms: i64) -> bool {
        self.starts_at < now_ms
    }
}
