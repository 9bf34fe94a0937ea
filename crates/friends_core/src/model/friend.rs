//! Friend (address book entry) record.

use super::ModelValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a friend.
pub type FriendId = Uuid;

/// Editable friend fields, as submitted by the create and edit forms.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FriendDraft {
    pub full_name: String,
    pub gender: String,
    pub phone_number: String,
    /// Unix epoch milliseconds.
    pub date_of_birth: i64,
    /// Free text, searched as one string.
    pub hobbies: String,
    /// Encoded image bytes; `None` renders the placeholder avatar.
    pub avatar: Option<Vec<u8>>,
}

impl FriendDraft {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(ModelValidationError::BlankFullName);
        }
        Ok(())
    }
}

/// Canonical persisted friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub uuid: FriendId,
    pub full_name: String,
    pub gender: String,
    pub phone_number: String,
    pub date_of_birth: i64,
    pub hobbies: String,
    pub avatar: Option<Vec<u8>>,
}

impl Friend {
    /// Builds a friend with a freshly generated id.
    pub fn new(draft: FriendDraft) -> Self {
        Self::from_draft(Uuid::new_v4(), draft)
    }

    /// Builds a friend with a caller-provided id, e.g. when applying an edit.
    pub fn from_draft(uuid: FriendId, draft: FriendDraft) -> Self {
        Self {
            uuid,
            full_name: draft.full_name,
            gender: draft.gender,
            phone_number: draft.phone_number,
            date_of_birth: draft.date_of_birth,
            hobbies: draft.hobbies,
            avatar: draft.avatar,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.uuid.is_nil() {
            return Err(ModelValidationError::NilUuid);
        }
        if self.full_name.trim().is_empty() {
            return Err(ModelValidationError::BlankFullName);
        }
        Ok(())
    }

    /// One-line list label: `full name, gender, phone`.
    pub fn summary_line(&self) -> String {
        format!("{}, {}, {}", self.full_name, self.gender, self.phone_number)
    }

    pub fn has_avatar(&self) -> bool {
        self.avatar.as_ref().is_some_and(|bytes| !bytes.is_empty())
    }
}
