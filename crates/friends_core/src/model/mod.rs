//! Domain records for the address book and its social events.
//!
//! # Invariants
//! - Every record is identified by a stable, non-nil UUID.
//! - An event references friends only by id; the store owns referential
//!   cleanup when a friend goes away.

pub mod event;
pub mod friend;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field-level validation failure for a domain record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Record identity must not be the nil UUID.
    NilUuid,
    /// `Friend.full_name` is empty or whitespace.
    BlankFullName,
    /// `Event.name` is empty or whitespace.
    BlankEventName,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "uuid must not be nil"),
            Self::BlankFullName => write!(f, "full_name must not be empty"),
            Self::BlankEventName => write!(f, "event name must not be empty"),
        }
    }
}

impl Error for ModelValidationError {}
