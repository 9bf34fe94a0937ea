//! Friend list filtering by one searchable field.
//!
//! # Invariants
//! - Matching is case-insensitive substring containment.
//! - An empty query returns the input unchanged, in order.
//! - Output order always follows input order.

use crate::model::friend::Friend;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Field a friend search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendSearchMode {
    #[default]
    Name,
    Phone,
    Hobbies,
}

impl FriendSearchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Hobbies => "hobbies",
        }
    }

    fn field(self, friend: &Friend) -> &str {
        match self {
            Self::Name => friend.full_name.as_str(),
            Self::Phone => friend.phone_number.as_str(),
            Self::Hobbies => friend.hobbies.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSearchMode(pub String);

impl Display for UnknownSearchMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported search mode `{}`; expected name|phone|hobbies",
            self.0
        )
    }
}

impl Error for UnknownSearchMode {}

impl FromStr for FriendSearchMode {
    type Err = UnknownSearchMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "phone" => Ok(Self::Phone),
            "hobbies" => Ok(Self::Hobbies),
            other => Err(UnknownSearchMode(other.to_string())),
        }
    }
}

/// Filters `friends` to those whose `mode` field contains `query`.
pub fn filter_friends<'a>(
    friends: &'a [Friend],
    query: &str,
    mode: FriendSearchMode,
) -> Vec<&'a Friend> {
    if query.is_empty() {
        return friends.iter().collect();
    }

    let needle = query.to_lowercase();
    friends
        .iter()
        .filter(|friend| mode.field(friend).to_lowercase().contains(&needle))
        .collect()
}
