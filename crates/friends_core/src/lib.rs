//! Core domain logic for the friends & events address book.
//! This crate is the single source of truth for relationship invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod selection;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::event::{Event, EventDraft, EventId};
pub use model::friend::{Friend, FriendDraft, FriendId};
pub use model::ModelValidationError;
pub use repo::relationship_repo::{
    EntityKind, RelationshipRepository, RepoError, RepoResult, SqliteRelationshipRepository,
};
pub use search::friend_filter::{filter_friends, FriendSearchMode, UnknownSearchMode};
pub use selection::list_selection::{
    ListSelection, SelectionError, SelectionMode, SelectionState,
};
pub use service::event_timeline::{categorize_events, now_epoch_ms, EventSection, EventTimeline};
pub use service::relationship_store::{
    FriendDeletion, RelationshipStore, StoreError, StoreResult, ValidationError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
