//! Friend/event relationship store.
//!
//! # Responsibility
//! - Single entry point for friend and event CRUD and their association.
//! - Enforce field and reference validation before any write.
//! - Apply list selection gating at the edit/delete action boundary.
//!
//! # Invariants
//! - Deleting a friend removes it from every event in the same transaction.
//! - Every failure is returned to the caller; nothing is logged and skipped.
//! - Log lines carry ids and counts only, never names or phone numbers.

use crate::model::event::{Event, EventDraft, EventId};
use crate::model::friend::{Friend, FriendDraft, FriendId};
use crate::model::ModelValidationError;
use crate::repo::relationship_repo::{EntityKind, RelationshipRepository, RepoError};
use crate::selection::list_selection::{ListSelection, SelectionError};
use crate::service::event_timeline::{categorize_events, EventTimeline};
use log::{info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Write rejected before reaching persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Field(ModelValidationError),
    /// Event references friends that do not exist.
    UnknownFriendReferences(BTreeSet<FriendId>),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(err) => write!(f, "{err}"),
            Self::UnknownFriendReferences(ids) => {
                let ids = ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "unknown friend reference: {ids}")
            }
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Field(err) => Some(err),
            Self::UnknownFriendReferences(_) => None,
        }
    }
}

/// Error returned by every `RelationshipStore` operation.
#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    /// Referenced record is no longer present.
    NotFound { kind: EntityKind, id: Uuid },
    /// Load/save/delete failed in the persistence collaborator.
    Persistence(RepoError),
    /// Action not allowed for the current list selection.
    Selection(SelectionError),
    /// A write succeeded but its read-back did not.
    InconsistentState(&'static str),
}

impl StoreError {
    /// Stable machine-readable code used in log lines and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound { .. } => "not_found",
            Self::Persistence(_) if self.is_fatal() => "persistence_unavailable",
            Self::Persistence(_) => "persistence_failed",
            Self::Selection(_) => "selection_rejected",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }

    /// Whether the persistence engine itself is unusable.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Persistence(RepoError::Db(err)) => err.is_fatal(),
            Self::Persistence(RepoError::UninitializedConnection { .. })
            | Self::Persistence(RepoError::MissingRequiredTable(_))
            | Self::Persistence(RepoError::MissingRequiredColumn { .. }) => true,
            _ => false,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::NotFound { kind, id } => write!(f, "{} not found: {id}", kind.as_str()),
            Self::Persistence(err) => write!(f, "persistence failed: {err}"),
            Self::Selection(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent store state: {details}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Selection(err) => Some(err),
            Self::NotFound { .. } | Self::InconsistentState(_) => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::Validation(err) => Self::Validation(ValidationError::Field(err)),
            other => Self::Persistence(other),
        }
    }
}

impl From<ModelValidationError> for StoreError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(ValidationError::Field(value))
    }
}

impl From<SelectionError> for StoreError {
    fn from(value: SelectionError) -> Self {
        Self::Selection(value)
    }
}

/// Outcome of a friend deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendDeletion {
    pub deleted: Vec<FriendId>,
    /// Events the deleted friends were detached from.
    pub detached_events: Vec<EventId>,
}

/// Source of truth for friends, events and their association.
///
/// Mutations take `&mut self`, so a store shared between contexts has to be
/// wrapped by the caller and writes stay serialized.
pub struct RelationshipStore<R: RelationshipRepository> {
    repo: R,
}

impl<R: RelationshipRepository> RelationshipStore<R> {
    /// Creates a store over the injected persistence collaborator.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns all friends in insertion order.
    pub fn load_friends(&self) -> StoreResult<Vec<Friend>> {
        logged("friends_load", self.repo.list_friends().map_err(Into::into))
    }

    /// Returns all events, with attendees, in insertion order.
    pub fn load_events(&self) -> StoreResult<Vec<Event>> {
        logged("events_load", self.repo.list_events().map_err(Into::into))
    }

    /// Loads events and splits them around `now_ms`.
    pub fn load_timeline(&self, now_ms: i64) -> StoreResult<EventTimeline> {
        Ok(categorize_events(self.load_events()?, now_ms))
    }

    pub fn get_friend(&self, id: FriendId) -> StoreResult<Friend> {
        self.repo.get_friend(id)?.ok_or(StoreError::NotFound {
            kind: EntityKind::Friend,
            id,
        })
    }

    pub fn get_event(&self, id: EventId) -> StoreResult<Event> {
        self.repo.get_event(id)?.ok_or(StoreError::NotFound {
            kind: EntityKind::Event,
            id,
        })
    }

    /// Creates a friend and returns the persisted record.
    pub fn create_friend(&mut self, draft: FriendDraft) -> StoreResult<Friend> {
        let result = self.try_create_friend(draft);
        if let Ok(friend) = &result {
            info!("event=friend_create module=store status=ok friend_id={}", friend.uuid);
        }
        logged("friend_create", result)
    }

    /// Replaces all editable fields of an existing friend.
    pub fn update_friend(&mut self, id: FriendId, draft: FriendDraft) -> StoreResult<Friend> {
        let result = self.try_update_friend(id, draft);
        if result.is_ok() {
            info!("event=friend_update module=store status=ok friend_id={id}");
        }
        logged("friend_update", result)
    }

    /// Creates an event attended by `friend_ids`.
    pub fn create_event(
        &mut self,
        draft: EventDraft,
        friend_ids: BTreeSet<FriendId>,
    ) -> StoreResult<Event> {
        let result = self.try_create_event(draft, friend_ids);
        if let Ok(event) = &result {
            info!(
                "event=event_create module=store status=ok event_id={} attendees={}",
                event.uuid,
                event.attendee_count()
            );
        }
        logged("event_create", result)
    }

    /// Replaces event fields and its whole attendee set.
    pub fn update_event(
        &mut self,
        id: EventId,
        draft: EventDraft,
        friend_ids: BTreeSet<FriendId>,
    ) -> StoreResult<Event> {
        let result = self.try_update_event(id, draft, friend_ids);
        if let Ok(event) = &result {
            info!(
                "event=event_update module=store status=ok event_id={id} attendees={}",
                event.attendee_count()
            );
        }
        logged("event_update", result)
    }

    /// Deletes friends and detaches them from every event, atomically.
    ///
    /// Any unknown id aborts the whole deletion with `NotFound`.
    pub fn delete_friends(&mut self, ids: &BTreeSet<FriendId>) -> StoreResult<FriendDeletion> {
        if ids.is_empty() {
            return Ok(FriendDeletion::default());
        }
        let result = self
            .repo
            .delete_friends(ids)
            .map(|detached_events| FriendDeletion {
                deleted: ids.iter().copied().collect(),
                detached_events,
            })
            .map_err(StoreError::from);
        if let Ok(deletion) = &result {
            info!(
                "event=friends_delete module=store status=ok count={} detached_events={}",
                deletion.deleted.len(),
                deletion.detached_events.len()
            );
        }
        logged("friends_delete", result)
    }

    /// Deletes events. Friends are untouched.
    pub fn delete_events(&mut self, ids: &BTreeSet<EventId>) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let result = self.repo.delete_events(ids).map_err(StoreError::from);
        if result.is_ok() {
            info!(
                "event=events_delete module=store status=ok count={}",
                ids.len()
            );
        }
        logged("events_delete", result)
    }

    /// Reloads the friends list and resets its selection.
    pub fn reload_friends(
        &self,
        selection: &mut ListSelection<FriendId>,
    ) -> StoreResult<Vec<Friend>> {
        let friends = self.load_friends()?;
        selection.clear();
        Ok(friends)
    }

    /// Reloads the events list and resets its selection.
    pub fn reload_events(
        &self,
        selection: &mut ListSelection<EventId>,
        now_ms: i64,
    ) -> StoreResult<EventTimeline> {
        let timeline = self.load_timeline(now_ms)?;
        selection.clear();
        Ok(timeline)
    }

    /// Resolves the friend an edit action applies to.
    pub fn friend_for_edit(&self, selection: &ListSelection<FriendId>) -> StoreResult<Friend> {
        let id = selection.edit_target()?;
        self.get_friend(id)
    }

    /// Resolves the event an edit action applies to.
    pub fn event_for_edit(&self, selection: &ListSelection<EventId>) -> StoreResult<Event> {
        let id = selection.edit_target()?;
        self.get_event(id)
    }

    /// Deletes the selected friends and clears the selection on success.
    pub fn delete_selected_friends(
        &mut self,
        selection: &mut ListSelection<FriendId>,
    ) -> StoreResult<FriendDeletion> {
        selection.delete_targets()?;
        let deletion = self.delete_friends(&selection.selected_set())?;
        selection.clear();
        Ok(deletion)
    }

    /// Deletes the selected events and clears the selection on success.
    pub fn delete_selected_events(
        &mut self,
        selection: &mut ListSelection<EventId>,
    ) -> StoreResult<()> {
        selection.delete_targets()?;
        self.delete_events(&selection.selected_set())?;
        selection.clear();
        Ok(())
    }

    /// Returns the wrapped repository.
    pub fn into_inner(self) -> R {
        self.repo
    }

    fn try_create_friend(&mut self, draft: FriendDraft) -> StoreResult<Friend> {
        draft.validate()?;
        let friend = Friend::new(draft);
        self.repo.insert_friend(&friend)?;
        self.read_back_friend(friend.uuid, "created friend not found in read-back")
    }

    fn try_update_friend(&mut self, id: FriendId, draft: FriendDraft) -> StoreResult<Friend> {
        draft.validate()?;
        let friend = Friend::from_draft(id, draft);
        self.repo.update_friend(&friend)?;
        self.read_back_friend(id, "updated friend not found in read-back")
    }

    fn try_create_event(
        &mut self,
        draft: EventDraft,
        friend_ids: BTreeSet<FriendId>,
    ) -> StoreResult<Event> {
        self.validate_event(&draft, &friend_ids)?;
        let event = Event::new(draft, friend_ids);
        self.repo.insert_event(&event)?;
        self.read_back_event(event.uuid, "created event not found in read-back")
    }

    fn try_update_event(
        &mut self,
        id: EventId,
        draft: EventDraft,
        friend_ids: BTreeSet<FriendId>,
    ) -> StoreResult<Event> {
        self.validate_event(&draft, &friend_ids)?;
        let event = Event::from_draft(id, draft, friend_ids);
        self.repo.update_event(&event)?;
        self.read_back_event(id, "updated event not found in read-back")
    }

    fn validate_event(
        &self,
        draft: &EventDraft,
        friend_ids: &BTreeSet<FriendId>,
    ) -> StoreResult<()> {
        draft.validate()?;
        if friend_ids.is_empty() {
            return Ok(());
        }
        let missing = self.repo.missing_friend_ids(friend_ids)?;
        if !missing.is_empty() {
            return Err(StoreError::Validation(
                ValidationError::UnknownFriendReferences(missing),
            ));
        }
        Ok(())
    }

    fn read_back_friend(&self, id: FriendId, details: &'static str) -> StoreResult<Friend> {
        self.repo
            .get_friend(id)?
            .ok_or(StoreError::InconsistentState(details))
    }

    fn read_back_event(&self, id: EventId, details: &'static str) -> StoreResult<Event> {
        self.repo
            .get_event(id)?
            .ok_or(StoreError::InconsistentState(details))
    }
}

/// Emits the failure line for `operation` and passes the result through.
fn logged<T>(operation: &str, result: StoreResult<T>) -> StoreResult<T> {
    if let Err(err) = &result {
        warn!(
            "event={operation} module=store status=error error_code={} error={}",
            err.code(),
            err.to_string().replace(['\n', '\r'], " ")
        );
    }
    result
}
