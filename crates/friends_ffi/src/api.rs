//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose friend/event list and form-submission use-cases to Dart via FRB.
//! - Own process-level configuration (database path).
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Writes are serialized process-wide; reads may run concurrently.
//! - Failures come back as envelopes with a stable `error_code`.

use friends_core::db::open_db;
use friends_core::{
    core_version as core_version_inner, default_log_level as default_log_level_inner,
    filter_friends, init_logging as init_logging_inner, now_epoch_ms, ping as ping_inner, Event,
    EventDraft, EventSection, Friend, FriendDraft, FriendSearchMode, RelationshipStore,
    SqliteRelationshipRepository, StoreResult,
};
use log::warn;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};
use uuid::Uuid;

const DB_FILE_NAME: &str = "friends_events.sqlite3";
const DB_PATH_ENV: &str = "FRIENDS_EVENTS_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE_WRITE_LOCK: Mutex<()> = Mutex::new(());

type Store<'conn> = RelationshipStore<SqliteRelationshipRepository<'conn>>;

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Suggested level for `init_logging` in the current build mode.
#[flutter_rust_bridge::frb(sync)]
pub fn default_log_level() -> String {
    default_log_level_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message on failure.
/// Repeating the same `level + log_dir` is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Pins the database file used by every later call.
///
/// # FFI contract
/// - Must be called before the first data call to take effect.
/// - Repeating the same path is a no-op; a different path is rejected.
/// - Returns an empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_db_path(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "database already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Friend row as rendered by list and form screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendItem {
    pub friend_id: String,
    pub full_name: String,
    pub gender: String,
    pub phone_number: String,
    pub date_of_birth_ms: i64,
    pub hobbies: String,
    /// Encoded image bytes; `None` means show the placeholder icon.
    pub avatar: Option<Vec<u8>>,
    /// `full name, gender, phone` list label.
    pub summary: String,
}

/// Event row with attendee ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventItem {
    pub event_id: String,
    pub name: String,
    pub location: String,
    pub starts_at_ms: i64,
    pub friend_ids: Vec<String>,
}

/// Friend form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendInput {
    pub full_name: String,
    pub gender: String,
    pub phone_number: String,
    pub date_of_birth_ms: i64,
    pub hobbies: String,
    pub avatar: Option<Vec<u8>>,
}

/// Event form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInput {
    pub name: String,
    pub location: String,
    pub starts_at_ms: i64,
    pub friend_ids: Vec<String>,
}

/// Friends list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendsListResponse {
    pub ok: bool,
    pub items: Vec<FriendItem>,
    pub error_code: Option<String>,
    pub message: String,
}

/// Events list envelope split into the two list sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsTimelineResponse {
    pub ok: bool,
    pub past_title: String,
    pub past: Vec<EventItem>,
    pub upcoming_title: String,
    pub upcoming: Vec<EventItem>,
    pub error_code: Option<String>,
    pub message: String,
}

/// Generic envelope for create/update/delete calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Id of the created or updated record.
    pub id: Option<String>,
    pub error_code: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(operation: &str, failure: ApiFailure) -> Self {
        Self {
            ok: false,
            id: None,
            error_code: Some(failure.code.to_string()),
            message: format!("{operation} failed: {}", failure.message),
        }
    }
}

/// Lists friends, filtered by `query` on the field named by `mode`
/// (`name|phone|hobbies`).
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Empty `query` returns every friend in insertion order.
#[flutter_rust_bridge::frb(sync)]
pub fn friends_list(query: String, mode: String) -> FriendsListResponse {
    let result = mode
        .parse::<FriendSearchMode>()
        .map_err(|err| ApiFailure::invalid_argument(err.to_string()))
        .and_then(|mode| {
            with_store(Access::Read, |store| store.load_friends()).map(|friends| {
                filter_friends(&friends, query.as_str(), mode)
                    .into_iter()
                    .map(to_friend_item)
                    .collect::<Vec<_>>()
            })
        });

    match result {
        Ok(items) => {
            let message = format!("Found {} friend(s).", items.len());
            FriendsListResponse {
                ok: true,
                items,
                error_code: None,
                message,
            }
        }
        Err(failure) => FriendsListResponse {
            ok: false,
            items: Vec::new(),
            error_code: Some(failure.code.to_string()),
            message: format!("friends_list failed: {}", failure.message),
        },
    }
}

/// Creates a friend from the add-friend form.
#[flutter_rust_bridge::frb(sync)]
pub fn friend_create(input: FriendInput) -> ActionResponse {
    let draft = to_friend_draft(input);
    match with_store(Access::Write, |store| store.create_friend(draft)) {
        Ok(friend) => ActionResponse::success("Friend created.", Some(friend.uuid.to_string())),
        Err(failure) => ActionResponse::failure("friend_create", failure),
    }
}

/// Replaces all fields of an existing friend from the edit form.
#[flutter_rust_bridge::frb(sync)]
pub fn friend_update(friend_id: String, input: FriendInput) -> ActionResponse {
    let result = parse_id(&friend_id).and_then(|id| {
        let draft = to_friend_draft(input);
        with_store(Access::Write, |store| store.update_friend(id, draft))
    });
    match result {
        Ok(friend) => ActionResponse::success("Friend updated.", Some(friend.uuid.to_string())),
        Err(failure) => ActionResponse::failure("friend_update", failure),
    }
}

/// Deletes friends and removes them from every event they attended.
#[flutter_rust_bridge::frb(sync)]
pub fn friends_delete(friend_ids: Vec<String>) -> ActionResponse {
    let result = parse_ids(&friend_ids)
        .and_then(|ids| with_store(Access::Write, |store| store.delete_friends(&ids)));
    match result {
        Ok(deletion) => ActionResponse::success(
            format!(
                "Deleted {} friend(s); updated {} event(s).",
                deletion.deleted.len(),
                deletion.detached_events.len()
            ),
            None,
        ),
        Err(failure) => ActionResponse::failure("friends_delete", failure),
    }
}

/// Lists events split into past and upcoming around `now_ms`
/// (wall clock when `None`).
#[flutter_rust_bridge::frb(sync)]
pub fn events_timeline(now_ms: Option<i64>) -> EventsTimelineResponse {
    let now_ms = now_ms.unwrap_or_else(now_epoch_ms);
    let past_title = EventSection::Past.title().to_string();
    let upcoming_title = EventSection::Upcoming.title().to_string();

    match with_store(Access::Read, |store| store.load_timeline(now_ms)) {
        Ok(timeline) => {
            let message = format!(
                "{} past, {} upcoming.",
                timeline.past.len(),
                timeline.upcoming.len()
            );
            EventsTimelineResponse {
                ok: true,
                past_title,
                past: timeline.past.iter().map(to_event_item).collect(),
                upcoming_title,
                upcoming: timeline.upcoming.iter().map(to_event_item).collect(),
                error_code: None,
                message,
            }
        }
        Err(failure) => EventsTimelineResponse {
            ok: false,
            past_title,
            past: Vec::new(),
            upcoming_title,
            upcoming: Vec::new(),
            error_code: Some(failure.code.to_string()),
            message: format!("events_timeline failed: {}", failure.message),
        },
    }
}

/// Creates an event with its attendee set.
#[flutter_rust_bridge::frb(sync)]
pub fn event_create(input: EventInput) -> ActionResponse {
    let result = to_event_parts(input).and_then(|(draft, friend_ids)| {
        with_store(Access::Write, |store| store.create_event(draft, friend_ids))
    });
    match result {
        Ok(event) => ActionResponse::success("Event created.", Some(event.uuid.to_string())),
        Err(failure) => ActionResponse::failure("event_create", failure),
    }
}

/// Replaces event fields and its whole attendee set.
#[flutter_rust_bridge::frb(sync)]
pub fn event_update(event_id: String, input: EventInput) -> ActionResponse {
    let result = parse_id(&event_id).and_then(|id| {
        let (draft, friend_ids) = to_event_parts(input)?;
        with_store(Access::Write, |store| {
            store.update_event(id, draft, friend_ids)
        })
    });
    match result {
        Ok(event) => ActionResponse::success("Event updated.", Some(event.uuid.to_string())),
        Err(failure) => ActionResponse::failure("event_update", failure),
    }
}

/// Deletes events; attendees are kept.
#[flutter_rust_bridge::frb(sync)]
pub fn events_delete(event_ids: Vec<String>) -> ActionResponse {
    let result = parse_ids(&event_ids).and_then(|ids| {
        with_store(Access::Write, |store| store.delete_events(&ids))?;
        Ok(ids.len())
    });
    match result {
        Ok(count) => ActionResponse::success(format!("Deleted {count} event(s)."), None),
        Err(failure) => ActionResponse::failure("events_delete", failure),
    }
}

#[derive(Debug)]
struct ApiFailure {
    code: &'static str,
    message: String,
}

impl ApiFailure {
    fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            code: "invalid_argument",
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_store<T>(
    access: Access,
    f: impl FnOnce(&mut Store<'_>) -> StoreResult<T>,
) -> Result<T, ApiFailure> {
    // Opening may run migrations, so it is serialized like a write.
    let guard = STORE_WRITE_LOCK
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let mut conn = open_db(resolve_db_path()).map_err(|err| {
        warn!("event=ffi_db_open module=ffi status=error error={err}");
        ApiFailure {
            code: if err.is_fatal() {
                "persistence_unavailable"
            } else {
                "persistence_failed"
            },
            message: format!("database open failed: {err}"),
        }
    })?;
    let _write_guard = (access == Access::Write).then_some(guard);

    let repo = SqliteRelationshipRepository::try_new(&mut conn).map_err(|err| ApiFailure {
        code: "persistence_unavailable",
        message: format!("repository init failed: {err}"),
    })?;
    let mut store = RelationshipStore::new(repo);
    f(&mut store).map_err(|err| ApiFailure {
        code: err.code(),
        message: err.to_string(),
    })
}

fn parse_id(value: &str) -> Result<Uuid, ApiFailure> {
    Uuid::parse_str(value.trim())
        .map_err(|_| ApiFailure::invalid_argument(format!("invalid id `{value}`")))
}

fn parse_ids(values: &[String]) -> Result<BTreeSet<Uuid>, ApiFailure> {
    values.iter().map(|value| parse_id(value)).collect()
}

fn to_friend_draft(input: FriendInput) -> FriendDraft {
    FriendDraft {
        full_name: input.full_name.trim().to_string(),
        gender: input.gender.trim().to_string(),
        phone_number: input.phone_number.trim().to_string(),
        date_of_birth: input.date_of_birth_ms,
        hobbies: input.hobbies,
        avatar: input.avatar.filter(|bytes| !bytes.is_empty()),
    }
}

fn to_event_parts(input: EventInput) -> Result<(EventDraft, BTreeSet<Uuid>), ApiFailure> {
    let friend_ids = parse_ids(&input.friend_ids)?;
    let draft = EventDraft {
        name: input.name.trim().to_string(),
        location: input.location.trim().to_string(),
        starts_at: input.starts_at_ms,
    };
    Ok((draft, friend_ids))
}

fn to_friend_item(friend: &Friend) -> FriendItem {
    FriendItem {
        friend_id: friend.uuid.to_string(),
        full_name: friend.full_name.clone(),
        gender: friend.gender.clone(),
        phone_number: friend.phone_number.clone(),
        date_of_birth_ms: friend.date_of_birth,
        hobbies: friend.hobbies.clone(),
        avatar: friend.avatar.clone(),
        summary: friend.summary_line(),
    }
}

fn to_event_item(event: &Event) -> EventItem {
    EventItem {
        event_id: event.uuid.to_string(),
        name: event.name.clone(),
        location: event.location.clone(),
        starts_at_ms: event.starts_at,
        friend_ids: event.friend_ids.iter().map(Uuid::to_string).collect(),
    }
}
