//! Friend/event repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist friends, events and the `event_friends` association.
//! - Apply association changes atomically with the owning write.
//!
//! # Invariants
//! - Write paths call `validate()` before SQL mutations.
//! - Read paths reject malformed persisted rows instead of masking them.
//! - Lists are ordered by insertion (`id ASC`).

use crate::db::DbError;
use crate::model::event::{Event, EventId};
use crate::model::friend::{Friend, FriendId};
use crate::model::ModelValidationError;
use crate::repo::schema::ensure_connection_ready;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const FRIEND_SELECT_SQL: &str = "SELECT
    uuid,
    full_name,
    gender,
    phone_number,
    date_of_birth,
    hobbies,
    avatar
FROM friends";

const EVENT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    location,
    starts_at
FROM events";

const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persisted entity type, used to qualify lookups that miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Friend,
    Event,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Friend => "friend",
            Self::Event => "event",
        }
    }
}

/// Repository error for friend/event persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    NotFound { kind: EntityKind, id: Uuid },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{} not found: {id}", kind.as_str()),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence collaborator consumed by `RelationshipStore`.
pub trait RelationshipRepository {
    fn list_friends(&self) -> RepoResult<Vec<Friend>>;
    fn get_friend(&self, id: FriendId) -> RepoResult<Option<Friend>>;
    fn insert_friend(&mut self, friend: &Friend) -> RepoResult<()>;
    /// Fails with `NotFound` when no row has `friend.uuid`.
    fn update_friend(&mut self, friend: &Friend) -> RepoResult<()>;
    /// Returns the subset of `ids` with no persisted friend.
    fn missing_friend_ids(&self, ids: &BTreeSet<FriendId>) -> RepoResult<BTreeSet<FriendId>>;

    fn list_events(&self) -> RepoResult<Vec<Event>>;
    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>>;
    /// Writes event fields and its full friend set in one transaction.
    fn insert_event(&mut self, event: &Event) -> RepoResult<()>;
    /// Replaces event fields and its full friend set in one transaction.
    fn update_event(&mut self, event: &Event) -> RepoResult<()>;

    /// Deletes friends and detaches them from every event in one
    /// transaction. Returns the events whose friend set changed.
    fn delete_friends(&mut self, ids: &BTreeSet<FriendId>) -> RepoResult<Vec<EventId>>;
    fn delete_events(&mut self, ids: &BTreeSet<EventId>) -> RepoResult<()>;
}

/// SQLite-backed relationship repository.
pub struct SqliteRelationshipRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteRelationshipRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RelationshipRepository for SqliteRelationshipRepository<'_> {
    fn list_friends(&self) -> RepoResult<Vec<Friend>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{FRIEND_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut friends = Vec::new();
        while let Some(row) = rows.next()? {
            friends.push(parse_friend_row(row)?);
        }
        Ok(friends)
    }

    fn get_friend(&self, id: FriendId) -> RepoResult<Option<Friend>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{FRIEND_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_friend_row(row)?));
        }
        Ok(None)
    }

    fn insert_friend(&mut self, friend: &Friend) -> RepoResult<()> {
        friend.validate()?;

        self.conn.execute(
            "INSERT INTO friends (
                uuid,
                full_name,
                gender,
                phone_number,
                date_of_birth,
                hobbies,
                avatar
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                friend.uuid.to_string(),
                friend.full_name.as_str(),
                friend.gender.as_str(),
                friend.phone_number.as_str(),
                friend.date_of_birth,
                friend.hobbies.as_str(),
                friend.avatar.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn update_friend(&mut self, friend: &Friend) -> RepoResult<()> {
        friend.validate()?;

        let changed = self.conn.execute(
            &format!(
                "UPDATE friends
                 SET
                    full_name = ?1,
                    gender = ?2,
                    phone_number = ?3,
                    date_of_birth = ?4,
                    hobbies = ?5,
                    avatar = ?6,
                    updated_at = {NOW_MS_SQL}
                 WHERE uuid = ?7;"
            ),
            params![
                friend.full_name.as_str(),
                friend.gender.as_str(),
                friend.phone_number.as_str(),
                friend.date_of_birth,
                friend.hobbies.as_str(),
                friend.avatar.as_deref(),
                friend.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Friend,
                id: friend.uuid,
            });
        }
        Ok(())
    }

    fn missing_friend_ids(&self, ids: &BTreeSet<FriendId>) -> RepoResult<BTreeSet<FriendId>> {
        let mut missing = BTreeSet::new();
        for id in ids {
            if !row_exists(self.conn, "friends", &id.to_string())? {
                missing.insert(*id);
            }
        }
        Ok(missing)
    }

    fn list_events(&self) -> RepoResult<Vec<Event>> {
        let mut links = load_all_event_friends(self.conn)?;
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            let mut event = parse_event_row(row)?;
            event.friend_ids = links.remove(&event.uuid).unwrap_or_default();
            events.push(event);
        }
        Ok(events)
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut event = parse_event_row(row)?;
            event.friend_ids = load_event_friends(self.conn, &event.uuid)?;
            return Ok(Some(event));
        }
        Ok(None)
    }

    fn insert_event(&mut self, event: &Event) -> RepoResult<()> {
        event.validate()?;

        let event_uuid = event.uuid.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO events (uuid, name, location, starts_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                event_uuid.as_str(),
                event.name.as_str(),
                event.location.as_str(),
                event.starts_at,
            ],
        )?;
        replace_event_friends(&tx, event_uuid.as_str(), &event.friend_ids)?;
        tx.commit()?;
        Ok(())
    }

    fn update_event(&mut self, event: &Event) -> RepoResult<()> {
        event.validate()?;

        let event_uuid = event.uuid.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            &format!(
                "UPDATE events
                 SET
                    name = ?1,
                    location = ?2,
                    starts_at = ?3,
                    updated_at = {NOW_MS_SQL}
                 WHERE uuid = ?4;"
            ),
            params![
                event.name.as_str(),
                event.location.as_str(),
                event.starts_at,
                event_uuid.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Event,
                id: event.uuid,
            });
        }
        replace_event_friends(&tx, event_uuid.as_str(), &event.friend_ids)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_friends(&mut self, ids: &BTreeSet<FriendId>) -> RepoResult<Vec<EventId>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut touched_events = BTreeSet::new();
        for id in ids {
            let friend_uuid = id.to_string();
            if !row_exists(&tx, "friends", friend_uuid.as_str())? {
                return Err(RepoError::NotFound {
                    kind: EntityKind::Friend,
                    id: *id,
                });
            }

            touched_events.extend(load_friend_events(&tx, friend_uuid.as_str())?);
            tx.execute(
                "DELETE FROM event_friends WHERE friend_uuid = ?1;",
                [friend_uuid.as_str()],
            )?;
            tx.execute(
                "DELETE FROM friends WHERE uuid = ?1;",
                [friend_uuid.as_str()],
            )?;
        }

        for event_id in &touched_events {
            tx.execute(
                &format!("UPDATE events SET updated_at = {NOW_MS_SQL} WHERE uuid = ?1;"),
                [event_id.to_string()],
            )?;
        }

        tx.commit()?;
        Ok(touched_events.into_iter().collect())
    }

    fn delete_events(&mut self, ids: &BTreeSet<EventId>) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for id in ids {
            let event_uuid = id.to_string();
            tx.execute(
                "DELETE FROM event_friends WHERE event_uuid = ?1;",
                [event_uuid.as_str()],
            )?;
            let changed = tx.execute(
                "DELETE FROM events WHERE uuid = ?1;",
                [event_uuid.as_str()],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    kind: EntityKind::Event,
                    id: *id,
                });
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_friend_row(row: &Row<'_>) -> RepoResult<Friend> {
    let uuid_text: String = row.get("uuid")?;
    let friend = Friend {
        uuid: parse_uuid(&uuid_text, "friends.uuid")?,
        full_name: row.get("full_name")?,
        gender: row.get("gender")?,
        phone_number: row.get("phone_number")?,
        date_of_birth: row.get("date_of_birth")?,
        hobbies: row.get("hobbies")?,
        avatar: row.get("avatar")?,
    };
    friend
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("friend {uuid_text}: {err}")))?;
    Ok(friend)
}

/// Parses event fields only; the caller attaches `friend_ids`.
fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let uuid_text: String = row.get("uuid")?;
    let event = Event {
        uuid: parse_uuid(&uuid_text, "events.uuid")?,
        name: row.get("name")?,
        location: row.get("location")?,
        starts_at: row.get("starts_at")?,
        friend_ids: BTreeSet::new(),
    };
    event
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("event {uuid_text}: {err}")))?;
    Ok(event)
}

fn load_event_friends(conn: &Connection, event_id: &EventId) -> RepoResult<BTreeSet<FriendId>> {
    let mut stmt = conn.prepare("SELECT friend_uuid FROM event_friends WHERE event_uuid = ?1;")?;
    let mut rows = stmt.query([event_id.to_string()])?;
    let mut friend_ids = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        friend_ids.insert(parse_uuid(&value, "event_friends.friend_uuid")?);
    }
    Ok(friend_ids)
}

fn load_friend_events(conn: &Connection, friend_uuid: &str) -> RepoResult<Vec<EventId>> {
    let mut stmt = conn.prepare("SELECT event_uuid FROM event_friends WHERE friend_uuid = ?1;")?;
    let mut rows = stmt.query([friend_uuid])?;
    let mut event_ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        event_ids.push(parse_uuid(&value, "event_friends.event_uuid")?);
    }
    Ok(event_ids)
}

fn load_all_event_friends(
    conn: &Connection,
) -> RepoResult<HashMap<EventId, BTreeSet<FriendId>>> {
    let mut stmt = conn.prepare("SELECT event_uuid, friend_uuid FROM event_friends;")?;
    let mut rows = stmt.query([])?;
    let mut links: HashMap<EventId, BTreeSet<FriendId>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let event_text: String = row.get(0)?;
        let friend_text: String = row.get(1)?;
        links
            .entry(parse_uuid(&event_text, "event_friends.event_uuid")?)
            .or_default()
            .insert(parse_uuid(&friend_text, "event_friends.friend_uuid")?);
    }
    Ok(links)
}

fn replace_event_friends(
    tx: &Transaction<'_>,
    event_uuid: &str,
    friend_ids: &BTreeSet<FriendId>,
) -> RepoResult<()> {
    tx.execute(
        "DELETE FROM event_friends WHERE event_uuid = ?1;",
        [event_uuid],
    )?;
    for friend_id in friend_ids {
        tx.execute(
            "INSERT INTO event_friends (event_uuid, friend_uuid) VALUES (?1, ?2);",
            params![event_uuid, friend_id.to_string()],
        )?;
    }
    Ok(())
}

fn row_exists(conn: &Connection, table: &'static str, uuid: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE uuid = ?1);"),
        [uuid],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
