use friends_core::db::migrations::latest_version;
use friends_core::db::open_db_in_memory;
use friends_core::{
    EntityKind, Event, EventDraft, Friend, FriendDraft, RelationshipRepository, RepoError,
    SqliteRelationshipRepository,
};
use rusqlite::Connection;
use std::collections::BTreeSet;

fn friend(name: &str) -> Friend {
    Friend::new(FriendDraft {
        full_name: name.to_string(),
        date_of_birth: 946_684_800_000,
        ..FriendDraft::default()
    })
}

fn event(name: &str, friend_ids: &[&Friend]) -> Event {
    Event::new(
        EventDraft {
            name: name.to_string(),
            location: "Riverside".to_string(),
            starts_at: 1_800_000_000_000,
        },
        friend_ids.iter().map(|f| f.uuid).collect(),
    )
}

#[test]
fn insert_and_get_friend_roundtrip_with_avatar() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();

    let mut ann = friend("Ann");
    ann.avatar = Some(vec![0x89, b'P', b'N', b'G']);
    repo.insert_friend(&ann).unwrap();

    let loaded = repo.get_friend(ann.uuid).unwrap().unwrap();
    assert_eq!(loaded, ann);
}

#[test]
fn list_friends_follows_insertion_order() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();

    let names = ["Zed", "Ann", "Mo"];
    for name in names {
        repo.insert_friend(&friend(name)).unwrap();
    }

    let listed: Vec<_> = repo
        .list_friends()
        .unwrap()
        .into_iter()
        .map(|f| f.full_name)
        .collect();
    assert_eq!(listed, names);
}

#[test]
fn update_missing_friend_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();

    let ghost = friend("Ghost");
    let err = repo.update_friend(&ghost).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { kind: EntityKind::Friend, id } if id == ghost.uuid
    ));
}

#[test]
fn insert_rejects_invalid_friend_before_sql() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();

    let err = repo.insert_friend(&friend("  ")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(repo.list_friends().unwrap().is_empty());
}

#[test]
fn event_roundtrip_includes_friend_set() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();

    let ann = friend("Ann");
    let bo = friend("Bo");
    repo.insert_friend(&ann).unwrap();
    repo.insert_friend(&bo).unwrap();

    let picnic = event("Picnic", &[&ann, &bo]);
    repo.insert_event(&picnic).unwrap();

    let loaded = repo.get_event(picnic.uuid).unwrap().unwrap();
    assert_eq!(loaded, picnic);
    assert_eq!(repo.list_events().unwrap(), vec![picnic]);
}

#[test]
fn insert_event_with_unknown_friend_writes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();

    let stranger = friend("Stranger");
    let party = event("Party", &[&stranger]);
    assert!(repo.insert_event(&party).is_err());

    assert!(repo.get_event(party.uuid).unwrap().is_none());
    assert!(repo.list_events().unwrap().is_empty());
}

#[test]
fn update_event_replaces_friend_set() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();

    let ann = friend("Ann");
    let bo = friend("Bo");
    repo.insert_friend(&ann).unwrap();
    repo.insert_friend(&bo).unwrap();

    let mut dinner = event("Dinner", &[&ann]);
    repo.insert_event(&dinner).unwrap();

    dinner.name = "Late dinner".to_string();
    dinner.friend_ids = BTreeSet::from([bo.uuid]);
    repo.update_event(&dinner).unwrap();

    let loaded = repo.get_event(dinner.uuid).unwrap().unwrap();
    assert_eq!(loaded.name, "Late dinner");
    assert_eq!(loaded.friend_ids, BTreeSet::from([bo.uuid]));
}

#[test]
fn delete_friends_detaches_from_events_and_reports_them() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();

    let ann = friend("Ann");
    let bo = friend("Bo");
    repo.insert_friend(&ann).unwrap();
    repo.insert_friend(&bo).unwrap();
    let picnic = event("Picnic", &[&ann, &bo]);
    let solo = event("Solo", &[&bo]);
    repo.insert_event(&picnic).unwrap();
    repo.insert_event(&solo).unwrap();

    let touched = repo.delete_friends(&BTreeSet::from([ann.uuid])).unwrap();
    assert_eq!(touched, vec![picnic.uuid]);

    assert!(repo.get_friend(ann.uuid).unwrap().is_none());
    let picnic_after = repo.get_event(picnic.uuid).unwrap().unwrap();
    assert_eq!(picnic_after.friend_ids, BTreeSet::from([bo.uuid]));
    let solo_after = repo.get_event(solo.uuid).unwrap().unwrap();
    assert_eq!(solo_after.friend_ids, BTreeSet::from([bo.uuid]));
}

#[test]
fn delete_friends_with_unknown_id_rolls_back() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();

    let ann = friend("Ann");
    repo.insert_friend(&ann).unwrap();
    let picnic = event("Picnic", &[&ann]);
    repo.insert_event(&picnic).unwrap();

    let ghost = friend("Ghost");
    let err = repo
        .delete_friends(&BTreeSet::from([ann.uuid, ghost.uuid]))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { kind: EntityKind::Friend, .. }));

    assert!(repo.get_friend(ann.uuid).unwrap().is_some());
    let picnic_after = repo.get_event(picnic.uuid).unwrap().unwrap();
    assert!(picnic_after.friend_ids.contains(&ann.uuid));
}

#[test]
fn delete_events_keeps_friends() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();

    let ann = friend("Ann");
    repo.insert_friend(&ann).unwrap();
    let picnic = event("Picnic", &[&ann]);
    repo.insert_event(&picnic).unwrap();

    repo.delete_events(&BTreeSet::from([picnic.uuid])).unwrap();

    assert!(repo.list_events().unwrap().is_empty());
    assert_eq!(repo.list_friends().unwrap(), vec![ann]);
}

#[test]
fn delete_events_with_unknown_id_rolls_back() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();

    let ann = friend("Ann");
    repo.insert_friend(&ann).unwrap();
    let picnic = event("Picnic", &[&ann]);
    repo.insert_event(&picnic).unwrap();

    let ghost = event("Ghost", &[]);
    let err = repo
        .delete_events(&BTreeSet::from([picnic.uuid, ghost.uuid]))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { kind: EntityKind::Event, id } if id == ghost.uuid
    ));

    let picnic_after = repo.get_event(picnic.uuid).unwrap().unwrap();
    assert_eq!(picnic_after, picnic);
}

#[test]
fn missing_friend_ids_reports_only_unknown_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();

    let ann = friend("Ann");
    repo.insert_friend(&ann).unwrap();
    let ghost = friend("Ghost");

    let missing = repo
        .missing_friend_ids(&BTreeSet::from([ann.uuid, ghost.uuid]))
        .unwrap();
    assert_eq!(missing, BTreeSet::from([ghost.uuid]));
}

#[test]
fn corrupted_rows_surface_as_invalid_data() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO friends (uuid, full_name, date_of_birth) VALUES ('not-a-uuid', 'Ann', 0);",
        [],
    )
    .unwrap();

    let repo = SqliteRelationshipRepository::try_new(&mut conn).unwrap();
    let err = repo.list_friends().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    match SqliteRelationshipRepository::try_new(&mut conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_missing_association_table() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE friends (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL,
            gender TEXT NOT NULL DEFAULT '',
            phone_number TEXT NOT NULL DEFAULT '',
            date_of_birth INTEGER NOT NULL,
            hobbies TEXT NOT NULL DEFAULT '',
            avatar BLOB,
            updated_at INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            location TEXT NOT NULL DEFAULT '',
            starts_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT 0
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteRelationshipRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("event_friends"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE friends (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteRelationshipRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "friends",
            column: "gender"
        })
    ));
}
