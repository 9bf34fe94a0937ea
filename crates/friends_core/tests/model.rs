use friends_core::{Event, EventDraft, Friend, FriendDraft, ModelValidationError};
use std::collections::BTreeSet;
use uuid::Uuid;

fn draft(name: &str) -> FriendDraft {
    FriendDraft {
        full_name: name.to_string(),
        gender: "female".to_string(),
        phone_number: "555-0100".to_string(),
        date_of_birth: 631_152_000_000,
        hobbies: "climbing, chess".to_string(),
        avatar: None,
    }
}

#[test]
fn friend_new_generates_identity_and_copies_fields() {
    let friend = Friend::new(draft("Ann"));

    assert!(!friend.uuid.is_nil());
    assert_eq!(friend.full_name, "Ann");
    assert_eq!(friend.hobbies, "climbing, chess");
    assert!(!friend.has_avatar());
    assert_eq!(friend.summary_line(), "Ann, female, 555-0100");
}

#[test]
fn blank_names_are_rejected() {
    assert_eq!(
        draft("   ").validate(),
        Err(ModelValidationError::BlankFullName)
    );

    let event = EventDraft {
        name: String::new(),
        location: "Park".to_string(),
        starts_at: 0,
    };
    assert_eq!(event.validate(), Err(ModelValidationError::BlankEventName));
}

#[test]
fn nil_identity_is_rejected() {
    let friend = Friend::from_draft(Uuid::nil(), draft("Ann"));
    assert_eq!(friend.validate(), Err(ModelValidationError::NilUuid));
}

#[test]
fn event_friend_set_has_no_duplicates() {
    let ann = Uuid::new_v4();
    let bo = Uuid::new_v4();
    let event = Event::new(
        EventDraft {
            name: "Picnic".to_string(),
            location: "Park".to_string(),
            starts_at: 1_700_000_000_000,
        },
        [ann, bo, ann].into_iter().collect::<BTreeSet<_>>(),
    );

    assert_eq!(event.attendee_count(), 2);
    assert!(event.has_friend(&ann));
    assert!(event.is_past(1_700_000_000_001));
    assert!(!event.is_past(1_700_000_000_000));
}

#[test]
fn friend_serialization_uses_expected_wire_fields() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let mut input = draft("Ann");
    input.avatar = Some(vec![1, 2, 3]);
    let friend = Friend::from_draft(id, input);

    let json = serde_json::to_value(&friend).unwrap();
    assert_eq!(json["uuid"], id.to_string());
    assert_eq!(json["full_name"], "Ann");
    assert_eq!(json["phone_number"], "555-0100");
    assert_eq!(json["date_of_birth"], 631_152_000_000_i64);
    assert_eq!(json["avatar"], serde_json::json!([1, 2, 3]));

    let decoded: Friend = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, friend);
}
