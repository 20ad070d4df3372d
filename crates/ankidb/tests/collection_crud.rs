//! Round-trip tests against a real schema-18 collection database.

use ankidb::enums::{BuriedBy, CardType, Flag, Queue, ReviewType, ScheduledState};
use ankidb::types::{Card, CardTemplate, Grave, Note, NoteField, NoteType, RevLogEntry, SyncMeta};
use ankidb::{Collection, Error, GraveType, SchemaVersion, TimestampSecs};

fn test_collection() -> Collection {
    Collection::create_in_memory(SchemaVersion::V18).unwrap()
}

fn basic_note_type(id: i64) -> NoteType {
    NoteType {
        id,
        name: "Basic".to_string(),
        config: "{}".to_string(),
        fields: vec![
            NoteField {
                ordinal: 0,
                name: "Front".to_string(),
                config: "{}".to_string(),
            },
            NoteField {
                ordinal: 1,
                name: "Back".to_string(),
                config: "{}".to_string(),
            },
        ],
        templates: vec![CardTemplate {
            ordinal: 0,
            name: "Card 1".to_string(),
            config: "{}".to_string(),
        }],
        sync: SyncMeta::new(-1),
    }
}

#[test]
fn test_create_on_disk_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collection.anki2");

    Collection::create(&path, SchemaVersion::V18).unwrap();
    let col = Collection::open(&path).unwrap();
    assert_eq!(col.schema_version(), SchemaVersion::V18);

    let meta = col.meta().unwrap();
    assert_eq!(meta.id, 1);
    assert_eq!(meta.version, 18);
    assert!(meta.created.0 > 0);
}

#[test]
fn test_note_round_trip_is_byte_exact() {
    let col = test_collection();
    let mut note = Note::new(
        1000,
        "abc123",
        100,
        vec!["front text".to_string(), "back text".to_string()],
    );
    note.tags = vec!["red".to_string(), "leech".to_string()];
    col.insert_note(&note).unwrap();

    // The stored encodings are the wire format to the owning application.
    let (raw_tags, raw_fields): (String, String) = col
        .conn()
        .query_row("SELECT tags, flds FROM notes WHERE id = 1000", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(raw_tags, " red leech ");
    assert_eq!(raw_fields, "front text\x1fback text");

    let loaded = col.note(1000).unwrap().unwrap();
    assert_eq!(loaded, note);
}

#[test]
fn test_update_note_refreshes_derived_columns() {
    let col = test_collection();
    let mut note = Note::new(1000, "abc123", 100, vec!["old".to_string()]);
    col.insert_note(&note).unwrap();

    note.fields[0] = "new front".to_string();
    note.refresh_derived();
    note.sync = SyncMeta::new(-1);
    col.update_note(&note).unwrap();

    let loaded = col.note(1000).unwrap().unwrap();
    assert_eq!(loaded.sort_field, "new front");
    assert_eq!(loaded.checksum, ankidb::types::field_checksum("new front"));
}

#[test]
fn test_card_round_trip_preserves_scheduling_state() {
    let col = test_collection();
    let mut card = Card::new(2000, 1000, 1, 0);
    card.card_type = CardType::Due;
    card.queue = Queue::Buried(BuriedBy::Scheduler);
    card.due = 120;
    card.interval = -30;
    card.factor = 2500;
    card.review_count = 4;
    card.lapse_count = 1;
    card.flag = Flag::Other(7);
    col.insert_card(&card).unwrap();

    let loaded = col.card(2000).unwrap().unwrap();
    assert_eq!(loaded, card);
    assert!(loaded.is_buried());
    assert_eq!(loaded.interval(), ankidb::Interval::Seconds(30));
    // Unknown flag values survive the round trip untouched.
    let raw_flags: i64 = col
        .conn()
        .query_row("SELECT flags FROM cards WHERE id = 2000", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(raw_flags, 7);
}

#[test]
fn test_unknown_queue_value_is_rejected_on_load() {
    let col = test_collection();
    col.conn()
        .execute(
            "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor,
                                reps, lapses, left, odue, odid, flags, data)
             VALUES (1, 1, 1, 0, 0, -1, 0, 9, 0, 0, 0, 0, 0, 0, 0, 0, 0, '')",
            [],
        )
        .unwrap();

    match col.card(1) {
        Err(Error::UnknownEnumValue { domain, value }) => {
            assert_eq!(domain, "queue");
            assert_eq!(value, 9);
        }
        other => panic!("expected UnknownEnumValue, got {other:?}"),
    }
}

#[test]
fn test_dangling_note_reference_is_reported() {
    let col = test_collection();
    let card = Card::new(2000, 9999, 1, 0);
    col.insert_card(&card).unwrap();

    match col.note_of(&card) {
        Err(Error::ForeignKeyUnresolved { table, column, value }) => {
            assert_eq!(table, "cards");
            assert_eq!(column, "nid");
            assert_eq!(value, 9999);
        }
        other => panic!("expected ForeignKeyUnresolved, got {other:?}"),
    }
}

#[test]
fn test_cards_for_note_ordered_by_template() {
    let col = test_collection();
    col.insert_card(&Card::new(2001, 1000, 1, 1)).unwrap();
    col.insert_card(&Card::new(2000, 1000, 1, 0)).unwrap();

    let cards = col.cards_for_note(1000).unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].ordinal, 0);
    assert_eq!(cards[1].ordinal, 1);
}

#[test]
fn test_note_type_round_trip_and_validation() {
    let col = test_collection();
    col.insert_note_type(&basic_note_type(100)).unwrap();

    let loaded = col.note_type(100).unwrap().unwrap();
    assert_eq!(loaded.name, "Basic");
    assert_eq!(loaded.fields.len(), 2);
    assert_eq!(loaded.fields[0].name, "Front");
    assert_eq!(loaded.templates.len(), 1);

    let good = Note::new(1000, "g1", 100, vec!["a".to_string(), "b".to_string()]);
    col.check_note(&good).unwrap();

    let bad = Note::new(1001, "g2", 100, vec!["a".to_string()]);
    match col.check_note(&bad) {
        Err(Error::InvariantViolation(msg)) => assert!(msg.contains("Basic")),
        other => panic!("expected InvariantViolation, got {other:?}"),
    }
}

#[test]
fn test_revlog_append_and_ordering() {
    let col = test_collection();
    for (id, usn) in [(3002_i64, 5_i64), (3001, 2), (3003, 5)] {
        col.insert_revlog(&RevLogEntry {
            id,
            card_id: 2000,
            usn,
            ease: 3,
            interval: 10,
            last_interval: -60,
            factor: 2500,
            taken_millis: 4200,
            review_type: ReviewType::Review,
        })
        .unwrap();
    }

    let entries = col.revlog_for_card(2000).unwrap();
    let order: Vec<(i64, i64)> = entries.iter().map(|e| (e.usn, e.id)).collect();
    assert_eq!(order, vec![(2, 3001), (5, 3002), (5, 3003)]);
    assert_eq!(entries[0].reviewed_at().0, 3001);
}

#[test]
fn test_duplicate_graves_are_preserved() {
    let col = test_collection();
    let grave = Grave {
        original_id: 42,
        kind: GraveType::Note,
        usn: 7,
    };
    col.add_grave(&grave).unwrap();
    col.add_grave(&grave).unwrap();

    let graves = col.graves().unwrap();
    assert_eq!(graves, vec![grave, grave]);
}

#[test]
fn test_delete_does_not_write_tombstones() {
    let col = test_collection();
    col.insert_card(&Card::new(2000, 1000, 1, 0)).unwrap();
    col.delete_card(2000).unwrap();

    assert!(col.card(2000).unwrap().is_none());
    assert!(col.graves().unwrap().is_empty());
}

#[test]
fn test_config_round_trip() {
    let col = test_collection();
    col.set_config_value("curDeck", &1_i64, SyncMeta::new(-1))
        .unwrap();
    col.set_config_value("sortBackwards", &false, SyncMeta::new(-1))
        .unwrap();

    assert_eq!(col.config_value::<i64>("curDeck").unwrap(), Some(1));
    assert_eq!(
        col.config_value::<bool>("sortBackwards").unwrap(),
        Some(false)
    );
    assert_eq!(col.config_value::<i64>("missing").unwrap(), None);
    assert_eq!(col.config_entries().unwrap().len(), 2);
}

#[test]
fn test_malformed_config_value_is_a_hard_error() {
    let col = test_collection();
    col.conn()
        .execute(
            "INSERT INTO config (key, usn, mtime_secs, val) VALUES ('broken', 0, 0, '{\"a\": [1,')",
            [],
        )
        .unwrap();

    match col.config_value::<serde_json::Value>("broken") {
        Err(Error::MalformedValue { table, column, .. }) => {
            assert_eq!(table, "config");
            assert_eq!(column, "val");
        }
        other => panic!("expected MalformedValue, got {other:?}"),
    }
}

#[test]
fn test_deck_config_soft_reference_absent_on_v18() {
    let col = test_collection();
    let deck = col.deck(1).unwrap().unwrap();
    assert_eq!(deck.name, "Default");
    assert_eq!(deck.config_id, None);
    assert!(matches!(
        col.deck_config_for(&deck),
        Err(Error::InvariantViolation(_))
    ));
}

#[test]
fn test_sync_meta_written_with_data() {
    let col = test_collection();
    let mut card = Card::new(2000, 1000, 1, 0);
    card.sync = SyncMeta {
        usn: 12,
        mtime: TimestampSecs(1_700_000_000),
    };
    col.insert_card(&card).unwrap();

    let (usn, mtime): (i64, i64) = col
        .conn()
        .query_row("SELECT usn, mod FROM cards WHERE id = 2000", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(usn, 12);
    assert_eq!(mtime, 1_700_000_000);
}

#[test]
fn test_queue_buried_recognized_regardless_of_card_type() {
    let col = test_collection();
    let mut card = Card::new(2000, 1000, 1, 0);
    card.card_type = CardType::New;
    card.queue = Queue::Buried(BuriedBy::User);
    col.insert_card(&card).unwrap();

    let loaded = col.card(2000).unwrap().unwrap();
    assert_eq!(loaded.card_type, CardType::New);
    assert!(loaded.is_buried());
    assert_ne!(loaded.queue, Queue::Scheduled(ScheduledState::New));
}
