//! Tests for the `unicase` collation as SQLite actually applies it.

use ankidb::types::{Deck, SyncMeta, Tag};
use ankidb::{Collection, SchemaVersion};

fn deck(id: i64, name: &str) -> Deck {
    Deck {
        id,
        name: name.to_string(),
        config_id: None,
        common: String::new(),
        kind: String::new(),
        sync: SyncMeta::new(-1),
    }
}

#[test]
fn test_deck_ordering_is_case_and_accent_insensitive() {
    let col = Collection::create_in_memory(SchemaVersion::V18).unwrap();
    col.insert_deck(&deck(2, "zebra")).unwrap();
    col.insert_deck(&deck(3, "Äpfel")).unwrap();
    col.insert_deck(&deck(4, "apple")).unwrap();

    let names: Vec<String> = col.decks().unwrap().into_iter().map(|d| d.name).collect();
    // "Äpfel" transliterates to "apfel", sorting before "apple"; "Default"
    // comes from collection creation.
    assert_eq!(names, vec!["Äpfel", "apple", "Default", "zebra"]);
}

#[test]
fn test_tag_ordering_under_unicase() {
    let col = Collection::create_in_memory(SchemaVersion::V18).unwrap();
    for name in ["Beta", "émile", "alpha"] {
        col.register_tag(&Tag {
            name: name.to_string(),
            usn: -1,
        })
        .unwrap();
    }

    let names: Vec<String> = col.tags().unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["alpha", "Beta", "émile"]);
}

#[test]
fn test_collation_available_to_ad_hoc_queries() {
    let col = Collection::create_in_memory(SchemaVersion::V18).unwrap();
    let equal: i64 = col
        .conn()
        .query_row(
            "SELECT 'Émile' = 'emile' COLLATE unicase",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(equal, 1);
}
