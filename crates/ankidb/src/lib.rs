//! A typed access layer over Anki collection SQLite databases.
//!
//! This crate reads and writes collection rows using the exact byte/text
//! encodings the Anki application expects, so external tools can inspect or
//! modify a collection without corrupting it. It deliberately does *not*
//! implement the spaced-repetition scheduler, a query builder, or schema
//! migrations: the schema is owned by Anki, and this crate only binds typed
//! values to it.
//!
//! # Quick Start
//!
//! ```no_run
//! use ankidb::Collection;
//!
//! # fn example() -> ankidb::Result<()> {
//! let col = Collection::open("collection.anki2")?;
//!
//! for deck in col.decks()? {
//!     println!("{} ({})", deck.name, deck.id);
//! }
//!
//! if let Some(note) = col.note(1651363200000)? {
//!     println!("tags: {:?}", note.tags);
//!     for card in col.cards_for_note(note.id)? {
//!         println!("  card {} buried={}", card.id, card.is_buried());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Layers
//!
//! - [`codec`] - pure, stateless converters between typed values and the
//!   stored encodings (tag sets, field lists, timestamps, JSON blobs)
//! - [`enums`] - the integer-backed enumerations, including the queue's
//!   burial/suspension sentinels decoded into a tagged union
//! - [`types`] - plain entity structs with derived, pure attribute functions
//! - [`collection`] - the binding layer: typed load/save per table, per
//!   schema revision
//! - [`collation`] - the `unicase` collation the schema references by name
//!
//! # Schema revisions
//!
//! Collections exist in two incompatible on-disk revisions (the schema-11
//! `.apkg` interchange format with inline JSON blobs, and the normalized
//! schema used since Anki 2.1.28). [`Collection::open`] selects the matching
//! binding set from the stored version; nothing is migrated.

pub mod codec;
pub mod collation;
pub mod collection;
pub mod enums;
pub mod error;
pub mod schema;
pub mod types;

pub use codec::{TimestampMillis, TimestampSecs};
pub use collection::Collection;
pub use enums::{BuriedBy, CardType, Flag, GraveType, Queue, ReviewType, ScheduledState};
pub use error::{Error, Result};
pub use schema::SchemaVersion;
pub use types::{
    Card, CardTemplate, CollectionMeta, ConfigEntry, Deck, DeckConfig, Due, Grave, Interval, Note,
    NoteField, NoteType, RevLogEntry, SyncMeta, Tag,
};
