//! Plain data structures for collection rows.
//!
//! Entities carry typed attributes only; all persistence goes through
//! [`crate::collection::Collection`], which binds each attribute to a storage
//! column and codec. Derived attributes are pure functions over already
//! loaded values and never touch the database.

mod card;
mod deck;
mod misc;
mod note;
mod notetype;
mod revlog;

pub use card::{Card, Due, Interval};
pub use deck::{Deck, DeckConfig};
pub use misc::{CollectionMeta, ConfigEntry, Grave, Tag};
pub use note::{Note, field_checksum, strip_html};
pub use notetype::{CardTemplate, NoteField, NoteType};
pub use revlog::RevLogEntry;

use crate::codec::TimestampSecs;

/// Row id of a card (also its creation time in milliseconds).
pub type CardId = i64;
/// Row id of a note (also its creation time in milliseconds).
pub type NoteId = i64;
/// Row id of a note type.
pub type NoteTypeId = i64;
/// Row id of a deck.
pub type DeckId = i64;
/// Row id of a deck config.
pub type DeckConfigId = i64;
/// Row id of a review history entry (a millisecond timestamp).
pub type RevLogId = i64;

/// Synchronization bookkeeping shared by every mutable entity.
///
/// Any mutation meant to be visible to a remote sync counterpart must bump
/// the update sequence number and modification time atomically with the data
/// change; this crate writes whatever meta the caller supplies and never
/// bumps it implicitly. Forgetting to bump is a silent sync bug, not a
/// schema violation, so the bump is kept explicit at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncMeta {
    /// Update sequence number (`usn`); -1 marks a locally changed row.
    pub usn: i64,
    /// Modification time in seconds.
    pub mtime: TimestampSecs,
}

impl SyncMeta {
    /// Meta for a freshly created or just-modified row.
    pub fn new(usn: i64) -> Self {
        Self {
            usn,
            mtime: TimestampSecs::now(),
        }
    }
}
