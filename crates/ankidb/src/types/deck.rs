//! Deck and deck config rows.

use crate::types::{DeckConfigId, DeckId, SyncMeta};

/// A named scheduling container for cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    /// Row id.
    pub id: DeckId,
    /// Deck name; `::` separates nesting levels in the owning application.
    pub name: String,
    /// Soft reference to a [`DeckConfig`], taken from the schema-11 deck
    /// JSON (`conf` key). Not an enforced foreign key: newer schema
    /// revisions embed it inside the opaque `kind` payload instead, so this
    /// is `None` there, and the referenced config row may not exist.
    pub config_id: Option<DeckConfigId>,
    /// Opaque counters payload (`common`); empty on schema-11 collections.
    pub common: String,
    /// Opaque kind payload (`kind`); empty on schema-11 collections.
    pub kind: String,
    /// Sync bookkeeping (`usn`, `mtime_secs` or schema-11 `mod`).
    pub sync: SyncMeta,
}

/// Scheduling options shared by one or more decks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckConfig {
    /// Row id.
    pub id: DeckConfigId,
    /// Config preset name.
    pub name: String,
    /// Opaque options payload, stored verbatim.
    pub config: String,
    /// Sync bookkeeping (`usn`, `mtime_secs` or schema-11 `mod`).
    pub sync: SyncMeta,
}
