//! Typed load/save over an open collection database.
//!
//! [`Collection`] wraps one SQLite connection to an existing collection file.
//! On load, raw column values pass through the codecs in [`crate::codec`] and
//! [`crate::enums`] to produce typed entities; on save, typed attributes pass
//! back through the codec inverses. The schema is owned by the Anki
//! application: nothing here migrates, and every storage column name is
//! preserved exactly per schema revision.
//!
//! # Quick Start
//!
//! ```no_run
//! use ankidb::Collection;
//!
//! # fn example() -> ankidb::Result<()> {
//! let col = Collection::open("collection.anki2")?;
//! if let Some(card) = col.card(1694392840012)? {
//!     let note = col.note_of(&card)?;
//!     println!("{}: buried={}", note.guid, card.is_buried());
//! }
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::codec::{
    TimestampSecs, decode_json, encode_json, join_fields, join_tags, split_fields, split_tags,
};
use crate::collation::{compare_unicase, register_unicase};
use crate::enums::{CardType, Flag, GraveType, Queue, ReviewType};
use crate::error::{Error, Result};
use crate::schema::{
    DEFAULT_CONF, DEFAULT_DCONF, DEFAULT_DECKS, SCHEMA_COMMON, SCHEMA_V18_EXTRA, SchemaVersion,
};
use crate::types::{
    Card, CardId, CardTemplate, CollectionMeta, ConfigEntry, Deck, DeckConfig, DeckConfigId,
    DeckId, Grave, Note, NoteField, NoteId, NoteType, NoteTypeId, RevLogEntry, SyncMeta, Tag,
};

const CARD_COLUMNS: &str =
    "id, nid, did, ord, type, queue, due, ivl, factor, reps, lapses, left, odue, odid, flags, data, usn, mod";
const NOTE_COLUMNS: &str = "id, guid, mid, tags, flds, sfld, csum, flags, data, usn, mod";
const REVLOG_COLUMNS: &str = "id, cid, usn, ease, ivl, lastIvl, factor, time, type";

/// An open collection database.
///
/// Purely synchronous; consistency under concurrent access is delegated to
/// SQLite's own transaction isolation.
pub struct Collection {
    conn: Connection,
    version: SchemaVersion,
}

impl Collection {
    /// Open an existing collection file.
    ///
    /// Registers the `unicase` collation before any query and selects the
    /// binding set matching the stored schema version. No migration runs.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory collection; mostly useful with [`Collection::create_in_memory`].
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an already opened connection to an existing collection.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        register_unicase(&conn)?;
        let ver: i64 = conn.query_row("SELECT ver FROM col", [], |row| row.get(0))?;
        let version = SchemaVersion::from_ver(ver)?;
        debug!(ver, ?version, "opened collection");
        Ok(Self { conn, version })
    }

    /// Create a fresh, empty collection file the owning application can open.
    pub fn create(path: impl AsRef<Path>, version: SchemaVersion) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(conn, version)
    }

    /// Create a fresh, empty in-memory collection.
    pub fn create_in_memory(version: SchemaVersion) -> Result<Self> {
        Self::init_schema(Connection::open_in_memory()?, version)
    }

    fn init_schema(conn: Connection, version: SchemaVersion) -> Result<Self> {
        register_unicase(&conn)?;
        conn.execute_batch(SCHEMA_COMMON)?;
        let now = TimestampSecs::now();
        let now_ms = now.millis();
        match version {
            SchemaVersion::V11 => {
                conn.execute(
                    "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
                     VALUES (1, ?1, ?2, ?2, 11, 0, 0, 0, ?3, '{}', ?4, ?5, '{}')",
                    params![now, now_ms, DEFAULT_CONF, DEFAULT_DECKS, DEFAULT_DCONF],
                )?;
            }
            SchemaVersion::V18 => {
                conn.execute_batch(SCHEMA_V18_EXTRA)?;
                conn.execute(
                    "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
                     VALUES (1, ?1, ?2, ?2, 18, 0, 0, 0, '', '', '', '', '')",
                    params![now, now_ms],
                )?;
                conn.execute(
                    "INSERT INTO decks (id, name, mtime_secs, usn, common, kind)
                     VALUES (1, 'Default', ?1, 0, '', '')",
                    params![now],
                )?;
                conn.execute(
                    "INSERT INTO deck_config (id, name, mtime_secs, usn, config)
                     VALUES (1, 'Default', ?1, 0, '{}')",
                    params![now],
                )?;
            }
        }
        debug!(ver = version.ver(), "created collection");
        Ok(Self { conn, version })
    }

    /// The binding set in use.
    pub fn schema_version(&self) -> SchemaVersion {
        self.version
    }

    /// Direct access to the underlying connection, for queries this crate
    /// does not model.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- collection row ---

    /// Load the singleton `col` row.
    pub fn meta(&self) -> Result<CollectionMeta> {
        let meta = self.conn.query_row(
            "SELECT id, crt, mod, scm, ver, dty, usn, ls FROM col",
            [],
            |row| {
                Ok(CollectionMeta {
                    id: row.get("id")?,
                    created: row.get("crt")?,
                    modified: row.get("mod")?,
                    schema_modified: row.get("scm")?,
                    version: row.get("ver")?,
                    dirty: row.get("dty")?,
                    usn: row.get("usn")?,
                    last_sync: row.get("ls")?,
                })
            },
        )?;
        Ok(meta)
    }

    /// Write back the singleton `col` row. `ver` is never changed: revision
    /// differences are handled by binding selection, not migration.
    pub fn update_meta(&self, meta: &CollectionMeta) -> Result<()> {
        self.conn.execute(
            "UPDATE col SET crt = ?1, mod = ?2, scm = ?3, dty = ?4, usn = ?5, ls = ?6 WHERE id = ?7",
            params![
                meta.created,
                meta.modified,
                meta.schema_modified,
                meta.dirty,
                meta.usn,
                meta.last_sync,
                meta.id,
            ],
        )?;
        Ok(())
    }

    // --- cards ---

    /// Load one card.
    pub fn card(&self, id: CardId) -> Result<Option<Card>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => read_card(row).map(Some),
            None => Ok(None),
        }
    }

    /// All cards generated from a note, in template order.
    pub fn cards_for_note(&self, note_id: NoteId) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE nid = ?1 ORDER BY ord"
        ))?;
        let mut rows = stmt.query([note_id])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(read_card(row)?);
        }
        Ok(cards)
    }

    /// Insert a card row.
    pub fn insert_card(&self, card: &Card) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO cards ({CARD_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
            ),
            params![
                card.id,
                card.note_id,
                card.deck_id,
                card.ordinal,
                card.card_type.code(),
                card.queue.code(),
                card.due,
                card.interval,
                card.factor,
                card.review_count,
                card.lapse_count,
                card.left,
                card.original_due,
                card.original_deck_id,
                card.flag.code(),
                card.data,
                card.sync.usn,
                card.sync.mtime,
            ],
        )?;
        Ok(())
    }

    /// Update a card row in place, sync meta included.
    pub fn update_card(&self, card: &Card) -> Result<()> {
        self.conn.execute(
            "UPDATE cards SET nid = ?2, did = ?3, ord = ?4, type = ?5, queue = ?6, due = ?7,
                    ivl = ?8, factor = ?9, reps = ?10, lapses = ?11, left = ?12, odue = ?13,
                    odid = ?14, flags = ?15, data = ?16, usn = ?17, mod = ?18
             WHERE id = ?1",
            params![
                card.id,
                card.note_id,
                card.deck_id,
                card.ordinal,
                card.card_type.code(),
                card.queue.code(),
                card.due,
                card.interval,
                card.factor,
                card.review_count,
                card.lapse_count,
                card.left,
                card.original_due,
                card.original_deck_id,
                card.flag.code(),
                card.data,
                card.sync.usn,
                card.sync.mtime,
            ],
        )?;
        Ok(())
    }

    /// Remove a card row. Does not write a tombstone; callers deleting
    /// something that must propagate via sync pair this with [`Collection::add_grave`].
    pub fn delete_card(&self, id: CardId) -> Result<()> {
        self.conn.execute("DELETE FROM cards WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Resolve a card's note.
    pub fn note_of(&self, card: &Card) -> Result<Note> {
        self.note(card.note_id)?.ok_or(Error::ForeignKeyUnresolved {
            table: "cards",
            column: "nid",
            value: card.note_id,
        })
    }

    /// Resolve a card's deck.
    pub fn deck_of(&self, card: &Card) -> Result<Deck> {
        self.deck(card.deck_id)?.ok_or(Error::ForeignKeyUnresolved {
            table: "cards",
            column: "did",
            value: card.deck_id,
        })
    }

    // --- review history ---

    /// A card's review history, ordered by usn then id.
    pub fn revlog_for_card(&self, card_id: CardId) -> Result<Vec<RevLogEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REVLOG_COLUMNS} FROM revlog WHERE cid = ?1 ORDER BY usn, id"
        ))?;
        let mut rows = stmt.query([card_id])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(read_revlog(row)?);
        }
        Ok(entries)
    }

    /// Append a review history entry. History is append-only; there is no
    /// update counterpart.
    pub fn insert_revlog(&self, entry: &RevLogEntry) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO revlog ({REVLOG_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                entry.id,
                entry.card_id,
                entry.usn,
                entry.ease,
                entry.interval,
                entry.last_interval,
                entry.factor,
                entry.taken_millis,
                entry.review_type.code(),
            ],
        )?;
        Ok(())
    }

    // --- notes ---

    /// Load one note.
    pub fn note(&self, id: NoteId) -> Result<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => read_note(row).map(Some),
            None => Ok(None),
        }
    }

    /// Insert a note row. Derived columns (`sfld`, `csum`) are written as
    /// given; call [`Note::refresh_derived`] after mutating fields.
    pub fn insert_note(&self, note: &Note) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO notes ({NOTE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, '', ?8, ?9)"
            ),
            params![
                note.id,
                note.guid,
                note.notetype_id,
                join_tags(&note.tags),
                join_fields(&note.fields),
                note.sort_field,
                note.checksum,
                note.sync.usn,
                note.sync.mtime,
            ],
        )?;
        Ok(())
    }

    /// Update a note row in place, sync meta included.
    pub fn update_note(&self, note: &Note) -> Result<()> {
        self.conn.execute(
            "UPDATE notes SET guid = ?2, mid = ?3, tags = ?4, flds = ?5, sfld = ?6, csum = ?7,
                    usn = ?8, mod = ?9
             WHERE id = ?1",
            params![
                note.id,
                note.guid,
                note.notetype_id,
                join_tags(&note.tags),
                join_fields(&note.fields),
                note.sort_field,
                note.checksum,
                note.sync.usn,
                note.sync.mtime,
            ],
        )?;
        Ok(())
    }

    /// Remove a note row. Tombstone creation and deletion ordering (cards
    /// first, then the note) are caller responsibilities.
    pub fn delete_note(&self, id: NoteId) -> Result<()> {
        self.conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Resolve a note's note type.
    pub fn note_type_of(&self, note: &Note) -> Result<NoteType> {
        self.note_type(note.notetype_id)?
            .ok_or(Error::ForeignKeyUnresolved {
                table: "notes",
                column: "mid",
                value: note.notetype_id,
            })
    }

    /// Advisory validation pass: a note's field count must match its note
    /// type's field definitions. The schema does not enforce this, so it is
    /// not run implicitly on save; writing a mismatched note desynchronizes
    /// positional field meaning for the owning application.
    pub fn check_note(&self, note: &Note) -> Result<()> {
        let notetype = self.note_type_of(note)?;
        if note.fields.len() != notetype.fields.len() {
            return Err(Error::InvariantViolation(format!(
                "note {} has {} fields but note type '{}' defines {}",
                note.id,
                note.fields.len(),
                notetype.name,
                notetype.fields.len(),
            )));
        }
        Ok(())
    }

    // --- note types ---

    /// Load one note type with its field and template definitions.
    pub fn note_type(&self, id: NoteTypeId) -> Result<Option<NoteType>> {
        match self.version {
            SchemaVersion::V18 => self.note_type_v18(id),
            SchemaVersion::V11 => Ok(self.note_types_v11()?.into_iter().find(|nt| nt.id == id)),
        }
    }

    /// All note types, ordered by id.
    pub fn note_types(&self) -> Result<Vec<NoteType>> {
        match self.version {
            SchemaVersion::V18 => {
                let ids: Vec<NoteTypeId> = self
                    .conn
                    .prepare("SELECT id FROM notetypes ORDER BY id")?
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<_>>()?;
                let mut out = Vec::with_capacity(ids.len());
                for id in ids {
                    if let Some(nt) = self.note_type_v18(id)? {
                        out.push(nt);
                    }
                }
                Ok(out)
            }
            SchemaVersion::V11 => {
                let mut out = self.note_types_v11()?;
                out.sort_by_key(|nt| nt.id);
                Ok(out)
            }
        }
    }

    fn note_type_v18(&self, id: NoteTypeId) -> Result<Option<NoteType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, config, usn, mtime_secs FROM notetypes WHERE id = ?1")?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut notetype = NoteType {
            id: row.get("id")?,
            name: row.get("name")?,
            config: row.get("config")?,
            fields: Vec::new(),
            templates: Vec::new(),
            sync: SyncMeta {
                usn: row.get("usn")?,
                mtime: row.get("mtime_secs")?,
            },
        };

        let mut stmt = self
            .conn
            .prepare("SELECT ord, name, config FROM fields WHERE ntid = ?1 ORDER BY ord")?;
        let mut rows = stmt.query([id])?;
        while let Some(row) = rows.next()? {
            notetype.fields.push(NoteField {
                ordinal: row.get("ord")?,
                name: row.get("name")?,
                config: row.get("config")?,
            });
        }

        let mut stmt = self
            .conn
            .prepare("SELECT ord, name, config FROM templates WHERE ntid = ?1 ORDER BY ord")?;
        let mut rows = stmt.query([id])?;
        while let Some(row) = rows.next()? {
            notetype.templates.push(CardTemplate {
                ordinal: row.get("ord")?,
                name: row.get("name")?,
                config: row.get("config")?,
            });
        }

        Ok(Some(notetype))
    }

    fn note_types_v11(&self) -> Result<Vec<NoteType>> {
        let raw = self.col_blob("models")?;
        let models: serde_json::Map<String, serde_json::Value> = decode_json(&raw)
            .map_err(|e| Error::malformed("col", "models", &raw, e))?;

        let mut out = Vec::with_capacity(models.len());
        for model in models.values() {
            out.push(note_type_from_model_json("col", "models", model)?);
        }
        Ok(out)
    }

    /// Insert a note type with its fields and templates, atomically.
    /// Schema-11 collections store note types inside `col.models`; through
    /// this layer those blobs are read-only, so the insert is rejected there.
    pub fn insert_note_type(&self, notetype: &NoteType) -> Result<()> {
        self.require_v18("insert_note_type")?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO notetypes (id, name, mtime_secs, usn, config) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                notetype.id,
                notetype.name,
                notetype.sync.mtime,
                notetype.sync.usn,
                notetype.config,
            ],
        )?;
        for field in &notetype.fields {
            tx.execute(
                "INSERT INTO fields (ntid, ord, name, config) VALUES (?1, ?2, ?3, ?4)",
                params![notetype.id, field.ordinal, field.name, field.config],
            )?;
        }
        for template in &notetype.templates {
            tx.execute(
                "INSERT INTO templates (ntid, ord, name, mtime_secs, usn, config)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    notetype.id,
                    template.ordinal,
                    template.name,
                    notetype.sync.mtime,
                    notetype.sync.usn,
                    template.config,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // --- decks ---

    /// Load one deck.
    pub fn deck(&self, id: DeckId) -> Result<Option<Deck>> {
        match self.version {
            SchemaVersion::V18 => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, name, mtime_secs, usn, common, kind FROM decks WHERE id = ?1",
                )?;
                let mut rows = stmt.query([id])?;
                match rows.next()? {
                    Some(row) => read_deck_v18(row).map(Some),
                    None => Ok(None),
                }
            }
            SchemaVersion::V11 => Ok(self.decks_v11()?.into_iter().find(|d| d.id == id)),
        }
    }

    /// All decks, ordered by name under the `unicase` collation.
    pub fn decks(&self) -> Result<Vec<Deck>> {
        match self.version {
            SchemaVersion::V18 => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, name, mtime_secs, usn, common, kind FROM decks ORDER BY name",
                )?;
                let mut rows = stmt.query([])?;
                let mut decks = Vec::new();
                while let Some(row) = rows.next()? {
                    decks.push(read_deck_v18(row)?);
                }
                Ok(decks)
            }
            SchemaVersion::V11 => {
                let mut decks = self.decks_v11()?;
                decks.sort_by(|a, b| compare_unicase(&a.name, &b.name));
                Ok(decks)
            }
        }
    }

    fn decks_v11(&self) -> Result<Vec<Deck>> {
        let raw = self.col_blob("decks")?;
        let map: serde_json::Map<String, serde_json::Value> =
            decode_json(&raw).map_err(|e| Error::malformed("col", "decks", &raw, e))?;

        let mut out = Vec::with_capacity(map.len());
        for deck in map.values() {
            out.push(Deck {
                id: json_i64("col", "decks", deck, "id")?,
                name: json_str("col", "decks", deck, "name")?,
                config_id: deck.get("conf").and_then(serde_json::Value::as_i64),
                common: String::new(),
                kind: String::new(),
                sync: SyncMeta {
                    usn: json_i64("col", "decks", deck, "usn")?,
                    mtime: TimestampSecs(json_i64("col", "decks", deck, "mod")?),
                },
            });
        }
        Ok(out)
    }

    /// Insert a deck row (schema 15+ only).
    pub fn insert_deck(&self, deck: &Deck) -> Result<()> {
        self.require_v18("insert_deck")?;
        self.conn.execute(
            "INSERT INTO decks (id, name, mtime_secs, usn, common, kind)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                deck.id,
                deck.name,
                deck.sync.mtime,
                deck.sync.usn,
                deck.common,
                deck.kind,
            ],
        )?;
        Ok(())
    }

    /// Remove a deck row (schema 15+ only). Tombstone creation is the
    /// caller's responsibility.
    pub fn delete_deck(&self, id: DeckId) -> Result<()> {
        self.require_v18("delete_deck")?;
        self.conn.execute("DELETE FROM decks WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Load one deck config.
    pub fn deck_config(&self, id: DeckConfigId) -> Result<Option<DeckConfig>> {
        match self.version {
            SchemaVersion::V18 => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, name, mtime_secs, usn, config FROM deck_config WHERE id = ?1",
                )?;
                let mut rows = stmt.query([id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(DeckConfig {
                        id: row.get("id")?,
                        name: row.get("name")?,
                        config: row.get("config")?,
                        sync: SyncMeta {
                            usn: row.get("usn")?,
                            mtime: row.get("mtime_secs")?,
                        },
                    })),
                    None => Ok(None),
                }
            }
            SchemaVersion::V11 => Ok(self.deck_configs_v11()?.into_iter().find(|c| c.id == id)),
        }
    }

    /// Resolve a deck's soft reference to its config. The reference is not
    /// an enforced foreign key, so a missing config row surfaces as
    /// [`Error::ForeignKeyUnresolved`] rather than being fabricated.
    pub fn deck_config_for(&self, deck: &Deck) -> Result<DeckConfig> {
        let config_id = deck.config_id.ok_or(Error::InvariantViolation(format!(
            "deck {} carries no config reference under this schema revision",
            deck.id
        )))?;
        self.deck_config(config_id)?
            .ok_or(Error::ForeignKeyUnresolved {
                table: "decks",
                column: "conf",
                value: config_id,
            })
    }

    fn deck_configs_v11(&self) -> Result<Vec<DeckConfig>> {
        let raw = self.col_blob("dconf")?;
        let map: serde_json::Map<String, serde_json::Value> =
            decode_json(&raw).map_err(|e| Error::malformed("col", "dconf", &raw, e))?;

        let mut out = Vec::with_capacity(map.len());
        for conf in map.values() {
            out.push(DeckConfig {
                id: json_i64("col", "dconf", conf, "id")?,
                name: json_str("col", "dconf", conf, "name")?,
                config: encode_json(conf)
                    .map_err(|e| Error::malformed("col", "dconf", &raw, e))?,
                sync: SyncMeta {
                    usn: json_i64("col", "dconf", conf, "usn")?,
                    mtime: TimestampSecs(json_i64("col", "dconf", conf, "mod")?),
                },
            });
        }
        Ok(out)
    }

    // --- graves ---

    /// All tombstones, verbatim. The composite key is not enforced unique,
    /// so duplicates are returned as stored.
    pub fn graves(&self) -> Result<Vec<Grave>> {
        let mut stmt = self
            .conn
            .prepare("SELECT oid, type, usn FROM graves ORDER BY usn, oid")?;
        let mut rows = stmt.query([])?;
        let mut graves = Vec::new();
        while let Some(row) = rows.next()? {
            let raw_type: i64 = row.get("type")?;
            graves.push(Grave {
                original_id: row.get("oid")?,
                kind: GraveType::from_code(raw_type)?,
                usn: row.get("usn")?,
            });
        }
        Ok(graves)
    }

    /// Record a deletion tombstone.
    pub fn add_grave(&self, grave: &Grave) -> Result<()> {
        self.conn.execute(
            "INSERT INTO graves (usn, oid, type) VALUES (?1, ?2, ?3)",
            params![grave.usn, grave.original_id, grave.kind.code()],
        )?;
        Ok(())
    }

    // --- config ---

    /// Read a config value, JSON-decoded into the requested type.
    pub fn config_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.version {
            SchemaVersion::V18 => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT val FROM config WHERE key = ?1")?;
                let mut rows = stmt.query([key])?;
                match rows.next()? {
                    Some(row) => {
                        let raw: String = row.get("val")?;
                        let value = decode_json(&raw)
                            .map_err(|e| Error::malformed("config", "val", &raw, e))?;
                        Ok(Some(value))
                    }
                    None => Ok(None),
                }
            }
            SchemaVersion::V11 => {
                let raw = self.col_blob("conf")?;
                let mut map: serde_json::Map<String, serde_json::Value> =
                    decode_json(&raw).map_err(|e| Error::malformed("col", "conf", &raw, e))?;
                match map.remove(key) {
                    Some(value) => serde_json::from_value(value)
                        .map(Some)
                        .map_err(|e| Error::malformed("col", "conf", &raw, e)),
                    None => Ok(None),
                }
            }
        }
    }

    /// Write a config entry (schema 15+ only).
    pub fn set_config_value<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
        sync: SyncMeta,
    ) -> Result<()> {
        self.require_v18("set_config_value")?;
        let raw = encode_json(value).map_err(|e| Error::malformed("config", "val", key, e))?;
        self.conn.execute(
            "INSERT OR REPLACE INTO config (key, usn, mtime_secs, val) VALUES (?1, ?2, ?3, ?4)",
            params![key, sync.usn, sync.mtime, raw],
        )?;
        Ok(())
    }

    /// All config entries (schema 15+ only; schema 11 keys live in one blob
    /// and are read through [`Collection::config_value`]).
    pub fn config_entries(&self) -> Result<Vec<ConfigEntry>> {
        self.require_v18("config_entries")?;
        let mut stmt = self
            .conn
            .prepare("SELECT key, val, usn, mtime_secs FROM config ORDER BY key")?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get("val")?;
            entries.push(ConfigEntry {
                key: row.get("key")?,
                value: decode_json(&raw)
                    .map_err(|e| Error::malformed("config", "val", &raw, e))?,
                sync: SyncMeta {
                    usn: row.get("usn")?,
                    mtime: row.get("mtime_secs")?,
                },
            });
        }
        Ok(entries)
    }

    // --- tags ---

    /// The tag registry, ordered under the `unicase` collation.
    pub fn tags(&self) -> Result<Vec<Tag>> {
        match self.version {
            SchemaVersion::V18 => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT tag, usn FROM tags ORDER BY tag")?;
                let mut rows = stmt.query([])?;
                let mut tags = Vec::new();
                while let Some(row) = rows.next()? {
                    tags.push(Tag {
                        name: row.get("tag")?,
                        usn: row.get("usn")?,
                    });
                }
                Ok(tags)
            }
            SchemaVersion::V11 => {
                let raw = self.col_blob("tags")?;
                let map: serde_json::Map<String, serde_json::Value> =
                    decode_json(&raw).map_err(|e| Error::malformed("col", "tags", &raw, e))?;
                let mut tags = Vec::with_capacity(map.len());
                for (name, usn) in &map {
                    let usn = usn.as_i64().ok_or_else(|| {
                        Error::malformed(
                            "col",
                            "tags",
                            &raw,
                            format!("non-integer usn for tag {name:?}"),
                        )
                    })?;
                    tags.push(Tag {
                        name: name.clone(),
                        usn,
                    });
                }
                tags.sort_by(|a, b| compare_unicase(&a.name, &b.name));
                Ok(tags)
            }
        }
    }

    /// Add or refresh a tag registry row (schema 15+ only).
    pub fn register_tag(&self, tag: &Tag) -> Result<()> {
        self.require_v18("register_tag")?;
        self.conn.execute(
            "INSERT OR REPLACE INTO tags (tag, usn) VALUES (?1, ?2)",
            params![tag.name, tag.usn],
        )?;
        Ok(())
    }

    // --- helpers ---

    fn require_v18(&self, operation: &'static str) -> Result<()> {
        match self.version {
            SchemaVersion::V18 => Ok(()),
            SchemaVersion::V11 => Err(Error::SchemaMismatch {
                operation,
                version: self.version,
            }),
        }
    }

    fn col_blob(&self, column: &'static str) -> Result<String> {
        let raw: String =
            self.conn
                .query_row(&format!("SELECT {column} FROM col"), [], |row| row.get(0))?;
        Ok(raw)
    }
}

fn read_card(row: &Row<'_>) -> Result<Card> {
    let raw_type: i64 = row.get("type")?;
    let raw_queue: i64 = row.get("queue")?;
    let raw_flags: i64 = row.get("flags")?;
    Ok(Card {
        id: row.get("id")?,
        note_id: row.get("nid")?,
        deck_id: row.get("did")?,
        ordinal: row.get("ord")?,
        card_type: CardType::from_code(raw_type)?,
        queue: Queue::from_code(raw_queue)?,
        due: row.get("due")?,
        interval: row.get("ivl")?,
        factor: row.get("factor")?,
        review_count: row.get("reps")?,
        lapse_count: row.get("lapses")?,
        left: row.get("left")?,
        original_due: row.get("odue")?,
        original_deck_id: row.get("odid")?,
        flag: Flag::from_code(raw_flags),
        data: row.get("data")?,
        sync: SyncMeta {
            usn: row.get("usn")?,
            mtime: row.get("mod")?,
        },
    })
}

fn read_note(row: &Row<'_>) -> Result<Note> {
    let raw_tags: String = row.get("tags")?;
    let raw_fields: String = row.get("flds")?;
    // sfld has INTEGER affinity, so a numeric-looking sort field comes back
    // as an integer; the owning application relies on that for sorting.
    let sort_field = match row.get_ref("sfld")? {
        ValueRef::Text(text) => String::from_utf8_lossy(text).into_owned(),
        ValueRef::Integer(n) => n.to_string(),
        ValueRef::Real(n) => n.to_string(),
        other => {
            return Err(Error::malformed(
                "notes",
                "sfld",
                &format!("{other:?}"),
                "expected text or integer",
            ));
        }
    };
    Ok(Note {
        id: row.get("id")?,
        guid: row.get("guid")?,
        notetype_id: row.get("mid")?,
        tags: split_tags(&raw_tags),
        fields: split_fields(&raw_fields),
        sort_field,
        checksum: row.get("csum")?,
        sync: SyncMeta {
            usn: row.get("usn")?,
            mtime: row.get("mod")?,
        },
    })
}

fn read_revlog(row: &Row<'_>) -> Result<RevLogEntry> {
    let raw_type: i64 = row.get("type")?;
    Ok(RevLogEntry {
        id: row.get("id")?,
        card_id: row.get("cid")?,
        usn: row.get("usn")?,
        ease: row.get("ease")?,
        interval: row.get("ivl")?,
        last_interval: row.get("lastIvl")?,
        factor: row.get("factor")?,
        taken_millis: row.get("time")?,
        review_type: ReviewType::from_code(raw_type)?,
    })
}

fn read_deck_v18(row: &Row<'_>) -> Result<Deck> {
    Ok(Deck {
        id: row.get("id")?,
        name: row.get("name")?,
        config_id: None,
        common: row.get("common")?,
        kind: row.get("kind")?,
        sync: SyncMeta {
            usn: row.get("usn")?,
            mtime: row.get("mtime_secs")?,
        },
    })
}

fn note_type_from_model_json(
    table: &'static str,
    column: &'static str,
    model: &serde_json::Value,
) -> Result<NoteType> {
    let mut notetype = NoteType {
        id: json_i64(table, column, model, "id")?,
        name: json_str(table, column, model, "name")?,
        config: encode_json(model).map_err(|e| Error::malformed(table, column, "", e))?,
        fields: Vec::new(),
        templates: Vec::new(),
        sync: SyncMeta {
            usn: json_i64(table, column, model, "usn")?,
            mtime: TimestampSecs(json_i64(table, column, model, "mod")?),
        },
    };

    for fld in json_array(table, column, model, "flds")? {
        notetype.fields.push(NoteField {
            ordinal: json_i64(table, column, fld, "ord")? as u32,
            name: json_str(table, column, fld, "name")?,
            config: encode_json(fld).map_err(|e| Error::malformed(table, column, "", e))?,
        });
    }
    notetype.fields.sort_by_key(|f| f.ordinal);

    for tmpl in json_array(table, column, model, "tmpls")? {
        notetype.templates.push(CardTemplate {
            ordinal: json_i64(table, column, tmpl, "ord")? as u32,
            name: json_str(table, column, tmpl, "name")?,
            config: encode_json(tmpl).map_err(|e| Error::malformed(table, column, "", e))?,
        });
    }
    notetype.templates.sort_by_key(|t| t.ordinal);

    Ok(notetype)
}

fn json_i64(
    table: &'static str,
    column: &'static str,
    obj: &serde_json::Value,
    key: &str,
) -> Result<i64> {
    obj.get(key).and_then(serde_json::Value::as_i64).ok_or_else(|| {
        Error::malformed(
            table,
            column,
            &obj.to_string(),
            format!("missing or non-integer key {key:?}"),
        )
    })
}

fn json_str(
    table: &'static str,
    column: &'static str,
    obj: &serde_json::Value,
    key: &str,
) -> Result<String> {
    obj.get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            Error::malformed(
                table,
                column,
                &obj.to_string(),
                format!("missing or non-text key {key:?}"),
            )
        })
}

fn json_array<'v>(
    table: &'static str,
    column: &'static str,
    obj: &'v serde_json::Value,
    key: &str,
) -> Result<&'v Vec<serde_json::Value>> {
    obj.get(key).and_then(serde_json::Value::as_array).ok_or_else(|| {
        Error::malformed(
            table,
            column,
            &obj.to_string(),
            format!("missing or non-array key {key:?}"),
        )
    })
}
