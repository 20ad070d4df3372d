//! Note type rows with their ordered field and template definitions.

use crate::types::{NoteTypeId, SyncMeta};

/// A field definition belonging to a note type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteField {
    /// Position within the note's field list (`ord`).
    pub ordinal: u32,
    /// Field name shown in the editor.
    pub name: String,
    /// Opaque per-field configuration, stored verbatim.
    pub config: String,
}

/// A card template belonging to a note type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTemplate {
    /// Template index; matches `Card::ordinal` (`ord`).
    pub ordinal: u32,
    /// Template name.
    pub name: String,
    /// Opaque per-template configuration (front/back generation rules).
    pub config: String,
}

/// The schema governing a note's field layout and card generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteType {
    /// Row id.
    pub id: NoteTypeId,
    /// Note type name.
    pub name: String,
    /// Opaque note-type configuration, stored verbatim.
    pub config: String,
    /// Field definitions, sorted by ordinal.
    pub fields: Vec<NoteField>,
    /// Template definitions, sorted by ordinal.
    pub templates: Vec<CardTemplate>,
    /// Sync bookkeeping (`usn`, `mtime_secs`).
    pub sync: SyncMeta,
}

impl NoteType {
    /// Look up a field definition by name.
    pub fn field(&self, name: &str) -> Option<&NoteField> {
        self.fields.iter().find(|f| f.name == name)
    }
}
