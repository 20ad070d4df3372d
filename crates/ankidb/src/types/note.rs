//! Note rows and the derived sort field / checksum.

use sha1::{Digest, Sha1};

use crate::codec::TimestampMillis;
use crate::types::{NoteId, NoteTypeId, SyncMeta};

/// One user-authored content record.
///
/// `fields` is positionally matched to the note type's field definitions;
/// this struct does not know its note type, so keeping the two in agreement
/// is a caller obligation (see `Collection::check_note`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Row id; also the note's creation time in milliseconds.
    pub id: NoteId,
    /// Globally unique id used by sync and import (`guid`).
    pub guid: String,
    /// The note type governing field layout and card generation (`mid`).
    pub notetype_id: NoteTypeId,
    /// Tags, decoded from the space-wrapped tag string.
    pub tags: Vec<String>,
    /// Ordered field values, decoded from the 0x1F-joined blob (`flds`).
    pub fields: Vec<String>,
    /// Denormalized copy of the sort field for fast browser sorting (`sfld`).
    pub sort_field: String,
    /// Checksum of the first field, used for duplicate detection (`csum`).
    pub checksum: u32,
    /// Sync bookkeeping (`usn`, `mod`).
    pub sync: SyncMeta,
}

impl Note {
    /// A note with the given fields and freshly computed derived columns.
    pub fn new(id: NoteId, guid: impl Into<String>, notetype_id: NoteTypeId, fields: Vec<String>) -> Self {
        let mut note = Self {
            id,
            guid: guid.into(),
            notetype_id,
            tags: Vec::new(),
            fields,
            sort_field: String::new(),
            checksum: 0,
            sync: SyncMeta::new(-1),
        };
        note.refresh_derived();
        note
    }

    /// When the note was created, read out of its id.
    pub fn creation_time(&self) -> TimestampMillis {
        TimestampMillis(self.id)
    }

    /// Recompute `sort_field` and `checksum` from the first field.
    ///
    /// Not called implicitly on save: any code that mutates `fields` must
    /// call this (or maintain the derived columns itself), or the owning
    /// application's duplicate detection will see stale values.
    pub fn refresh_derived(&mut self) {
        let first = self.fields.first().map(String::as_str).unwrap_or("");
        self.sort_field = strip_html(first);
        self.checksum = field_checksum(first);
    }
}

/// Checksum of a field value as the owning application computes it:
/// strip HTML, SHA-1, then the first four digest bytes as a big-endian u32.
pub fn field_checksum(text: &str) -> u32 {
    let digest = Sha1::digest(strip_html(text).as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Remove HTML tags, keeping text content.
pub fn strip_html(s: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<b>Hello</b> World"), "Hello World");
        assert_eq!(strip_html("No HTML"), "No HTML");
        assert_eq!(strip_html("<div><p>Nested</p></div>"), "Nested");
    }

    #[test]
    fn test_field_checksum_ignores_markup() {
        assert_eq!(field_checksum("<b>front</b>"), field_checksum("front"));
        assert_ne!(field_checksum("front"), field_checksum("back"));
    }

    #[test]
    fn test_field_checksum_is_stable() {
        // First eight hex digits of sha1("front").
        assert_eq!(field_checksum("front"), 0x1b78_eb3b);
    }

    #[test]
    fn test_refresh_derived_tracks_first_field() {
        let mut note = Note::new(1, "guid", 100, vec!["<i>a</i>".into(), "b".into()]);
        assert_eq!(note.sort_field, "a");
        let original = note.checksum;

        note.fields[0] = "changed".into();
        assert_eq!(note.checksum, original);
        note.refresh_derived();
        assert_eq!(note.sort_field, "changed");
        assert_ne!(note.checksum, original);
    }

    #[test]
    fn test_new_note_with_no_fields() {
        let note = Note::new(1, "guid", 100, Vec::new());
        assert_eq!(note.sort_field, "");
        assert_eq!(note.checksum, field_checksum(""));
    }
}
