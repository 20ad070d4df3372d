//! Tombstones, config entries, tag registry rows, and the collection row.

use crate::codec::{TimestampMillis, TimestampSecs};
use crate::enums::GraveType;
use crate::types::SyncMeta;

/// A deletion tombstone, retained so sync can propagate the deletion.
///
/// The schema does not enforce `(original_id, kind)` uniqueness, so
/// duplicate tombstones are possible; this crate returns them verbatim and
/// leaves deduplication to sync logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grave {
    /// Id of the deleted row (`oid`).
    pub original_id: i64,
    /// What kind of row was deleted (`type`).
    pub kind: GraveType,
    /// Update sequence number.
    pub usn: i64,
}

/// One key-value configuration entry; values are JSON-encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    /// Config key.
    pub key: String,
    /// Decoded JSON value (`val`).
    pub value: serde_json::Value,
    /// Sync bookkeeping (`usn`, `mtime_secs`).
    pub sync: SyncMeta,
}

/// One tag registry row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// The tag text (`tag`).
    pub name: String,
    /// Update sequence number.
    pub usn: i64,
}

/// The singleton `col` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionMeta {
    /// Row id, always 1.
    pub id: i64,
    /// Collection creation time in seconds (`crt`); day-offset due values
    /// count from this point.
    pub created: TimestampSecs,
    /// Last modification time in milliseconds (`mod`).
    pub modified: TimestampMillis,
    /// Last schema modification time in milliseconds (`scm`); a mismatch
    /// with the remote forces a full sync.
    pub schema_modified: TimestampMillis,
    /// Schema version (`ver`).
    pub version: i64,
    /// Dirty flag (`dty`); unused by modern clients.
    pub dirty: i64,
    /// Update sequence number.
    pub usn: i64,
    /// Last sync time in milliseconds (`ls`).
    pub last_sync: TimestampMillis,
}
