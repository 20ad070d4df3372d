//! Error types for ankidb.
//!
//! Decode failures are never retried and never defaulted: a value that does
//! not parse under its column's codec means either data corruption or a
//! schema mismatch, and both must surface to the caller with enough context
//! (table, column, raw value) to diagnose.

use thiserror::Error;

use crate::schema::SchemaVersion;

/// Result type for ankidb operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing a collection.
#[derive(Debug, Error)]
pub enum Error {
    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be parsed by the codec bound to its column.
    #[error("malformed value in {table}.{column}: {reason} (raw: {raw:?})")]
    MalformedValue {
        /// Table the value was read from.
        table: &'static str,
        /// Column the value was read from.
        column: &'static str,
        /// The raw stored text, truncated for display.
        raw: String,
        /// Why the codec rejected it.
        reason: String,
    },

    /// An integer outside a closed enumeration's declared domain.
    #[error("unknown {domain} value: {value}")]
    UnknownEnumValue {
        /// The enumeration the value was decoded against.
        domain: &'static str,
        /// The offending integer.
        value: i64,
    },

    /// A relationship lookup found no matching row.
    #[error("{table}.{column} = {value} references a missing row")]
    ForeignKeyUnresolved {
        /// Table holding the dangling reference.
        table: &'static str,
        /// Column holding the dangling reference.
        column: &'static str,
        /// The unresolved key.
        value: i64,
    },

    /// A caller-supplied entity violates a cross-entity invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The database reports a schema version this crate has no bindings for.
    #[error("unsupported collection schema version: {0}")]
    UnsupportedSchemaVersion(i64),

    /// An operation is not available under the database's schema version.
    #[error("{operation} is not supported on a {version:?} collection")]
    SchemaMismatch {
        /// The rejected operation.
        operation: &'static str,
        /// The schema version of the open database.
        version: SchemaVersion,
    },
}

impl Error {
    /// Wrap a codec failure with the table/column it occurred in.
    pub(crate) fn malformed(
        table: &'static str,
        column: &'static str,
        raw: &str,
        reason: impl ToString,
    ) -> Self {
        let raw: String = raw.chars().take(128).collect();
        Error::MalformedValue {
            table,
            column,
            raw,
            reason: reason.to_string(),
        }
    }
}
