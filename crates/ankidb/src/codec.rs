//! Bidirectional codecs for Anki's column encodings.
//!
//! Everything here is pure and stateless. Each codec reproduces the exact
//! byte/text encoding the owning application expects, so a round-trip through
//! this module leaves a collection byte-identical. None of the encodings are
//! self-describing; which codec applies to a column is fixed by the schema
//! bindings in [`crate::collection`], never inferred from the stored value.

use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Separator used by the note field list (ASCII unit separator).
pub const FIELD_SEPARATOR: char = '\x1f';

/// Separator used by the tag set.
pub const TAG_SEPARATOR: char = ' ';

/// Encode a tag set as `" tag1 tag2 "`.
///
/// The single leading and trailing space let the owning application match
/// whole tags with a plain `LIKE '% tag %'` search. An empty set encodes to
/// the empty string, which is what Anki stores for untagged notes. Tags must
/// not contain spaces; the separator is not escapable.
pub fn join_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        format!(" {} ", tags.join(" "))
    }
}

/// Decode a stored tag set, preserving element order.
///
/// `""` and `" "` both decode to an empty vector.
pub fn split_tags(raw: &str) -> Vec<String> {
    let trimmed = raw.trim_matches(TAG_SEPARATOR);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split(TAG_SEPARATOR).map(str::to_string).collect()
    }
}

/// Encode a note's field values, joined by 0x1F with no wrapping delimiter.
pub fn join_fields(fields: &[String]) -> String {
    fields.join(&FIELD_SEPARATOR.to_string())
}

/// Decode a stored field list.
///
/// Empty fields are preserved: two adjacent separators produce an empty
/// element, which is valid note content. Only a fully empty encoded value
/// decodes to an empty vector.
pub fn split_fields(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(FIELD_SEPARATOR).map(str::to_string).collect()
    }
}

/// A point in time stored as whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimestampSecs(pub i64);

/// A point in time stored as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimestampMillis(pub i64);

impl TimestampSecs {
    /// The current wall-clock time, truncated to seconds.
    pub fn now() -> Self {
        Self(elapsed().as_secs() as i64)
    }

    /// Widen to milliseconds. Sub-second precision is already gone.
    pub fn millis(self) -> TimestampMillis {
        TimestampMillis(self.0 * 1000)
    }
}

impl TimestampMillis {
    /// The current wall-clock time in milliseconds.
    pub fn now() -> Self {
        Self(elapsed().as_millis() as i64)
    }

    /// Build from a second count, multiplying out exactly as stored.
    pub fn from_secs(secs: i64) -> Self {
        Self(secs * 1000)
    }

    /// Truncate to second resolution.
    pub fn as_secs(self) -> TimestampSecs {
        TimestampSecs(self.0 / 1000)
    }
}

fn elapsed() -> std::time::Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

impl ToSql for TimestampSecs {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for TimestampSecs {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(TimestampSecs)
    }
}

impl ToSql for TimestampMillis {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for TimestampMillis {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(TimestampMillis)
    }
}

/// Encode a structured value as its canonical JSON text.
pub fn encode_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// Decode a stored structured value.
///
/// A malformed or truncated blob is a hard error; callers wrap it with
/// table/column context. Returning a partial or defaulted structure here
/// would let this layer silently diverge from the owning application.
pub fn decode_json<T: DeserializeOwned>(raw: &str) -> serde_json::Result<T> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_tags_wraps_with_spaces() {
        let tags = vec!["red".to_string(), "leech".to_string()];
        assert_eq!(join_tags(&tags), " red leech ");
    }

    #[test]
    fn test_join_tags_empty_set() {
        assert_eq!(join_tags(&[]), "");
    }

    #[test]
    fn test_split_tags_preserves_order() {
        assert_eq!(split_tags(" red leech "), vec!["red", "leech"]);
    }

    #[test]
    fn test_split_tags_empty_inputs() {
        assert!(split_tags("").is_empty());
        assert!(split_tags(" ").is_empty());
    }

    #[test]
    fn test_tags_round_trip() {
        let tags = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(split_tags(&join_tags(&tags)), tags);
    }

    #[test]
    fn test_join_fields_uses_unit_separator() {
        let fields = vec!["front text".to_string(), "back text".to_string()];
        assert_eq!(join_fields(&fields), "front text\x1fback text");
    }

    #[test]
    fn test_split_fields_empty_value() {
        assert!(split_fields("").is_empty());
    }

    #[test]
    fn test_split_fields_preserves_empty_elements() {
        assert_eq!(split_fields("a\x1f\x1fb"), vec!["a", "", "b"]);
        assert_eq!(split_fields("\x1f"), vec!["", ""]);
    }

    #[test]
    fn test_fields_round_trip() {
        let fields = vec!["front".to_string(), String::new(), "back".to_string()];
        assert_eq!(split_fields(&join_fields(&fields)), fields);
    }

    #[test]
    fn test_timestamp_round_trip() {
        let t = TimestampSecs(1_700_000_000);
        assert_eq!(t.0, 1_700_000_000);
        assert_eq!(t.millis(), TimestampMillis(1_700_000_000_000));
        assert_eq!(t.millis().as_secs(), t);
    }

    #[test]
    fn test_millis_from_secs_multiplies_exactly() {
        assert_eq!(TimestampMillis::from_secs(42), TimestampMillis(42_000));
    }

    #[test]
    fn test_json_round_trip() {
        let value = serde_json::json!({"nested": {"list": [1, 2, 3]}, "flag": true});
        let encoded = encode_json(&value).unwrap();
        let decoded: serde_json::Value = decode_json(&encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_json_truncated_value_fails() {
        assert!(decode_json::<serde_json::Value>("{\"unbalanced\": [1, 2").is_err());
    }
}
