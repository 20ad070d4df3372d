//! The `unicase` collation used for case- and accent-insensitive ordering.
//!
//! The owning application's schema references this collation by name in
//! index and column definitions, so it must be registered on every
//! connection before the first query. The comparison transliterates both
//! sides to ASCII and lowercases them, matching the original `unicase`
//! behavior. It is pure and performs no I/O, so SQLite may invoke it from
//! whatever thread runs the comparison.

use std::cmp::Ordering;

use deunicode::deunicode;
use rusqlite::Connection;

/// The name the schema's index and column definitions reference.
pub const COLLATION_NAME: &str = "unicase";

/// Register the `unicase` collation on a connection.
///
/// Must be called once per connection, before any statement that sorts or
/// compares under the collation. The registered function is referentially
/// stable for the connection's lifetime.
pub fn register_unicase(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_collation(COLLATION_NAME, compare_unicase)
}

/// The comparison behind the collation, usable directly for sorting values
/// decoded from schema-11 JSON blobs.
pub fn compare_unicase(a: &str, b: &str) -> Ordering {
    deunicode(a).to_lowercase().cmp(&deunicode(b).to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        assert_eq!(compare_unicase("Apple", "apple"), Ordering::Equal);
        assert_eq!(compare_unicase("apple", "banana"), Ordering::Less);
    }

    #[test]
    fn test_accent_insensitive() {
        assert_eq!(compare_unicase("Émile", "emile"), Ordering::Equal);
        assert_eq!(compare_unicase("café", "CAFE"), Ordering::Equal);
    }

    #[test]
    fn test_three_way() {
        assert_eq!(compare_unicase("zebra", "Äpfel"), Ordering::Greater);
    }
}
