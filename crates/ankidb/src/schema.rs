//! Schema revisions and DDL for Anki collection databases.
//!
//! Two incompatible revisions of the same logical schema exist side by side
//! in the wild: schema 11 (the `.apkg` interchange format) inlines decks,
//! deck configs, note types, config and tags as JSON blobs in the singleton
//! `col` row, while schema 15-18 normalizes them into dedicated tables keyed
//! with `mtime_secs`. This crate selects the matching binding set at open
//! time; it never migrates between revisions.

use crate::error::{Error, Result};

/// Which binding set applies to an open collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Schema 11: inline JSON blobs in `col`, `mod` timestamps everywhere.
    V11,
    /// Schema 15-18: normalized `decks`/`deck_config`/`notetypes`/`fields`/
    /// `templates`/`config`/`tags` tables with `mtime_secs` timestamps.
    V18,
}

impl SchemaVersion {
    /// Map a stored `col.ver` value to a binding set.
    pub fn from_ver(ver: i64) -> Result<Self> {
        match ver {
            11 => Ok(SchemaVersion::V11),
            15..=18 => Ok(SchemaVersion::V18),
            other => Err(Error::UnsupportedSchemaVersion(other)),
        }
    }

    /// The `col.ver` value written when creating a fresh collection.
    pub fn ver(self) -> i64 {
        match self {
            SchemaVersion::V11 => 11,
            SchemaVersion::V18 => 18,
        }
    }
}

/// Tables shared unchanged by both schema revisions.
pub(crate) const SCHEMA_COMMON: &str = r#"
CREATE TABLE IF NOT EXISTS col (
    id              INTEGER PRIMARY KEY,
    crt             INTEGER NOT NULL,
    mod             INTEGER NOT NULL,
    scm             INTEGER NOT NULL,
    ver             INTEGER NOT NULL,
    dty             INTEGER NOT NULL,
    usn             INTEGER NOT NULL,
    ls              INTEGER NOT NULL,
    conf            TEXT NOT NULL,
    models          TEXT NOT NULL,
    decks           TEXT NOT NULL,
    dconf           TEXT NOT NULL,
    tags            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    id              INTEGER PRIMARY KEY,
    guid            TEXT NOT NULL,
    mid             INTEGER NOT NULL,
    mod             INTEGER NOT NULL,
    usn             INTEGER NOT NULL,
    tags            TEXT NOT NULL,
    flds            TEXT NOT NULL,
    sfld            INTEGER NOT NULL,
    csum            INTEGER NOT NULL,
    flags           INTEGER NOT NULL,
    data            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cards (
    id              INTEGER PRIMARY KEY,
    nid             INTEGER NOT NULL,
    did             INTEGER NOT NULL,
    ord             INTEGER NOT NULL,
    mod             INTEGER NOT NULL,
    usn             INTEGER NOT NULL,
    type            INTEGER NOT NULL,
    queue           INTEGER NOT NULL,
    due             INTEGER NOT NULL,
    ivl             INTEGER NOT NULL,
    factor          INTEGER NOT NULL,
    reps            INTEGER NOT NULL,
    lapses          INTEGER NOT NULL,
    left            INTEGER NOT NULL,
    odue            INTEGER NOT NULL,
    odid            INTEGER NOT NULL,
    flags           INTEGER NOT NULL,
    data            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS revlog (
    id              INTEGER PRIMARY KEY,
    cid             INTEGER NOT NULL,
    usn             INTEGER NOT NULL,
    ease            INTEGER NOT NULL,
    ivl             INTEGER NOT NULL,
    lastIvl         INTEGER NOT NULL,
    factor          INTEGER NOT NULL,
    time            INTEGER NOT NULL,
    type            INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS graves (
    usn             INTEGER NOT NULL,
    oid             INTEGER NOT NULL,
    type            INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS ix_notes_usn ON notes (usn);
CREATE INDEX IF NOT EXISTS ix_cards_usn ON cards (usn);
CREATE INDEX IF NOT EXISTS ix_revlog_usn ON revlog (usn);
CREATE INDEX IF NOT EXISTS ix_cards_nid ON cards (nid);
CREATE INDEX IF NOT EXISTS ix_cards_sched ON cards (did, queue, due);
CREATE INDEX IF NOT EXISTS ix_revlog_cid ON revlog (cid);
CREATE INDEX IF NOT EXISTS ix_notes_csum ON notes (csum);
"#;

/// Normalized tables added by schema 15-18. `unicase` must be registered on
/// the connection before this runs.
pub(crate) const SCHEMA_V18_EXTRA: &str = r#"
CREATE TABLE IF NOT EXISTS decks (
    id              INTEGER PRIMARY KEY NOT NULL,
    name            TEXT NOT NULL COLLATE unicase,
    mtime_secs      INTEGER NOT NULL,
    usn             INTEGER NOT NULL,
    common          TEXT NOT NULL,
    kind            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS deck_config (
    id              INTEGER PRIMARY KEY NOT NULL,
    name            TEXT NOT NULL,
    mtime_secs      INTEGER NOT NULL,
    usn             INTEGER NOT NULL,
    config          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notetypes (
    id              INTEGER PRIMARY KEY NOT NULL,
    name            TEXT NOT NULL COLLATE unicase,
    mtime_secs      INTEGER NOT NULL,
    usn             INTEGER NOT NULL,
    config          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fields (
    ntid            INTEGER NOT NULL,
    ord             INTEGER NOT NULL,
    name            TEXT NOT NULL,
    config          TEXT NOT NULL,
    PRIMARY KEY (ntid, ord)
);

CREATE TABLE IF NOT EXISTS templates (
    ntid            INTEGER NOT NULL,
    ord             INTEGER NOT NULL,
    name            TEXT NOT NULL,
    mtime_secs      INTEGER NOT NULL,
    usn             INTEGER NOT NULL,
    config          TEXT NOT NULL,
    PRIMARY KEY (ntid, ord)
);

CREATE TABLE IF NOT EXISTS config (
    key             TEXT PRIMARY KEY NOT NULL,
    usn             INTEGER NOT NULL,
    mtime_secs      INTEGER NOT NULL,
    val             TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    tag             TEXT PRIMARY KEY NOT NULL COLLATE unicase,
    usn             INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS ix_decks_usn ON decks (usn);
CREATE INDEX IF NOT EXISTS ix_deck_config_usn ON deck_config (usn);
CREATE INDEX IF NOT EXISTS ix_notetypes_usn ON notetypes (usn);
CREATE INDEX IF NOT EXISTS ix_templates_usn ON templates (usn);
CREATE INDEX IF NOT EXISTS ix_fields_ntid ON fields (ntid);
"#;

/// Default collection configuration JSON for fresh schema-11 collections.
pub(crate) const DEFAULT_CONF: &str = r#"{
    "activeDecks": [1],
    "curDeck": 1,
    "newSpread": 0,
    "collapseTime": 1200,
    "timeLim": 0,
    "estTimes": true,
    "dueCounts": true,
    "curModel": null,
    "nextPos": 1,
    "sortType": "noteFld",
    "sortBackwards": false,
    "addToCur": true
}"#;

/// Default deck configuration JSON for fresh schema-11 collections.
pub(crate) const DEFAULT_DCONF: &str = r#"{
    "1": {
        "id": 1,
        "mod": 0,
        "name": "Default",
        "usn": 0,
        "maxTaken": 60,
        "autoplay": true,
        "timer": 0,
        "replayq": true,
        "new": {
            "bury": true,
            "delays": [1, 10],
            "initialFactor": 2500,
            "ints": [1, 4, 7],
            "order": 1,
            "perDay": 20,
            "separate": true
        },
        "rev": {
            "bury": true,
            "ease4": 1.3,
            "fuzz": 0.05,
            "ivlFct": 1,
            "maxIvl": 36500,
            "perDay": 100,
            "hardFactor": 1.2
        },
        "lapse": {
            "delays": [10],
            "leechAction": 0,
            "leechFails": 8,
            "minInt": 1,
            "mult": 0
        },
        "dyn": false
    }
}"#;

/// Default deck map JSON for fresh schema-11 collections.
pub(crate) const DEFAULT_DECKS: &str = r#"{
    "1": {
        "id": 1,
        "mod": 0,
        "name": "Default",
        "usn": 0,
        "lrnToday": [0, 0],
        "revToday": [0, 0],
        "newToday": [0, 0],
        "timeToday": [0, 0],
        "collapsed": false,
        "browserCollapsed": false,
        "desc": "",
        "dyn": 0,
        "conf": 1,
        "extendNew": 10,
        "extendRev": 50
    }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version_selection() {
        assert_eq!(SchemaVersion::from_ver(11).unwrap(), SchemaVersion::V11);
        for ver in 15..=18 {
            assert_eq!(SchemaVersion::from_ver(ver).unwrap(), SchemaVersion::V18);
        }
        assert!(matches!(
            SchemaVersion::from_ver(12),
            Err(Error::UnsupportedSchemaVersion(12))
        ));
        assert!(SchemaVersion::from_ver(19).is_err());
    }

    #[test]
    fn test_default_blobs_are_valid_json() {
        for blob in [DEFAULT_CONF, DEFAULT_DCONF, DEFAULT_DECKS] {
            serde_json::from_str::<serde_json::Value>(blob).unwrap();
        }
    }
}
