//! Review history rows.

use crate::codec::TimestampMillis;
use crate::enums::ReviewType;
use crate::types::{CardId, RevLogId};

/// One review of one card. Append-only: the owning application never
/// mutates these after insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevLogEntry {
    /// Row id; a millisecond timestamp of when the review happened.
    pub id: RevLogId,
    /// The reviewed card (`cid`).
    pub card_id: CardId,
    /// Update sequence number.
    pub usn: i64,
    /// Ease button pressed (1-4).
    pub ease: u8,
    /// Interval after the review (`ivl`); negative means seconds.
    pub interval: i32,
    /// Interval before the review (`lastIvl`); negative means seconds.
    pub last_interval: i32,
    /// Ease factor after the review, in permille.
    pub factor: u32,
    /// How long the answer took, in milliseconds (`time`).
    pub taken_millis: u32,
    /// How the review was produced (`type`).
    pub review_type: ReviewType,
}

impl RevLogEntry {
    /// When the review happened, read out of its id.
    pub fn reviewed_at(&self) -> TimestampMillis {
        TimestampMillis(self.id)
    }
}
