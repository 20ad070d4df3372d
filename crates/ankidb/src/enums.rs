//! Integer-backed enumerations stored in the collection.
//!
//! Each decode function is the only defense against schema drift between
//! this crate and future revisions of the owning application: closed
//! domains ([`CardType`], [`Queue`], [`GraveType`], [`ReviewType`]) reject
//! integers outside their declared members with
//! [`Error::UnknownEnumValue`], while the flag-style [`Flag`] domain
//! preserves unnamed values opaquely so newer flag colors survive a
//! round-trip untouched.

use crate::error::{Error, Result};

/// A card's scheduling stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardType {
    /// Never studied.
    #[default]
    New,
    /// In the learning steps.
    Learning,
    /// Graduated and due for review.
    Due,
    /// Lapsed and relearning.
    Relearning,
}

impl CardType {
    /// Decode from the stored integer.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(CardType::New),
            1 => Ok(CardType::Learning),
            2 => Ok(CardType::Due),
            3 => Ok(CardType::Relearning),
            _ => Err(Error::UnknownEnumValue {
                domain: "card type",
                value: code,
            }),
        }
    }

    /// The integer stored in `cards.type`.
    pub fn code(self) -> i64 {
        match self {
            CardType::New => 0,
            CardType::Learning => 1,
            CardType::Due => 2,
            CardType::Relearning => 3,
        }
    }
}

/// Who buried a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuriedBy {
    /// Buried manually by the user (stored as -3).
    User,
    /// Buried automatically by the scheduler, e.g. a sibling card (stored as -2).
    Scheduler,
}

/// The active scheduling bucket of an unsuspended, unburied card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduledState {
    /// Waiting in the new queue.
    #[default]
    New,
    /// In learning, due at an exact timestamp.
    Learning,
    /// Due for review on a day offset.
    Due,
    /// In learning, but delayed past the day boundary.
    DayLearning,
}

/// A card's queue.
///
/// The stored integer mixes burial/suspension sentinels (negative) with
/// scheduling states (non-negative) in one column, and the non-negative
/// values overlap [`CardType`] numerically without meaning the same thing.
/// Decoding into a tagged union keeps callers from comparing across the two
/// domains by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Queue {
    /// Hidden until the next day rollover.
    Buried(BuriedBy),
    /// Suspended indefinitely by the user (stored as -1).
    Suspended,
    /// Actively scheduled.
    Scheduled(ScheduledState),
}

impl Default for Queue {
    fn default() -> Self {
        Queue::Scheduled(ScheduledState::New)
    }
}

impl Queue {
    /// Decode from the stored integer. The domain is closed; unknown values
    /// are rejected rather than coerced.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            -3 => Ok(Queue::Buried(BuriedBy::User)),
            -2 => Ok(Queue::Buried(BuriedBy::Scheduler)),
            -1 => Ok(Queue::Suspended),
            0 => Ok(Queue::Scheduled(ScheduledState::New)),
            1 => Ok(Queue::Scheduled(ScheduledState::Learning)),
            2 => Ok(Queue::Scheduled(ScheduledState::Due)),
            3 => Ok(Queue::Scheduled(ScheduledState::DayLearning)),
            _ => Err(Error::UnknownEnumValue {
                domain: "queue",
                value: code,
            }),
        }
    }

    /// The integer stored in `cards.queue`.
    pub fn code(self) -> i64 {
        match self {
            Queue::Buried(BuriedBy::User) => -3,
            Queue::Buried(BuriedBy::Scheduler) => -2,
            Queue::Suspended => -1,
            Queue::Scheduled(ScheduledState::New) => 0,
            Queue::Scheduled(ScheduledState::Learning) => 1,
            Queue::Scheduled(ScheduledState::Due) => 2,
            Queue::Scheduled(ScheduledState::DayLearning) => 3,
        }
    }
}

/// A card's flag color.
///
/// Flag-style domain: values beyond the named colors are preserved opaquely
/// via [`Flag::Other`] so collections written by newer versions of the owning
/// application round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flag {
    /// No flag.
    #[default]
    None,
    /// Red flag.
    Red,
    /// Orange flag.
    Orange,
    /// Green flag.
    Green,
    /// Blue flag.
    Blue,
    /// A flag value this crate does not name, carried verbatim.
    Other(i64),
}

impl Flag {
    /// Decode from the stored integer. Never fails.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Flag::None,
            1 => Flag::Red,
            2 => Flag::Orange,
            3 => Flag::Green,
            4 => Flag::Blue,
            other => Flag::Other(other),
        }
    }

    /// The integer stored in `cards.flags`.
    pub fn code(self) -> i64 {
        match self {
            Flag::None => 0,
            Flag::Red => 1,
            Flag::Orange => 2,
            Flag::Green => 3,
            Flag::Blue => 4,
            Flag::Other(code) => code,
        }
    }
}

/// What kind of row a tombstone records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraveType {
    /// A deleted card.
    Card,
    /// A deleted note.
    Note,
    /// A deleted deck.
    Deck,
}

impl GraveType {
    /// Decode from the stored integer.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(GraveType::Card),
            1 => Ok(GraveType::Note),
            2 => Ok(GraveType::Deck),
            _ => Err(Error::UnknownEnumValue {
                domain: "grave type",
                value: code,
            }),
        }
    }

    /// The integer stored in `graves.type`.
    pub fn code(self) -> i64 {
        match self {
            GraveType::Card => 0,
            GraveType::Note => 1,
            GraveType::Deck => 2,
        }
    }
}

/// How a review history entry was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewType {
    /// Answered while in learning.
    Learn,
    /// A normal review.
    Review,
    /// Answered while relearning after a lapse.
    Relearn,
    /// Reviewed early in a filtered (cram) deck.
    Cram,
    /// Rescheduled manually.
    Manual,
}

impl ReviewType {
    /// Decode from the stored integer.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(ReviewType::Learn),
            1 => Ok(ReviewType::Review),
            2 => Ok(ReviewType::Relearn),
            3 => Ok(ReviewType::Cram),
            4 => Ok(ReviewType::Manual),
            _ => Err(Error::UnknownEnumValue {
                domain: "review type",
                value: code,
            }),
        }
    }

    /// The integer stored in `revlog.type`.
    pub fn code(self) -> i64 {
        match self {
            ReviewType::Learn => 0,
            ReviewType::Review => 1,
            ReviewType::Relearn => 2,
            ReviewType::Cram => 3,
            ReviewType::Manual => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_type_round_trip() {
        for code in 0..=3 {
            assert_eq!(CardType::from_code(code).unwrap().code(), code);
        }
        assert!(matches!(
            CardType::from_code(4),
            Err(Error::UnknownEnumValue { value: 4, .. })
        ));
    }

    #[test]
    fn test_queue_round_trip() {
        for code in -3..=3 {
            assert_eq!(Queue::from_code(code).unwrap().code(), code);
        }
    }

    #[test]
    fn test_queue_rejects_unknown() {
        assert!(Queue::from_code(-4).is_err());
        assert!(Queue::from_code(4).is_err());
    }

    #[test]
    fn test_queue_burial_variants() {
        assert_eq!(Queue::from_code(-3).unwrap(), Queue::Buried(BuriedBy::User));
        assert_eq!(
            Queue::from_code(-2).unwrap(),
            Queue::Buried(BuriedBy::Scheduler)
        );
    }

    #[test]
    fn test_flag_preserves_unknown_values() {
        assert_eq!(Flag::from_code(7), Flag::Other(7));
        assert_eq!(Flag::from_code(7).code(), 7);
        assert_eq!(Flag::from_code(3), Flag::Green);
    }

    #[test]
    fn test_review_type_rejects_seven() {
        assert!(matches!(
            ReviewType::from_code(7),
            Err(Error::UnknownEnumValue {
                domain: "review type",
                value: 7,
            })
        ));
    }

    #[test]
    fn test_grave_type_round_trip() {
        for code in 0..=2 {
            assert_eq!(GraveType::from_code(code).unwrap().code(), code);
        }
        assert!(GraveType::from_code(3).is_err());
    }
}
