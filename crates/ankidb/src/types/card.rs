//! Card rows and their derived scheduling attributes.

use crate::codec::{TimestampMillis, TimestampSecs};
use crate::enums::{CardType, Flag, Queue, ScheduledState};
use crate::types::{CardId, DeckId, NoteId, SyncMeta};

/// One schedulable card, generated from a note by a template.
///
/// `due` and `interval` are stored raw because their stored form is what the
/// owning application's scheduler reads; use [`Card::due`] and
/// [`Card::interval`] to interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Row id; also the card's creation time in milliseconds.
    pub id: CardId,
    /// The note this card was generated from (`nid`).
    pub note_id: NoteId,
    /// The deck the card currently lives in (`did`).
    pub deck_id: DeckId,
    /// Template index within the note type (`ord`).
    pub ordinal: u16,
    /// Scheduling stage (`type`).
    pub card_type: CardType,
    /// Scheduling queue, including burial/suspension sentinels (`queue`).
    pub queue: Queue,
    /// Raw due value; its meaning depends on `card_type`.
    pub due: i64,
    /// Raw interval (`ivl`); negative means seconds, positive means days.
    pub interval: i32,
    /// Ease factor in permille; 2500 multiplies the interval by 2.5 on Good.
    pub factor: u16,
    /// Number of reviews (`reps`).
    pub review_count: u32,
    /// Number of lapses (`lapses`).
    pub lapse_count: u32,
    /// Learning steps remaining, encoded by the scheduler (`left`).
    pub left: u32,
    /// Snapshot of `due` while the card is in a filtered deck (`odue`).
    pub original_due: i64,
    /// Snapshot of `deck_id` while the card is in a filtered deck (`odid`).
    pub original_deck_id: DeckId,
    /// Flag color (`flags`).
    pub flag: Flag,
    /// Unused by the owning application, but preserved verbatim.
    pub data: String,
    /// Sync bookkeeping (`usn`, `mod`).
    pub sync: SyncMeta,
}

/// A card's interval, decoded from the sign of the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    /// Sub-day interval, stored negated.
    Seconds(u32),
    /// Whole-day interval.
    Days(u32),
}

/// A card's due value, decoded according to its scheduling stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Due {
    /// New cards: a queue position (the note id, or a random integer).
    Position(i64),
    /// Due cards: days since the collection was created.
    DaysFromCreation(i64),
    /// Learning and relearning cards: an absolute timestamp.
    At(TimestampSecs),
}

impl Card {
    /// `WHERE` fragment matching buried cards, for query push-down.
    pub const BURIED_WHERE: &'static str = "queue IN (-3, -2)";
    /// `WHERE` fragment matching suspended cards.
    pub const SUSPENDED_WHERE: &'static str = "queue = -1";
    /// `WHERE` fragment matching mature review cards.
    pub const MATURE_WHERE: &'static str = "queue = 2 AND ivl >= 21";
    /// `WHERE` fragment matching young review cards.
    pub const YOUNG_WHERE: &'static str = "queue = 2 AND ivl < 21";

    /// A new-state card for the given note/deck/template, ready to insert.
    pub fn new(id: CardId, note_id: NoteId, deck_id: DeckId, ordinal: u16) -> Self {
        Self {
            id,
            note_id,
            deck_id,
            ordinal,
            card_type: CardType::New,
            queue: Queue::default(),
            due: 0,
            interval: 0,
            factor: 0,
            review_count: 0,
            lapse_count: 0,
            left: 0,
            original_due: 0,
            original_deck_id: 0,
            flag: Flag::None,
            data: String::new(),
            sync: SyncMeta::new(-1),
        }
    }

    /// When the card was created, read out of its id.
    pub fn creation_time(&self) -> TimestampMillis {
        TimestampMillis(self.id)
    }

    /// Whether the card is buried, regardless of its scheduling stage.
    pub fn is_buried(&self) -> bool {
        matches!(self.queue, Queue::Buried(_))
    }

    /// Whether the card is suspended.
    pub fn is_suspended(&self) -> bool {
        self.queue == Queue::Suspended
    }

    /// Whether the card is in the review queue.
    pub fn is_review(&self) -> bool {
        self.queue == Queue::Scheduled(ScheduledState::Due)
    }

    /// A review card with an interval of at least 21 days.
    pub fn is_mature(&self) -> bool {
        self.is_review() && self.interval >= 21
    }

    /// A review card with an interval under 21 days.
    pub fn is_young(&self) -> bool {
        self.is_review() && self.interval < 21
    }

    /// The interval with its unit made explicit.
    pub fn interval(&self) -> Interval {
        if self.interval < 0 {
            Interval::Seconds(self.interval.unsigned_abs())
        } else {
            Interval::Days(self.interval as u32)
        }
    }

    /// The due value interpreted according to the card's scheduling stage.
    pub fn due(&self) -> Due {
        match self.card_type {
            CardType::New => Due::Position(self.due),
            CardType::Due => Due::DaysFromCreation(self.due),
            CardType::Learning | CardType::Relearning => Due::At(TimestampSecs(self.due)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::BuriedBy;

    #[test]
    fn test_buried_independent_of_card_type() {
        let mut card = Card::new(1, 10, 1, 0);
        card.card_type = CardType::New;
        card.queue = Queue::Buried(BuriedBy::Scheduler);
        assert!(card.is_buried());
        assert!(!card.is_review());
    }

    #[test]
    fn test_negative_interval_means_seconds() {
        let mut card = Card::new(1, 10, 1, 0);
        card.card_type = CardType::Due;
        card.interval = -30;
        assert_eq!(card.interval(), Interval::Seconds(30));
        card.interval = 30;
        assert_eq!(card.interval(), Interval::Days(30));
    }

    #[test]
    fn test_due_interpretation_follows_card_type() {
        let mut card = Card::new(1, 10, 1, 0);
        card.due = 1_700_000_000;
        assert_eq!(card.due(), Due::Position(1_700_000_000));
        card.card_type = CardType::Due;
        card.due = 120;
        assert_eq!(card.due(), Due::DaysFromCreation(120));
        card.card_type = CardType::Learning;
        card.due = 1_700_000_000;
        assert_eq!(card.due(), Due::At(TimestampSecs(1_700_000_000)));
    }

    #[test]
    fn test_maturity_thresholds() {
        let mut card = Card::new(1, 10, 1, 0);
        card.queue = Queue::Scheduled(ScheduledState::Due);
        card.interval = 21;
        assert!(card.is_mature());
        card.interval = 20;
        assert!(card.is_young());
        card.queue = Queue::Suspended;
        assert!(!card.is_mature() && !card.is_young());
    }

    #[test]
    fn test_creation_time_from_id() {
        let card = Card::new(1_700_000_000_000, 10, 1, 0);
        assert_eq!(card.creation_time(), TimestampMillis(1_700_000_000_000));
    }
}
