//! Persistence collaborators: the review record store and the deck provider,
//! with in-memory and SQLite implementations.

pub mod db;
pub mod memory;

pub use db::SqliteStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::{Deck, ReviewRecord, StudyItem, Timestamp};

pub type ItemId = i64;
pub type DeckId = i64;
pub type LearnerId = i64;

/// Keeps one review record per (learner, item) pair.
///
/// Implementations must serialize concurrent `upsert_record` calls for the same pair.
pub trait ReviewStore {
    fn load_record(
        &self,
        learner: LearnerId,
        item: ItemId,
    ) -> Result<Option<ReviewRecord>, StoreError>;

    /// Creates or replaces the record for the pair in one atomic step.
    fn upsert_record(
        &self,
        learner: LearnerId,
        item: ItemId,
        record: &ReviewRecord,
    ) -> Result<ReviewRecord, StoreError>;

    fn records_for_learner(
        &self,
        learner: LearnerId,
    ) -> Result<Vec<(ItemId, ReviewRecord)>, StoreError>;

    /// Items whose record is due at `now`, oldest due first.
    fn due_item_ids(&self, learner: LearnerId, now: Timestamp) -> Result<Vec<ItemId>, StoreError> {
        let mut due: Vec<_> = self
            .records_for_learner(learner)?
            .into_iter()
            .filter(|(_, record)| record.is_due(now))
            .collect();
        due.sort_by(|(a_id, a), (b_id, b)| a.next_review.cmp(&b.next_review).then(a_id.cmp(b_id)));
        Ok(due.into_iter().map(|(id, _)| id).collect())
    }
}

/// Read-only source of decks and their ordered items.
pub trait DeckProvider {
    fn load_deck(&self, deck: DeckId) -> Result<Deck, StoreError>;

    fn list_items(&self, deck: DeckId) -> Result<Vec<StudyItem>, StoreError> {
        Ok(self.load_deck(deck)?.items)
    }
}
