//! In-memory store, for hosts that persist elsewhere and for tests.

use super::{DeckId, DeckProvider, ItemId, LearnerId, ReviewStore};
use crate::error::StoreError;
use crate::models::{Deck, ReviewRecord};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<(LearnerId, ItemId), ReviewRecord>>,
    decks: Mutex<HashMap<DeckId, Deck>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_deck(&self, deck: Deck) {
        lock(&self.decks).insert(deck.id, deck);
    }

    pub fn remove_item(&self, item: ItemId) {
        for deck in lock(&self.decks).values_mut() {
            deck.items.retain(|i| i.id != item);
        }
        lock(&self.records).retain(|(_, id), _| *id != item);
    }
}

// A poisoned map is still structurally valid; every write replaces a whole entry.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ReviewStore for MemoryStore {
    fn load_record(
        &self,
        learner: LearnerId,
        item: ItemId,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        Ok(lock(&self.records).get(&(learner, item)).cloned())
    }

    fn upsert_record(
        &self,
        learner: LearnerId,
        item: ItemId,
        record: &ReviewRecord,
    ) -> Result<ReviewRecord, StoreError> {
        lock(&self.records).insert((learner, item), record.clone());
        Ok(record.clone())
    }

    fn records_for_learner(
        &self,
        learner: LearnerId,
    ) -> Result<Vec<(ItemId, ReviewRecord)>, StoreError> {
        Ok(lock(&self.records)
            .iter()
            .filter(|((owner, _), _)| *owner == learner)
            .map(|((_, item), record)| (*item, record.clone()))
            .collect())
    }
}

impl DeckProvider for MemoryStore {
    fn load_deck(&self, deck: DeckId) -> Result<Deck, StoreError> {
        lock(&self.decks)
            .get(&deck)
            .cloned()
            .ok_or(StoreError::DeckNotFound(deck))
    }
}
