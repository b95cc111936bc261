//! Deck is an ordered snapshot of study items, taken when a session starts
use super::StudyItem;
use crate::database::DeckId;

#[derive(Clone, Debug)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub items: Vec<StudyItem>,
}

impl Deck {
    pub fn new(id: DeckId, name: &str, items: Vec<StudyItem>) -> Self {
        Self {
            id,
            name: name.to_string(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
