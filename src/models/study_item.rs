//! StudyItem is a question/answer pair belonging to a deck. Read-only to the scheduler.
use crate::database::{DeckId, ItemId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudyItem {
    pub id: ItemId,
    pub deck_id: DeckId,
    pub question: String,
    pub answer: String,
}

impl StudyItem {
    pub fn new(id: ItemId, deck_id: DeckId, question: &str, answer: &str) -> Self {
        Self {
            id,
            deck_id,
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }
}
