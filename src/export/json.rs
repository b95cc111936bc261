//! JSON import/export of decks.
//! A deck file holds the deck name and its question/answer pairs; review records are not exported.

use crate::database::{DeckId, SqliteStore};
use crate::error::{ExportError, StoreError};
use crate::models::Deck;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeckFile {
    pub name: String,
    pub items: Vec<ItemFile>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemFile {
    pub question: String,
    pub answer: String,
}

impl From<&Deck> for DeckFile {
    fn from(deck: &Deck) -> Self {
        Self {
            name: deck.name.clone(),
            items: deck
                .items
                .iter()
                .map(|item| ItemFile {
                    question: item.question.clone(),
                    answer: item.answer.clone(),
                })
                .collect(),
        }
    }
}

/// Exports a deck to a JSON file at the specified path.
pub fn export_deck_to_path(deck: &Deck, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let json_string = serde_json::to_string_pretty(&DeckFile::from(deck))?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(json_string.as_bytes())?;
    info!("Deck '{}' exported to '{}'", deck.name, path.as_ref().display());
    Ok(())
}

/// Reads a deck file. Fails if the file is missing or not a valid deck.
pub fn import_deck(path: impl AsRef<Path>) -> Result<DeckFile, ExportError> {
    let mut file = File::open(path.as_ref())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let deck: DeckFile = serde_json::from_str(&contents)?;
    info!("Deck '{}' read from '{}'", deck.name, path.as_ref().display());
    Ok(deck)
}

/// Creates the deck and its items in the store.
pub fn import_into(deck: &DeckFile, store: &SqliteStore) -> Result<DeckId, StoreError> {
    let deck_id = store.new_deck(&deck.name)?;
    for item in &deck.items {
        store.add_item(deck_id, &item.question, &item.answer)?;
    }
    Ok(deck_id)
}
