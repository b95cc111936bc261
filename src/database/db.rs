//! SQLite-backed store for decks, study items and review records
//!
//! Handles schema initialization, the deck/item CRUD the host binary needs,
//! and atomic create-or-replace of review records.

use super::{DeckId, DeckProvider, ItemId, LearnerId, ReviewStore};
use crate::error::StoreError;
use crate::models::{Deck, ReviewRecord, StudyItem, Timestamp};
use chrono::{DateTime, Local, SecondsFormat};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// All statements run on one connection behind a mutex, so upserts for the
/// same (learner, item) pair never interleave.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!("Opened review database at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Creates the tables if missing and turns on foreign key enforcement
    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS decks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS study_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                deck_id INTEGER NOT NULL,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE,
                UNIQUE(deck_id, question)
            )",
            (),
        )?;

        // One row per (learner, item); created on first grading
        conn.execute(
            "CREATE TABLE IF NOT EXISTS review_records (
                learner_id INTEGER NOT NULL,
                item_id INTEGER NOT NULL,
                ease_factor REAL NOT NULL,
                interval_days INTEGER NOT NULL,
                last_reviewed TEXT NOT NULL,
                next_review TEXT NOT NULL,
                PRIMARY KEY (learner_id, item_id),
                FOREIGN KEY (item_id) REFERENCES study_items(id) ON DELETE CASCADE
            )",
            (),
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn new_deck(&self, name: &str) -> Result<DeckId, StoreError> {
        let conn = self.conn();
        conn.execute("INSERT INTO decks (name) VALUES (?1)", params![name])?;
        let id = conn.last_insert_rowid();
        info!("Deck '{}' created with id {}", name, id);
        Ok(id)
    }

    /// Adds an item to a deck and returns its id.
    ///
    /// A question already present in the deck is left untouched and its existing id returned.
    pub fn add_item(
        &self,
        deck: DeckId,
        question: &str,
        answer: &str,
    ) -> Result<ItemId, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO study_items (deck_id, question, answer) VALUES (?1, ?2, ?3)",
            params![deck, question, answer],
        )?;

        let id = conn.query_row(
            "SELECT id FROM study_items WHERE deck_id = ?1 AND question = ?2",
            params![deck, question],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Deletes an item; its review records go with it.
    pub fn delete_item(&self, item: ItemId) -> Result<(), StoreError> {
        self.conn()
            .execute("DELETE FROM study_items WHERE id = ?1", params![item])?;
        Ok(())
    }

    pub fn list_decks(&self) -> Result<Vec<(DeckId, String)>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name FROM decks ORDER BY id")?;
        let decks = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(decks)
    }

    pub fn deck_id_by_name(&self, name: &str) -> Result<Option<DeckId>, StoreError> {
        let id = self
            .conn()
            .query_row(
                "SELECT id FROM decks WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

fn format_timestamp(timestamp: &Timestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

fn parse_timestamp(raw: &str) -> Result<Timestamp, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Local))
        .map_err(|e| StoreError::InvalidTimestamp(format!("{raw}: {e}")))
}

type RawRecord = (f64, u32, String, String);

fn record_from_raw(
    (ease_factor, interval, last, next): RawRecord,
) -> Result<ReviewRecord, StoreError> {
    Ok(ReviewRecord {
        ease_factor,
        interval,
        last_reviewed: parse_timestamp(&last)?,
        next_review: parse_timestamp(&next)?,
    })
}

impl ReviewStore for SqliteStore {
    fn load_record(
        &self,
        learner: LearnerId,
        item: ItemId,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        let raw: Option<RawRecord> = self
            .conn()
            .query_row(
                "SELECT ease_factor, interval_days, last_reviewed, next_review
                 FROM review_records WHERE learner_id = ?1 AND item_id = ?2",
                params![learner, item],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        raw.map(record_from_raw).transpose()
    }

    fn upsert_record(
        &self,
        learner: LearnerId,
        item: ItemId,
        record: &ReviewRecord,
    ) -> Result<ReviewRecord, StoreError> {
        self.conn().execute(
            "INSERT INTO review_records
                (learner_id, item_id, ease_factor, interval_days, last_reviewed, next_review)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(learner_id, item_id) DO UPDATE SET
                ease_factor = excluded.ease_factor,
                interval_days = excluded.interval_days,
                last_reviewed = excluded.last_reviewed,
                next_review = excluded.next_review",
            params![
                learner,
                item,
                record.ease_factor,
                record.interval,
                format_timestamp(&record.last_reviewed),
                format_timestamp(&record.next_review),
            ],
        )?;
        debug!(
            "Stored review record for learner {} item {}: ease {:.2}, interval {}d",
            learner, item, record.ease_factor, record.interval
        );
        Ok(record.clone())
    }

    fn records_for_learner(
        &self,
        learner: LearnerId,
    ) -> Result<Vec<(ItemId, ReviewRecord)>, StoreError> {
        let raw = {
            let conn = self.conn();
            let mut stmt = conn.prepare(
                "SELECT item_id, ease_factor, interval_days, last_reviewed, next_review
                 FROM review_records WHERE learner_id = ?1 ORDER BY item_id",
            )?;
            stmt.query_map(params![learner], |row| {
                Ok((
                    row.get::<_, ItemId>(0)?,
                    (row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?),
                ))
            })?
            .collect::<rusqlite::Result<Vec<(ItemId, RawRecord)>>>()?
        };

        raw.into_iter()
            .map(|(item, raw)| Ok((item, record_from_raw(raw)?)))
            .collect()
    }
}

impl DeckProvider for SqliteStore {
    /// Loads a deck with its items in insertion order
    fn load_deck(&self, deck: DeckId) -> Result<Deck, StoreError> {
        let conn = self.conn();
        let name: String = conn
            .query_row(
                "SELECT name FROM decks WHERE id = ?1",
                params![deck],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::DeckNotFound(deck))?;

        let mut stmt = conn.prepare(
            "SELECT id, question, answer FROM study_items WHERE deck_id = ?1 ORDER BY id",
        )?;
        let items = stmt
            .query_map(params![deck], |row| {
                Ok(StudyItem {
                    id: row.get(0)?,
                    deck_id: deck,
                    question: row.get(1)?,
                    answer: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<StudyItem>>>()?;

        Ok(Deck { id: deck, name, items })
    }
}
