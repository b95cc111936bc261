//! A single study session over a fixed deck snapshot.
//! Each item is presented, revealed, then rated (or skipped) before moving on.

use super::quality::{Rating, validate_quality};
use super::sm2::compute_next_review;
use super::{StudyItem, Timestamp};
use crate::database::{LearnerId, ReviewStore};
use crate::error::SessionError;
use log::{debug, info};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Question of the item at this index is shown
    Presenting(usize),
    /// Answer is revealed and a rating is expected
    AwaitingRating(usize),
    Completed,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StudySessionStats {
    /// Number of items planned for the session
    pub total: usize,
    pub failed: usize,
    pub hard: usize,
    pub good: usize,
    pub completed: bool,
}

impl StudySessionStats {
    pub fn rated(&self) -> usize {
        self.failed + self.hard + self.good
    }

    /// Fraction of the deck answered with the top grade.
    pub fn score(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.good as f64 / self.total as f64
    }

    fn record(&mut self, quality: u8) {
        match Rating::from_quality(quality) {
            Some(Rating::Failed) => self.failed += 1,
            Some(Rating::Hard) => self.hard += 1,
            Some(Rating::Easy) => self.good += 1,
            None => {}
        }
    }
}

/// Result of a rating or a skip.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionStep {
    /// The next item is being presented
    Next(StudySessionStats),
    Completed(StudySessionStats),
}

pub struct StudySession {
    learner: LearnerId,
    items: Vec<StudyItem>,
    state: SessionState,
    stats: StudySessionStats,
}

impl StudySession {
    /// Starts presenting the first item. An empty deck is rejected.
    pub fn new(learner: LearnerId, items: Vec<StudyItem>) -> Result<Self, SessionError> {
        if items.is_empty() {
            return Err(SessionError::PreconditionViolation(
                "cannot start a session with an empty deck".to_string(),
            ));
        }

        info!(
            "Starting study session for learner {} with {} items",
            learner,
            items.len()
        );
        let total = items.len();
        Ok(Self {
            learner,
            items,
            state: SessionState::Presenting(0),
            stats: StudySessionStats {
                total,
                ..Default::default()
            },
        })
    }

    pub fn learner(&self) -> LearnerId {
        self.learner
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> &StudySessionStats {
        &self.stats
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }

    pub fn current_item(&self) -> Option<&StudyItem> {
        match self.state {
            SessionState::Presenting(i) | SessionState::AwaitingRating(i) => self.items.get(i),
            SessionState::Completed => None,
        }
    }

    /// (items already moved past, deck size)
    pub fn progress(&self) -> (usize, usize) {
        let done = match self.state {
            SessionState::Presenting(i) | SessionState::AwaitingRating(i) => i,
            SessionState::Completed => self.items.len(),
        };
        (done, self.items.len())
    }

    pub fn score(&self) -> f64 {
        self.stats.score()
    }

    /// Reveals the answer of the current item. Revealing twice returns the same item.
    pub fn reveal(&mut self) -> Result<&StudyItem, SessionError> {
        let index = match self.state {
            SessionState::Presenting(i) | SessionState::AwaitingRating(i) => i,
            SessionState::Completed => {
                return Err(SessionError::PreconditionViolation(
                    "session is already completed".to_string(),
                ));
            }
        };

        self.state = SessionState::AwaitingRating(index);
        Ok(&self.items[index])
    }

    /// Grades the revealed item, persists its new review record and advances.
    ///
    /// If the store fails, the session stays on the same item awaiting a rating.
    pub fn rate<S: ReviewStore + ?Sized>(
        &mut self,
        quality: u8,
        store: &S,
        now: Timestamp,
    ) -> Result<SessionStep, SessionError> {
        let SessionState::AwaitingRating(index) = self.state else {
            return Err(SessionError::PreconditionViolation(format!(
                "rating requires a revealed item, session is {:?}",
                self.state
            )));
        };
        let quality = validate_quality(quality)?;
        let item = self.items[index].id;

        let previous = store.load_record(self.learner, item)?;
        let next = compute_next_review(previous.as_ref(), quality, now);
        store.upsert_record(self.learner, item, &next)?;
        debug!(
            "Learner {} rated item {} with {}: next review in {} days (ease {:.2})",
            self.learner, item, quality, next.interval, next.ease_factor
        );

        self.stats.record(quality);
        Ok(self.advance(index))
    }

    /// Moves past the presented item without grading it.
    pub fn skip(&mut self) -> Result<SessionStep, SessionError> {
        let SessionState::Presenting(index) = self.state else {
            return Err(SessionError::PreconditionViolation(format!(
                "only a presented item can be skipped, session is {:?}",
                self.state
            )));
        };

        debug!("Learner {} skipped item {}", self.learner, self.items[index].id);
        Ok(self.advance(index))
    }

    fn advance(&mut self, index: usize) -> SessionStep {
        if index + 1 == self.items.len() {
            self.state = SessionState::Completed;
            self.stats.completed = true;
            self.stats.total = self.items.len();
            info!(
                "Study session for learner {} completed: {} good, {} hard, {} failed of {}",
                self.learner, self.stats.good, self.stats.hard, self.stats.failed, self.stats.total
            );
            SessionStep::Completed(self.stats.clone())
        } else {
            self.state = SessionState::Presenting(index + 1);
            SessionStep::Next(self.stats.clone())
        }
    }
}
