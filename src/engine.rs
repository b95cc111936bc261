//! Study Session Engine: owns the running sessions of a host application,
//! addressed by handle.
//!
//! Each session is driven by one action at a time. Any action on a session,
//! reads included, that arrives while another one (typically a rating waiting on
//! the store) is still running is rejected with [`SessionError::SessionBusy`].
//! Sessions of different learners never block each other.

use crate::clock::Clock;
use crate::database::{DeckId, DeckProvider, LearnerId, ReviewStore};
use crate::error::SessionError;
use crate::models::{SessionStep, StudyItem, StudySession, StudySessionStats};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

pub type SessionHandle = u64;

type SharedSession = Arc<Mutex<StudySession>>;

pub struct SessionEngine<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    sessions: Mutex<HashMap<SessionHandle, SharedSession>>,
    next_handle: AtomicU64,
}

impl<S: ReviewStore + DeckProvider> SessionEngine<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            sessions: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshots the deck's items and starts a session over them.
    pub fn start(&self, learner: LearnerId, deck: DeckId) -> Result<SessionHandle, SessionError> {
        let items = self.store.list_items(deck)?;
        if items.is_empty() {
            return Err(SessionError::PreconditionViolation(format!(
                "deck {deck} has no items to study"
            )));
        }
        self.start_with_items(learner, items)
    }

    /// Starts a session over an explicit item list, e.g. only the due items of a deck.
    pub fn start_with_items(
        &self,
        learner: LearnerId,
        items: Vec<StudyItem>,
    ) -> Result<SessionHandle, SessionError> {
        let session = StudySession::new(learner, items)?;
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.sessions().insert(handle, Arc::new(Mutex::new(session)));
        info!("Session {} started for learner {}", handle, learner);
        Ok(handle)
    }

    /// The item currently presented, without revealing its answer.
    pub fn current_item(&self, handle: SessionHandle) -> Result<Option<StudyItem>, SessionError> {
        self.with_session(handle, |session| Ok(session.current_item().cloned()))
    }

    pub fn reveal(&self, handle: SessionHandle) -> Result<StudyItem, SessionError> {
        self.with_session(handle, |session| session.reveal().cloned())
    }

    pub fn rate(&self, handle: SessionHandle, quality: u8) -> Result<SessionStep, SessionError> {
        let result = self.with_session(handle, |session| {
            session.rate(quality, self.store.as_ref(), self.clock.now())
        });
        if let Err(e) = &result {
            warn!("Rating {} rejected for session {}: {}", quality, handle, e);
        }
        result
    }

    pub fn skip(&self, handle: SessionHandle) -> Result<SessionStep, SessionError> {
        self.with_session(handle, |session| session.skip())
    }

    pub fn stats(&self, handle: SessionHandle) -> Result<StudySessionStats, SessionError> {
        self.with_session(handle, |session| Ok(session.stats().clone()))
    }

    /// Drops the session and returns its final statistics.
    pub fn finish(&self, handle: SessionHandle) -> Result<StudySessionStats, SessionError> {
        let stats = self.stats(handle)?;
        self.sessions().remove(&handle);
        info!("Session {} closed", handle);
        Ok(stats)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions().len()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionHandle, SharedSession>> {
        self.sessions.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn with_session<T>(
        &self,
        handle: SessionHandle,
        action: impl FnOnce(&mut StudySession) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        // Clone out of the map so one busy session does not hold the map lock.
        let session = self
            .sessions()
            .get(&handle)
            .cloned()
            .ok_or(SessionError::UnknownSession(handle))?;

        let mut guard = match session.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(SessionError::SessionBusy),
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
        };
        action(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::{ItemId, MemoryStore};
    use crate::error::StoreError;
    use crate::models::{Deck, ReviewRecord, Timestamp};
    use chrono::{Local, TimeZone};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::thread;

    fn start_time() -> Timestamp {
        Local.with_ymd_and_hms(2024, 4, 8, 20, 0, 0).unwrap()
    }

    fn deck(id: DeckId, count: i64) -> Deck {
        let items = (1..=count)
            .map(|n| StudyItem::new(id * 100 + n, id, &format!("q{n}"), &format!("a{n}")))
            .collect();
        Deck::new(id, &format!("deck {id}"), items)
    }

    fn engine() -> (SessionEngine<MemoryStore>, Arc<ManualClock>) {
        let store = MemoryStore::new();
        store.insert_deck(deck(1, 3));
        store.insert_deck(deck(2, 0));
        let clock = Arc::new(ManualClock::new(start_time()));
        (SessionEngine::new(Arc::new(store), clock.clone()), clock)
    }

    #[test]
    fn test_full_session_through_handles() {
        let (engine, _) = engine();
        let handle = engine.start(7, 1).unwrap();

        for quality in [5, 3] {
            engine.reveal(handle).unwrap();
            assert!(matches!(
                engine.rate(handle, quality).unwrap(),
                SessionStep::Next(_)
            ));
        }
        assert_eq!(engine.current_item(handle).unwrap().unwrap().id, 103);
        assert_eq!(engine.reveal(handle).unwrap().id, 103);
        let SessionStep::Completed(stats) = engine.rate(handle, 0).unwrap() else {
            panic!("expected completion");
        };

        assert_eq!(stats.total, 3);
        assert_eq!((stats.good, stats.hard, stats.failed), (1, 1, 1));
        assert_eq!(engine.store().records_for_learner(7).unwrap().len(), 3);
        assert_eq!(engine.finish(handle).unwrap(), stats);
        assert_eq!(engine.active_sessions(), 0);
        assert!(matches!(
            engine.stats(handle),
            Err(SessionError::UnknownSession(_))
        ));
    }

    #[test]
    fn test_empty_and_missing_decks() {
        let (engine, _) = engine();
        assert!(matches!(
            engine.start(1, 2),
            Err(SessionError::PreconditionViolation(_))
        ));
        assert!(matches!(
            engine.start(1, 9),
            Err(SessionError::PersistenceFailure(StoreError::DeckNotFound(9)))
        ));
    }

    #[test]
    fn test_ratings_use_clock_time() {
        let (engine, clock) = engine();
        let handle = engine.start(1, 1).unwrap();
        clock.advance_days(2);

        engine.reveal(handle).unwrap();
        engine.rate(handle, 5).unwrap();

        let record = engine.store().load_record(1, 101).unwrap().unwrap();
        assert_eq!(record.last_reviewed, clock.now());
    }

    #[test]
    fn test_invalid_quality_rejected_at_boundary() {
        let (engine, _) = engine();
        let handle = engine.start(1, 1).unwrap();
        engine.reveal(handle).unwrap();

        assert!(matches!(
            engine.rate(handle, 7),
            Err(SessionError::InvalidQuality(7))
        ));
        assert!(engine.store().load_record(1, 101).unwrap().is_none());
        assert!(engine.rate(handle, 5).is_ok());
    }

    /// Store that parks inside `upsert_record` until the test releases it.
    struct GatedStore {
        inner: MemoryStore,
        entered: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl ReviewStore for GatedStore {
        fn load_record(
            &self,
            learner: LearnerId,
            item: ItemId,
        ) -> Result<Option<ReviewRecord>, StoreError> {
            self.inner.load_record(learner, item)
        }

        fn upsert_record(
            &self,
            learner: LearnerId,
            item: ItemId,
            record: &ReviewRecord,
        ) -> Result<ReviewRecord, StoreError> {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            self.inner.upsert_record(learner, item, record)
        }

        fn records_for_learner(
            &self,
            learner: LearnerId,
        ) -> Result<Vec<(ItemId, ReviewRecord)>, StoreError> {
            self.inner.records_for_learner(learner)
        }
    }

    impl DeckProvider for GatedStore {
        fn load_deck(&self, deck: DeckId) -> Result<Deck, StoreError> {
            self.inner.load_deck(deck)
        }
    }

    #[test]
    fn test_actions_on_busy_session_are_rejected() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let inner = MemoryStore::new();
        inner.insert_deck(deck(1, 2));
        let store = GatedStore {
            inner,
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let engine = SessionEngine::new(Arc::new(store), Arc::new(ManualClock::new(start_time())));
        let handle = engine.start(1, 1).unwrap();
        engine.reveal(handle).unwrap();

        thread::scope(|scope| {
            let first = scope.spawn(|| engine.rate(handle, 5));

            entered_rx.recv().unwrap();
            assert!(matches!(
                engine.rate(handle, 3),
                Err(SessionError::SessionBusy)
            ));
            assert!(matches!(
                engine.stats(handle),
                Err(SessionError::SessionBusy)
            ));
            release_tx.send(()).unwrap();

            assert!(matches!(first.join().unwrap(), Ok(SessionStep::Next(_))));
        });

        let stats = engine.stats(handle).unwrap();
        assert_eq!((stats.good, stats.hard), (1, 0));
    }

    #[test]
    fn test_sessions_are_independent() {
        let (engine, _) = engine();
        let a = engine.start(1, 1).unwrap();
        let b = engine.start(2, 1).unwrap();
        assert_ne!(a, b);

        engine.reveal(a).unwrap();
        engine.rate(a, 5).unwrap();
        engine.skip(b).unwrap();

        assert_eq!(engine.stats(a).unwrap().good, 1);
        assert_eq!(engine.stats(b).unwrap().rated(), 0);
        assert!(engine.store().load_record(2, 101).unwrap().is_none());
    }
}
