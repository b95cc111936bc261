pub mod clock;
pub mod database;
pub mod engine;
pub mod error;
pub mod export;
pub mod models;

pub use engine::{SessionEngine, SessionHandle};
pub use error::{ExportError, SessionError, StoreError};
pub use models::{
    Deck, MasteryStats, Rating, ReviewRecord, SessionStep, StudyItem, StudySession,
    StudySessionStats, classify, compute_next_review,
};
