pub mod deck;
pub mod mastery;
pub mod quality;
pub mod review_record;
pub mod sm2;
pub mod study_item;
pub mod study_session;

pub use deck::Deck;
pub use mastery::{MasteryStats, classify};
pub use quality::{Rating, validate_quality};
pub use review_record::{ReviewRecord, Timestamp};
pub use sm2::compute_next_review;
pub use study_item::StudyItem;
pub use study_session::{SessionState, SessionStep, StudySession, StudySessionStats};
