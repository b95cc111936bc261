//! Scheduling state for one (learner, item) pair, plus the predicates the
//! mastery classifier buckets records by.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Wall-clock instant in the learner's local time zone.
pub type Timestamp = DateTime<Local>;

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
/// Records with at least this interval and a default-or-better ease count as mastered.
pub const MASTERED_INTERVAL_DAYS: u32 = 21;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub ease_factor: f64,
    /// Days until the next review, always >= 1
    pub interval: u32,
    pub last_reviewed: Timestamp,
    pub next_review: Timestamp,
}

impl ReviewRecord {
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review <= now
    }

    pub fn is_well_known(&self) -> bool {
        self.ease_factor >= DEFAULT_EASE_FACTOR
    }

    pub fn is_learning(&self) -> bool {
        self.ease_factor >= MIN_EASE_FACTOR && self.ease_factor < DEFAULT_EASE_FACTOR
    }

    /// Only reachable for records written outside the scheduler, which floors ease at 1.3.
    pub fn is_difficult(&self) -> bool {
        self.ease_factor < MIN_EASE_FACTOR
    }

    pub fn is_mastered(&self) -> bool {
        self.is_well_known() && self.interval >= MASTERED_INTERVAL_DAYS
    }

    pub fn reviewed_on(&self, date: NaiveDate) -> bool {
        self.last_reviewed.date_naive() == date
    }
}
