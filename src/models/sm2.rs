//! SM-2 style review scheduler.
//!
//! Computes the next review record for a (learner, item) pair from the previous one:
//! - Passing grades (3-5): the first review schedules 1 day, a card still on a 1 day
//!   interval graduates to 6 days, after that the interval is multiplied by the
//!   previous ease factor
//! - Failing grades (0-2): interval resets to 1 day and ease drops by 0.2
//! - Ease never falls below 1.3, intervals stay within 1 day and `MAX_INTERVAL_DAYS`
//!
//! The function is pure: the grading time is passed in, nothing is read from the clock.

use super::quality::is_passing;
use super::review_record::{DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR, ReviewRecord, Timestamp};
use chrono::{Days, Duration};
use log::warn;

/// Ease lost on a failing grade.
const FAILURE_EASE_PENALTY: f64 = 0.2;
const GRADUATING_INTERVAL_DAYS: u32 = 6;
/// Longest interval ever scheduled, roughly a century.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Calculates the review record that follows `previous` after grading with `quality`.
///
/// `previous` is `None` on the first review of an item. `quality` is expected in 0..=5;
/// larger values are not rejected here and only push the ease adjustment further.
pub fn compute_next_review(
    previous: Option<&ReviewRecord>,
    quality: u8,
    now: Timestamp,
) -> ReviewRecord {
    let ease0 = previous.map_or(DEFAULT_EASE_FACTOR, |r| r.ease_factor);
    let interval0 = previous.map_or(1, |r| r.interval);

    let (interval, ease_factor) = if is_passing(quality) {
        let interval = match previous {
            None => 1,
            Some(_) if interval0 == 1 => GRADUATING_INTERVAL_DAYS,
            Some(_) => (interval0 as f64 * ease0).round() as u32,
        };

        // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
        let distance = 5.0 - quality as f64;
        let ease = ease0 + (0.1 - distance * (0.08 + distance * 0.02));

        (interval, ease.max(MIN_EASE_FACTOR))
    } else {
        (1, (ease0 - FAILURE_EASE_PENALTY).max(MIN_EASE_FACTOR))
    };
    let interval = interval.clamp(1, MAX_INTERVAL_DAYS);

    ReviewRecord {
        ease_factor,
        interval,
        last_reviewed: now,
        next_review: add_calendar_days(now, interval),
    }
}

/// Adds whole calendar days, keeping the local time of day across DST changes.
///
/// Falls back to whole 24h days when the local time does not exist on the target
/// date, and to `now` if the result is outside the representable range.
fn add_calendar_days(now: Timestamp, days: u32) -> Timestamp {
    now.checked_add_days(Days::new(days as u64))
        .or_else(|| now.checked_add_signed(Duration::days(days as i64)))
        .unwrap_or_else(|| {
            warn!("Review date {} days after {} is out of range", days, now);
            now
        })
}
