//! Aggregate progress over a learner's items.
//!
//! Buckets are computed independently: an item can be due, well known and
//! reviewed today all at once. Only `not_studied` excludes the others.

use super::StudyItem;
use super::review_record::{ReviewRecord, Timestamp};
use crate::database::ItemId;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MasteryStats {
    pub total: usize,
    pub reviewed_today: usize,
    pub needs_review: usize,
    pub well_known: usize,
    pub learning: usize,
    pub difficult: usize,
    pub not_studied: usize,
    pub mastered: usize,
    /// Share of mastered items, 0-100
    pub mastery_percentage: f64,
}

impl MasteryStats {
    pub fn studied(&self) -> usize {
        self.total - self.not_studied
    }
}

/// Classifies every item against its review record, if it has one.
///
/// Records for items not in `items` are ignored.
pub fn classify(
    records: &HashMap<ItemId, ReviewRecord>,
    items: &[StudyItem],
    now: Timestamp,
) -> MasteryStats {
    let today = now.date_naive();
    let mut stats = MasteryStats {
        total: items.len(),
        ..Default::default()
    };

    for item in items {
        let Some(record) = records.get(&item.id) else {
            stats.not_studied += 1;
            continue;
        };

        if record.reviewed_on(today) {
            stats.reviewed_today += 1;
        }
        if record.is_due(now) {
            stats.needs_review += 1;
        }
        if record.is_well_known() {
            stats.well_known += 1;
        }
        if record.is_learning() {
            stats.learning += 1;
        }
        if record.is_difficult() {
            stats.difficult += 1;
        }
        if record.is_mastered() {
            stats.mastered += 1;
        }
    }

    if stats.total > 0 {
        stats.mastery_percentage = stats.mastered as f64 / stats.total as f64 * 100.0;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local, TimeZone};

    fn now() -> Timestamp {
        Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn items(count: i64) -> Vec<StudyItem> {
        (1..=count)
            .map(|id| StudyItem::new(id, 1, &format!("q{id}"), &format!("a{id}")))
            .collect()
    }

    fn record(ease_factor: f64, interval: u32, last_reviewed: Timestamp) -> ReviewRecord {
        ReviewRecord {
            ease_factor,
            interval,
            last_reviewed,
            next_review: last_reviewed + Duration::days(interval as i64),
        }
    }

    #[test]
    fn test_empty_input() {
        let stats = classify(&HashMap::new(), &[], now());
        assert_eq!(stats, MasteryStats::default());
        assert_eq!(stats.mastery_percentage, 0.0);
    }

    #[test]
    fn test_unstudied_items() {
        let stats = classify(&HashMap::new(), &items(3), now());
        assert_eq!(stats.total, 3);
        assert_eq!(stats.not_studied, 3);
        assert_eq!(stats.studied(), 0);
    }

    #[test]
    fn test_buckets_overlap() {
        // Reviewed today, well known and already due: counted in all three.
        let today_early = Local.with_ymd_and_hms(2024, 6, 15, 0, 30, 0).unwrap();
        let mut overlapping = record(2.6, 1, today_early);
        overlapping.next_review = today_early;

        let records = HashMap::from([(1, overlapping)]);
        let stats = classify(&records, &items(1), now());

        assert_eq!(stats.reviewed_today, 1);
        assert_eq!(stats.needs_review, 1);
        assert_eq!(stats.well_known, 1);
        assert_eq!(stats.learning, 0);
    }

    #[test]
    fn test_classification() {
        let long_ago = now() - Duration::days(40);
        let records = HashMap::from([
            (1, record(2.7, 30, long_ago + Duration::days(30))),
            (2, record(2.0, 6, long_ago)),
            (3, record(1.1, 1, long_ago)),
            (99, record(2.5, 50, long_ago)),
        ]);

        let stats = classify(&records, &items(4), now());

        assert_eq!(stats.total, 4);
        assert_eq!(stats.not_studied, 1);
        assert_eq!(stats.well_known, 1);
        assert_eq!(stats.learning, 1);
        assert_eq!(stats.difficult, 1);
        assert_eq!(stats.needs_review, 2);
        assert_eq!(stats.reviewed_today, 0);
        assert_eq!(stats.mastered, 1);
        assert!((stats.mastery_percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_not_studied_partition() {
        let records = HashMap::from([
            (2, record(2.5, 1, now())),
            (4, record(1.5, 1, now())),
        ]);
        let all = items(5);
        let stats = classify(&records, &all, now());
        let with_record = all.iter().filter(|i| records.contains_key(&i.id)).count();
        assert_eq!(stats.not_studied + with_record, stats.total);
        assert_eq!(stats.studied(), 2);
    }
}
