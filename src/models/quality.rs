//! Quality ratings as offered to learners, and validation of raw grades.

use crate::error::SessionError;

pub const MAX_QUALITY: u8 = 5;
/// Grades at or above this value are passing.
pub const PASSING_QUALITY: u8 = 3;

/// The three answer buttons a learner is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rating {
    Failed,
    Hard,
    Easy,
}

impl Rating {
    pub fn quality(self) -> u8 {
        match self {
            Rating::Failed => 0,
            Rating::Hard => 3,
            Rating::Easy => 5,
        }
    }

    /// Maps a grade to the stats bucket it is counted in: failing grades are
    /// `Failed`, 3 and 4 are `Hard`, 5 is `Easy`.
    pub fn from_quality(quality: u8) -> Option<Rating> {
        match quality {
            0..=2 => Some(Rating::Failed),
            3 | 4 => Some(Rating::Hard),
            5 => Some(Rating::Easy),
            _ => None,
        }
    }
}

pub fn is_passing(quality: u8) -> bool {
    quality >= PASSING_QUALITY
}

/// Rejects grades outside 0..=5 before they reach the scheduler.
pub fn validate_quality(quality: u8) -> Result<u8, SessionError> {
    if quality > MAX_QUALITY {
        return Err(SessionError::InvalidQuality(quality));
    }
    Ok(quality)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_quality_values() {
        assert_eq!(Rating::Failed.quality(), 0);
        assert_eq!(Rating::Hard.quality(), 3);
        assert_eq!(Rating::Easy.quality(), 5);
    }

    #[test]
    fn test_from_quality_buckets() {
        assert_eq!(Rating::from_quality(0), Some(Rating::Failed));
        assert_eq!(Rating::from_quality(2), Some(Rating::Failed));
        assert_eq!(Rating::from_quality(3), Some(Rating::Hard));
        assert_eq!(Rating::from_quality(4), Some(Rating::Hard));
        assert_eq!(Rating::from_quality(5), Some(Rating::Easy));
        assert_eq!(Rating::from_quality(6), None);
    }

    #[test]
    fn test_validate_quality() {
        assert_eq!(validate_quality(0).unwrap(), 0);
        assert_eq!(validate_quality(5).unwrap(), 5);
        assert!(matches!(
            validate_quality(6),
            Err(SessionError::InvalidQuality(6))
        ));
    }

    #[test]
    fn test_passing_threshold() {
        assert!(!is_passing(2));
        assert!(is_passing(3));
    }
}
