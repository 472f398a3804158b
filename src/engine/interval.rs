//! Next-review interval calculation.
//!
//! Exponential back-off keyed on how many reviews a card has had, scaled by
//! the rating of the current review. A hard answer shortens the current step
//! but does not restart the curve.

use chrono::{DateTime, Duration, Local};

use crate::models::Difficulty;

/// Longest interval ever scheduled.
pub const MAX_INTERVAL_DAYS: i64 = 180;

const GROWTH: f64 = 2.5;
const SECOND_REVIEW_BASE: f64 = 3.0;
const HARD_SCALE: f64 = 0.6;
const EASY_SCALE: f64 = 1.5;

/// Interval in whole days for a review rated `rating`, given the card's review
/// count before this review (0 on the first ever review).
pub fn interval_days(rating: Difficulty, prior_count: u32) -> i64 {
    capped_interval_days(rating, prior_count, MAX_INTERVAL_DAYS)
}

/// Same as [`interval_days`] with an explicit cap, which is itself limited to
/// `1..=MAX_INTERVAL_DAYS`.
pub fn capped_interval_days(rating: Difficulty, prior_count: u32, max_days: i64) -> i64 {
    let days = if prior_count == 0 {
        match rating {
            Difficulty::Hard => 1,
            Difficulty::Good => 2,
            Difficulty::Easy => 4,
        }
    } else {
        let base = step_base(prior_count);
        let scaled = match rating {
            Difficulty::Hard => base * HARD_SCALE,
            Difficulty::Good => base,
            Difficulty::Easy => base * EASY_SCALE,
        };
        // `as` saturates, so an overflowing base still lands on the cap
        scaled.floor() as i64
    };

    days.clamp(1, max_days.clamp(1, MAX_INTERVAL_DAYS))
}

/// Due date for a review rated `rating` at `now`.
pub fn next_review_at(rating: Difficulty, prior_count: u32, now: DateTime<Local>) -> DateTime<Local> {
    capped_next_review_at(rating, prior_count, MAX_INTERVAL_DAYS, now)
}

/// [`next_review_at`] with an explicit cap.
pub fn capped_next_review_at(
    rating: Difficulty,
    prior_count: u32,
    max_days: i64,
    now: DateTime<Local>,
) -> DateTime<Local> {
    now + Duration::days(capped_interval_days(rating, prior_count, max_days))
}

// 2.5^(n-1) never drops below the second-review base of 3 days, so the
// interval for a fixed rating never shrinks as reviews accumulate.
fn step_base(prior_count: u32) -> f64 {
    // 2.5^32 is far past any cap; keeps the exponent within i32
    let exponent = (prior_count - 1).min(32) as i32;
    GROWTH.powi(exponent).max(SECOND_REVIEW_BASE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_first_review_intervals() {
        assert_eq!(interval_days(Difficulty::Hard, 0), 1);
        assert_eq!(interval_days(Difficulty::Good, 0), 2);
        assert_eq!(interval_days(Difficulty::Easy, 0), 4);
    }

    #[test]
    fn test_second_review_uses_three_day_base() {
        assert_eq!(interval_days(Difficulty::Hard, 1), 1);
        assert_eq!(interval_days(Difficulty::Good, 1), 3);
        assert_eq!(interval_days(Difficulty::Easy, 1), 4);
    }

    #[test]
    fn test_third_review_keeps_three_day_floor() {
        // 2.5^1 would give 2 and 3 days; the floor keeps the curve monotone
        assert_eq!(interval_days(Difficulty::Hard, 2), 1);
        assert_eq!(interval_days(Difficulty::Good, 2), 3);
        assert_eq!(interval_days(Difficulty::Easy, 2), 4);
    }

    #[test]
    fn test_hard_after_three_reviews() {
        // 2.5^2 = 6.25, * 0.6 = 3.75
        assert_eq!(interval_days(Difficulty::Hard, 3), 3);
        assert_eq!(interval_days(Difficulty::Good, 3), 6);
        assert_eq!(interval_days(Difficulty::Easy, 3), 9);
    }

    #[test]
    fn test_interval_never_shrinks() {
        for rating in Difficulty::ALL {
            let mut previous = interval_days(rating, 0);
            for count in 1..64 {
                let current = interval_days(rating, count);
                assert!(
                    current >= previous,
                    "{rating:?}: interval for {count} reviews ({current}) < {previous}"
                );
                previous = current;
            }
        }
    }

    #[test]
    fn test_cap_holds_for_any_count() {
        for rating in Difficulty::ALL {
            for count in [5, 6, 7, 10, 100, 1_000, u32::MAX] {
                let days = interval_days(rating, count);
                assert!((1..=MAX_INTERVAL_DAYS).contains(&days));
            }
            assert_eq!(interval_days(rating, u32::MAX), MAX_INTERVAL_DAYS);
        }
    }

    #[test]
    fn test_explicit_cap_is_bounded() {
        assert_eq!(capped_interval_days(Difficulty::Easy, 20, 30), 30);
        assert_eq!(capped_interval_days(Difficulty::Easy, 20, 10_000), MAX_INTERVAL_DAYS);
        assert_eq!(capped_interval_days(Difficulty::Easy, 20, 0), 1);
    }

    #[test]
    fn test_next_review_is_whole_days_after_now() {
        let now = Local.with_ymd_and_hms(2025, 1, 10, 8, 30, 0).unwrap();
        let next = next_review_at(Difficulty::Good, 0, now);
        assert_eq!(next - now, Duration::days(2));

        let capped = capped_next_review_at(Difficulty::Easy, 20, 30, now);
        assert_eq!(capped - now, Duration::days(30));
    }
}
