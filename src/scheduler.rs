//! Applies graded reviews to cards.

use chrono::{DateTime, Local};

use crate::engine::grader::{self, Outcome};
use crate::engine::interval::{capped_interval_days, capped_next_review_at, MAX_INTERVAL_DAYS};
use crate::models::{Difficulty, Flashcard};

/// Review scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    max_interval_days: i64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            max_interval_days: MAX_INTERVAL_DAYS,
        }
    }

    /// Scheduler with a tighter interval cap. The cap is kept within
    /// `1..=MAX_INTERVAL_DAYS`.
    pub fn with_max_interval(days: i64) -> Self {
        Self {
            max_interval_days: days.clamp(1, MAX_INTERVAL_DAYS),
        }
    }

    pub fn max_interval_days(&self) -> i64 {
        self.max_interval_days
    }

    /// Days until the next review if `card` were rated `rating` now.
    pub fn interval_for(&self, card: &Flashcard, rating: Difficulty) -> i64 {
        capped_interval_days(rating, card.review_count, self.max_interval_days)
    }

    /// Record a review of `card` rated `rating` at `now`.
    ///
    /// Counters, last rating, last-review time and due date are all updated
    /// together; the interval is based on the review count before this review.
    pub fn review_card(&self, card: &mut Flashcard, rating: Difficulty, now: DateTime<Local>) -> Outcome {
        let outcome = grader::grade(rating);
        let next_review = capped_next_review_at(rating, card.review_count, self.max_interval_days, now);

        card.review_count += 1;
        card.correct_count += outcome.credit;
        card.incorrect_count += outcome.penalty();
        card.difficulty = Some(rating);
        card.last_reviewed = Some(now);
        card.next_review = Some(next_review);

        outcome
    }

    /// Interval labels for each possible rating of `card`.
    pub fn preview_intervals(&self, card: &Flashcard) -> [(Difficulty, String); 3] {
        Difficulty::ALL.map(|rating| (rating, format_interval(self.interval_for(card, rating))))
    }
}

/// Short label for an interval in days: `3d`, `5w`, `4mo`.
pub fn format_interval(days: i64) -> String {
    if days < 14 {
        format!("{}d", days)
    } else if days < 60 {
        format!("{}w", days / 7)
    } else {
        format!("{}mo", days / 30)
    }
}
