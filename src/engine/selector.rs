//! Session selection: urgency scoring, tiering and tie-break shuffling.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::ParseValueError;
use crate::models::{Difficulty, Flashcard};

/// Maximum number of cards in a prioritized session.
pub const SESSION_SIZE: usize = 20;

const OVERDUE_BASE: f64 = -1000.0;
const NEW_CARD_PRIORITY: f64 = -500.0;

/// Urgency group. Sessions list every overdue card before any new card, and
/// every new card before any merely reviewed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Overdue,
    New,
    Reviewed,
}

/// Sort key of a card. Lower sorts first; cards with equal keys are
/// indistinguishable and get shuffled among themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Urgency {
    pub priority: f64,
    pub difficulty_rank: u8,
    pub recency_rank: i64,
}

impl Urgency {
    pub fn of(card: &Flashcard, now: DateTime<Local>) -> Self {
        Self {
            priority: priority(card, now),
            difficulty_rank: match card.difficulty {
                Some(Difficulty::Hard) => 0,
                Some(Difficulty::Good) => 1,
                _ => 2,
            },
            recency_rank: card
                .last_reviewed
                .map_or(0, |reviewed| -reviewed.timestamp_millis()),
        }
    }

    pub fn tier(&self) -> Tier {
        if self.priority < NEW_CARD_PRIORITY {
            Tier::Overdue
        } else if self.priority == NEW_CARD_PRIORITY {
            Tier::New
        } else {
            Tier::Reviewed
        }
    }

    fn sort_cmp(&self, other: &Self) -> Ordering {
        self.tier()
            .cmp(&other.tier())
            .then_with(|| self.priority.total_cmp(&other.priority))
            .then_with(|| self.difficulty_rank.cmp(&other.difficulty_rank))
            .then_with(|| self.recency_rank.cmp(&other.recency_rank))
    }
}

/// Urgency score; more negative means more urgent.
///
/// - overdue: `-1000 - days overdue`
/// - never reviewed: `-500`
/// - reviewed, not yet due: `days since review * weight`, where hard cards
///   weigh 2, good 1.5 and easy 1
pub fn priority(card: &Flashcard, now: DateTime<Local>) -> f64 {
    if let Some(next) = card.next_review.filter(|&next| next <= now) {
        return OVERDUE_BASE - (now - next).num_days() as f64;
    }

    let Some(reviewed) = card.last_reviewed else {
        return NEW_CARD_PRIORITY;
    };

    let weight = match card.difficulty {
        Some(Difficulty::Hard) => 2.0,
        Some(Difficulty::Good) => 1.5,
        Some(Difficulty::Easy) | None => 1.0,
    };
    (now - reviewed).num_days().max(0) as f64 * weight
}

/// Order `pool` by urgency and keep at most `limit` cards.
///
/// Ties on the full urgency key are shuffled with `rng`, so the same pool
/// always yields the same ranking but not always the same order within a tie.
pub fn select_session<'a, R>(
    pool: &[&'a Flashcard],
    now: DateTime<Local>,
    limit: usize,
    rng: &mut R,
) -> Vec<&'a Flashcard>
where
    R: Rng + ?Sized,
{
    let mut scored: Vec<(Urgency, &'a Flashcard)> =
        pool.iter().map(|&card| (Urgency::of(card, now), card)).collect();
    scored.sort_by(|a, b| a.0.sort_cmp(&b.0));

    for tie in scored.chunk_by_mut(|a, b| a.0 == b.0) {
        tie.shuffle(rng);
    }

    let overdue = scored.iter().filter(|(u, _)| u.tier() == Tier::Overdue).count();
    let new = scored.iter().filter(|(u, _)| u.tier() == Tier::New).count();
    debug!(
        pool = pool.len(),
        overdue,
        new,
        reviewed = pool.len() - overdue - new,
        limit,
        "selected session"
    );

    scored.into_iter().take(limit).map(|(_, card)| card).collect()
}

/// [`select_session`] with a freshly seeded random source.
pub fn prioritize<'a>(pool: &[&'a Flashcard], now: DateTime<Local>, limit: usize) -> Vec<&'a Flashcard> {
    let mut rng = StdRng::from_entropy();
    select_session(pool, now, limit, &mut rng)
}

/// How a session is put together from the filtered pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudyOrder {
    /// Most urgent first, capped at the session size.
    #[default]
    Priority,
    /// Deck order, uncapped.
    Sequence,
    /// Uniformly shuffled, uncapped.
    Shuffled,
}

impl StudyOrder {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Sequence => "sequence",
            Self::Shuffled => "shuffled",
        }
    }
}

impl fmt::Display for StudyOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StudyOrder {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "priority" => Ok(Self::Priority),
            "sequence" => Ok(Self::Sequence),
            "shuffled" | "shuffle" => Ok(Self::Shuffled),
            _ => Err(ParseValueError::new("study order", s)),
        }
    }
}

/// Build a session from `pool` in the requested order.
pub fn arrange<'a, R>(
    pool: &[&'a Flashcard],
    order: StudyOrder,
    now: DateTime<Local>,
    limit: usize,
    rng: &mut R,
) -> Vec<&'a Flashcard>
where
    R: Rng + ?Sized,
{
    match order {
        StudyOrder::Priority => select_session(pool, now, limit, rng),
        StudyOrder::Sequence => pool.to_vec(),
        StudyOrder::Shuffled => {
            let mut cards = pool.to_vec();
            cards.shuffle(rng);
            cards
        }
    }
}
