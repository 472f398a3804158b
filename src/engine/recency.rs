//! Time-since-last-review buckets.
//!
//! Thresholds adapt to the spread of review times in the population being
//! classified, with fixed floors so that a young deck (all reviews within a
//! few hours of each other) still gets day-scale buckets.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Local};

use crate::error::ParseValueError;
use crate::models::Flashcard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecencyBucket {
    Fresh,
    Familiar,
    Fuzzy,
    Forgotten,
}

impl RecencyBucket {
    pub const ALL: [RecencyBucket; 4] = [Self::Fresh, Self::Familiar, Self::Fuzzy, Self::Forgotten];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fresh => "Fresh",
            Self::Familiar => "Familiar",
            Self::Fuzzy => "Fuzzy",
            Self::Forgotten => "Forgotten",
        }
    }
}

impl fmt::Display for RecencyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RecencyBucket {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fresh" => Ok(Self::Fresh),
            "familiar" => Ok(Self::Familiar),
            "fuzzy" => Ok(Self::Fuzzy),
            "forgotten" => Ok(Self::Forgotten),
            _ => Err(ParseValueError::new("recency bucket", s)),
        }
    }
}

/// One labeled bucket of a recency partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecencyGroup {
    pub bucket: RecencyBucket,
    pub description: String,
    pub count: usize,
}

/// Upper bounds (inclusive) on time since review for the first three buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyThresholds {
    pub fresh_max: Duration,
    pub familiar_max: Duration,
    pub fuzzy_max: Duration,
}

impl RecencyThresholds {
    /// Derive thresholds from the reviewed cards in `cards`.
    ///
    /// Returns `None` when none of them has ever been reviewed.
    pub fn from_cards<'a>(cards: impl IntoIterator<Item = &'a Flashcard>) -> Option<Self> {
        let (oldest, newest) = cards
            .into_iter()
            .filter_map(|card| card.last_reviewed)
            .fold(None, |range: Option<(DateTime<Local>, DateTime<Local>)>, reviewed| {
                Some(match range {
                    None => (reviewed, reviewed),
                    Some((oldest, newest)) => (oldest.min(reviewed), newest.max(reviewed)),
                })
            })?;

        Some(Self::from_span(newest - oldest))
    }

    pub fn from_span(span: Duration) -> Self {
        Self {
            fresh_max: Duration::days(1).max(span / 4),
            familiar_max: Duration::days(2).max(span / 2),
            fuzzy_max: Duration::days(7).max(span * 3 / 4),
        }
    }

    pub fn bucket_for(&self, card: &Flashcard, now: DateTime<Local>) -> RecencyBucket {
        let Some(reviewed) = card.last_reviewed else {
            return RecencyBucket::Forgotten;
        };

        let elapsed = now - reviewed;
        if elapsed <= self.fresh_max {
            RecencyBucket::Fresh
        } else if elapsed <= self.familiar_max {
            RecencyBucket::Familiar
        } else if elapsed <= self.fuzzy_max {
            RecencyBucket::Fuzzy
        } else {
            RecencyBucket::Forgotten
        }
    }

    fn describe(&self, bucket: RecencyBucket) -> String {
        match bucket {
            RecencyBucket::Fresh => format!("Reviewed within {}", format_span(self.fresh_max)),
            RecencyBucket::Familiar => format!(
                "Reviewed {} to {} ago",
                format_span(self.fresh_max),
                format_span(self.familiar_max)
            ),
            RecencyBucket::Fuzzy => format!(
                "Reviewed {} to {} ago",
                format_span(self.familiar_max),
                format_span(self.fuzzy_max)
            ),
            RecencyBucket::Forgotten => format!(
                "Not reviewed in over {}, or never",
                format_span(self.fuzzy_max)
            ),
        }
    }
}

/// Classifies cards against thresholds computed from a fixed population.
#[derive(Debug, Clone, Copy)]
pub struct RecencyClassifier {
    thresholds: Option<RecencyThresholds>,
    now: DateTime<Local>,
}

impl RecencyClassifier {
    pub fn new<'a>(population: impl IntoIterator<Item = &'a Flashcard>, now: DateTime<Local>) -> Self {
        Self {
            thresholds: RecencyThresholds::from_cards(population),
            now,
        }
    }

    pub fn thresholds(&self) -> Option<&RecencyThresholds> {
        self.thresholds.as_ref()
    }

    pub fn bucket(&self, card: &Flashcard) -> RecencyBucket {
        match &self.thresholds {
            Some(thresholds) => thresholds.bucket_for(card, self.now),
            None => RecencyBucket::Forgotten,
        }
    }

    /// Count `cards` per bucket.
    ///
    /// When nothing has been reviewed yet the result is a single
    /// "Never Studied" forgotten bucket holding every card.
    pub fn partition(&self, cards: &[&Flashcard]) -> Vec<RecencyGroup> {
        let Some(thresholds) = &self.thresholds else {
            return vec![RecencyGroup {
                bucket: RecencyBucket::Forgotten,
                description: "Never Studied".to_string(),
                count: cards.len(),
            }];
        };

        RecencyBucket::ALL
            .iter()
            .map(|&bucket| RecencyGroup {
                bucket,
                description: thresholds.describe(bucket),
                count: cards.iter().filter(|card| self.bucket(card) == bucket).count(),
            })
            .collect()
    }
}

/// Partition `cards` into recency buckets relative to themselves.
pub fn partition(cards: &[&Flashcard], now: DateTime<Local>) -> Vec<RecencyGroup> {
    RecencyClassifier::new(cards.iter().copied(), now).partition(cards)
}

fn format_span(span: Duration) -> String {
    let days = span.num_days();
    let hours = span.num_hours() % 24;

    match (days, hours) {
        (0, 0) => plural(span.num_minutes(), "minute"),
        (0, h) => plural(h, "hour"),
        (d, 0) => plural(d, "day"),
        (d, h) => format!("{} {}", plural(d, "day"), plural(h, "hour")),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn reviewed(ago: Duration) -> Flashcard {
        let mut card = Flashcard::new("Q".into(), "A".into(), vec![]);
        card.last_reviewed = Some(now() - ago);
        card
    }

    fn never() -> Flashcard {
        Flashcard::new("Q".into(), "A".into(), vec![])
    }

    fn counts(groups: &[RecencyGroup]) -> Vec<(RecencyBucket, usize)> {
        groups.iter().map(|g| (g.bucket, g.count)).collect()
    }

    #[test]
    fn test_never_studied_is_single_bucket() {
        let cards = [never(), never(), never()];
        let refs: Vec<&Flashcard> = cards.iter().collect();

        let groups = partition(&refs, now());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].bucket, RecencyBucket::Forgotten);
        assert_eq!(groups[0].description, "Never Studied");
        assert_eq!(groups[0].count, 3);
    }

    #[test]
    fn test_floors_dominate_small_spans() {
        let cards = [
            reviewed(Duration::hours(2)),
            reviewed(Duration::hours(30)),
            reviewed(Duration::hours(72)),
            never(),
        ];
        let refs: Vec<&Flashcard> = cards.iter().collect();

        let thresholds = RecencyThresholds::from_cards(refs.iter().copied()).unwrap();
        assert_eq!(thresholds.fresh_max, Duration::days(1));
        assert_eq!(thresholds.familiar_max, Duration::days(2));
        assert_eq!(thresholds.fuzzy_max, Duration::days(7));

        assert_eq!(
            counts(&partition(&refs, now())),
            vec![
                (RecencyBucket::Fresh, 1),
                (RecencyBucket::Familiar, 1),
                (RecencyBucket::Fuzzy, 1),
                (RecencyBucket::Forgotten, 1),
            ]
        );
    }

    #[test]
    fn test_span_dominates_long_histories() {
        let cards = [
            reviewed(Duration::days(1)),
            reviewed(Duration::days(40)),
            reviewed(Duration::days(60)),
            reviewed(Duration::days(100)),
        ];
        let refs: Vec<&Flashcard> = cards.iter().collect();

        let classifier = RecencyClassifier::new(refs.iter().copied(), now());
        let thresholds = classifier.thresholds().unwrap();
        assert_eq!(thresholds.fresh_max, Duration::days(99) / 4);

        let buckets: Vec<RecencyBucket> = cards.iter().map(|c| classifier.bucket(c)).collect();
        assert_eq!(
            buckets,
            vec![
                RecencyBucket::Fresh,
                RecencyBucket::Familiar,
                RecencyBucket::Fuzzy,
                RecencyBucket::Forgotten,
            ]
        );
    }

    #[test]
    fn test_threshold_edges_are_inclusive() {
        let thresholds = RecencyThresholds::from_span(Duration::zero());
        assert_eq!(
            thresholds.bucket_for(&reviewed(Duration::days(1)), now()),
            RecencyBucket::Fresh
        );
        assert_eq!(
            thresholds.bucket_for(&reviewed(Duration::days(7)), now()),
            RecencyBucket::Fuzzy
        );
        assert_eq!(
            thresholds.bucket_for(&reviewed(Duration::days(7) + Duration::seconds(1)), now()),
            RecencyBucket::Forgotten
        );
    }

    #[test]
    fn test_partition_counts_cover_every_card() {
        let cards: Vec<Flashcard> = (0..25)
            .map(|i| match i % 5 {
                0 => never(),
                n => reviewed(Duration::hours(i * 11 * n)),
            })
            .collect();
        let refs: Vec<&Flashcard> = cards.iter().collect();

        let groups = partition(&refs, now());
        assert_eq!(groups.len(), 4);
        assert_eq!(groups.iter().map(|g| g.count).sum::<usize>(), cards.len());
    }

    #[test]
    fn test_descriptions() {
        let thresholds = RecencyThresholds::from_span(Duration::zero());
        assert_eq!(thresholds.describe(RecencyBucket::Fresh), "Reviewed within 1 day");
        assert_eq!(thresholds.describe(RecencyBucket::Fuzzy), "Reviewed 2 days to 7 days ago");
        assert_eq!(format_span(Duration::hours(30)), "1 day 6 hours");
        assert_eq!(format_span(Duration::minutes(5)), "5 minutes");
    }
}
