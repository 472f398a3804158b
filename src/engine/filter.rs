//! Narrowing a deck's cards by category, recency and mastery.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Local};
use tracing::debug;

use super::recency::{RecencyBucket, RecencyClassifier, RecencyGroup};
use crate::models::{Category, Flashcard, MasteryLevel};

/// Allowed values for each filter dimension, plus the reference time.
///
/// An empty set on any dimension lets no card through.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRequest {
    pub categories: BTreeSet<Category>,
    pub recency: BTreeSet<RecencyBucket>,
    pub mastery: BTreeSet<MasteryLevel>,
    pub now: DateTime<Local>,
}

impl SelectionRequest {
    /// A request that lets every card in `cards` through.
    pub fn everything(cards: &[Flashcard], now: DateTime<Local>) -> Self {
        Self {
            categories: categories_of(cards),
            recency: RecencyBucket::ALL.into_iter().collect(),
            mastery: MasteryLevel::ALL.into_iter().collect(),
            now,
        }
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn with_recency(mut self, recency: impl IntoIterator<Item = RecencyBucket>) -> Self {
        self.recency = recency.into_iter().collect();
        self
    }

    pub fn with_mastery(mut self, mastery: impl IntoIterator<Item = MasteryLevel>) -> Self {
        self.mastery = mastery.into_iter().collect();
        self
    }
}

/// Cards surviving all three filters, with the recency breakdown of the
/// category-filtered subset they were drawn from.
#[derive(Debug, Clone)]
pub struct FilteredPool<'a> {
    pub cards: Vec<&'a Flashcard>,
    pub recency: Vec<RecencyGroup>,
    pub category_matches: usize,
}

impl FilteredPool<'_> {
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Apply category, then recency, then mastery filtering.
///
/// Recency buckets are computed against the category-filtered subset, not the
/// whole deck. Card order is preserved.
pub fn apply_filters<'a>(cards: &'a [Flashcard], request: &SelectionRequest) -> FilteredPool<'a> {
    let in_category: Vec<&Flashcard> = cards
        .iter()
        .filter(|card| matches_category(card, &request.categories))
        .collect();

    let classifier = RecencyClassifier::new(in_category.iter().copied(), request.now);
    let recency = classifier.partition(&in_category);

    let after_recency: Vec<&Flashcard> = in_category
        .iter()
        .copied()
        .filter(|card| request.recency.contains(&classifier.bucket(card)))
        .collect();
    let recency_matches = after_recency.len();

    let filtered: Vec<&Flashcard> = after_recency
        .into_iter()
        .filter(|card| request.mastery.contains(&card.mastery()))
        .collect();

    debug!(
        total = cards.len(),
        category = in_category.len(),
        recency = recency_matches,
        mastery = filtered.len(),
        "filtered card pool"
    );

    FilteredPool {
        cards: filtered,
        recency,
        category_matches: in_category.len(),
    }
}

pub fn matches_category(card: &Flashcard, allowed: &BTreeSet<Category>) -> bool {
    card.category_labels().iter().any(|label| allowed.contains(label))
}

/// Every category present in `cards`, sorted.
pub fn categories_of(cards: &[Flashcard]) -> BTreeSet<Category> {
    cards.iter().flat_map(Flashcard::category_labels).collect()
}

/// Number of cards at each mastery level, with zero entries for absent levels.
pub fn mastery_counts<'a>(cards: impl IntoIterator<Item = &'a Flashcard>) -> BTreeMap<MasteryLevel, usize> {
    let mut counts: BTreeMap<MasteryLevel, usize> =
        MasteryLevel::ALL.iter().map(|&level| (level, 0)).collect();
    for card in cards {
        *counts.entry(card.mastery()).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn card(question: &str, categories: &[&str], difficulty: Option<Difficulty>, ago_days: Option<i64>) -> Flashcard {
        let mut card = Flashcard::new(
            question.into(),
            "A".into(),
            categories.iter().map(|c| c.to_string()).collect(),
        );
        card.difficulty = difficulty;
        card.last_reviewed = ago_days.map(|d| now() - Duration::days(d));
        card
    }

    fn sample() -> Vec<Flashcard> {
        vec![
            card("history recent", &["History"], Some(Difficulty::Good), Some(0)),
            card("history old", &["History"], Some(Difficulty::Hard), Some(30)),
            card("science new", &["Science"], None, None),
            card("both", &["History", "Science"], Some(Difficulty::Easy), Some(10)),
            card("loose", &[], None, None),
            card("literal", &["Uncategorized"], None, None),
        ]
    }

    fn questions(pool: &FilteredPool) -> Vec<String> {
        pool.cards.iter().map(|c| c.question.clone()).collect()
    }

    #[test]
    fn test_everything_keeps_all_cards() {
        let cards = sample();
        let pool = apply_filters(&cards, &SelectionRequest::everything(&cards, now()));
        assert_eq!(pool.cards.len(), cards.len());
        assert_eq!(pool.category_matches, cards.len());
    }

    #[test]
    fn test_category_filter_matches_any_label() {
        let cards = sample();
        let request = SelectionRequest::everything(&cards, now())
            .with_categories([Category::explicit("Science")]);
        let pool = apply_filters(&cards, &request);
        assert_eq!(questions(&pool), vec!["science new", "both"]);
    }

    #[test]
    fn test_uncategorized_is_distinct_from_literal_label() {
        let cards = sample();
        let request = SelectionRequest::everything(&cards, now())
            .with_categories([Category::Uncategorized]);
        assert_eq!(questions(&apply_filters(&cards, &request)), vec!["loose"]);

        let request = SelectionRequest::everything(&cards, now())
            .with_categories([Category::explicit("Uncategorized")]);
        assert_eq!(questions(&apply_filters(&cards, &request)), vec!["literal"]);
    }

    #[test]
    fn test_empty_allow_set_excludes_everything() {
        let cards = sample();
        let base = SelectionRequest::everything(&cards, now());

        let no_categories = base.clone().with_categories(Vec::<Category>::new());
        assert!(apply_filters(&cards, &no_categories).is_empty());
        let no_recency = base.clone().with_recency(Vec::<RecencyBucket>::new());
        assert!(apply_filters(&cards, &no_recency).is_empty());
        let no_mastery = base.with_mastery(Vec::<MasteryLevel>::new());
        assert!(apply_filters(&cards, &no_mastery).is_empty());
    }

    #[test]
    fn test_mastery_filter_treats_absent_as_ungraded() {
        let cards = sample();
        let request = SelectionRequest::everything(&cards, now())
            .with_mastery([MasteryLevel::Ungraded, MasteryLevel::Hard]);
        assert_eq!(
            questions(&apply_filters(&cards, &request)),
            vec!["history old", "science new", "loose", "literal"]
        );
    }

    #[test]
    fn test_recency_is_relative_to_category_subset() {
        let cards = sample();
        // History reviews span 30 days, so fresh covers up to 7.5 days
        let request = SelectionRequest::everything(&cards, now())
            .with_categories([Category::explicit("History")])
            .with_recency([RecencyBucket::Fresh]);
        let pool = apply_filters(&cards, &request);
        assert_eq!(questions(&pool), vec!["history recent"]);
        assert_eq!(pool.category_matches, 3);
        assert_eq!(pool.recency.iter().map(|g| g.count).sum::<usize>(), 3);

        // Science alone: one reviewed card, floors apply, 10 days is forgotten
        let request = SelectionRequest::everything(&cards, now())
            .with_categories([Category::explicit("Science")])
            .with_recency([RecencyBucket::Forgotten]);
        assert_eq!(questions(&apply_filters(&cards, &request)), vec!["science new", "both"]);
    }

    #[test]
    fn test_filtering_is_deterministic() {
        let cards = sample();
        let request = SelectionRequest::everything(&cards, now())
            .with_mastery([MasteryLevel::Ungraded, MasteryLevel::Easy]);
        let first = questions(&apply_filters(&cards, &request));
        for _ in 0..5 {
            assert_eq!(questions(&apply_filters(&cards, &request)), first);
        }
    }

    #[test]
    fn test_catalogue_helpers() {
        let cards = sample();
        let categories: Vec<Category> = categories_of(&cards).into_iter().collect();
        assert_eq!(
            categories,
            vec![
                Category::explicit("History"),
                Category::explicit("Science"),
                Category::explicit("Uncategorized"),
                Category::Uncategorized,
            ]
        );

        let counts = mastery_counts(&cards);
        assert_eq!(counts[&MasteryLevel::Ungraded], 3);
        assert_eq!(counts[&MasteryLevel::Hard], 1);
        assert_eq!(counts[&MasteryLevel::Good], 1);
        assert_eq!(counts[&MasteryLevel::Easy], 1);
    }
}
