//! Study statistics across decks, categories and sessions.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate};

use crate::engine::grader::Outcome;
use crate::models::{percent, Category, Deck, Difficulty, Flashcard, StudySession};

/// Number of most recent sessions used for the recent-performance figures.
pub const RECENT_SESSIONS: usize = 7;

/// Running totals for a study session in progress.
#[derive(Debug, Clone)]
pub struct SessionTally {
    deck_id: String,
    started_at: DateTime<Local>,
    cards_studied: u32,
    correct: u32,
    incorrect: u32,
}

impl SessionTally {
    pub fn new(deck_id: impl Into<String>, started_at: DateTime<Local>) -> Self {
        Self {
            deck_id: deck_id.into(),
            started_at,
            cards_studied: 0,
            correct: 0,
            incorrect: 0,
        }
    }

    pub fn record(&mut self, outcome: Outcome) {
        self.cards_studied += 1;
        self.correct += outcome.credit;
        self.incorrect += outcome.penalty();
    }

    pub fn is_empty(&self) -> bool {
        self.cards_studied == 0
    }

    /// The history record for this session, or `None` if nothing was answered.
    pub fn finish(self, ended_at: DateTime<Local>) -> Option<StudySession> {
        if self.is_empty() {
            return None;
        }

        Some(StudySession {
            deck_id: self.deck_id,
            start_time: self.started_at,
            end_time: Some(ended_at),
            cards_studied: self.cards_studied,
            correct_answers: self.correct,
            incorrect_answers: self.incorrect,
            session_accuracy: percent(self.correct, self.cards_studied),
        })
    }
}

/// Totals across every deck and session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppStats {
    pub total_decks: usize,
    pub total_cards: usize,
    pub mastered_cards: usize,
    pub learning_cards: usize,
    pub new_cards: usize,
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_study_sessions: usize,
    pub accuracy_rate: u32,
    pub total_correct_answers: u32,
    pub total_answers: u32,
}

impl AppStats {
    pub fn calculate(decks: &[Deck], sessions: &[StudySession], today: NaiveDate) -> Self {
        let cards = || decks.iter().flat_map(|deck| deck.cards.iter());

        let total_cards = cards().count();
        let mastered_cards = cards().filter(|c| c.is_mastered()).count();
        let learning_cards = cards()
            .filter(|c| c.review_count > 0 && !c.is_mastered())
            .count();
        let total_correct_answers: u32 = cards().map(|c| c.correct_count).sum();
        let total_answers: u32 = cards().map(|c| c.review_count).sum();

        let study_days: Vec<NaiveDate> = sessions.iter().map(|s| s.start_time.date_naive()).collect();
        let (current_streak, best_streak) = calculate_streaks(&study_days, today);

        Self {
            total_decks: decks.len(),
            total_cards,
            mastered_cards,
            learning_cards,
            new_cards: total_cards - mastered_cards - learning_cards,
            current_streak,
            best_streak,
            total_study_sessions: sessions.len(),
            accuracy_rate: percent(total_correct_answers, total_answers),
            total_correct_answers,
            total_answers,
        }
    }
}

/// Current and best runs of consecutive study days.
///
/// The current run ends today, or yesterday if nothing was studied today yet.
pub fn calculate_streaks(study_days: &[NaiveDate], today: NaiveDate) -> (u32, u32) {
    if study_days.is_empty() {
        return (0, 0);
    }

    let unique: HashSet<NaiveDate> = study_days.iter().copied().collect();

    let mut current = 0u32;
    let mut check = if unique.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    while unique.contains(&check) {
        current += 1;
        check -= Duration::days(1);
    }

    let mut sorted: Vec<NaiveDate> = unique.into_iter().collect();
    sorted.sort();
    let mut best = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for day in sorted {
        run = match previous {
            Some(prev) if day.num_days_from_ce() - prev.num_days_from_ce() == 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(day);
    }

    (current, best.max(current))
}

/// Review performance of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: Category,
    pub card_count: usize,
    pub total_reviews: u32,
    pub correct_answers: u32,
    pub accuracy: u32,
    pub average_difficulty: &'static str,
    pub last_reviewed: Option<DateTime<Local>>,
}

/// Per-category statistics, most accurate first.
///
/// A card with several categories counts toward each of them.
pub fn category_stats<'a>(cards: impl IntoIterator<Item = &'a Flashcard>) -> Vec<CategoryStats> {
    let mut by_category: BTreeMap<Category, Vec<&Flashcard>> = BTreeMap::new();
    for card in cards {
        for label in card.category_labels() {
            by_category.entry(label).or_default().push(card);
        }
    }

    let mut stats: Vec<CategoryStats> = by_category
        .into_iter()
        .map(|(category, cards)| {
            let total_reviews: u32 = cards.iter().map(|c| c.review_count).sum();
            let correct_answers: u32 = cards.iter().map(|c| c.correct_count).sum();
            CategoryStats {
                category,
                card_count: cards.len(),
                total_reviews,
                correct_answers,
                accuracy: percent(correct_answers, total_reviews),
                average_difficulty: average_difficulty(&cards),
                last_reviewed: cards.iter().filter_map(|c| c.last_reviewed).max(),
            }
        })
        .collect();

    // stable sort keeps categories alphabetical within equal accuracy
    stats.sort_by(|a, b| b.accuracy.cmp(&a.accuracy));
    stats
}

fn average_difficulty(cards: &[&Flashcard]) -> &'static str {
    let scores: Vec<f64> = cards
        .iter()
        .filter_map(|c| c.difficulty)
        .map(|d| match d {
            Difficulty::Easy => 3.0,
            Difficulty::Good => 2.0,
            Difficulty::Hard => 1.0,
        })
        .collect();
    if scores.is_empty() {
        return "New";
    }

    let average = scores.iter().sum::<f64>() / scores.len() as f64;
    if average > 2.5 {
        "Easy"
    } else if average > 1.5 {
        "Good"
    } else {
        "Hard"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Accuracy over the latest sessions of a set of decks.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentPerformance {
    pub sessions: usize,
    pub average_accuracy: u32,
    pub trend: Trend,
}

/// Recent performance for the decks in `deck_ids`, using sessions in log order.
pub fn recent_performance(sessions: &[StudySession], deck_ids: &[&str]) -> RecentPerformance {
    let matching: Vec<&StudySession> = sessions
        .iter()
        .filter(|s| deck_ids.contains(&s.deck_id.as_str()))
        .collect();
    let recent = &matching[matching.len().saturating_sub(RECENT_SESSIONS)..];

    let average_accuracy = if recent.is_empty() {
        0
    } else {
        let total: u32 = recent.iter().map(|s| s.session_accuracy).sum();
        (f64::from(total) / recent.len() as f64).round() as u32
    };

    let trend = match (recent.first(), recent.last()) {
        (Some(first), Some(last)) if recent.len() >= 2 => {
            if last.session_accuracy > first.session_accuracy {
                Trend::Up
            } else {
                Trend::Down
            }
        }
        _ => Trend::Stable,
    };

    RecentPerformance {
        sessions: recent.len(),
        average_accuracy,
        trend,
    }
}

/// Review record of a single card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardBreakdown {
    pub id: String,
    pub question: String,
    pub review_count: u32,
    pub accuracy: u32,
    pub trend: Trend,
}

/// Per-card accuracy and trend, in deck order, for cards matching `search`.
///
/// The search is a case-insensitive substring match on question, answer and
/// categories. A blank search matches every card.
pub fn card_breakdown<'a>(cards: impl IntoIterator<Item = &'a Flashcard>, search: &str) -> Vec<CardBreakdown> {
    let term = search.trim().to_lowercase();
    cards
        .into_iter()
        .filter(|card| term.is_empty() || matches_search(card, &term))
        .map(|card| CardBreakdown {
            id: card.id.clone(),
            question: card.question.clone(),
            review_count: card.review_count,
            accuracy: percent(card.correct_count, card.review_count),
            trend: match card.correct_count.cmp(&card.incorrect_count) {
                Ordering::Greater => Trend::Up,
                Ordering::Less => Trend::Down,
                Ordering::Equal => Trend::Stable,
            },
        })
        .collect()
}

fn matches_search(card: &Flashcard, term: &str) -> bool {
    card.question.to_lowercase().contains(term)
        || card.answer.to_lowercase().contains(term)
        || card.categories.iter().any(|c| c.to_lowercase().contains(term))
}
