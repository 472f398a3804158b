//! Data models for flashcards, decks and study history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::grader::Outcome;
use crate::error::ParseValueError;
use crate::scheduler::Scheduler;

/// Self-rated difficulty of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Hard,
    Good,
    Easy,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Hard, Self::Good, Self::Easy];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hard => "Hard",
            Self::Good => "Good",
            Self::Easy => "Easy",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hard" => Ok(Self::Hard),
            "good" => Ok(Self::Good),
            "easy" => Ok(Self::Easy),
            _ => Err(ParseValueError::new("rating", s)),
        }
    }
}

/// Mastery level of a card: its last rating, or `Ungraded` if never reviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MasteryLevel {
    Ungraded,
    Easy,
    Good,
    Hard,
}

impl MasteryLevel {
    pub const ALL: [MasteryLevel; 4] = [Self::Ungraded, Self::Easy, Self::Good, Self::Hard];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ungraded => "Ungraded",
            Self::Easy => "Easy",
            Self::Good => "Good",
            Self::Hard => "Hard",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Ungraded => "Cards never studied",
            Self::Easy => "Last marked as easy",
            Self::Good => "Last marked as good",
            Self::Hard => "Last marked as hard",
        }
    }
}

impl From<Option<Difficulty>> for MasteryLevel {
    fn from(difficulty: Option<Difficulty>) -> Self {
        match difficulty {
            None => Self::Ungraded,
            Some(Difficulty::Easy) => Self::Easy,
            Some(Difficulty::Good) => Self::Good,
            Some(Difficulty::Hard) => Self::Hard,
        }
    }
}

impl fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MasteryLevel {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ungraded" | "new" => Ok(Self::Ungraded),
            "easy" => Ok(Self::Easy),
            "good" => Ok(Self::Good),
            "hard" => Ok(Self::Hard),
            _ => Err(ParseValueError::new("mastery level", s)),
        }
    }
}

/// A category a card belongs to for filtering purposes.
///
/// Cards with no labels fall into `Uncategorized`, which never collides with
/// a real label that happens to be spelled "Uncategorized".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Explicit(String),
    Uncategorized,
}

impl Category {
    pub fn explicit(name: impl Into<String>) -> Self {
        Self::Explicit(name.into())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(name) => f.write_str(name),
            Self::Uncategorized => f.write_str("Uncategorized"),
        }
    }
}

/// A single flashcard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub categories: Vec<String>,

    // Review state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub incorrect_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review: Option<DateTime<Local>>,

    pub created_at: DateTime<Local>,
}

impl Flashcard {
    pub fn new(question: String, answer: String, categories: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string()[..8].to_string(),
            question,
            answer,
            categories,
            difficulty: None,
            review_count: 0,
            correct_count: 0,
            incorrect_count: 0,
            last_reviewed: None,
            next_review: None,
            created_at: Local::now(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.last_reviewed.is_none()
    }

    /// Due once `next_review` has been reached. Never-reviewed cards are not due.
    pub fn is_due_at(&self, now: DateTime<Local>) -> bool {
        self.next_review.is_some_and(|next| next <= now)
    }

    pub fn is_mastered(&self) -> bool {
        self.correct_count >= 3 && self.correct_count > self.incorrect_count
    }

    pub fn mastery(&self) -> MasteryLevel {
        MasteryLevel::from(self.difficulty)
    }

    /// Category labels used for filtering; an empty label set maps to `Uncategorized`.
    pub fn category_labels(&self) -> Vec<Category> {
        if self.categories.is_empty() {
            vec![Category::Uncategorized]
        } else {
            self.categories.iter().cloned().map(Category::Explicit).collect()
        }
    }

    /// Clear all review state, as if the card had just been created.
    pub fn reset_progress(&mut self) {
        self.difficulty = None;
        self.review_count = 0;
        self.correct_count = 0;
        self.incorrect_count = 0;
        self.last_reviewed = None;
        self.next_review = None;
    }
}

/// Replacement values for a card; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardEdit {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub categories: Option<Vec<String>>,
}

/// Aggregate review statistics stored on a deck.
///
/// Always derived from the cards by [`Deck::recompute_stats`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckStats {
    pub total_reviews: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    /// Whole percent, 0-100.
    pub average_accuracy: u32,
}

/// Card counts for listing a deck.
#[derive(Debug, Default, PartialEq)]
pub struct DeckOverview {
    pub total_cards: usize,
    pub new_cards: usize,
    pub due_cards: usize,
    pub learning_cards: usize,
    pub mastered_cards: usize,
}

/// A collection of flashcards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cards: Vec<Flashcard>,
    pub created_at: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_studied: Option<DateTime<Local>>,
    #[serde(default)]
    pub total_study_sessions: u32,
    #[serde(default)]
    pub stats: DeckStats,
}

impl Deck {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string()[..8].to_string(),
            name,
            description: String::new(),
            cards: Vec::new(),
            created_at: Local::now(),
            last_studied: None,
            total_study_sessions: 0,
            stats: DeckStats::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn add_card(&mut self, question: String, answer: String, categories: Vec<String>) -> &Flashcard {
        self.cards.push(Flashcard::new(question, answer, categories));
        self.recompute_stats();
        &self.cards[self.cards.len() - 1]
    }

    /// Change a card's text or categories, keeping its review history.
    ///
    /// Returns `false` when no card with `card_id` exists.
    pub fn edit_card(&mut self, card_id: &str, edit: CardEdit) -> bool {
        let Some(card) = self.cards.iter_mut().find(|c| c.id == card_id) else {
            return false;
        };
        if let Some(question) = edit.question {
            card.question = question;
        }
        if let Some(answer) = edit.answer {
            card.answer = answer;
        }
        if let Some(categories) = edit.categories {
            card.categories = categories;
        }
        self.recompute_stats();
        true
    }

    /// Remove a card; its reviews no longer count toward the deck stats.
    pub fn remove_card(&mut self, card_id: &str) -> Option<Flashcard> {
        let index = self.cards.iter().position(|c| c.id == card_id)?;
        let card = self.cards.remove(index);
        self.recompute_stats();
        Some(card)
    }

    pub fn card(&self, card_id: &str) -> Option<&Flashcard> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    /// Grade a card and refresh the deck aggregates.
    ///
    /// Returns `None` when no card with `card_id` exists.
    pub fn record_review(
        &mut self,
        scheduler: &Scheduler,
        card_id: &str,
        rating: Difficulty,
        now: DateTime<Local>,
    ) -> Option<Outcome> {
        let card = self.cards.iter_mut().find(|c| c.id == card_id)?;
        let outcome = scheduler.review_card(card, rating, now);
        self.recompute_stats();
        self.last_studied = Some(now);
        Some(outcome)
    }

    pub fn recompute_stats(&mut self) {
        let mut stats = DeckStats::default();
        for card in &self.cards {
            stats.total_reviews += card.review_count;
            stats.correct_answers += card.correct_count;
            stats.incorrect_answers += card.incorrect_count;
        }
        stats.average_accuracy = percent(stats.correct_answers, stats.total_reviews);
        self.stats = stats;
    }

    pub fn reset_progress(&mut self) {
        for card in &mut self.cards {
            card.reset_progress();
        }
        self.last_studied = None;
        self.total_study_sessions = 0;
        self.stats = DeckStats::default();
    }

    pub fn overview(&self, now: DateTime<Local>) -> DeckOverview {
        let mut overview = DeckOverview {
            total_cards: self.cards.len(),
            ..Default::default()
        };

        for card in &self.cards {
            if card.is_new() {
                overview.new_cards += 1;
            } else if card.is_mastered() {
                overview.mastered_cards += 1;
            } else {
                overview.learning_cards += 1;
            }

            if card.is_due_at(now) {
                overview.due_cards += 1;
            }
        }

        overview
    }
}

/// A finished (or saved-and-exited) study session. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub deck_id: String,
    pub start_time: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Local>>,
    pub cards_studied: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    /// Whole percent, 0-100.
    pub session_accuracy: u32,
}

/// Rounded whole percentage of `part` in `total`, 0 when `total` is 0.
pub fn percent(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(part) / f64::from(total) * 100.0).round() as u32
}
