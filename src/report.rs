//! Plain-text rendering of decks, sessions and statistics for the CLI.

use chrono::{DateTime, Local};
use unicode_width::UnicodeWidthChar;

use crate::engine::{Outcome, RecencyGroup};
use crate::models::{Deck, Flashcard, MasteryLevel};
use crate::scheduler::Scheduler;
use crate::stats::{AppStats, CardBreakdown, CategoryStats, RecentPerformance, Trend};

const QUESTION_WIDTH: usize = 48;

/// Cut `text` to at most `max_width` terminal columns, ending in `…` if cut.
pub fn truncate(text: &str, max_width: usize) -> String {
    let width = |c: char| c.width().unwrap_or(1);
    if text.chars().map(width).sum::<usize>() <= max_width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = width(c);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

pub fn deck_line(deck: &Deck, now: DateTime<Local>) -> String {
    let overview = deck.overview(now);
    format!(
        "{:<8}  {}  ({} cards, {} due, {} new, {} mastered)",
        deck.id,
        deck.name,
        overview.total_cards,
        overview.due_cards,
        overview.new_cards,
        overview.mastered_cards
    )
}

/// One line per card: id, question and the interval each rating would give.
pub fn session_lines(cards: &[&Flashcard], scheduler: &Scheduler) -> Vec<String> {
    cards
        .iter()
        .map(|card| {
            let preview = scheduler
                .preview_intervals(card)
                .iter()
                .map(|(rating, interval)| format!("{} {}", rating.name().to_lowercase(), interval))
                .collect::<Vec<_>>()
                .join(" | ");
            format!(
                "{:<8}  {:<width$}  [{}]",
                card.id,
                truncate(&card.question, QUESTION_WIDTH),
                preview,
                width = QUESTION_WIDTH
            )
        })
        .collect()
}

pub fn review_line(card: &Flashcard, outcome: Outcome) -> String {
    let verdict = if outcome.is_correct { "correct" } else { "incorrect" };
    match card.next_review {
        Some(due) => format!("{:<8}  {:<9}  next review {}", card.id, verdict, due.format("%Y-%m-%d")),
        None => format!("{:<8}  {}", card.id, verdict),
    }
}

pub fn recency_lines(groups: &[RecencyGroup]) -> Vec<String> {
    groups
        .iter()
        .map(|g| format!("{:<10} {:>4}  {}", g.bucket.name(), g.count, g.description))
        .collect()
}

pub fn mastery_lines(counts: &std::collections::BTreeMap<MasteryLevel, usize>) -> Vec<String> {
    counts
        .iter()
        .map(|(level, count)| format!("{:<10} {:>4}  {}", level.name(), count, level.description()))
        .collect()
}

pub fn app_stats_lines(stats: &AppStats) -> Vec<String> {
    vec![
        format!("Decks:          {}", stats.total_decks),
        format!(
            "Cards:          {} ({} mastered, {} learning, {} new)",
            stats.total_cards, stats.mastered_cards, stats.learning_cards, stats.new_cards
        ),
        format!("Sessions:       {}", stats.total_study_sessions),
        format!(
            "Accuracy:       {}% ({}/{})",
            stats.accuracy_rate, stats.total_correct_answers, stats.total_answers
        ),
        format!(
            "Streak:         {} {} (best {})",
            stats.current_streak,
            if stats.current_streak == 1 { "day" } else { "days" },
            stats.best_streak
        ),
    ]
}

pub fn category_lines(stats: &[CategoryStats]) -> Vec<String> {
    stats
        .iter()
        .map(|s| {
            let last = s
                .last_reviewed
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "never".to_string());
            format!(
                "{:<20} {:>4} cards {:>4}% accuracy  {:<5} last {}",
                truncate(&s.category.to_string(), 20),
                s.card_count,
                s.accuracy,
                s.average_difficulty,
                last
            )
        })
        .collect()
}

pub fn card_lines(cards: &[CardBreakdown]) -> Vec<String> {
    cards
        .iter()
        .map(|c| {
            let trend = match c.trend {
                Trend::Up => "↑",
                Trend::Down => "↓",
                Trend::Stable => "-",
            };
            format!(
                "{:<8}  {:<width$}  {:>3} reviews {:>4}% {}",
                c.id,
                truncate(&c.question, QUESTION_WIDTH),
                c.review_count,
                c.accuracy,
                trend,
                width = QUESTION_WIDTH
            )
        })
        .collect()
}

pub fn recent_line(recent: &RecentPerformance) -> String {
    if recent.sessions == 0 {
        return "No sessions yet".to_string();
    }
    let trend = match recent.trend {
        Trend::Up => "improving",
        Trend::Down => "declining",
        Trend::Stable => "stable",
    };
    format!(
        "Last {} sessions: {}% average, {}",
        recent.sessions, recent.average_accuracy, trend
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grade;
    use crate::models::Difficulty;
    use chrono::TimeZone;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("a longer question", 8), "a longe…");
        // wide characters take two columns
        assert_eq!(truncate("日本語の質問", 7), "日本語…");
    }

    #[test]
    fn test_session_lines_show_previews() {
        let card = Flashcard::new("What is 2+2?".into(), "4".into(), vec![]);
        let lines = session_lines(&[&card], &Scheduler::new());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with(&card.id));
        assert!(lines[0].ends_with("[hard 1d | good 2d | easy 4d]"));
    }

    #[test]
    fn test_review_line() {
        let now = Local.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut card = Flashcard::new("Q".into(), "A".into(), vec![]);
        let outcome = Scheduler::new().review_card(&mut card, Difficulty::Good, now);
        assert!(review_line(&card, outcome).ends_with("correct    next review 2025-03-03"));
        assert!(review_line(&card, grade(Difficulty::Hard)).contains("incorrect"));
    }

    #[test]
    fn test_card_lines() {
        let line = CardBreakdown {
            id: "ab12cd34".into(),
            question: "What is the capital of Australia?".into(),
            review_count: 4,
            accuracy: 75,
            trend: Trend::Up,
        };
        let lines = card_lines(&[line]);
        assert!(lines[0].starts_with("ab12cd34  What is the capital of Australia?"));
        assert!(lines[0].ends_with("  4 reviews   75% ↑"));
    }

    #[test]
    fn test_recent_line() {
        let recent = RecentPerformance {
            sessions: 3,
            average_accuracy: 72,
            trend: Trend::Up,
        };
        assert_eq!(recent_line(&recent), "Last 3 sessions: 72% average, improving");
        let none = RecentPerformance {
            sessions: 0,
            average_accuracy: 0,
            trend: Trend::Stable,
        };
        assert_eq!(recent_line(&none), "No sessions yet");
    }
}
