//! Spaced repetition scheduling and study-session selection for flashcard decks.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod report;
pub mod scheduler;
pub mod stats;
pub mod storage;

pub use models::{Category, Deck, Difficulty, Flashcard, MasteryLevel, StudySession};
pub use scheduler::Scheduler;
