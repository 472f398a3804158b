//! xcards - spaced repetition flashcards from the command line
//!
//! Builds prioritized study sessions from filtered decks and records graded
//! reviews with growing intervals.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use xcards::config::Config;
use xcards::engine::{self, filter, RecencyBucket, SelectionRequest, StudyOrder};
use xcards::models::{CardEdit, Category, Deck, Difficulty, MasteryLevel};
use xcards::report;
use xcards::stats::{self, AppStats, SessionTally};
use xcards::storage::DeckStorage;

// ══════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ══════════════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "xcards")]
#[command(author, version, about = "Spaced repetition flashcards", long_about = None)]
struct Args {
    /// Directory holding decks and study history
    #[arg(short, long)]
    decks_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List decks with due and mastery counts
    Decks,

    /// Import cards from a CSV file
    Import {
        csv: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Add the bundled General Knowledge deck
    Sample,

    /// Create an empty deck
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Delete a deck
    Delete { deck: String },

    /// Add a card to a deck
    Add {
        deck: String,
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
        #[arg(long = "category")]
        categories: Vec<String>,
    },

    /// Change a card's question, answer or categories
    Edit {
        deck: String,
        card: String,
        #[arg(long)]
        question: Option<String>,
        #[arg(long)]
        answer: Option<String>,
        /// Replace the card's categories (repeatable)
        #[arg(long = "category", conflicts_with = "clear_categories")]
        categories: Vec<String>,
        /// Remove every category from the card
        #[arg(long)]
        clear_categories: bool,
    },

    /// Remove a card from a deck
    Remove { deck: String, card: String },

    /// Per-card accuracy and trend
    Cards {
        deck: String,
        /// Only cards whose question, answer or categories contain this text
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Build a study session from a deck
    Session {
        deck: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Recency buckets to keep: fresh, familiar, fuzzy, forgotten
        #[arg(long)]
        recency: Vec<RecencyBucket>,
        /// Mastery levels to keep: ungraded, easy, good, hard
        #[arg(long)]
        mastery: Vec<MasteryLevel>,
        #[arg(long, default_value_t = StudyOrder::Priority)]
        order: StudyOrder,
        /// Session size for priority order
        #[arg(long)]
        limit: Option<usize>,
        /// Seed for tie-breaking and shuffling
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Record ratings as CARD_ID=hard|good|easy
    Review {
        deck: String,
        #[arg(required = true, value_parser = parse_review)]
        ratings: Vec<(String, Difficulty)>,
    },

    /// Show how long ago cards were reviewed
    Recency {
        deck: String,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show overall, category and recent statistics
    Stats { decks: Vec<String> },

    /// Clear all review progress and study history
    Reset,

    /// Export decks and history to a backup file
    Export { path: Option<PathBuf> },

    /// Restore decks and history from a backup file
    Restore { path: PathBuf },

    /// Show or change settings
    Config {
        #[arg(long)]
        session_size: Option<usize>,
        #[arg(long)]
        max_interval_days: Option<i64>,
    },
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Categories to keep (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,
    /// Keep cards without any category
    #[arg(long)]
    uncategorized: bool,
}

impl FilterArgs {
    fn apply(&self, request: SelectionRequest) -> SelectionRequest {
        if self.categories.is_empty() && !self.uncategorized {
            return request;
        }
        let mut categories: Vec<Category> = self.categories.iter().map(Category::explicit).collect();
        if self.uncategorized {
            categories.push(Category::Uncategorized);
        }
        request.with_categories(categories)
    }
}

fn parse_review(s: &str) -> Result<(String, Difficulty), String> {
    let (id, rating) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CARD_ID=RATING, got {:?}", s))?;
    let rating = rating.parse::<Difficulty>().map_err(|e| e.to_string())?;
    Ok((id.trim().to_string(), rating))
}

// ══════════════════════════════════════════════════════════════════════════
// Main Entry Point
// ══════════════════════════════════════════════════════════════════════════

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = Config::load()?;

    // Determine data directory
    let root = args
        .decks_dir
        .or_else(|| config.decks_dir.clone())
        .unwrap_or_else(DeckStorage::default_path);
    let storage = DeckStorage::new(root)?;

    match args.command {
        Command::Decks => {
            let now = Local::now();
            for deck in storage.load_all_decks()? {
                println!("{}", report::deck_line(&deck, now));
            }
        }
        Command::Import { csv, name, description } => {
            let deck = storage.import_csv(&csv, &name, &description)?;
            storage.save_deck(&deck)?;
            println!("✓ Imported {} cards into '{}' ({})", deck.cards.len(), deck.name, deck.id);
        }
        Command::Sample => {
            let deck = xcards::storage::sample_deck()?;
            storage.save_deck(&deck)?;
            println!("✓ Added '{}' with {} cards ({})", deck.name, deck.cards.len(), deck.id);
        }
        Command::Create { name, description } => {
            let deck = Deck::new(name).with_description(description);
            storage.save_deck(&deck)?;
            println!("✓ Created '{}' ({})", deck.name, deck.id);
        }
        Command::Delete { deck } => {
            let deck = find_deck(&storage, &deck)?;
            storage.delete_deck(&deck.id)?;
            println!("✓ Deleted '{}'", deck.name);
        }
        Command::Add {
            deck,
            question,
            answer,
            categories,
        } => {
            let mut deck = find_deck(&storage, &deck)?;
            let card_id = deck.add_card(question, answer, categories).id.clone();
            storage.save_deck(&deck)?;
            println!("✓ Added card {} to '{}'", card_id, deck.name);
        }
        Command::Edit {
            deck,
            card,
            question,
            answer,
            categories,
            clear_categories,
        } => {
            let mut deck = find_deck(&storage, &deck)?;
            let categories = if clear_categories {
                Some(Vec::new())
            } else if categories.is_empty() {
                None
            } else {
                Some(categories)
            };
            let edit = CardEdit {
                question,
                answer,
                categories,
            };
            if !deck.edit_card(&card, edit) {
                bail!("No card {:?} in '{}'", card, deck.name);
            }
            storage.save_deck(&deck)?;
            println!("✓ Updated card {}", card);
        }
        Command::Remove { deck, card } => {
            let mut deck = find_deck(&storage, &deck)?;
            let Some(removed) = deck.remove_card(&card) else {
                bail!("No card {:?} in '{}'", card, deck.name);
            };
            storage.save_deck(&deck)?;
            println!("✓ Removed {:?}", removed.question);
        }
        Command::Cards { deck, search } => {
            let deck = find_deck(&storage, &deck)?;
            let breakdown = stats::card_breakdown(&deck.cards, &search);
            if breakdown.is_empty() {
                println!("No cards match {:?}", search);
            }
            for line in report::card_lines(&breakdown) {
                println!("{}", line);
            }
        }
        Command::Session {
            deck,
            filters,
            recency,
            mastery,
            order,
            limit,
            seed,
        } => {
            let deck = find_deck(&storage, &deck)?;
            let now = Local::now();

            let mut request = filters.apply(SelectionRequest::everything(&deck.cards, now));
            if !recency.is_empty() {
                request = request.with_recency(recency);
            }
            if !mastery.is_empty() {
                request = request.with_mastery(mastery);
            }

            let pool = engine::apply_filters(&deck.cards, &request);
            if pool.is_empty() {
                println!("No cards match these filters");
                return Ok(());
            }

            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let limit = limit.unwrap_or(config.session_size);
            let session = engine::arrange(&pool.cards, order, now, limit, &mut rng);
            info!(deck = %deck.id, %order, cards = session.len(), "built session");

            println!("{} of {} matching cards ({} order)", session.len(), pool.cards.len(), order);
            for line in report::session_lines(&session, &config.scheduler()) {
                println!("{}", line);
            }
        }
        Command::Review { deck, ratings } => {
            let mut deck = find_deck(&storage, &deck)?;
            review(&storage, &config, &mut deck, &ratings)?;
        }
        Command::Recency { deck, filters } => {
            let deck = find_deck(&storage, &deck)?;
            let request = filters.apply(SelectionRequest::everything(&deck.cards, Local::now()));
            let pool = engine::apply_filters(&deck.cards, &request);

            println!("{} cards in selected categories", pool.category_matches);
            for line in report::recency_lines(&pool.recency) {
                println!("{}", line);
            }
            let in_category = deck
                .cards
                .iter()
                .filter(|card| filter::matches_category(card, &request.categories));
            for line in report::mastery_lines(&filter::mastery_counts(in_category)) {
                println!("{}", line);
            }
        }
        Command::Stats { decks } => {
            let all_decks = storage.load_all_decks()?;
            let sessions = storage.load_sessions()?;

            let selected: Vec<&Deck> = if decks.is_empty() {
                all_decks.iter().collect()
            } else {
                let mut selected = Vec::new();
                for key in &decks {
                    match all_decks.iter().find(|d| d.id == *key || d.name.eq_ignore_ascii_case(key)) {
                        Some(deck) => selected.push(deck),
                        None => bail!("No deck named {:?}", key),
                    }
                }
                selected
            };

            let overall = AppStats::calculate(&all_decks, &sessions, Local::now().date_naive());
            for line in report::app_stats_lines(&overall) {
                println!("{}", line);
            }
            println!();
            let cards = selected.iter().flat_map(|d| d.cards.iter());
            for line in report::category_lines(&stats::category_stats(cards)) {
                println!("{}", line);
            }
            println!();
            let ids: Vec<&str> = selected.iter().map(|d| d.id.as_str()).collect();
            println!("{}", report::recent_line(&stats::recent_performance(&sessions, &ids)));
        }
        Command::Reset => {
            let count = storage.reset_statistics()?;
            println!("✓ Reset progress on {} decks", count);
        }
        Command::Export { path } => {
            let path = path.unwrap_or_else(DeckStorage::default_backup_path);
            let count = storage.export_backup(&path)?;
            println!("✓ Exported {} decks to {}", count, path.display());
        }
        Command::Restore { path } => {
            let (imported, skipped) = storage.import_backup(&path)?;
            println!("✓ Restored {} decks ({} already present)", imported, skipped);
        }
        Command::Config {
            session_size,
            max_interval_days,
        } => {
            let mut config = config;
            if session_size.is_some() || max_interval_days.is_some() {
                if let Some(size) = session_size {
                    config.session_size = size;
                }
                if let Some(days) = max_interval_days {
                    config.max_interval_days = days;
                }
                config.save()?;
                println!("✓ Saved {}", Config::default_path().display());
            }
            println!("session_size = {}", config.session_size);
            println!(
                "max_interval_days = {}",
                config.scheduler().max_interval_days()
            );
        }
    }

    Ok(())
}

fn find_deck(storage: &DeckStorage, key: &str) -> Result<Deck> {
    storage
        .find_deck(key)?
        .with_context(|| format!("No deck named {:?}", key))
}

/// Grade each listed card, save the deck and log one study session.
fn review(storage: &DeckStorage, config: &Config, deck: &mut Deck, ratings: &[(String, Difficulty)]) -> Result<()> {
    let scheduler = config.scheduler();
    let started = Local::now();
    let mut tally = SessionTally::new(deck.id.clone(), started);

    for (card_id, rating) in ratings {
        let now = Local::now();
        match deck.record_review(&scheduler, card_id, *rating, now) {
            Some(outcome) => {
                tally.record(outcome);
                if let Some(card) = deck.card(card_id) {
                    println!("{}", report::review_line(card, outcome));
                }
            }
            None => warn!(deck = %deck.id, card = %card_id, "no such card, skipped"),
        }
    }

    let Some(session) = tally.finish(Local::now()) else {
        bail!("None of the given cards are in '{}'", deck.name);
    };

    storage.record_session(deck, &session)?;
    println!(
        "✓ Reviewed {} cards, {}% correct",
        session.cards_studied, session.session_accuracy
    );
    Ok(())
}
