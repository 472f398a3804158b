//! Storage module for saving and loading decks and study history.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::ImportError;
use crate::models::{Deck, Flashcard, StudySession};

/// Bundled deck: General Knowledge
const BUNDLED_GENERAL_KNOWLEDGE: &str = include_str!("../bundled_decks/general-knowledge.csv");

const SESSIONS_FILE: &str = "sessions.json";

/// Handles deck and session persistence.
///
/// Layout under the root directory: one `decks/<id>.json` per deck and a
/// single append-only `sessions.json` history log.
pub struct DeckStorage {
    root: PathBuf,
}

impl DeckStorage {
    pub fn new(root: PathBuf) -> Result<Self> {
        let storage = Self { root };
        fs::create_dir_all(storage.decks_dir())
            .with_context(|| format!("Failed to create decks directory: {:?}", storage.decks_dir()))?;

        storage.install_bundled_decks();
        Ok(storage)
    }

    /// Install bundled decks if the user has none yet.
    fn install_bundled_decks(&self) {
        if let Ok(entries) = fs::read_dir(self.decks_dir()) {
            if entries
                .filter_map(|e| e.ok())
                .any(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            {
                return;
            }
        }

        match sample_deck() {
            Ok(deck) => {
                if let Err(e) = self.save_deck(&deck) {
                    warn!("Failed to install bundled deck: {}", e);
                }
            }
            Err(e) => warn!("Bundled deck is invalid: {}", e),
        }
    }

    /// Get default storage location.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("xcards")
    }

    fn decks_dir(&self) -> PathBuf {
        self.root.join("decks")
    }

    fn deck_path(&self, deck_id: &str) -> PathBuf {
        self.decks_dir().join(format!("{}.json", deck_id))
    }

    fn sessions_path(&self) -> PathBuf {
        self.root.join(SESSIONS_FILE)
    }

    /// Save a deck to disk.
    pub fn save_deck(&self, deck: &Deck) -> Result<PathBuf> {
        let path = self.deck_path(&deck.id);
        let json = serde_json::to_string_pretty(deck)?;
        fs::write(&path, json).with_context(|| format!("Failed to write deck file: {:?}", path))?;
        debug!(deck = %deck.id, cards = deck.cards.len(), "saved deck");
        Ok(path)
    }

    /// Load a deck from disk.
    pub fn load_deck(&self, deck_id: &str) -> Result<Option<Deck>> {
        let path = self.deck_path(deck_id);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)?;
        let deck: Deck = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse deck file: {:?}", path))?;
        Ok(Some(deck))
    }

    /// Find a deck by id, or failing that by case-insensitive name.
    pub fn find_deck(&self, key: &str) -> Result<Option<Deck>> {
        if let Some(deck) = self.load_deck(key)? {
            return Ok(Some(deck));
        }

        let wanted = key.to_lowercase();
        match self.list_decks()?.into_iter().find(|d| d.name.to_lowercase() == wanted) {
            Some(info) => self.load_deck(&info.id),
            None => Ok(None),
        }
    }

    /// Delete a deck file. Its past sessions stay in the history log.
    pub fn delete_deck(&self, deck_id: &str) -> Result<bool> {
        let path = self.deck_path(deck_id);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to delete deck file: {:?}", path))?;
            info!(deck = %deck_id, "deleted deck");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Load every readable deck, sorted by name.
    pub fn load_all_decks(&self) -> Result<Vec<Deck>> {
        let mut decks = Vec::new();

        for entry in fs::read_dir(self.decks_dir())? {
            let path = entry?.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|json| serde_json::from_str::<Deck>(&json).map_err(anyhow::Error::from));
            match parsed {
                Ok(deck) => decks.push(deck),
                Err(e) => warn!("Skipping unreadable deck file {:?}: {}", path, e),
            }
        }

        decks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(decks)
    }

    /// List all available decks.
    pub fn list_decks(&self) -> Result<Vec<DeckInfo>> {
        Ok(self
            .load_all_decks()?
            .into_iter()
            .map(|deck| DeckInfo {
                id: deck.id,
                name: deck.name,
                card_count: deck.cards.len(),
                description: deck.description,
            })
            .collect())
    }

    /// Load the study history, oldest first.
    pub fn load_sessions(&self) -> Result<Vec<StudySession>> {
        let path = self.sessions_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&path)?;
        let sessions = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse session history: {:?}", path))?;
        Ok(sessions)
    }

    /// Append a finished session to the history log.
    pub fn append_session(&self, session: &StudySession) -> Result<()> {
        let mut sessions = self.load_sessions()?;
        sessions.push(session.clone());
        self.write_sessions(&sessions)
    }

    /// Log a finished session, then count it on the deck and save the deck.
    ///
    /// The deck is left untouched if the log cannot be written.
    pub fn record_session(&self, deck: &mut Deck, session: &StudySession) -> Result<()> {
        self.append_session(session)?;
        deck.total_study_sessions += 1;
        self.save_deck(deck)?;
        Ok(())
    }

    fn write_sessions(&self, sessions: &[StudySession]) -> Result<()> {
        let path = self.sessions_path();
        let json = serde_json::to_string_pretty(sessions)?;
        fs::write(&path, json).with_context(|| format!("Failed to write session history: {:?}", path))?;
        Ok(())
    }

    /// Import cards from a CSV file.
    pub fn import_csv(&self, csv_path: &Path, deck_name: &str, description: &str) -> Result<Deck> {
        let deck = read_csv(csv_path, deck_name, description)
            .with_context(|| format!("Failed to import CSV file: {:?}", csv_path))?;
        info!(deck = %deck.name, cards = deck.cards.len(), "imported CSV");
        Ok(deck)
    }

    /// Clear review progress on every deck and empty the session log.
    /// Returns the number of decks reset.
    pub fn reset_statistics(&self) -> Result<usize> {
        let decks = self.load_all_decks()?;
        for mut deck in decks.iter().cloned() {
            deck.reset_progress();
            self.save_deck(&deck)?;
        }
        self.write_sessions(&[])?;
        info!(decks = decks.len(), "reset all statistics");
        Ok(decks.len())
    }
}

/// Build a deck from CSV text with a header row.
///
/// Recognized columns: `question`/`front`, `answer`/`back`, and optionally
/// `categories`/`category`/`tags` with labels separated by `;` or `|`.
pub fn parse_csv(text: &str, name: &str, description: &str) -> std::result::Result<Deck, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.trim().as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_lowercase()).collect();
    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    if records.is_empty() {
        return Err(ImportError::MissingRows);
    }

    let column = |names: &[&str]| headers.iter().position(|h| names.iter().any(|n| h.contains(n)));
    let (Some(question_idx), Some(answer_idx)) = (column(&["question", "front"]), column(&["answer", "back"]))
    else {
        return Err(ImportError::MissingColumns);
    };
    let categories_idx = column(&["categor", "tags"]);

    let name = if name.trim().is_empty() { "Imported Deck" } else { name.trim() };
    let mut deck = Deck::new(name.to_string());
    deck.description = if description.trim().is_empty() {
        "Imported from CSV".to_string()
    } else {
        description.trim().to_string()
    };

    for record in &records {
        let (Some(question), Some(answer)) = (record.get(question_idx), record.get(answer_idx)) else {
            continue;
        };
        if question.is_empty() || answer.is_empty() {
            continue;
        }

        let categories = categories_idx
            .and_then(|idx| record.get(idx))
            .map(|field| {
                field
                    .split([';', '|'])
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        deck.cards.push(Flashcard::new(question.to_string(), answer.to_string(), categories));
    }

    if deck.cards.is_empty() {
        return Err(ImportError::NoCards);
    }
    Ok(deck)
}

/// Read and parse a CSV file into a new deck.
pub fn read_csv(path: &Path, name: &str, description: &str) -> std::result::Result<Deck, ImportError> {
    let text = fs::read_to_string(path)?;
    parse_csv(&text, name, description)
}

/// The bundled "General Knowledge" deck with fresh review state.
pub fn sample_deck() -> std::result::Result<Deck, ImportError> {
    parse_csv(
        BUNDLED_GENERAL_KNOWLEDGE,
        "General Knowledge",
        "Comprehensive collection covering History, Science, Geography, Literature, Math, Art, and Music",
    )
}

/// Summary info for a deck.
#[derive(Debug, Clone)]
pub struct DeckInfo {
    pub id: String,
    pub name: String,
    pub card_count: usize,
    pub description: String,
}

/// Backup format containing all decks and the study history.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Backup {
    pub version: u32,
    pub created_at: chrono::DateTime<chrono::Local>,
    pub decks: Vec<Deck>,
    #[serde(default)]
    pub sessions: Vec<StudySession>,
}

impl DeckStorage {
    /// Export all decks and sessions to a backup file.
    pub fn export_backup(&self, path: &Path) -> Result<usize> {
        let backup = Backup {
            version: 2,
            created_at: chrono::Local::now(),
            decks: self.load_all_decks()?,
            sessions: self.load_sessions()?,
        };

        let json = serde_json::to_string_pretty(&backup)?;
        fs::write(path, json).with_context(|| format!("Failed to write backup: {:?}", path))?;

        Ok(backup.decks.len())
    }

    /// Import decks from a backup file, skipping decks that already exist.
    /// Sessions belonging to imported decks are appended to the history.
    /// Returns (imported_count, skipped_count).
    pub fn import_backup(&self, path: &Path) -> Result<(usize, usize)> {
        let json = fs::read_to_string(path).with_context(|| format!("Failed to read backup: {:?}", path))?;
        let backup: Backup = serde_json::from_str(&json).with_context(|| "Failed to parse backup file")?;

        let existing_ids: std::collections::HashSet<String> =
            self.list_decks()?.into_iter().map(|d| d.id).collect();

        let mut imported_ids = Vec::new();
        let mut skipped = 0;

        for deck in backup.decks {
            if existing_ids.contains(&deck.id) {
                skipped += 1;
            } else {
                self.save_deck(&deck)?;
                imported_ids.push(deck.id);
            }
        }

        let restored: Vec<StudySession> = backup
            .sessions
            .into_iter()
            .filter(|s| imported_ids.contains(&s.deck_id))
            .collect();
        if !restored.is_empty() {
            let mut sessions = self.load_sessions()?;
            sessions.extend(restored);
            self.write_sessions(&sessions)?;
        }

        Ok((imported_ids.len(), skipped))
    }

    /// Get default backup path.
    pub fn default_backup_path() -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(format!("xcards_backup_{}.json", timestamp))
    }
}
