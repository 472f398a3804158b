//! Error types.

/// Errors raised while turning CSV text into a deck.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("CSV must contain at least a header row and one data row")]
    MissingRows,
    #[error("CSV must contain \"question\" and \"answer\" columns (or \"front\" and \"back\")")]
    MissingColumns,
    #[error("No valid cards found in CSV data")]
    NoCards,
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A name that does not match any known value of its kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseValueError {
    kind: &'static str,
    value: String,
}

impl ParseValueError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
