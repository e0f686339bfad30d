//! Review corpus — loading, the `Review` row type, and the exemplar/gold split.
//!
//! Two sources produce the same rows:
//! - `hub`: Hugging Face datasets-server rows API (paginated).
//! - `local`: a JSONL file with one `{"text", "label"}` object per line.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

pub mod hub;
pub mod local;
pub mod split;

/// A train split smaller than this is unusual for the IMDB corpus and is logged.
pub const EXPECTED_TRAIN_ROWS: usize = 25_000;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Dataset API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Row {row} has label {label}; expected 0 or 1")]
    InvalidLabel { row: usize, label: i64 },

    #[error("Row {row} was truncated by the dataset server (cells: {cells:?})")]
    TruncatedRow { row: usize, cells: Vec<String> },

    #[error("Corpus is empty")]
    Empty,
}

// ────────────────────────────────────────────────────────────────────────────
// Row model
// ────────────────────────────────────────────────────────────────────────────

/// Human-readable class derived from the integer label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Positive,
}

impl Sentiment {
    pub const ALL: [Sentiment; 2] = [Sentiment::Positive, Sentiment::Negative];

    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labeled review. Immutable once loaded; `label` is always 0 or 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub text: String,
    pub label: u8,
}

impl Review {
    /// Validates the raw integer label. `row` is only used in the error.
    pub fn new(text: String, label: i64, row: usize) -> Result<Self, CorpusError> {
        match label {
            0 | 1 => Ok(Self {
                text,
                label: label as u8,
            }),
            other => Err(CorpusError::InvalidLabel { row, label: other }),
        }
    }

    pub fn sentiment(&self) -> Sentiment {
        Sentiment::from_label(self.label)
    }
}

/// Raw `{text, label}` row as it appears in both sources.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRow {
    pub text: String,
    pub label: i64,
}

// ────────────────────────────────────────────────────────────────────────────
// Source selection
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum CorpusSource {
    Hub {
        dataset: String,
        config: String,
        split: String,
    },
    Local(PathBuf),
}

impl fmt::Display for CorpusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorpusSource::Hub {
                dataset,
                config,
                split,
            } => write!(f, "hub:{dataset}/{config}[{split}]"),
            CorpusSource::Local(path) => write!(f, "local:{}", path.display()),
        }
    }
}

/// Loads every row of the selected source.
pub async fn load_corpus(source: &CorpusSource, config: &Config) -> Result<Vec<Review>, CorpusError> {
    let reviews = match source {
        CorpusSource::Hub {
            dataset,
            config: dataset_config,
            split,
        } => {
            info!("Loading {dataset}/{dataset_config} [{split}] from the dataset hub");
            let hub = hub::HubClient::new(config)?;
            hub.fetch_split(dataset, dataset_config, split).await?
        }
        CorpusSource::Local(path) => {
            info!("Loading corpus from {}", path.display());
            local::load_jsonl(path).await?
        }
    };

    if reviews.is_empty() {
        return Err(CorpusError::Empty);
    }

    if reviews.len() < EXPECTED_TRAIN_ROWS {
        warn!(
            "Corpus has {} rows; the full training split has {}",
            reviews.len(),
            EXPECTED_TRAIN_ROWS
        );
    }

    let positives = reviews.iter().filter(|r| r.label == 1).count();
    info!(
        "Loaded {} reviews ({} positive, {} negative)",
        reviews.len(),
        positives,
        reviews.len() - positives
    );

    Ok(reviews)
}
