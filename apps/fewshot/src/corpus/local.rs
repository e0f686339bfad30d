use std::path::Path;

use crate::corpus::{CorpusError, RawRow, Review};

/// Reads a JSONL corpus: one `{"text": .., "label": 0|1}` object per line.
/// Blank lines are skipped; line numbers in errors (parse and label) are 1-based.
pub async fn load_jsonl(path: &Path) -> Result<Vec<Review>, CorpusError> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse_jsonl(&contents)
}

fn parse_jsonl(contents: &str) -> Result<Vec<Review>, CorpusError> {
    let mut reviews = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let raw: RawRow = serde_json::from_str(line).map_err(|source| CorpusError::Parse {
            line: idx + 1,
            source,
        })?;
        reviews.push(Review::new(raw.text, raw.label, idx + 1)?);
    }

    Ok(reviews)
}
