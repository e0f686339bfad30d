use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::evaluator::{EvalOutcome, EvalSettings, PredictionRecord, SkippedExample};
use crate::evaluation::metrics::ClassCounts;

/// Seeds that reproduce a run's split, gold set and exemplar draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSeeds {
    pub split: u64,
    pub gold: u64,
    pub sample: u64,
}

/// Everything a finished run produced, serialisable for `--report`.
#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub model: String,
    pub corpus: String,
    pub seeds: RunSeeds,
    pub settings: EvalSettings,
    pub exemplar_count: usize,
    /// Diagnostic estimate for the base prompt, before the query turn.
    pub prompt_tokens: usize,
    pub attempted: usize,
    pub scored: usize,
    pub skipped: usize,
    pub micro_f1: Option<f64>,
    pub class_counts: Vec<ClassCounts>,
    pub skipped_examples: Vec<SkippedExample>,
    pub predictions: Vec<PredictionRecord>,
}

/// Run metadata that does not come out of the evaluator.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub model: String,
    pub corpus: String,
    pub seeds: RunSeeds,
    pub settings: EvalSettings,
    pub exemplar_count: usize,
    pub prompt_tokens: usize,
}

impl EvalReport {
    pub fn new(context: RunContext, outcome: EvalOutcome) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            model: context.model,
            corpus: context.corpus,
            seeds: context.seeds,
            settings: context.settings,
            exemplar_count: context.exemplar_count,
            prompt_tokens: context.prompt_tokens,
            attempted: outcome.attempted,
            scored: outcome.predictions.len(),
            skipped: outcome.skipped.len(),
            micro_f1: outcome.micro_f1,
            class_counts: outcome.class_counts,
            skipped_examples: outcome.skipped,
            predictions: outcome.predictions,
        }
    }

    pub fn log_summary(&self) {
        match self.micro_f1 {
            Some(f1) => info!(
                "Run {}: model={} micro-F1={:.4} ({} scored, {} skipped, {} exemplars, ~{} prompt tokens)",
                self.run_id,
                self.model,
                f1,
                self.scored,
                self.skipped,
                self.exemplar_count,
                self.prompt_tokens
            ),
            None => info!(
                "Run {}: model={} produced no scorable predictions ({} skipped)",
                self.run_id, self.model, self.skipped
            ),
        }
        for counts in &self.class_counts {
            info!(
                "  {}: tp={} fp={} fn={}",
                counts.label, counts.true_positives, counts.false_positives, counts.false_negatives
            );
        }
    }

    /// Writes the report as pretty-printed JSON, replacing any existing file.
    pub async fn write_json(&self, path: &Path) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        info!("Report written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn context() -> RunContext {
        RunContext {
            model: "gpt-4o-mini".to_string(),
            corpus: "local:reviews.jsonl".to_string(),
            seeds: RunSeeds {
                split: 42,
                gold: 42,
                sample: 7,
            },
            settings: EvalSettings::default(),
            exemplar_count: 6,
            prompt_tokens: 512,
        }
    }

    fn outcome() -> EvalOutcome {
        EvalOutcome {
            attempted: 3,
            predictions: vec![
                PredictionRecord {
                    predicted_label: "positive".to_string(),
                    true_label: "positive".to_string(),
                },
                PredictionRecord {
                    predicted_label: "positive".to_string(),
                    true_label: "negative".to_string(),
                },
            ],
            skipped: vec![SkippedExample {
                index: 1,
                reason: "LLM returned empty content".to_string(),
            }],
            micro_f1: Some(0.5),
            class_counts: vec![],
        }
    }

    #[test]
    fn test_report_counts_come_from_outcome() {
        let report = EvalReport::new(context(), outcome());
        assert_eq!(report.attempted, 3);
        assert_eq!(report.scored, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.skipped_examples[0].index, 1);
        assert_eq!(report.micro_f1, Some(0.5));
    }

    #[tokio::test]
    async fn test_write_json_round_trips_key_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = EvalReport::new(context(), outcome());

        report.write_json(&path).await.unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["model"], "gpt-4o-mini");
        assert_eq!(written["seeds"]["sample"], 7);
        assert_eq!(written["settings"]["max_tokens"], 2);
        assert_eq!(written["predictions"].as_array().unwrap().len(), 2);
        assert_eq!(written["run_id"], report.run_id.to_string());
    }

    #[test]
    fn test_unscored_report_serializes_null_f1() {
        let mut empty = outcome();
        empty.predictions.clear();
        empty.micro_f1 = None;
        let report = EvalReport::new(context(), empty);
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["micro_f1"].is_null());
    }
}
