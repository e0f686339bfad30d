//! Predictor/evaluator — one completion request per gold review, strictly in order.
//!
//! Each example yields `Ok(label)` or `Err(reason)`. Failures are excluded from
//! both the prediction and truth lists and counted as skipped; nothing is retried.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::corpus::{Review, Sentiment};
use crate::errors::AppError;
use crate::evaluation::metrics::{class_counts, micro_f1, ClassCounts, MetricError};
use crate::fewshot::prompt::FewShotPrompt;
use crate::llm_client::{ChatCompletion, CompletionOptions, LlmError};

/// The label set the metric is computed over.
pub const LABELS: [&str; 2] = [Sentiment::Positive.as_str(), Sentiment::Negative.as_str()];

/// Decoding settings for every prediction call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvalSettings {
    pub temperature: f32,
    /// Enough for a single `positive`/`negative` answer.
    pub max_tokens: u32,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 2,
        }
    }
}

impl From<EvalSettings> for CompletionOptions {
    fn from(settings: EvalSettings) -> Self {
        CompletionOptions {
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionRecord {
    pub predicted_label: String,
    pub true_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedExample {
    /// Position in the gold set.
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalOutcome {
    pub attempted: usize,
    pub predictions: Vec<PredictionRecord>,
    pub skipped: Vec<SkippedExample>,
    /// `None` when every call failed and there was nothing to score.
    pub micro_f1: Option<f64>,
    pub class_counts: Vec<ClassCounts>,
}

/// Trims and lowercases a raw completion.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Classifies one review: base prompt + review as the final user turn.
pub async fn predict(
    llm: &dyn ChatCompletion,
    prompt: &FewShotPrompt,
    review: &Review,
    settings: EvalSettings,
) -> Result<String, LlmError> {
    let messages = prompt.with_query(&review.text);
    let raw = llm.complete(&messages, settings.into()).await?;
    Ok(normalize_label(&raw))
}

/// Runs every gold review through `predict` and scores the collected pairs.
pub async fn evaluate(
    llm: &dyn ChatCompletion,
    prompt: &FewShotPrompt,
    gold: &[Review],
    settings: EvalSettings,
) -> Result<EvalOutcome, AppError> {
    let mut predictions = Vec::with_capacity(gold.len());
    let mut skipped = Vec::new();

    for (index, review) in gold.iter().enumerate() {
        let true_label = review.sentiment().as_str();
        match predict(llm, prompt, review, settings).await {
            Ok(predicted_label) => {
                debug!("Example {index}: predicted={predicted_label} actual={true_label}");
                predictions.push(PredictionRecord {
                    predicted_label,
                    true_label: true_label.to_string(),
                });
            }
            Err(e) => {
                warn!("Example {index} skipped: {e}");
                skipped.push(SkippedExample {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Scored {} of {} gold examples ({} skipped)",
        predictions.len(),
        gold.len(),
        skipped.len()
    );

    let predicted: Vec<&str> = predictions.iter().map(|p| p.predicted_label.as_str()).collect();
    let truth: Vec<&str> = predictions.iter().map(|p| p.true_label.as_str()).collect();

    let (score, counts) = match micro_f1(&predicted, &truth, &LABELS) {
        Ok(score) => (Some(score), class_counts(&predicted, &truth, &LABELS)?),
        Err(MetricError::Empty) => {
            warn!("No predictions collected; micro-F1 is undefined");
            (None, Vec::new())
        }
        Err(e) => return Err(e.into()),
    };

    Ok(EvalOutcome {
        attempted: gold.len(),
        predictions,
        skipped,
        micro_f1: score,
        class_counts: counts,
    })
}
