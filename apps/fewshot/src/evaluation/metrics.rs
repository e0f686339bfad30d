//! Micro-averaged F1 over a fixed label set.
//!
//! For each label `l`: TP when prediction and truth are both `l`, FP when the
//! prediction is `l` and the truth is not, FN when the truth is `l` and the
//! prediction is not. Counts are summed across labels before computing
//! `F1 = 2TP / (2TP + FP + FN)`. A prediction outside the label set therefore
//! costs a false negative but never a false positive.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricError {
    #[error("Cannot score an empty prediction set")]
    Empty,

    #[error("Got {predictions} predictions but {truth} ground-truth labels")]
    LengthMismatch { predictions: usize, truth: usize },
}

/// Confusion counts for one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub label: String,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

pub fn class_counts<P, T>(
    predicted: &[P],
    truth: &[T],
    labels: &[&str],
) -> Result<Vec<ClassCounts>, MetricError>
where
    P: AsRef<str>,
    T: AsRef<str>,
{
    if predicted.len() != truth.len() {
        return Err(MetricError::LengthMismatch {
            predictions: predicted.len(),
            truth: truth.len(),
        });
    }
    if predicted.is_empty() {
        return Err(MetricError::Empty);
    }

    Ok(labels
        .iter()
        .map(|&label| {
            let mut counts = ClassCounts {
                label: label.to_string(),
                true_positives: 0,
                false_positives: 0,
                false_negatives: 0,
            };
            for (p, t) in predicted.iter().zip(truth) {
                match (p.as_ref() == label, t.as_ref() == label) {
                    (true, true) => counts.true_positives += 1,
                    (true, false) => counts.false_positives += 1,
                    (false, true) => counts.false_negatives += 1,
                    (false, false) => {}
                }
            }
            counts
        })
        .collect())
}

/// Micro-F1 in `[0, 1]`. Rejects empty and mismatched inputs.
pub fn micro_f1<P, T>(predicted: &[P], truth: &[T], labels: &[&str]) -> Result<f64, MetricError>
where
    P: AsRef<str>,
    T: AsRef<str>,
{
    let counts = class_counts(predicted, truth, labels)?;
    Ok(f1_from_counts(&counts))
}

fn f1_from_counts(counts: &[ClassCounts]) -> f64 {
    let tp: usize = counts.iter().map(|c| c.true_positives).sum();
    let fp: usize = counts.iter().map(|c| c.false_positives).sum();
    let fn_: usize = counts.iter().map(|c| c.false_negatives).sum();

    let denominator = 2 * tp + fp + fn_;
    if denominator == 0 {
        return 0.0;
    }
    (2 * tp) as f64 / denominator as f64
}
