//! Balanced exemplar sampling.
//!
//! `create_examples` draws `n` positive and `n` negative reviews without
//! replacement and reshuffles the combined set, so the prompt never lists
//! one class as a block. The RNG is passed in; callers own reproducibility.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::corpus::{Review, Sentiment};

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Requested {requested} {sentiment} examples but the pool only has {available}")]
    InsufficientClass {
        sentiment: Sentiment,
        requested: usize,
        available: usize,
    },

    #[error("Requested a gold set of {requested} but only {available} held-out rows exist")]
    GoldTooLarge { requested: usize, available: usize },

    #[error("Train fraction must be strictly between 0 and 1, got {0}")]
    InvalidFraction(f64),

    #[error("Splitting {rows} rows at {train_fraction} leaves one side empty")]
    EmptyPartition { rows: usize, train_fraction: f64 },
}

/// Returns exactly `2 * per_class` reviews: `per_class` of each sentiment, shuffled.
pub fn create_examples<R: Rng + ?Sized>(
    pool: &[Review],
    per_class: usize,
    rng: &mut R,
) -> Result<Vec<Review>, SamplingError> {
    // Validate both classes before touching the RNG or allocating.
    let mut by_class = Vec::with_capacity(Sentiment::ALL.len());
    for sentiment in Sentiment::ALL {
        let candidates: Vec<&Review> = pool
            .iter()
            .filter(|r| r.sentiment() == sentiment)
            .collect();

        if candidates.len() < per_class {
            return Err(SamplingError::InsufficientClass {
                sentiment,
                requested: per_class,
                available: candidates.len(),
            });
        }
        by_class.push(candidates);
    }

    let mut examples = Vec::new();
    for candidates in by_class {
        examples.extend(
            candidates
                .choose_multiple(&mut *rng, per_class)
                .map(|r| (*r).clone()),
        );
    }

    examples.shuffle(rng);
    Ok(examples)
}
