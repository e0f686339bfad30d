//! Exemplar-pool / held-out split and seeded gold-set sampling.
//!
//! The gold set is drawn only from the held-out side, so it never overlaps
//! the rows the few-shot prompt is built from.

use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;

use crate::corpus::Review;
use crate::fewshot::sampler::SamplingError;

#[derive(Debug, Clone)]
pub struct CorpusSplit {
    /// Rows the few-shot exemplars are sampled from.
    pub exemplar_pool: Vec<Review>,
    /// Rows the gold set is sampled from.
    pub held_out: Vec<Review>,
}

/// Shuffles `reviews` with `seed` and cuts at `floor(len * train_fraction)`.
pub fn split_corpus(
    mut reviews: Vec<Review>,
    train_fraction: f64,
    seed: u64,
) -> Result<CorpusSplit, SamplingError> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(SamplingError::InvalidFraction(train_fraction));
    }

    let cut = (reviews.len() as f64 * train_fraction).floor() as usize;
    if cut == 0 || cut == reviews.len() {
        return Err(SamplingError::EmptyPartition {
            rows: reviews.len(),
            train_fraction,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    reviews.shuffle(&mut rng);
    let held_out = reviews.split_off(cut);

    Ok(CorpusSplit {
        exemplar_pool: reviews,
        held_out,
    })
}

/// Draws `size` distinct held-out rows in seeded random order.
/// Same seed and input ⇒ same rows in the same order.
pub fn sample_gold(held_out: &[Review], size: usize, seed: u64) -> Result<Vec<Review>, SamplingError> {
    if size > held_out.len() {
        return Err(SamplingError::GoldTooLarge {
            requested: size,
            available: held_out.len(),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    Ok(index::sample(&mut rng, held_out.len(), size)
        .into_iter()
        .map(|i| held_out[i].clone())
        .collect())
}
