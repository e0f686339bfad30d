//! Evaluation run — wires the pipeline stages together.
//!
//! Flow: split_corpus → sample_gold → create_examples → build_prompt →
//!       count_prompt_tokens → evaluate → EvalReport.
//!
//! Preparation is pure and makes no network calls, so `--dry-run` stops after it.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::corpus::split::{sample_gold, split_corpus};
use crate::corpus::{CorpusSource, Review};
use crate::errors::AppError;
use crate::evaluation::evaluator::{evaluate, EvalSettings};
use crate::evaluation::report::{EvalReport, RunContext, RunSeeds};
use crate::fewshot::prompt::{build_prompt, FewShotPrompt, ReviewTemplate};
use crate::fewshot::sampler::create_examples;
use crate::fewshot::tokens::{count_prompt_tokens, TokenEncoder};
use crate::llm_client::prompts::{REVIEW_TEMPLATE, SENTIMENT_SYSTEM};
use crate::llm_client::ChatCompletion;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: CorpusSource,
    pub examples_per_class: usize,
    pub gold_size: usize,
    pub train_fraction: f64,
    pub split_seed: u64,
    pub gold_seed: u64,
    pub sample_seed: u64,
    pub settings: EvalSettings,
}

/// A ready-to-send prompt and the gold set it will be scored on.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub gold: Vec<Review>,
    pub prompt: FewShotPrompt,
    pub prompt_tokens: usize,
    pub corpus: String,
    pub seeds: RunSeeds,
    pub settings: EvalSettings,
}

/// Splits the corpus, samples gold and exemplars, and assembles the prompt.
pub fn prepare_run(
    reviews: Vec<Review>,
    options: &RunOptions,
    encoder: &dyn TokenEncoder,
) -> Result<PreparedRun, AppError> {
    let split = split_corpus(reviews, options.train_fraction, options.split_seed)?;
    info!(
        "Split corpus: {} exemplar-pool rows, {} held-out rows",
        split.exemplar_pool.len(),
        split.held_out.len()
    );

    let gold = sample_gold(&split.held_out, options.gold_size, options.gold_seed)?;

    let mut rng = StdRng::seed_from_u64(options.sample_seed);
    let exemplars = create_examples(&split.exemplar_pool, options.examples_per_class, &mut rng)?;

    let template = ReviewTemplate::new(REVIEW_TEMPLATE)?;
    let prompt = build_prompt(SENTIMENT_SYSTEM, &exemplars, &template);
    let prompt_tokens = count_prompt_tokens(prompt.messages(), encoder);
    info!(
        "Built few-shot prompt: {} exemplars, {} messages, ~{} tokens",
        prompt.exemplar_count(),
        prompt.messages().len(),
        prompt_tokens
    );

    Ok(PreparedRun {
        gold,
        prompt,
        prompt_tokens,
        corpus: options.source.to_string(),
        seeds: RunSeeds {
            split: options.split_seed,
            gold: options.gold_seed,
            sample: options.sample_seed,
        },
        settings: options.settings,
    })
}

/// Sends every gold review to `llm` and builds the report.
pub async fn execute_run(
    prepared: &PreparedRun,
    llm: &dyn ChatCompletion,
) -> Result<EvalReport, AppError> {
    info!(
        "Evaluating {} gold reviews with model {}",
        prepared.gold.len(),
        llm.model()
    );

    let outcome = evaluate(llm, &prepared.prompt, &prepared.gold, prepared.settings).await?;

    let context = RunContext {
        model: llm.model().to_string(),
        corpus: prepared.corpus.clone(),
        seeds: prepared.seeds,
        settings: prepared.settings,
        exemplar_count: prepared.prompt.exemplar_count(),
        prompt_tokens: prepared.prompt_tokens,
    };

    Ok(EvalReport::new(context, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fewshot::sampler::SamplingError;
    use crate::llm_client::{ChatMessage, CompletionOptions, LlmError};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::path::PathBuf;

    struct CharEncoder;

    impl TokenEncoder for CharEncoder {
        fn count(&self, text: &str) -> usize {
            text.len()
        }
    }

    /// Reads the sentiment back out of the review wording.
    struct KeywordCompleter;

    #[async_trait]
    impl ChatCompletion for KeywordCompleter {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _options: CompletionOptions,
        ) -> Result<String, LlmError> {
            let query = &messages.last().ok_or(LlmError::EmptyContent)?.content;
            Ok(if query.contains("wonderful") {
                "Positive".to_string()
            } else {
                "Negative".to_string()
            })
        }

        fn model(&self) -> &str {
            "keyword-mock"
        }
    }

    struct DownCompleter;

    #[async_trait]
    impl ChatCompletion for DownCompleter {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _options: CompletionOptions,
        ) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            })
        }

        fn model(&self) -> &str {
            "down-mock"
        }
    }

    fn corpus(n: usize) -> Vec<Review> {
        (0..n)
            .map(|i| {
                let label = (i % 2) as u8;
                let text = if label == 1 {
                    format!("A wonderful film, number {i}")
                } else {
                    format!("A tedious film, number {i}")
                };
                Review { text, label }
            })
            .collect()
    }

    fn options() -> RunOptions {
        RunOptions {
            source: CorpusSource::Local(PathBuf::from("reviews.jsonl")),
            examples_per_class: 3,
            gold_size: 50,
            train_fraction: 0.8,
            split_seed: 42,
            gold_seed: 42,
            sample_seed: 11,
            settings: EvalSettings::default(),
        }
    }

    #[test]
    fn test_prepare_run_shapes_prompt_and_gold() {
        let prepared = prepare_run(corpus(400), &options(), &CharEncoder).unwrap();
        assert_eq!(prepared.gold.len(), 50);
        assert_eq!(prepared.prompt.messages().len(), 13);
        assert_eq!(prepared.prompt.exemplar_count(), 6);
        assert!(prepared.prompt_tokens > 0);
        assert_eq!(prepared.corpus, "local:reviews.jsonl");
    }

    #[test]
    fn test_gold_never_overlaps_exemplars() {
        let prepared = prepare_run(corpus(400), &options(), &CharEncoder).unwrap();
        let gold: HashSet<String> = prepared
            .gold
            .iter()
            .map(|r| prepared.prompt.with_query(&r.text).pop().unwrap().content)
            .collect();
        for message in prepared.prompt.messages() {
            assert!(!gold.contains(&message.content));
        }
    }

    #[test]
    fn test_prepare_run_is_reproducible() {
        let a = prepare_run(corpus(400), &options(), &CharEncoder).unwrap();
        let b = prepare_run(corpus(400), &options(), &CharEncoder).unwrap();
        assert_eq!(a.gold, b.gold);
        assert_eq!(a.prompt.messages(), b.prompt.messages());
    }

    #[test]
    fn test_prepare_run_rejects_oversized_gold_set() {
        let err = prepare_run(corpus(100), &options(), &CharEncoder).unwrap_err();
        assert!(matches!(
            err,
            AppError::Sampling(SamplingError::GoldTooLarge {
                requested: 50,
                available: 20
            })
        ));
    }

    #[tokio::test]
    async fn test_end_to_end_with_correct_endpoint_scores_1() {
        let prepared = prepare_run(corpus(400), &options(), &CharEncoder).unwrap();
        let report = execute_run(&prepared, &KeywordCompleter).await.unwrap();
        assert_eq!(report.model, "keyword-mock");
        assert_eq!(report.scored, 50);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.micro_f1, Some(1.0));
        assert_eq!(report.seeds.sample, 11);
    }

    #[tokio::test]
    async fn test_end_to_end_with_failing_endpoint_has_no_score() {
        let prepared = prepare_run(corpus(400), &options(), &CharEncoder).unwrap();
        let report = execute_run(&prepared, &DownCompleter).await.unwrap();
        assert_eq!(report.scored, 0);
        assert_eq!(report.skipped, 50);
        assert!(report.predictions.is_empty());
        assert_eq!(report.micro_f1, None);
    }
}
