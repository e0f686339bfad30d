mod config;
mod corpus;
mod errors;
mod evaluation;
mod fewshot;
mod llm_client;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::corpus::{load_corpus, CorpusSource};
use crate::evaluation::evaluator::EvalSettings;
use crate::evaluation::runner::{execute_run, prepare_run, RunOptions};
use crate::fewshot::tokens::TiktokenEncoder;
use crate::llm_client::LlmClient;

/// Few-shot sentiment evaluation of a hosted chat model.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Local JSONL corpus ({"text", "label"} per line). Overrides the hub dataset.
    #[arg(long, env = "CORPUS_PATH")]
    corpus_path: Option<PathBuf>,

    #[arg(long, default_value = "stanfordnlp/imdb")]
    dataset: String,

    #[arg(long, default_value = "plain_text")]
    dataset_config: String,

    #[arg(long, default_value = "train")]
    split: String,

    /// Exemplars per class in the prompt (total is twice this).
    #[arg(long, default_value_t = 3)]
    examples_per_class: usize,

    #[arg(long, default_value_t = 50)]
    gold_size: usize,

    #[arg(long, default_value_t = 0.8)]
    train_fraction: f64,

    #[arg(long, default_value_t = 42)]
    split_seed: u64,

    #[arg(long, default_value_t = 42)]
    gold_seed: u64,

    /// Seed for the exemplar draw. A fresh one is picked and logged when omitted.
    #[arg(long)]
    sample_seed: Option<u64>,

    /// Write the full evaluation report as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print the assembled prompt and exit without calling the model.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn corpus_source(&self) -> CorpusSource {
        match &self.corpus_path {
            Some(path) => CorpusSource::Local(path.clone()),
            None => CorpusSource::Hub {
                dataset: self.dataset.clone(),
                config: self.dataset_config.clone(),
                split: self.split.clone(),
            },
        }
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            source: self.corpus_source(),
            examples_per_class: self.examples_per_class,
            gold_size: self.gold_size,
            train_fraction: self.train_fraction,
            split_seed: self.split_seed,
            gold_seed: self.gold_seed,
            sample_seed: self.sample_seed.unwrap_or_else(rand::random),
            settings: EvalSettings::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting fewshot v{}", env!("CARGO_PKG_VERSION"));

    let options = cli.run_options();
    info!(
        "Seeds: split={} gold={} sample={}",
        options.split_seed, options.gold_seed, options.sample_seed
    );

    let reviews = load_corpus(&options.source, &config).await?;

    let encoder = TiktokenEncoder::o200k()?;
    let prepared = prepare_run(reviews, &options, &encoder)?;

    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(prepared.prompt.messages())?);
        info!("Dry run: ~{} prompt tokens, no requests sent", prepared.prompt_tokens);
        return Ok(());
    }

    let llm = LlmClient::new(&config)?;
    info!("LLM client initialized (model: {})", config.model);

    let report = execute_run(&prepared, &llm).await?;
    report.log_summary();

    if let Some(path) = &cli.report {
        report.write_json(path).await?;
    }

    if report.micro_f1.is_none() {
        bail!(
            "All {} completion requests failed; nothing to score",
            report.attempted
        );
    }

    Ok(())
}
