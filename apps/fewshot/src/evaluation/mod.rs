// Prediction, scoring and reporting.
// All completion calls go through llm_client::ChatCompletion.

pub mod evaluator;
pub mod metrics;
pub mod report;
pub mod runner;
