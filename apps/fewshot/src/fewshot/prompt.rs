//! Few-shot prompt assembly.
//!
//! Layout: `[system]` then one `(user review, assistant label)` pair per
//! exemplar in sampled order. The query turn is appended per prediction by
//! `FewShotPrompt::with_query`, which leaves the base prompt untouched.

use crate::corpus::Review;
use crate::errors::AppError;
use crate::llm_client::prompts::REVIEW_PLACEHOLDER;
use crate::llm_client::ChatMessage;

/// A user-turn template with exactly one `{review}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTemplate(String);

impl ReviewTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, AppError> {
        let template = template.into();
        match template.matches(REVIEW_PLACEHOLDER).count() {
            1 => Ok(Self(template)),
            n => Err(AppError::Validation(format!(
                "Review template must contain exactly one {REVIEW_PLACEHOLDER} placeholder, found {n}"
            ))),
        }
    }

    pub fn format(&self, review_text: &str) -> String {
        self.0.replace(REVIEW_PLACEHOLDER, review_text)
    }
}

#[derive(Debug, Clone)]
pub struct FewShotPrompt {
    messages: Vec<ChatMessage>,
    template: ReviewTemplate,
}

impl FewShotPrompt {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of exemplar pairs after the system message.
    pub fn exemplar_count(&self) -> usize {
        (self.messages.len() - 1) / 2
    }

    /// The full message list for one prediction: base prompt plus a trailing user turn.
    pub fn with_query(&self, review_text: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.extend_from_slice(&self.messages);
        messages.push(ChatMessage::user(self.template.format(review_text)));
        messages
    }
}

/// Builds `[system] + [user(review), assistant(label)]*` from the exemplars.
pub fn build_prompt(system: &str, exemplars: &[Review], template: &ReviewTemplate) -> FewShotPrompt {
    let mut messages = Vec::with_capacity(1 + exemplars.len() * 2);
    messages.push(ChatMessage::system(system));

    for exemplar in exemplars {
        messages.push(ChatMessage::user(template.format(&exemplar.text)));
        messages.push(ChatMessage::assistant(exemplar.sentiment().as_str()));
    }

    FewShotPrompt {
        messages,
        template: template.clone(),
    }
}
