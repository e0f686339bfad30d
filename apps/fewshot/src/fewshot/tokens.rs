//! Diagnostic token estimate for a chat prompt.
//!
//! Per-message overhead model for chat models: every message costs
//! `TOKENS_PER_MESSAGE` plus the encoded role and content, and the reply is
//! primed with `REPLY_PRIMING_TOKENS`. The result is an estimate; the
//! endpoint's reported usage is authoritative.

use tiktoken_rs::CoreBPE;

use crate::llm_client::ChatMessage;

pub const TOKENS_PER_MESSAGE: usize = 3;
pub const REPLY_PRIMING_TOKENS: usize = 3;

/// Counts tokens for a piece of text. Swappable so tests need no BPE tables.
pub trait TokenEncoder {
    fn count(&self, text: &str) -> usize;
}

/// `o200k_base` BPE, the encoding used by the gpt-4o model family.
pub struct TiktokenEncoder {
    bpe: CoreBPE,
}

impl TiktokenEncoder {
    pub fn o200k() -> anyhow::Result<Self> {
        Ok(Self {
            bpe: tiktoken_rs::o200k_base()?,
        })
    }
}

impl TokenEncoder for TiktokenEncoder {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

pub fn count_prompt_tokens(messages: &[ChatMessage], encoder: &dyn TokenEncoder) -> usize {
    let body: usize = messages
        .iter()
        .map(|m| TOKENS_PER_MESSAGE + encoder.count(m.role.as_str()) + encoder.count(&m.content))
        .sum();
    body + REPLY_PRIMING_TOKENS
}
