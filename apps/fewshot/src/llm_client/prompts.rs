// Prompt constants for the few-shot sentiment classifier.

/// System instruction. Restricts the answer to the two label words so the
/// 2-token output cap is always enough.
pub const SENTIMENT_SYSTEM: &str = "You are a sentiment classifier for movie reviews. \
    Classify the sentiment of each review as either positive or negative. \
    Answer with exactly one word: positive or negative. \
    Do NOT include punctuation, explanations or any other text.";

/// Review template. Replace `{review}` before sending.
pub const REVIEW_TEMPLATE: &str = "Review:\n{review}\n\nSentiment:";

/// Placeholder that `REVIEW_TEMPLATE` (and any custom template) must contain.
pub const REVIEW_PLACEHOLDER: &str = "{review}";
