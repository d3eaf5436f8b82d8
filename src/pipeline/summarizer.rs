//! Intent summarization.

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::error::SummarizeError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::types::NormalizedText;

/// A black-box summarizer: text in, short description of the sender's intent out.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize(&self, text: &NormalizedText) -> Result<String, SummarizeError>;
}

/// Upper bound on extractive summary length, in characters.
const MAX_SUMMARY_CHARS: usize = 240;

/// A name or group address after a greeting or sign-off: a capitalized
/// word or one of a few collective nouns.
const NAME: &str = r"(?:\p{Lu}[\p{L}.'-]*|(?i:team|all|there|everyone|folks|guys|or|and))";

/// A sentence that is only a greeting, optionally followed by a name.
static GREETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?i:hi|hello|hey|dear|greetings|good\s+(?:morning|afternoon|evening))(?:\s+{NAME}){{0,3}}\s*[,!.:]?$"
    ))
    .expect("valid regex")
});

/// A sentence that is only a sign-off, optionally followed by a name.
static SIGN_OFF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?i:thanks|thank\s+you|many\s+thanks|thx|cheers|regards|best|best\s+regards|kind\s+regards|warm\s+regards|sincerely)(?:\s+(?i:again|so\s+much|in\s+advance))?\s*[,!.]?(?:\s+{NAME}){{0,3}}\s*[,!.]?$"
    ))
    .expect("valid regex")
});

static REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\b(need|needs|please|can you|could you|would you|want to|would like|requesting|help)\b|\?)",
    )
    .expect("valid regex")
});

/// Deterministic extractive summarizer.
///
/// Drops greetings and sign-offs, then keeps the lead sentence plus the
/// first later sentence that carries a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveSummarizer;

impl ExtractiveSummarizer {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize_text(text: &str) -> String {
        let candidates: Vec<String> = split_sentences(text)
            .into_iter()
            .filter(|s| !GREETING.is_match(s) && !SIGN_OFF.is_match(s))
            .collect();

        let Some(lead) = candidates.first() else {
            return String::new();
        };

        let mut parts = vec![with_terminal(lead)];
        if let Some(request) = candidates.iter().skip(1).find(|s| REQUEST.is_match(s)) {
            parts.push(with_terminal(request));
        }

        truncate_chars(&parts.join(" "), MAX_SUMMARY_CHARS)
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    fn name(&self) -> &str {
        "extractive"
    }

    async fn summarize(&self, text: &NormalizedText) -> Result<String, SummarizeError> {
        Ok(Self::summarize_text(text.as_str()))
    }
}

/// Split on `.`, `!` or `?` followed by whitespace, and on line breaks.
fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for line in text.lines() {
        let mut current = String::new();
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            current.push(c);
            if matches!(c, '.' | '!' | '?') && chars.peek().is_none_or(|n| n.is_whitespace()) {
                push_sentence(&mut out, &current);
                current.clear();
            }
        }
        push_sentence(&mut out, &current);
    }
    out
}

fn push_sentence(out: &mut Vec<String>, sentence: &str) {
    let trimmed = sentence.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn with_terminal(sentence: &str) -> String {
    if sentence.ends_with(['.', '!', '?']) {
        sentence.to_string()
    } else {
        format!("{sentence}.")
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max - 1).collect();
    format!("{}…", cut.trim_end())
}

// ── LLM summarizer ──────────────────────────────────────────────────

const SUMMARY_MAX_TOKENS: u32 = 80;
const SUMMARY_TEMPERATURE: f32 = 0.2;

/// One-sentence intent summary through an LLM provider.
pub struct LlmSummarizer {
    llm: Arc<dyn LlmProvider>,
}

impl LlmSummarizer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    fn name(&self) -> &str {
        "llm"
    }

    async fn summarize(&self, text: &NormalizedText) -> Result<String, SummarizeError> {
        let content_preview: String = text.as_str().chars().take(2000).collect();
        let request = CompletionRequest::new(vec![
            ChatMessage::system(
                "Summarize in one short sentence what the sender of this email wants. \
                 Respond with the sentence only.",
            ),
            ChatMessage::user(content_preview),
        ])
        .with_temperature(SUMMARY_TEMPERATURE)
        .with_max_tokens(SUMMARY_MAX_TOKENS);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| SummarizeError::Backend(e.to_string()))?;

        Ok(response.content.trim().to_string())
    }
}
