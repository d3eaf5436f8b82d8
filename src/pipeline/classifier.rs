//! Priority classification.
//!
//! `Classifier` is the black box: text plus candidate label names in, a raw
//! score list out. `PriorityClassifier` turns whatever the black box returns
//! into a complete `ScoreDistribution` and picks the label.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClassifyError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::types::{Classification, NormalizedText, ScoreDistribution, UrgencyLabel};

/// One entry of a raw classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A black-box scorer over a fixed set of candidate labels.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Short backend name, for logging.
    fn name(&self) -> &str;

    /// Score `text` against `labels`. Labels may be omitted from the result.
    async fn score(&self, text: &str, labels: &[&str]) -> Result<Vec<LabelScore>, ClassifyError>;
}

/// Adapter that normalizes black-box output and selects the top label.
#[derive(Clone)]
pub struct PriorityClassifier {
    inner: Arc<dyn Classifier>,
}

impl PriorityClassifier {
    pub fn new(inner: Arc<dyn Classifier>) -> Self {
        Self { inner }
    }

    pub fn backend_name(&self) -> &str {
        self.inner.name()
    }

    pub async fn classify(&self, text: &NormalizedText) -> Result<Classification, ClassifyError> {
        let labels: Vec<&str> = UrgencyLabel::ALL.iter().map(|l| l.as_str()).collect();
        let raw = self.inner.score(text.as_str(), &labels).await?;
        let scores = normalize_scores(&raw)?;
        let label = scores.top();

        debug!(
            backend = self.inner.name(),
            label = %label,
            urgent = scores.get(UrgencyLabel::Urgent),
            normal = scores.get(UrgencyLabel::Normal),
            low = scores.get(UrgencyLabel::Low),
            "Classified text"
        );

        Ok(Classification { label, scores })
    }
}

/// Map raw scores onto the closed label set. Missing labels default to 0.0.
pub fn normalize_scores(raw: &[LabelScore]) -> Result<ScoreDistribution, ClassifyError> {
    let mut scores = ScoreDistribution::default();
    let mut seen = HashSet::new();

    for entry in raw {
        let label: UrgencyLabel = entry.label.parse()?;
        if !seen.insert(label) {
            return Err(ClassifyError::DuplicateLabel(label.to_string()));
        }
        if entry.score.is_nan() {
            return Err(ClassifyError::InvalidScore {
                label: entry.label.clone(),
                score: entry.score,
            });
        }
        scores.set(label, entry.score);
    }

    Ok(scores)
}

// ── Keyword classifier ──────────────────────────────────────────────

struct Cue {
    regex: Regex,
    weight: f64,
}

fn cue(pattern: &str, weight: f64) -> Cue {
    Cue {
        regex: Regex::new(pattern).expect("valid regex"),
        weight,
    }
}

static URGENT_CUES: LazyLock<Vec<Cue>> = LazyLock::new(|| {
    vec![
        cue(r"(?i)\b(urgent|urgently|asap|emergency|critical)\b", 2.0),
        cue(r"(?i)\b(immediately|right away|as soon as possible)\b", 1.5),
        cue(r"(?i)\b(today|tonight|by eod|end of day)\b", 1.0),
        cue(r"(?i)\b(outage|down|broken|blocked|blocking)\b", 1.5),
        cue(r"(?i)\b(fail(s|ed|ure|ing)?|error|timeout|timed out|crash(es|ed)?)\b", 1.0),
        cue(r"(?i)\b(cannot|can't|unable to)\b", 1.0),
        cue(r"(?i)\b(deadline|overdue|escalat(e|ed|ion))\b", 1.0),
    ]
});

static LOW_CUES: LazyLock<Vec<Cue>> = LazyLock::new(|| {
    vec![
        cue(r"(?i)\b(fyi|for your information)\b", 1.5),
        cue(r"(?i)\b(no rush|no hurry|whenever|when you get a chance|low priority)\b", 2.0),
        cue(r"(?i)\b(newsletter|unsubscribe|digest|announcement)\b", 1.5),
        cue(r"(?i)\b(no action (is )?(needed|required))\b", 2.0),
        cue(r"(?i)\b(just (wanted|a note) to (say|share|let you know)|thank you so much|kudos)\b", 1.0),
    ]
});

static NORMAL_CUES: LazyLock<Vec<Cue>> = LazyLock::new(|| {
    vec![
        cue(r"\?", 0.5),
        cue(r"(?i)\b(please|could you|can you|would you|request)\b", 0.5),
    ]
});

/// Prior mass on Normal so text without cues lands there.
const NORMAL_PRIOR: f64 = 1.0;

/// Local lexicon-based classifier. Deterministic, no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    fn weight(cues: &[Cue], text: &str) -> f64 {
        cues.iter()
            .map(|c| c.regex.find_iter(text).count() as f64 * c.weight)
            .sum()
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn score(&self, text: &str, labels: &[&str]) -> Result<Vec<LabelScore>, ClassifyError> {
        let urgent = Self::weight(&URGENT_CUES, text);
        let low = Self::weight(&LOW_CUES, text);
        let normal = NORMAL_PRIOR + Self::weight(&NORMAL_CUES, text);
        let total = urgent + normal + low;

        let mut out = Vec::with_capacity(labels.len());
        for name in labels {
            let raw = match name.parse::<UrgencyLabel>()? {
                UrgencyLabel::Urgent => urgent,
                UrgencyLabel::Normal => normal,
                UrgencyLabel::Low => low,
            };
            out.push(LabelScore::new(*name, raw / total));
        }
        Ok(out)
    }
}

// ── LLM classifier ──────────────────────────────────────────────────

const CLASSIFY_MAX_TOKENS: u32 = 128;
const CLASSIFY_TEMPERATURE: f32 = 0.0;

/// Zero-shot classification through an LLM provider.
pub struct LlmClassifier {
    llm: Arc<dyn LlmProvider>,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    fn name(&self) -> &str {
        "llm"
    }

    async fn score(&self, text: &str, labels: &[&str]) -> Result<Vec<LabelScore>, ClassifyError> {
        let system_prompt = format!(
            "You classify the urgency of support emails. Candidate labels: {}.\n\
             Respond with ONLY a JSON object mapping each label to a confidence \
             between 0.0 and 1.0, the values summing to 1.0. Example:\n\
             {{\"Urgent\": 0.7, \"Normal\": 0.2, \"Low\": 0.1}}",
            labels.join(", ")
        );
        let content_preview: String = text.chars().take(2000).collect();

        let request = CompletionRequest::new(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(format!("Email:\n{content_preview}")),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| ClassifyError::Backend(e.to_string()))?;

        parse_llm_scores(&response.content)
    }
}

/// The outermost `{...}` span, ignoring prose or code fences around it.
fn score_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Parse `{"Label": score, ...}` from model output.
fn parse_llm_scores(raw: &str) -> Result<Vec<LabelScore>, ClassifyError> {
    let json = score_object(raw)
        .ok_or_else(|| ClassifyError::Parse("no JSON object in classifier output".into()))?;
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).map_err(|e| ClassifyError::Parse(e.to_string()))?;

    map.into_iter()
        .map(|(label, value)| {
            let score = value.as_f64().ok_or_else(|| {
                ClassifyError::Parse(format!("score for '{label}' is not a number"))
            })?;
            Ok(LabelScore { label, score })
        })
        .collect()
}
