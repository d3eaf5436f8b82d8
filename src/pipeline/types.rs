//! Shared types for the triage pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ClassifyError, ConfigError};

// ── Input ───────────────────────────────────────────────────────────

/// A raw email as supplied by the caller. Never mutated by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub subject: String,
    pub body: String,
}

impl Email {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Subject and body combined, with quoted replies and disclaimers removed.
///
/// Only produced by `normalize::normalize`; recomputed on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Urgency ─────────────────────────────────────────────────────────

/// Closed, ordered set of urgency labels. Declaration order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UrgencyLabel {
    Urgent,
    Normal,
    Low,
}

impl UrgencyLabel {
    pub const ALL: [UrgencyLabel; 3] = [Self::Urgent, Self::Normal, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "Urgent",
            Self::Normal => "Normal",
            Self::Low => "Low",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Urgent => 0,
            Self::Normal => 1,
            Self::Low => 2,
        }
    }
}

impl fmt::Display for UrgencyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrgencyLabel {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ClassifyError::UnknownLabel(trimmed.to_string()))
    }
}

/// Confidence per label. Always complete; every value lies in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ScoreFields")]
pub struct ScoreDistribution {
    #[serde(rename = "Urgent")]
    urgent: f64,
    #[serde(rename = "Normal")]
    normal: f64,
    #[serde(rename = "Low")]
    low: f64,
}

impl ScoreDistribution {
    /// Build a distribution, clamping into [0, 1]. NaN becomes 0.0.
    pub fn new(urgent: f64, normal: f64, low: f64) -> Self {
        Self {
            urgent: clamp_unit(urgent),
            normal: clamp_unit(normal),
            low: clamp_unit(low),
        }
    }

    pub fn get(&self, label: UrgencyLabel) -> f64 {
        self.as_array()[label.index()]
    }

    pub(crate) fn set(&mut self, label: UrgencyLabel, score: f64) {
        let score = clamp_unit(score);
        match label {
            UrgencyLabel::Urgent => self.urgent = score,
            UrgencyLabel::Normal => self.normal = score,
            UrgencyLabel::Low => self.low = score,
        }
    }

    /// Labels with their scores, in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (UrgencyLabel, f64)> + '_ {
        UrgencyLabel::ALL.into_iter().map(|label| (label, self.get(label)))
    }

    /// Argmax; ties go to the label declared first.
    pub fn top(&self) -> UrgencyLabel {
        let mut best = UrgencyLabel::Urgent;
        let mut best_score = self.urgent;
        for (label, score) in self.iter().skip(1) {
            if score > best_score {
                best = label;
                best_score = score;
            }
        }
        best
    }

    fn as_array(&self) -> [f64; 3] {
        [self.urgent, self.normal, self.low]
    }
}

/// Wire form of `ScoreDistribution`. Deserialized values are clamped on the way in.
#[derive(Deserialize)]
struct ScoreFields {
    #[serde(rename = "Urgent", default)]
    urgent: f64,
    #[serde(rename = "Normal", default)]
    normal: f64,
    #[serde(rename = "Low", default)]
    low: f64,
}

impl From<ScoreFields> for ScoreDistribution {
    fn from(fields: ScoreFields) -> Self {
        Self::new(fields.urgent, fields.normal, fields.low)
    }
}

fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Output of the priority classifier adapter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub label: UrgencyLabel,
    pub scores: ScoreDistribution,
}

// ── Drafting ────────────────────────────────────────────────────────

/// Register of the drafted reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    #[default]
    Neutral,
    Friendly,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Neutral => "neutral",
            Self::Friendly => "friendly",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "formal" => Ok(Self::Formal),
            "neutral" => Ok(Self::Neutral),
            "friendly" => Ok(Self::Friendly),
            other => Err(ConfigError::InvalidValue {
                key: "tone".into(),
                message: format!("'{other}' is not one of formal, neutral, friendly"),
            }),
        }
    }
}

/// Which generator produced the final reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Template,
    Llm,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Llm => "llm",
        }
    }
}

impl fmt::Display for ReplySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run drafting options supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct DraftOptions {
    pub tone: Tone,
    /// Name placed in the signature. May be blank.
    pub sender_name: String,
    /// Name used in the salutation. Blank means a generic greeting.
    pub recipient_name: String,
}

impl DraftOptions {
    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = name.into();
        self
    }

    pub fn with_recipient_name(mut self, name: impl Into<String>) -> Self {
        self.recipient_name = name.into();
        self
    }
}

// ── Result ──────────────────────────────────────────────────────────

/// Everything a pipeline run produces.
#[derive(Debug, Clone, Serialize)]
pub struct TriageOutcome {
    pub run_id: Uuid,
    pub label: UrgencyLabel,
    pub scores: ScoreDistribution,
    pub intent: String,
    pub reply_subject: String,
    /// Substantive content only: no subject, salutation or signature.
    pub reply_body: String,
    /// `reply_body` wrapped in the envelope.
    pub reply: String,
    pub source: ReplySource,
    pub processed_at: DateTime<Utc>,
}
