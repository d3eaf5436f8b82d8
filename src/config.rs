//! Configuration types, built from environment variables.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;
use crate::pipeline::generative::{
    DEFAULT_MAX_TOKENS, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT,
};
use crate::pipeline::types::{DraftOptions, Tone};

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_BATCH_CONCURRENCY: usize = 4;

// ── Generative source ───────────────────────────────────────────────

/// Which external text generator, if any, is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerativeProvider {
    #[default]
    None,
    OpenAi,
    Anthropic,
}

impl GenerativeProvider {
    /// Plain toggles (`1`, `true`, `yes`) select OpenAI.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "openai" => Self::OpenAi,
            "anthropic" => Self::Anthropic,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

/// Generative source configuration.
///
/// Enabled only when a provider is selected and its credentials are present.
#[derive(Debug, Clone)]
pub struct GenerativeConfig {
    pub provider: GenerativeProvider,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: Option<String>,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            provider: GenerativeProvider::None,
            api_key: None,
            model: String::new(),
            timeout: DEFAULT_TIMEOUT,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

impl GenerativeConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let provider = lookup("LLM_PROVIDER")
            .map(|v| GenerativeProvider::parse(&v))
            .unwrap_or_default();

        let (key_var, model_var, default_model) = match provider {
            GenerativeProvider::Anthropic => {
                ("ANTHROPIC_API_KEY", "ANTHROPIC_MODEL", DEFAULT_ANTHROPIC_MODEL)
            }
            _ => ("OPENAI_API_KEY", "OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
        };

        let api_key = lookup(key_var)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let model = lookup(model_var)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_model.to_string());

        let timeout = lookup("LLM_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        let max_tokens: u32 = lookup("LLM_MAX_TOKENS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        Self {
            provider,
            api_key,
            model,
            timeout,
            max_tokens,
            ..Self::default()
        }
    }

    pub fn enabled(&self) -> bool {
        self.provider != GenerativeProvider::None
            && self
                .api_key
                .as_ref()
                .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }
}

// ── Pipeline ────────────────────────────────────────────────────────

/// Backend for priority classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierBackend {
    #[default]
    Keyword,
    Llm,
}

/// Backend for intent summarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummarizerBackend {
    #[default]
    Extractive,
    Llm,
}

/// Top-level configuration for the triage binary.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub tone: Tone,
    pub sender_name: String,
    pub recipient_name: String,
    pub classifier: ClassifierBackend,
    pub summarizer: SummarizerBackend,
    /// Maximum emails in flight during batch runs.
    pub batch_concurrency: usize,
    pub generative: GenerativeConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            tone: Tone::default(),
            sender_name: String::new(),
            recipient_name: String::new(),
            classifier: ClassifierBackend::default(),
            summarizer: SummarizerBackend::default(),
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            generative: GenerativeConfig::default(),
        }
    }
}

impl TriageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let tone = match lookup("TRIAGE_TONE") {
            Some(v) if !v.trim().is_empty() => v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TRIAGE_TONE".into(),
                message: format!("'{}' is not one of formal, neutral, friendly", v.trim()),
            })?,
            _ => Tone::default(),
        };

        let classifier = match lookup("TRIAGE_CLASSIFIER")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("keyword") => ClassifierBackend::Keyword,
            Some("llm") => ClassifierBackend::Llm,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "TRIAGE_CLASSIFIER".into(),
                    message: format!("'{other}' is not one of keyword, llm"),
                });
            }
        };

        let summarizer = match lookup("TRIAGE_SUMMARIZER")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("extractive") => SummarizerBackend::Extractive,
            Some("llm") => SummarizerBackend::Llm,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "TRIAGE_SUMMARIZER".into(),
                    message: format!("'{other}' is not one of extractive, llm"),
                });
            }
        };

        let batch_concurrency: usize = lookup("TRIAGE_BATCH_CONCURRENCY")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_BATCH_CONCURRENCY)
            .max(1);

        let generative = GenerativeConfig::from_lookup(&lookup);

        let config = Self {
            tone,
            sender_name: lookup("TRIAGE_SENDER_NAME").unwrap_or_default(),
            recipient_name: lookup("TRIAGE_RECIPIENT_NAME").unwrap_or_default(),
            classifier,
            summarizer,
            batch_concurrency,
            generative,
        };
        config.validate()?;
        Ok(config)
    }

    /// LLM-backed classifier or summarizer needs an enabled provider.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.needs_llm() && !self.generative.enabled() {
            return Err(ConfigError::InvalidValue {
                key: "LLM_PROVIDER".into(),
                message: "llm classifier/summarizer requires a provider and API key".into(),
            });
        }
        Ok(())
    }

    /// Whether any analysis stage depends on the LLM provider.
    pub fn needs_llm(&self) -> bool {
        self.classifier == ClassifierBackend::Llm || self.summarizer == SummarizerBackend::Llm
    }

    pub fn draft_options(&self) -> DraftOptions {
        DraftOptions::default()
            .with_tone(self.tone)
            .with_sender_name(self.sender_name.clone())
            .with_recipient_name(self.recipient_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    // ── provider toggles ────────────────────────────────────────

    #[test]
    fn provider_toggles() {
        assert_eq!(GenerativeProvider::parse("1"), GenerativeProvider::OpenAi);
        assert_eq!(GenerativeProvider::parse(" TRUE "), GenerativeProvider::OpenAi);
        assert_eq!(GenerativeProvider::parse("yes"), GenerativeProvider::OpenAi);
        assert_eq!(GenerativeProvider::parse("OpenAI"), GenerativeProvider::OpenAi);
        assert_eq!(GenerativeProvider::parse("anthropic"), GenerativeProvider::Anthropic);
        assert_eq!(GenerativeProvider::parse("0"), GenerativeProvider::None);
        assert_eq!(GenerativeProvider::parse(""), GenerativeProvider::None);
        assert_eq!(GenerativeProvider::parse("mistral"), GenerativeProvider::None);
    }

    // ── generative config ───────────────────────────────────────

    #[test]
    fn disabled_without_provider() {
        let config = GenerativeConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")]));
        assert!(!config.enabled());
    }

    #[test]
    fn disabled_without_credentials() {
        let config = GenerativeConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "   "),
        ]));
        assert_eq!(config.provider, GenerativeProvider::OpenAi);
        assert!(!config.enabled());
    }

    #[test]
    fn openai_defaults() {
        let config = GenerativeConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "true"),
            ("OPENAI_API_KEY", "sk-test"),
        ]));
        assert!(config.enabled());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.max_tokens, 300);
        assert_eq!(config.provider, GenerativeProvider::OpenAi);
        assert_eq!(config.api_key.unwrap().expose_secret(), "sk-test");
    }

    #[test]
    fn anthropic_uses_its_own_key_and_model() {
        let config = GenerativeConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "anthropic"),
            ("OPENAI_API_KEY", "sk-wrong"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("ANTHROPIC_MODEL", "claude-test"),
            ("LLM_TIMEOUT_SECS", "5"),
        ]));
        assert!(config.enabled());
        assert_eq!(config.model, "claude-test");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.api_key.unwrap().expose_secret(), "sk-ant");
    }

    #[test]
    fn anthropic_without_its_key_is_disabled() {
        let config = GenerativeConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "anthropic"),
            ("OPENAI_API_KEY", "sk-openai"),
        ]));
        assert!(!config.enabled());
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let config = GenerativeConfig::from_lookup(lookup(&[
            ("LLM_TIMEOUT_SECS", "soon"),
            ("LLM_MAX_TOKENS", "-1"),
        ]));
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.max_tokens, 300);
    }

    #[test]
    fn api_key_not_in_debug_output() {
        let config = GenerativeConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-very-secret"),
        ]));
        assert!(!format!("{config:?}").contains("sk-very-secret"));
    }

    // ── triage config ───────────────────────────────────────────

    #[test]
    fn triage_defaults() {
        let config = TriageConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.tone, Tone::Neutral);
        assert_eq!(config.classifier, ClassifierBackend::Keyword);
        assert_eq!(config.summarizer, SummarizerBackend::Extractive);
        assert_eq!(config.batch_concurrency, 4);
        assert!(!config.generative.enabled());
        assert!(!config.needs_llm());
    }

    #[test]
    fn triage_reads_names_and_tone() {
        let config = TriageConfig::from_lookup(lookup(&[
            ("TRIAGE_TONE", "Friendly"),
            ("TRIAGE_SENDER_NAME", "Sam"),
            ("TRIAGE_RECIPIENT_NAME", "Dana"),
            ("TRIAGE_BATCH_CONCURRENCY", "0"),
        ]))
        .unwrap();
        let options = config.draft_options();
        assert_eq!(options.tone, Tone::Friendly);
        assert_eq!(options.sender_name, "Sam");
        assert_eq!(options.recipient_name, "Dana");
        assert_eq!(config.batch_concurrency, 1);
    }

    #[test]
    fn invalid_tone_rejected() {
        let result = TriageConfig::from_lookup(lookup(&[("TRIAGE_TONE", "sarcastic")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn unknown_classifier_rejected() {
        let result = TriageConfig::from_lookup(lookup(&[("TRIAGE_CLASSIFIER", "bart")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn llm_classifier_requires_enabled_provider() {
        let result = TriageConfig::from_lookup(lookup(&[("TRIAGE_CLASSIFIER", "llm")]));
        assert!(result.is_err());

        let config = TriageConfig::from_lookup(lookup(&[
            ("TRIAGE_CLASSIFIER", "llm"),
            ("LLM_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();
        assert!(config.needs_llm());
    }
}
