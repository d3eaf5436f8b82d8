//! Best-effort generative reply upgrade.
//!
//! Every failure mode (disabled, missing credentials, transport error,
//! timeout, blank output) collapses into `Unavailable`. Nothing here can
//! fail a pipeline run.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::GenerativeConfig;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::types::{Tone, UrgencyLabel};

/// Word ceiling the model is asked to respect.
pub const REPLY_WORD_LIMIT: usize = 180;

/// Default system instruction for reply generation.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that writes concise, clear replies.";

/// Upper bound on one generation call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Why no generated body is available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Unavailable {
    #[error("generative source disabled")]
    Disabled,

    #[error("empty prompt")]
    EmptyPrompt,

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("provider returned no text")]
    EmptyResponse,
}

/// Inputs for the reply-generation prompt.
#[derive(Debug, Clone, Copy)]
pub struct ReplyPrompt<'a> {
    pub label: UrgencyLabel,
    pub intent: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub tone: Tone,
}

impl ReplyPrompt<'_> {
    /// Render the prompt. The model is told to return the body only.
    pub fn render(&self) -> String {
        format!(
            "You are an email assistant. Based on the details below, write ONLY the BODY of a {tone} reply.\n\
             Do NOT include a subject line, greeting/salutation, or any sign-off/signature. \
             Keep it under {limit} words.\n\
             Make it clear, concise, and actionable.\n\n\
             Urgency: {label}\n\
             Intent summary:\n{intent}\n\n\
             Original email:\n\
             Subject: {subject}\n\
             Body:\n{body}\n",
            tone = self.tone,
            limit = REPLY_WORD_LIMIT,
            label = self.label,
            intent = self.intent,
            subject = self.subject,
            body = self.body,
        )
    }
}

/// Optional external text generator.
#[derive(Clone)]
pub struct GenerativeReplyAdapter {
    llm: Option<Arc<dyn LlmProvider>>,
    system_prompt: Option<String>,
    timeout: Duration,
    max_tokens: u32,
    temperature: f32,
}

impl GenerativeReplyAdapter {
    /// An adapter that never calls out.
    pub fn disabled() -> Self {
        Self {
            llm: None,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            timeout: DEFAULT_TIMEOUT,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm: Some(llm),
            ..Self::disabled()
        }
    }

    /// Build from configuration around an already-created provider.
    /// A disabled config yields a disabled adapter even when a provider is given.
    pub fn from_config(llm: Option<Arc<dyn LlmProvider>>, config: &GenerativeConfig) -> Self {
        let Some(llm) = llm.filter(|_| config.enabled()) else {
            debug!(provider = config.provider.as_str(), "Generative replies disabled");
            return Self::disabled();
        };

        Self::new(llm)
            .with_timeout(config.timeout)
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature)
            .with_system_prompt(config.system_prompt.clone())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.llm.is_some()
    }

    /// Ask the provider for a reply body. Returns trimmed, non-empty text or `Unavailable`.
    pub async fn maybe_generate(&self, prompt: &str) -> Result<String, Unavailable> {
        let Some(llm) = &self.llm else {
            return Err(Unavailable::Disabled);
        };
        if prompt.trim().is_empty() {
            return Err(Unavailable::EmptyPrompt);
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt));

        let request = CompletionRequest::new(messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = match tokio::time::timeout(self.timeout, llm.complete(request)).await {
            Err(_) => return Err(Unavailable::Timeout(self.timeout)),
            Ok(Err(e)) => return Err(Unavailable::Provider(e.to_string())),
            Ok(Ok(response)) => response,
        };

        debug!(
            model = llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Generated reply body"
        );

        let text = response.content.trim();
        if text.is_empty() {
            Err(Unavailable::EmptyResponse)
        } else {
            Ok(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::LlmError;
    use crate::llm::{CompletionResponse, Role};

    /// Mock provider that records the last request and replies after an optional delay.
    struct MockLlm {
        reply: Result<String, ()>,
        delay: Duration,
        seen: Mutex<Option<CompletionRequest>>,
    }

    impl MockLlm {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                delay: Duration::ZERO,
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlm {
        fn model_name(&self) -> &str {
            "mock-generator"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            *self.seen.lock().unwrap() = Some(request);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.reply {
                Ok(content) => Ok(CompletionResponse {
                    content: content.clone(),
                    input_tokens: 5,
                    output_tokens: 5,
                }),
                Err(()) => Err(LlmError::RequestFailed {
                    provider: "mock".into(),
                    reason: "unauthorized".into(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn disabled_never_calls_out() {
        let adapter = GenerativeReplyAdapter::disabled();
        assert!(!adapter.is_enabled());
        assert_eq!(adapter.maybe_generate("prompt").await, Err(Unavailable::Disabled));
    }

    #[tokio::test]
    async fn returns_trimmed_text() {
        let adapter = GenerativeReplyAdapter::new(Arc::new(MockLlm::replying("\n  We are on it.  \n")));
        assert_eq!(adapter.maybe_generate("prompt").await.unwrap(), "We are on it.");
    }

    #[tokio::test]
    async fn blank_output_is_unavailable() {
        let adapter = GenerativeReplyAdapter::new(Arc::new(MockLlm::replying(" \n\t ")));
        assert_eq!(adapter.maybe_generate("prompt").await, Err(Unavailable::EmptyResponse));
    }

    #[tokio::test]
    async fn empty_prompt_is_unavailable() {
        let adapter = GenerativeReplyAdapter::new(Arc::new(MockLlm::replying("x")));
        assert_eq!(adapter.maybe_generate("   ").await, Err(Unavailable::EmptyPrompt));
    }

    #[tokio::test]
    async fn provider_error_is_unavailable() {
        let llm = MockLlm {
            reply: Err(()),
            delay: Duration::ZERO,
            seen: Mutex::new(None),
        };
        let adapter = GenerativeReplyAdapter::new(Arc::new(llm));
        assert!(matches!(
            adapter.maybe_generate("prompt").await,
            Err(Unavailable::Provider(_))
        ));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let llm = MockLlm {
            reply: Ok("late".into()),
            delay: Duration::from_secs(10),
            seen: Mutex::new(None),
        };
        let timeout = Duration::from_millis(50);
        let adapter = GenerativeReplyAdapter::new(Arc::new(llm)).with_timeout(timeout);
        assert_eq!(
            adapter.maybe_generate("prompt").await,
            Err(Unavailable::Timeout(timeout))
        );
    }

    #[tokio::test]
    async fn request_carries_system_prompt_and_limits() {
        let llm = Arc::new(MockLlm::replying("ok"));
        let adapter = GenerativeReplyAdapter::new(llm.clone()).with_max_tokens(123);
        adapter.maybe_generate("write it").await.unwrap();

        let seen = llm.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.max_tokens, Some(123));
        assert_eq!(seen.temperature, Some(0.3));
        assert_eq!(seen.messages[0].role, Role::System);
        assert_eq!(seen.messages[0].content, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(seen.messages[1].content, "write it");
    }

    #[tokio::test]
    async fn from_config_applies_settings() {
        use crate::config::GenerativeProvider;
        use secrecy::SecretString;

        let config = GenerativeConfig {
            provider: GenerativeProvider::OpenAi,
            api_key: Some(SecretString::from("sk-test".to_string())),
            model: "gpt-4o-mini".into(),
            max_tokens: 42,
            system_prompt: None,
            ..GenerativeConfig::default()
        };
        let llm = Arc::new(MockLlm::replying("ok"));
        let adapter = GenerativeReplyAdapter::from_config(Some(llm.clone()), &config);
        assert!(adapter.is_enabled());
        adapter.maybe_generate("write it").await.unwrap();

        let seen = llm.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.max_tokens, Some(42));
        assert_eq!(seen.messages.len(), 1);
        assert_eq!(seen.messages[0].role, Role::User);
    }

    #[tokio::test]
    async fn default_config_matches_adapter_defaults() {
        use crate::config::GenerativeProvider;
        use secrecy::SecretString;

        let config = GenerativeConfig {
            provider: GenerativeProvider::Anthropic,
            api_key: Some(SecretString::from("sk-test".to_string())),
            ..GenerativeConfig::default()
        };
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);

        let configured = Arc::new(MockLlm::replying("ok"));
        let plain = Arc::new(MockLlm::replying("ok"));
        GenerativeReplyAdapter::from_config(Some(configured.clone()), &config)
            .maybe_generate("p")
            .await
            .unwrap();
        GenerativeReplyAdapter::new(plain.clone())
            .maybe_generate("p")
            .await
            .unwrap();

        let a = configured.seen.lock().unwrap().clone().unwrap();
        let b = plain.seen.lock().unwrap().clone().unwrap();
        assert_eq!(a.temperature, b.temperature);
        assert_eq!(a.max_tokens, b.max_tokens);
        assert_eq!(a.max_tokens, Some(DEFAULT_MAX_TOKENS));
        assert_eq!(a.system_prompt(), b.system_prompt());
    }

    #[test]
    fn from_config_disabled_ignores_provider() {
        let llm: Arc<dyn LlmProvider> = Arc::new(MockLlm::replying("ok"));
        let adapter = GenerativeReplyAdapter::from_config(Some(llm), &GenerativeConfig::default());
        assert!(!adapter.is_enabled());
    }

    #[test]
    fn prompt_constrains_output() {
        let prompt = ReplyPrompt {
            label: UrgencyLabel::Urgent,
            intent: "Checkout payments fail.",
            subject: "Payment failure",
            body: "It fails with a 3DS timeout.",
            tone: Tone::Formal,
        }
        .render();

        assert!(prompt.contains("ONLY the BODY of a formal reply"));
        assert!(prompt.contains("Do NOT include a subject line, greeting/salutation, or any sign-off/signature"));
        assert!(prompt.contains("under 180 words"));
        assert!(prompt.contains("Urgency: Urgent"));
        assert!(prompt.contains("Checkout payments fail."));
        assert!(prompt.contains("Subject: Payment failure"));
        assert!(prompt.contains("3DS timeout"));
    }
}
