//! LLM access for the LLM-backed classifier, summarizer and reply upgrade.
//!
//! rig-core does the HTTP work. `RigAdapter` puts its completion models
//! behind `LlmProvider` so the pipeline never sees a vendor type.

pub mod provider;
mod rig_adapter;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::fmt::Display;
use std::sync::Arc;

use rig::client::CompletionClient;
use rig::providers::{anthropic, openai};
use secrecy::ExposeSecret;
use tracing::info;

use crate::config::{GenerativeConfig, GenerativeProvider};
use crate::error::LlmError;

/// Build the configured provider client, or `None` when generation is disabled.
///
/// A single client serves every LLM-backed stage of a pipeline.
pub fn create_provider(config: &GenerativeConfig) -> Result<Option<Arc<dyn LlmProvider>>, LlmError> {
    let Some(api_key) = config.api_key.as_ref().filter(|_| config.enabled()) else {
        return Ok(None);
    };
    let api_key = api_key.expose_secret();

    let llm: Arc<dyn LlmProvider> = match config.provider {
        GenerativeProvider::None => return Ok(None),
        GenerativeProvider::OpenAi => {
            let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
                openai::Client::new(api_key).map_err(|e| client_error(config.provider, e))?;
            Arc::new(RigAdapter::new(
                client.completion_model(&config.model),
                &config.model,
            ))
        }
        GenerativeProvider::Anthropic => {
            let client: rig::client::Client<anthropic::client::AnthropicExt> =
                anthropic::Client::new(api_key).map_err(|e| client_error(config.provider, e))?;
            Arc::new(RigAdapter::new(
                client.completion_model(&config.model),
                &config.model,
            ))
        }
    };

    info!(
        provider = config.provider.as_str(),
        model = %config.model,
        "LLM provider ready"
    );
    Ok(Some(llm))
}

fn client_error(provider: GenerativeProvider, e: impl Display) -> LlmError {
    LlmError::RequestFailed {
        provider: provider.as_str().to_string(),
        reason: format!("could not build client: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> GenerativeConfig {
        let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
        GenerativeConfig::from_lookup(|key: &str| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn toggle_builds_openai_client() {
        let llm = create_provider(&config(&[("LLM_PROVIDER", "yes"), ("OPENAI_API_KEY", "sk-test")]))
            .unwrap()
            .expect("enabled");
        assert_eq!(llm.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn anthropic_builds_with_configured_model() {
        let llm = create_provider(&config(&[
            ("LLM_PROVIDER", "anthropic"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("ANTHROPIC_MODEL", "claude-test"),
        ]))
        .unwrap()
        .expect("enabled");
        assert_eq!(llm.model_name(), "claude-test");
    }

    #[test]
    fn anthropic_ignores_openai_key() {
        let llm = create_provider(&config(&[
            ("LLM_PROVIDER", "anthropic"),
            ("OPENAI_API_KEY", "sk-openai"),
        ]))
        .unwrap();
        assert!(llm.is_none());
    }

    #[test]
    fn disabled_builds_nothing() {
        assert!(create_provider(&config(&[])).unwrap().is_none());
        assert!(
            create_provider(&config(&[("LLM_PROVIDER", "off"), ("OPENAI_API_KEY", "sk-test")]))
                .unwrap()
                .is_none()
        );
    }
}
