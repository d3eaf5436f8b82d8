//! Reply pipeline: prepare, analyze, draft, optionally upgrade, envelope.
//!
//! A drafted reply always exists once analysis succeeds. The generative
//! upgrade can only replace the template body, never remove it.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ClassifierBackend, SummarizerBackend, TriageConfig};
use crate::error::{Error, PipelineError};
use crate::llm::{LlmProvider, create_provider};
use crate::pipeline::classifier::{KeywordClassifier, LlmClassifier, PriorityClassifier};
use crate::pipeline::envelope::Envelope;
use crate::pipeline::generative::{GenerativeReplyAdapter, ReplyPrompt};
use crate::pipeline::normalize::normalize;
use crate::pipeline::summarizer::{ExtractiveSummarizer, LlmSummarizer, Summarizer};
use crate::pipeline::templates::draft_reply;
use crate::pipeline::types::{DraftOptions, Email, ReplySource, TriageOutcome};

/// End-to-end triage and reply drafting for one email at a time.
///
/// Cheap to clone; all components are shared.
#[derive(Clone)]
pub struct ReplyPipeline {
    classifier: PriorityClassifier,
    summarizer: Arc<dyn Summarizer>,
    generator: GenerativeReplyAdapter,
}

impl ReplyPipeline {
    pub fn new(classifier: PriorityClassifier, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            classifier,
            summarizer,
            generator: GenerativeReplyAdapter::disabled(),
        }
    }

    /// Keyword classifier, extractive summarizer, no generative upgrade.
    pub fn offline() -> Self {
        Self::new(
            PriorityClassifier::new(Arc::new(KeywordClassifier::new())),
            Arc::new(ExtractiveSummarizer::new()),
        )
    }

    pub fn with_generator(mut self, generator: GenerativeReplyAdapter) -> Self {
        self.generator = generator;
        self
    }

    /// Wire components from configuration.
    ///
    /// One provider client is shared between every LLM-backed stage. If the
    /// client cannot be built and only the reply upgrade needed it, the
    /// pipeline runs template-only.
    pub fn from_config(config: &TriageConfig) -> Result<Self, Error> {
        config.validate()?;

        let llm: Option<Arc<dyn LlmProvider>> = match create_provider(&config.generative) {
            Ok(llm) => llm,
            Err(e) if config.needs_llm() => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Could not create LLM provider, using template replies");
                None
            }
        };

        let classifier: PriorityClassifier = match (config.classifier, &llm) {
            (ClassifierBackend::Llm, Some(llm)) => {
                PriorityClassifier::new(Arc::new(LlmClassifier::new(llm.clone())))
            }
            _ => PriorityClassifier::new(Arc::new(KeywordClassifier::new())),
        };

        let summarizer: Arc<dyn Summarizer> = match (config.summarizer, &llm) {
            (SummarizerBackend::Llm, Some(llm)) => Arc::new(LlmSummarizer::new(llm.clone())),
            _ => Arc::new(ExtractiveSummarizer::new()),
        };

        let generator = GenerativeReplyAdapter::from_config(llm, &config.generative);

        info!(
            classifier = classifier.backend_name(),
            summarizer = summarizer.name(),
            generative = generator.is_enabled(),
            "Reply pipeline ready"
        );

        Ok(Self::new(classifier, summarizer).with_generator(generator))
    }

    pub fn generator_enabled(&self) -> bool {
        self.generator.is_enabled()
    }

    /// Run one email through the pipeline.
    ///
    /// Classification and summarization failures abort the run. Anything
    /// that goes wrong in the generative upgrade falls back to the template.
    pub async fn run(
        &self,
        email: &Email,
        options: &DraftOptions,
    ) -> Result<TriageOutcome, PipelineError> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();

        // Prepare
        let text = normalize(&email.subject, &email.body);
        debug!(%run_id, chars = text.as_str().len(), "Normalized email");

        // Analyze
        let classification = self.classifier.classify(&text).await?;
        let intent = self.summarizer.summarize(&text).await?;
        debug!(%run_id, label = %classification.label, "Analysis complete");

        // Draft
        let mut body = draft_reply(classification.label, &intent, options.tone);
        let mut source = ReplySource::Template;

        // Upgrade
        if self.generator.is_enabled() {
            let prompt = ReplyPrompt {
                label: classification.label,
                intent: &intent,
                subject: &email.subject,
                body: text.as_str(),
                tone: options.tone,
            }
            .render();

            match self.generator.maybe_generate(&prompt).await {
                Ok(generated) => {
                    body = generated;
                    source = ReplySource::Llm;
                }
                Err(reason) => {
                    warn!(%run_id, reason = %reason, "Generative reply unavailable, keeping template");
                }
            }
        }

        // Envelope
        let envelope = Envelope::wrap(
            &email.subject,
            &body,
            &options.sender_name,
            &options.recipient_name,
        );
        let reply = envelope.to_string();

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            %run_id,
            label = %classification.label,
            source = %source,
            elapsed_ms,
            "Drafted reply"
        );

        Ok(TriageOutcome {
            run_id,
            label: classification.label,
            scores: classification.scores,
            intent,
            reply_subject: envelope.subject,
            reply_body: body,
            reply,
            source,
            processed_at: Utc::now(),
        })
    }
}
