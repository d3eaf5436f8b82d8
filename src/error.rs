//! Error types for email triage.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Failures of the priority classifier black box or of its output shape.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassifyError {
    #[error("classifier backend failed: {0}")]
    Backend(String),

    #[error("classifier returned unknown label '{0}'")]
    UnknownLabel(String),

    #[error("classifier returned label '{0}' more than once")]
    DuplicateLabel(String),

    #[error("classifier returned invalid score {score} for '{label}'")]
    InvalidScore { label: String, score: f64 },

    #[error("could not parse classifier output: {0}")]
    Parse(String),
}

/// Failures of the intent summarizer black box.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SummarizeError {
    #[error("summarizer backend failed: {0}")]
    Backend(String),
}

/// Hard failures of a pipeline run. No reply is produced when one occurs.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    #[error("Classification failed: {0}")]
    Classification(#[from] ClassifyError),

    #[error("Summarization failed: {0}")]
    Summarization(#[from] SummarizeError),
}

/// Structural failures of a batch input, raised before any row is processed.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("CSV must contain column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw email input that could not be turned into an `Email`.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Could not parse email message")]
    Unparseable,

    #[error("Input is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for email triage.
pub type Result<T> = std::result::Result<T, Error>;
