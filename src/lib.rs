//! Email triage: urgency classification, intent summary and reply drafting.

pub mod batch;
pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;

pub use error::{Error, Result};
pub use pipeline::ReplyPipeline;
