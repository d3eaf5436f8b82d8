//! Email triage pipeline.
//!
//! Each email flows through:
//! 1. `normalize` - strip quoted history and disclaimers
//! 2. `classifier` + `summarizer` - urgency label and one-line intent
//! 3. `templates` - deterministic reply body
//! 4. `generative` - optional LLM body upgrade, falls back to the template
//! 5. `envelope` - subject, salutation and signature
//!
//! `orchestrator::ReplyPipeline` ties the stages together.

pub mod classifier;
pub mod envelope;
pub mod generative;
pub mod normalize;
pub mod orchestrator;
pub mod summarizer;
pub mod templates;
pub mod types;

pub use orchestrator::ReplyPipeline;
