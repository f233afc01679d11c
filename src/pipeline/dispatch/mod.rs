//! Layered response dispatch.
//!
//! Stage order over a single message: canned small-talk match, then
//! knowledge retrieval, then generative fallback filtered for domain
//! relevance. Collaborator failures never escape: they are mapped to a
//! fixed apologetic reply at this boundary, so the dispatcher's public
//! surface is infallible.

pub mod canned;
pub mod generate;
pub mod medical;
mod orchestrator;

pub use generate::{GenerateError, MockGenerator, OllamaGenerator, TextGenerator};
pub use orchestrator::Dispatcher;

use thiserror::Error;

use super::retrieval::{RetrievalError, RetrievalResult};

/// Internal stage failures, all converted to the apology reply before
/// leaving the dispatcher.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerateError),
    #[error("Matched condition missing from knowledge base: {0}")]
    UnknownCondition(String),
}

/// Which stage produced the final reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Small-talk phrase match; retrieval was bypassed.
    Canned,
    /// Knowledge-base condition summary.
    Knowledge,
    /// Generative continuation (possibly substituted by the relevance filter).
    Fallback,
    /// A stage failed and the apology reply was substituted.
    Recovery,
}

/// The dispatcher's result for one message.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub reply: String,
    /// Top retrieval hit when the knowledge stage answered, for downstream
    /// suggestion derivation without a second index query.
    pub matched: Option<RetrievalResult>,
    pub stage: Stage,
}
