//! Ventra core library
//!
//! Locally-run conversational assistant core for understanding abdominal
//! pain symptoms. The transport layer (HTTP, schemas, CORS) lives
//! elsewhere and calls in through [`engine::ChatEngine`].
//!
//! # Architecture
//!
//! ```text
//! message ──► Session Store (append user)
//!                  │
//!                  ▼
//!           Response Dispatcher
//!        ┌─────────┼──────────────┐
//!        │         │              │
//!     canned    knowledge     generative
//!     match     retrieval      fallback
//!        │     (embedding       │
//!        │       index)    relevance filter
//!        └─────────┼──────────────┘
//!                  ▼
//!        Suggestion Generator
//!                  │
//!                  ▼
//!           Session Store (append reply) ──► ChatReply
//! ```
//!
//! Failures from the embedding and generation collaborators never escape
//! the dispatcher; the user always gets a plain conversational sentence.
//!
//! # Modules
//!
//! - [`knowledge`]: static condition table, warning signs, phrase lists
//! - [`pipeline::embedding`]: text-to-vector collaborators
//! - [`pipeline::retrieval`]: cosine-scored condition index
//! - [`pipeline::dispatch`]: the layered response policy
//! - [`session`]: in-memory conversation store
//! - [`suggestions`]: follow-up question derivation
//! - [`engine`]: the assembled call surface

pub mod config;
pub mod engine;
pub mod knowledge;
pub mod pipeline;
pub mod session;
pub mod suggestions;

pub use config::EngineConfig;
pub use engine::{ChatEngine, ChatReply, EngineError};
pub use knowledge::{Condition, KnowledgeBase, KnowledgeError, Severity};
pub use pipeline::dispatch::{
    DispatchOutcome, MockGenerator, OllamaGenerator, Stage, TextGenerator,
};
pub use pipeline::embedding::{HashingEmbedder, TextEmbedder, EMBEDDING_DIM};
#[cfg(feature = "onnx-embeddings")]
pub use pipeline::embedding::MiniLmEmbedder;
pub use pipeline::retrieval::{ConditionIndex, RetrievalResult};
pub use session::{Message, MessageRole, SessionStore};
pub use suggestions::MAX_SUGGESTIONS;
