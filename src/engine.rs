//! The engine surface the transport layer calls.
//!
//! One inbound message yields one synchronous dispatch producing one
//! reply; there is no internal concurrency. `handle` never fails: every
//! collaborator failure has already been converted to a fixed
//! conversational reply by the dispatcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::knowledge::{KnowledgeBase, KnowledgeError};
use crate::pipeline::dispatch::{Dispatcher, TextGenerator};
use crate::pipeline::embedding::TextEmbedder;
use crate::pipeline::retrieval::{ConditionIndex, RetrievalError};
use crate::session::{Message, MessageRole, SessionStore};
use crate::suggestions::suggest;

/// Errors from engine construction. Runtime message handling is infallible.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Knowledge base failed validation: {0}")]
    Knowledge(#[from] KnowledgeError),
    #[error("Failed to build condition index: {0}")]
    Index(#[from] RetrievalError),
}

/// What the transport layer gets back for one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: Uuid,
    pub reply: String,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// The assembled core: knowledge base, condition index, collaborators,
/// and session store behind a three-call surface.
pub struct ChatEngine<E: TextEmbedder, G: TextGenerator> {
    kb: KnowledgeBase,
    index: ConditionIndex,
    embedder: E,
    generator: G,
    sessions: SessionStore,
    config: EngineConfig,
}

impl<E: TextEmbedder, G: TextGenerator> ChatEngine<E, G> {
    /// Load the builtin knowledge base and embed it once. The embedder
    /// passed here serves both index construction and later queries.
    pub fn new(embedder: E, generator: G, config: EngineConfig) -> Result<Self, EngineError> {
        let kb = KnowledgeBase::builtin()?;
        let index = ConditionIndex::build(&kb, &embedder)?;
        tracing::info!(conditions = kb.len(), "Chat engine ready");
        Ok(Self {
            kb,
            index,
            embedder,
            generator,
            sessions: SessionStore::new(),
            config,
        })
    }

    /// Open a fresh session.
    pub fn new_session(&self) -> Uuid {
        self.sessions.create()
    }

    /// Handle one message: provision the session if needed, record the
    /// message, dispatch a reply, derive follow-up suggestions, record the
    /// reply. Unknown session ids are provisioned silently.
    pub fn handle(&self, session_id: Option<Uuid>, text: &str) -> ChatReply {
        let session_id = session_id.unwrap_or_else(|| self.sessions.create());

        self.sessions.append(session_id, MessageRole::User, text);

        let history = self.sessions.history(session_id);
        // Context for the fallback generator: everything before the
        // message being handled.
        let prior = &history[..history.len().saturating_sub(1)];

        let dispatcher = Dispatcher::new(
            &self.kb,
            &self.index,
            &self.embedder,
            &self.generator,
            &self.config,
        );
        let outcome = dispatcher.dispatch(text, prior);

        let matched = outcome
            .matched
            .as_ref()
            .and_then(|hit| self.kb.get(&hit.key));
        let suggestions = suggest(text, matched);

        self.sessions
            .append(session_id, MessageRole::Assistant, &outcome.reply);

        ChatReply {
            session_id,
            reply: outcome.reply,
            suggestions,
            timestamp: Utc::now(),
        }
    }

    /// Ordered history for a session; empty for unknown ids.
    pub fn get_history(&self, session_id: Uuid) -> Vec<Message> {
        self.sessions.history(session_id)
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// The session store, for maintenance (eviction, counting).
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dispatch::canned::GREETING_REPLY;
    use crate::pipeline::dispatch::generate::{MockGenerator, REDIRECT_REPLY};
    use crate::pipeline::dispatch::medical::{ATTENTION_ADVISORY, URGENT_ADVISORY};
    use crate::pipeline::embedding::HashingEmbedder;
    use crate::suggestions::MAX_SUGGESTIONS;

    fn engine_with(generator: MockGenerator) -> ChatEngine<HashingEmbedder, MockGenerator> {
        ChatEngine::new(HashingEmbedder::new(), generator, EngineConfig::default()).unwrap()
    }

    #[test]
    fn hello_without_session_bootstraps_one() {
        let engine = engine_with(MockGenerator::failing());

        let reply = engine.handle(None, "hello");
        assert_eq!(reply.reply, GREETING_REPLY);

        let history = engine.get_history(reply.session_id);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert_eq!(history[1].content, GREETING_REPLY);
    }

    #[test]
    fn appendicitis_query_names_the_condition_with_advisory() {
        let engine = engine_with(MockGenerator::failing());
        let sid = engine.new_session();

        let reply = engine.handle(
            Some(sid),
            "sharp pain near navel, fever, pain moved to lower right",
        );
        assert!(reply.reply.contains("Appendicitis"));
        assert!(reply.reply.contains(ATTENTION_ADVISORY));
    }

    #[test]
    fn matched_condition_drives_suggestions() {
        let engine = engine_with(MockGenerator::failing());

        let reply = engine.handle(None, "burning stomach pain and nausea after meals");
        assert_eq!(reply.suggestions.len(), MAX_SUGGESTIONS);
        assert!(
            reply.suggestions[0].starts_with("What causes"),
            "got: {:?}",
            reply.suggestions
        );
    }

    #[test]
    fn suggestions_never_exceed_cap() {
        let engine = engine_with(MockGenerator::failing());

        let reply = engine.handle(None, "pain ache hurt nausea fever everywhere");
        assert!(reply.suggestions.len() <= MAX_SUGGESTIONS);
    }

    #[test]
    fn off_domain_generation_is_redirected_verbatim() {
        let engine = engine_with(MockGenerator::replying("Let me sing you a sea shanty."));

        let reply = engine.handle(None, "tell me a joke");
        assert_eq!(reply.reply, REDIRECT_REPLY);
    }

    #[test]
    fn warning_sign_adds_urgent_advisory_even_on_canned_reply() {
        let engine = engine_with(MockGenerator::failing());

        let reply = engine.handle(None, "hi, there is blood in vomit or stool");
        assert!(reply.reply.contains(URGENT_ADVISORY));
    }

    #[test]
    fn unknown_session_id_is_provisioned_not_rejected() {
        let engine = engine_with(MockGenerator::failing());
        let ghost = Uuid::new_v4();

        let reply = engine.handle(Some(ghost), "hello");
        assert_eq!(reply.session_id, ghost);
        assert_eq!(engine.get_history(ghost).len(), 2);
    }

    #[test]
    fn history_for_never_seen_session_is_empty() {
        let engine = engine_with(MockGenerator::failing());
        assert!(engine.get_history(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn conversation_accumulates_across_turns() {
        let engine = engine_with(MockGenerator::replying("Stomach care is important."));
        let sid = engine.new_session();

        engine.handle(Some(sid), "hello");
        engine.handle(Some(sid), "cramping and bloating for weeks");

        let history = engine.get_history(sid);
        assert_eq!(history.len(), 4);
        assert_eq!(history[2].content, "cramping and bloating for weeks");
    }

    #[test]
    fn reply_timestamp_is_recent() {
        let engine = engine_with(MockGenerator::failing());
        let before = Utc::now();
        let reply = engine.handle(None, "hello");
        assert!(reply.timestamp >= before);
    }
}
