//! The dispatcher itself: runs the stages in order and owns the
//! failure-to-apology boundary.

use crate::config::EngineConfig;
use crate::knowledge::KnowledgeBase;
use crate::pipeline::embedding::TextEmbedder;
use crate::pipeline::retrieval::ConditionIndex;
use crate::session::Message;

use super::canned::match_canned;
use super::generate::{vet_draft, TextGenerator};
use super::medical::{condition_reply, URGENT_ADVISORY};
use super::{DispatchError, DispatchOutcome, Stage};

/// Substituted whenever any stage fails internally.
pub(crate) const APOLOGY_REPLY: &str = "I apologize, but I'm having trouble processing your request. \
     Could you please rephrase your question?";

/// Coordinates canned → knowledge → fallback dispatch for one message.
/// Stateless across turns; conversation state lives in the session store.
pub struct Dispatcher<'a, E: TextEmbedder, G: TextGenerator> {
    kb: &'a KnowledgeBase,
    index: &'a ConditionIndex,
    embedder: &'a E,
    generator: &'a G,
    config: &'a EngineConfig,
}

impl<'a, E: TextEmbedder, G: TextGenerator> Dispatcher<'a, E, G> {
    pub fn new(
        kb: &'a KnowledgeBase,
        index: &'a ConditionIndex,
        embedder: &'a E,
        generator: &'a G,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            kb,
            index,
            embedder,
            generator,
            config,
        }
    }

    /// Produce the reply for one message. Never fails: internal stage
    /// errors are logged and mapped to the fixed apology. `history` is the
    /// prior conversation, oldest first, without the message being handled.
    pub fn dispatch(&self, text: &str, history: &[Message]) -> DispatchOutcome {
        let lowered = text.to_lowercase();

        let mut outcome = match self.respond(text, &lowered, history) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Dispatch stage failed; substituting apology");
                DispatchOutcome {
                    reply: APOLOGY_REPLY.to_string(),
                    matched: None,
                    stage: Stage::Recovery,
                }
            }
        };

        // The urgent advisory follows the user's wording, not the stage:
        // the knowledge stage already placed it inline, every other stage
        // gets it appended here.
        if outcome.stage != Stage::Knowledge && self.kb.contains_warning_sign(&lowered) {
            outcome.reply = format!("{}\n\n{URGENT_ADVISORY}", outcome.reply);
        }

        tracing::debug!(stage = ?outcome.stage, "Message dispatched");
        outcome
    }

    fn respond(
        &self,
        text: &str,
        lowered: &str,
        history: &[Message],
    ) -> Result<DispatchOutcome, DispatchError> {
        if let Some(reply) = match_canned(self.kb, lowered) {
            return Ok(DispatchOutcome {
                reply: reply.to_string(),
                matched: None,
                stage: Stage::Canned,
            });
        }

        let results = self.index.query(
            text,
            self.embedder,
            self.config.top_k,
            self.config.min_similarity,
        )?;

        if let Some(top) = results.into_iter().next() {
            let condition = self
                .kb
                .get(&top.key)
                .ok_or_else(|| DispatchError::UnknownCondition(top.key.clone()))?;
            return Ok(DispatchOutcome {
                reply: condition_reply(condition, lowered, self.kb),
                matched: Some(top),
                stage: Stage::Knowledge,
            });
        }

        let context = self.context_window(history);
        let draft = self.generator.generate(&context, text)?;
        Ok(DispatchOutcome {
            reply: vet_draft(&draft),
            matched: None,
            stage: Stage::Fallback,
        })
    }

    /// Concatenate the most recent prior messages as generation context.
    fn context_window(&self, history: &[Message]) -> String {
        let skip = history.len().saturating_sub(self.config.max_history_context);
        history[skip..]
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
