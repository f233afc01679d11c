//! Generative fallback collaborator and its relevance filter.
//!
//! When neither the canned stage nor the knowledge stage answers, the
//! dispatcher asks a text generator for a best-effort continuation. The
//! draft is then vetted: empty drafts and drafts with no domain vocabulary
//! are replaced with fixed replies rather than shown to the user.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the generation collaborator. Every variant maps to the
/// same apologetic reply at the dispatcher boundary; the distinction
/// exists for logs.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Cannot reach generation backend at {0}")]
    Connection(String),
    #[error("Generation timed out after {0}s")]
    Timeout(u64),
    #[error("HTTP client error: {0}")]
    Http(String),
    #[error("Generation backend returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

/// Best-effort text continuation. May be slow, may fail, may return
/// empty text; the caller owns all of those outcomes.
pub trait TextGenerator {
    /// `context` is the concatenated prior conversation, possibly empty;
    /// `input` is the new user message.
    fn generate(&self, context: &str, input: &str) -> Result<String, GenerateError>;
}

// ═══════════════════════════════════════════════════════════
// Ollama-backed generator
// ═══════════════════════════════════════════════════════════

/// System framing for every fallback generation.
const SYSTEM_PROMPT: &str = "You are a medical assistant specialized in abdominal pain. \
     Answer briefly and conversationally, and stay within that scope.";

/// Text generator backed by a local Ollama instance.
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }

    /// Default local Ollama instance with a 30-second deadline.
    pub fn default_local() -> Self {
        Self::new("http://localhost:11434", "llama3.2", 30)
    }

    /// Generator wired from engine configuration.
    pub fn from_config(config: &crate::config::EngineConfig) -> Self {
        Self::new(
            &config.ollama_base_url,
            &config.ollama_model,
            config.generation_timeout_secs,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl TextGenerator for OllamaGenerator {
    fn generate(&self, context: &str, input: &str) -> Result<String, GenerateError> {
        let prompt = if context.is_empty() {
            input.to_string()
        } else {
            format!("{context}\n{input}")
        };

        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: &prompt,
            system: SYSTEM_PROMPT,
            stream: false,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                GenerateError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                GenerateError::Timeout(self.timeout_secs)
            } else {
                GenerateError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerateError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| GenerateError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response.trim().to_string())
    }
}

/// Mock generator for tests: a fixed reply or a fixed failure.
pub struct MockGenerator {
    response: Option<String>,
}

impl MockGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            response: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { response: None }
    }
}

impl TextGenerator for MockGenerator {
    fn generate(&self, _context: &str, _input: &str) -> Result<String, GenerateError> {
        match &self.response {
            Some(text) => Ok(text.clone()),
            None => Err(GenerateError::Connection("mock".into())),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Relevance filter
// ═══════════════════════════════════════════════════════════

pub(crate) const REDIRECT_REPLY: &str = "I'm specifically trained to help with abdominal pain and \
     digestive issues. Could you tell me more about any symptoms you're experiencing?";

pub(crate) const EMPTY_DRAFT_REPLY: &str = "I'm not sure how to respond to that. Could you ask about \
     abdominal pain symptoms?";

/// Vocabulary a generated draft must touch to be shown at all.
static DOMAIN_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(pain|symptom|condition|doctor|medical|treatment|abdomen|stomach|digestive|nausea|fever|diagnosis)",
    )
    .expect("Invalid domain keyword regex")
});

fn is_on_domain(text: &str) -> bool {
    DOMAIN_TERMS.is_match(text)
}

/// Vet a generated draft: empty drafts and off-domain drafts are
/// replaced with fixed messages, on-domain drafts pass through trimmed.
pub fn vet_draft(draft: &str) -> String {
    let trimmed = draft.trim();
    if trimmed.is_empty() {
        tracing::debug!("Fallback draft empty; substituting fixed reply");
        return EMPTY_DRAFT_REPLY.to_string();
    }
    if !is_on_domain(trimmed) {
        tracing::debug!("Fallback draft off domain; substituting redirect");
        return REDIRECT_REPLY.to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_domain_draft_passes_through_trimmed() {
        let draft = "  That could relate to stomach discomfort; a doctor can advise you. ";
        assert_eq!(
            vet_draft(draft),
            "That could relate to stomach discomfort; a doctor can advise you."
        );
    }

    #[test]
    fn off_domain_draft_is_replaced_with_redirect_verbatim() {
        let draft = "Sure! Here is a joke about two cats on a roof.";
        assert_eq!(vet_draft(draft), REDIRECT_REPLY);
    }

    #[test]
    fn empty_draft_is_replaced_with_fixed_reply() {
        assert_eq!(vet_draft(""), EMPTY_DRAFT_REPLY);
        assert_eq!(vet_draft("   \n "), EMPTY_DRAFT_REPLY);
    }

    #[test]
    fn every_domain_keyword_keeps_a_draft() {
        for keyword in [
            "pain", "symptom", "condition", "doctor", "medical", "treatment", "abdomen",
            "stomach", "digestive", "nausea", "fever", "diagnosis",
        ] {
            let draft = format!("Something about {keyword} in passing.");
            assert_eq!(vet_draft(&draft), draft, "keyword: {keyword}");
        }
    }

    #[test]
    fn keyword_match_is_case_insensitive_and_prefix_tolerant() {
        // "symptoms" and "Painful" still anchor on their keyword stems.
        assert_ne!(vet_draft("Your SYMPTOMS may vary."), REDIRECT_REPLY);
        assert_ne!(vet_draft("Painful episodes deserve attention."), REDIRECT_REPLY);
    }

    #[test]
    fn mock_generator_replies_and_fails_as_configured() {
        let ok = MockGenerator::replying("stomach advice");
        assert_eq!(ok.generate("", "x").unwrap(), "stomach advice");

        let broken = MockGenerator::failing();
        assert!(matches!(
            broken.generate("", "x"),
            Err(GenerateError::Connection(_))
        ));
    }

    #[test]
    fn ollama_generator_normalizes_base_url() {
        let generator = OllamaGenerator::new("http://localhost:11434/", "llama3.2", 5);
        assert_eq!(generator.model(), "llama3.2");
    }
}
