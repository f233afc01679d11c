//! Engine configuration.

/// Tunables for retrieval, context assembly, and the generation backend.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Retrieval candidates considered per query.
    pub top_k: usize,
    /// Minimum cosine similarity for a retrieval hit.
    pub min_similarity: f32,
    /// Prior messages included as generation context.
    pub max_history_context: usize,
    /// Request deadline for the generation collaborator, in seconds.
    /// Expiry is treated like any other collaborator failure.
    pub generation_timeout_secs: u64,
    /// Base URL of the local Ollama instance.
    pub ollama_base_url: String,
    /// Model used for fallback generation.
    pub ollama_model: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_similarity: 0.3,
            max_history_context: 5,
            generation_timeout_secs: 30,
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2".to_string(),
        }
    }
}
