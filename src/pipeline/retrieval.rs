//! Condition retrieval by embedding similarity.
//!
//! One vector per condition, computed once at startup from the condition's
//! profile text and read-only afterwards. Queries are a cosine-scored
//! linear scan; at single-digit knowledge-base sizes nothing more is
//! warranted, and this deliberately does not generalize to large corpora.

use std::cmp::Ordering;

use serde::Serialize;
use thiserror::Error;

use super::embedding::{EmbeddingError, TextEmbedder};
use crate::knowledge::KnowledgeBase;

/// Errors from index construction or querying.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// One retrieval hit: a condition key and its similarity to the query.
/// Transient: produced per query, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub key: String,
    pub score: f32,
}

struct IndexEntry {
    key: &'static str,
    embedding: Vec<f32>,
}

/// Read-only nearest-neighbor index over the condition table.
/// Safe for unsynchronized concurrent reads once built.
pub struct ConditionIndex {
    entries: Vec<IndexEntry>,
}

impl ConditionIndex {
    /// Embed every condition's profile text with the given embedder.
    pub fn build(
        kb: &KnowledgeBase,
        embedder: &dyn TextEmbedder,
    ) -> Result<Self, RetrievalError> {
        let mut entries = Vec::with_capacity(kb.len());
        for condition in kb.conditions() {
            let embedding = embedder.embed(&condition.profile_text())?;
            entries.push(IndexEntry {
                key: condition.key,
                embedding,
            });
        }
        tracing::info!(conditions = entries.len(), "Condition index built");
        Ok(Self { entries })
    }

    /// An index with no entries; every query returns no results.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-`k` conditions whose cosine similarity to the query strictly
    /// exceeds `min_similarity`, ordered by score descending with ties
    /// broken by key ascending. An empty index yields an empty result,
    /// not an error. The embedder must be the one the index was built with.
    pub fn query(
        &self,
        text: &str,
        embedder: &dyn TextEmbedder,
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<RetrievalResult>, RetrievalError> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = embedder.embed(text)?;

        let mut scored: Vec<RetrievalResult> = self
            .entries
            .iter()
            .map(|entry| RetrievalResult {
                key: entry.key.to_string(),
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .filter(|r| r.score > min_similarity)
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        scored.truncate(top_k);

        Ok(scored)
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
