//! Text embedding collaborators.
//!
//! The retrieval index only needs a function from text to a dense vector
//! that is deterministic within a process run. Two implementations ship:
//! a dependency-free signed feature-hashing embedder that is always
//! available, and a real all-MiniLM-L6-v2 ONNX embedder behind the
//! `onnx-embeddings` feature.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Embedding dimension shared by both embedders (all-MiniLM-L6-v2 output).
pub const EMBEDDING_DIM: usize = 384;

/// Errors from embedding collaborators.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model file not found: {0}")]
    ModelNotFound(std::path::PathBuf),
    #[error("Model initialization failed: {0}")]
    ModelInit(String),
    #[error("Tokenization failed: {0}")]
    Tokenization(String),
    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Maps text to a fixed-length vector. Must be deterministic per process.
pub trait TextEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize;
}

// ═══════════════════════════════════════════════════════════
// Hashing embedder (always available)
// ═══════════════════════════════════════════════════════════

/// Signed feature-hashing embedder over word tokens.
///
/// Each lowercased alphanumeric token is hashed into one of `dimension`
/// buckets with an alternating sign, and the result is L2-normalized.
/// Texts that share tokens score proportionally to their overlap under
/// cosine similarity; unrelated texts score near zero. Not a semantic
/// model; it is the deterministic default for environments without the
/// ONNX runtime, and for tests.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self {
            dimension: EMBEDDING_DIM,
        }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEmbedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(hashed_vector(text, self.dimension))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Accumulate signed token hashes, then L2-normalize.
/// Empty or token-free text yields the zero vector.
fn hashed_vector(text: &str, dim: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dim];
    let lowered = text.to_lowercase();

    for token in lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let digest = Sha256::digest(token.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_be_bytes(bucket_bytes) % dim as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vec[bucket] += sign;
    }

    l2_normalize(&mut vec);
    vec
}

pub(crate) fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in vec.iter_mut() {
            *val /= norm;
        }
    }
}

// ═══════════════════════════════════════════════════════════
// MiniLM ONNX embedder, behind `onnx-embeddings` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-embeddings")]
mod minilm {
    use std::path::Path;
    use std::sync::Mutex;

    use ort::session::Session;
    use ort::value::TensorRef;

    use super::{EmbeddingError, TextEmbedder, EMBEDDING_DIM};

    /// all-MiniLM-L6-v2 inference via ONNX Runtime.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in the model directory.
    /// The session sits behind a Mutex because `Session::run` takes
    /// `&mut self` while the `TextEmbedder` trait exposes `&self`.
    pub struct MiniLmEmbedder {
        session: Mutex<Session>,
        tokenizer: tokenizers::Tokenizer,
    }

    impl MiniLmEmbedder {
        pub fn load(model_dir: &Path) -> Result<Self, EmbeddingError> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");
            for path in [&model_path, &tokenizer_path] {
                if !path.exists() {
                    return Err(EmbeddingError::ModelNotFound(path.clone()));
                }
            }

            let session = Session::builder()
                .and_then(|b| b.with_intra_threads(2))
                .and_then(|b| b.commit_from_file(&model_path))
                .map_err(|e: ort::Error| EmbeddingError::ModelInit(e.to_string()))?;

            let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| EmbeddingError::ModelInit(e.to_string()))?;

            tracing::info!(dir = %model_dir.display(), "MiniLM embedder loaded");

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
            })
        }

        fn infer(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?;

            let seq_len = encoding.get_ids().len();
            let as_i64 =
                |vals: &[u32]| -> Vec<i64> { vals.iter().map(|&v| v as i64).collect() };
            let attention_mask = as_i64(encoding.get_attention_mask());

            let to_array = |vals: Vec<i64>| {
                ndarray::Array2::from_shape_vec((1, seq_len), vals)
                    .map_err(|e| EmbeddingError::Inference(e.to_string()))
            };
            let ids = to_array(as_i64(encoding.get_ids()))?;
            let mask = to_array(attention_mask.clone())?;
            let types = to_array(as_i64(encoding.get_type_ids()))?;

            let ids_tensor = TensorRef::from_array_view(&ids)
                .map_err(|e| EmbeddingError::Inference(e.to_string()))?;
            let mask_tensor = TensorRef::from_array_view(&mask)
                .map_err(|e| EmbeddingError::Inference(e.to_string()))?;
            let types_tensor = TensorRef::from_array_view(&types)
                .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| EmbeddingError::Inference("session lock poisoned".into()))?;

            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, types_tensor])
                .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

            if shape.len() != 3 || shape[2] as usize != EMBEDDING_DIM {
                return Err(EmbeddingError::Inference(format!(
                    "unexpected output shape {shape:?}, expected [1, {seq_len}, {EMBEDDING_DIM}]"
                )));
            }

            // Mean pooling over the attention mask, then L2 normalization.
            let mut pooled = vec![0.0f32; EMBEDDING_DIM];
            let mut mask_sum = 0.0f32;
            for (token_idx, &mask_val) in attention_mask.iter().enumerate() {
                let weight = mask_val as f32;
                mask_sum += weight;
                let offset = token_idx * EMBEDDING_DIM;
                for (dim_idx, slot) in pooled.iter_mut().enumerate() {
                    *slot += data[offset + dim_idx] * weight;
                }
            }
            if mask_sum > 0.0 {
                for val in &mut pooled {
                    *val /= mask_sum;
                }
            }
            super::l2_normalize(&mut pooled);

            Ok(pooled)
        }
    }

    impl TextEmbedder for MiniLmEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.infer(text)
        }

        fn dimension(&self) -> usize {
            EMBEDDING_DIM
        }
    }
}

#[cfg(feature = "onnx-embeddings")]
pub use minilm::MiniLmEmbedder;
