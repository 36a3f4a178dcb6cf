//! fastembed-backed model capabilities.
//!
//! Embeddings come from nomic-embed-text-v1.5 (ONNX, 8192 token context);
//! reranking from Jina Reranker v1 Turbo, a cross-encoder. fastembed owns the
//! first-run artifact download into the resolved cache directory; the
//! HuggingFace tokenizer provides the token spans the chunker needs.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fastembed::{
    EmbeddingModel, InitOptions, RerankInitOptions, RerankerModel, TextEmbedding, TextRerank,
};
use tokenizers::Tokenizer;

use super::{Embedder, ModelCache, ModelError, RerankScorer, Token};
use crate::DEFAULT_EMBEDDING_MODEL;
use crate::pipeline::vector::normalize_unit;

/// nomic-embed-text-v1.5 context window, in tokens
const NOMIC_CONTEXT_SIZE: usize = 8192;

/// Maximum text length in bytes before embedding input is truncated
const MAX_TEXT_LENGTH: usize = 32768;

fn prepare_models_dir(models_dir: &Path) -> Result<PathBuf, ModelError> {
    std::fs::create_dir_all(models_dir)
        .map_err(|e| ModelError::Init(format!("failed to create {}: {e}", models_dir.display())))?;
    Ok(models_dir.to_path_buf())
}

/// Truncate to a char boundary at or below `max_bytes`
fn truncate_text(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// ============================================================================
// EMBEDDER
// ============================================================================

/// Local embedding model (nomic-embed-text-v1.5 via fastembed)
pub struct FastembedEmbedder {
    model: Mutex<TextEmbedding>,
    tokenizer: Tokenizer,
}

impl FastembedEmbedder {
    /// Load the model, downloading artifacts into the resolved cache
    /// directory on first run.
    pub fn load(cache: &ModelCache, models_dir: &Path) -> Result<Self, ModelError> {
        let cache_dir = cache.resolve("embedding", || prepare_models_dir(models_dir))?;

        let options = InitOptions::new(EmbeddingModel::NomicEmbedTextV15)
            .with_show_download_progress(true)
            .with_cache_dir(cache_dir);
        let model = TextEmbedding::try_new(options)
            .map_err(|e| ModelError::Init(format!("embedding model: {e}")))?;

        let tokenizer = Tokenizer::from_pretrained(DEFAULT_EMBEDDING_MODEL, None)
            .map_err(|e| ModelError::Init(format!("embedding tokenizer: {e}")))?;

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
        })
    }
}

impl Embedder for FastembedEmbedder {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, ModelError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| ModelError::Tokenize(e.to_string()))?;

        Ok(encoding
            .get_ids()
            .iter()
            .zip(encoding.get_offsets())
            .map(|(&id, &(start, end))| Token { id, start, end })
            .collect())
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let text = truncate_text(text, MAX_TEXT_LENGTH);
        let mut model = self
            .model
            .lock()
            .map_err(|_| ModelError::Inference("embedding model lock poisoned".to_string()))?;

        let mut embeddings = model
            .embed(vec![text], None)
            .map_err(|e| ModelError::Inference(e.to_string()))?;
        let vector = embeddings
            .pop()
            .ok_or_else(|| ModelError::Inference("no embedding generated".to_string()))?;

        Ok(normalize_unit(vector))
    }

    fn context_size(&self) -> usize {
        NOMIC_CONTEXT_SIZE
    }
}

// ============================================================================
// RERANKER
// ============================================================================

/// Local cross-encoder (Jina Reranker v1 Turbo via fastembed)
pub struct FastembedReranker {
    model: Mutex<TextRerank>,
}

impl FastembedReranker {
    /// Load the model, downloading artifacts into the resolved cache
    /// directory on first run.
    pub fn load(cache: &ModelCache, models_dir: &Path) -> Result<Self, ModelError> {
        let cache_dir = cache.resolve("reranker", || prepare_models_dir(models_dir))?;

        let options = RerankInitOptions::new(RerankerModel::JINARerankerV1TurboEn)
            .with_show_download_progress(true)
            .with_cache_dir(cache_dir);
        let model = TextRerank::try_new(options)
            .map_err(|e| ModelError::Init(format!("reranker model: {e}")))?;

        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl RerankScorer for FastembedReranker {
    fn score_all(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, ModelError> {
        if documents.is_empty() {
            return Ok(vec![]);
        }

        let mut model = self
            .model
            .lock()
            .map_err(|_| ModelError::Inference("reranker lock poisoned".to_string()))?;

        let docs: Vec<&str> = documents.iter().map(String::as_str).collect();
        let results = model
            .rerank(query, &docs, false, None)
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        // Positional alignment: anything the batch response dropped scores 0
        let mut scores = vec![0.0_f32; documents.len()];
        for result in results {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = result.score;
            }
        }
        Ok(scores)
    }
}

// ============================================================================
// TESTS
// ============================================================================
