//! Model capabilities.
//!
//! The pipeline consumes two capability objects: an [`Embedder`] (tokenize +
//! embed, with a model-imposed context length) and a [`RerankScorer`]
//! (batch cross-encoder scoring). Any backing implementation satisfies the
//! same contract; the shipped ones run fastembed ONNX models locally.
//!
//! Both are scoped resources: construct them for an invocation and let `Drop`
//! release model state on every exit path.

mod cache;
#[cfg(feature = "models")]
mod fastembed;

pub use cache::ModelCache;
#[cfg(feature = "models")]
pub use fastembed::{FastembedEmbedder, FastembedReranker};

/// Model error types
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Failed to initialize a model
    #[error("model initialization failed: {0}")]
    Init(String),
    /// Failed to tokenize input text
    #[error("tokenization failed: {0}")]
    Tokenize(String),
    /// Failed to run inference
    #[error("inference failed: {0}")]
    Inference(String),
}

/// One token of embedder input, with its byte span in the source text.
///
/// The spans let chunk windows map back to slices of the original note
/// content, so the same windows feed both the lexical index and the embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Vocabulary id
    pub id: u32,
    /// Byte offset of the token's start in the source text
    pub start: usize,
    /// Byte offset one past the token's end
    pub end: usize,
}

/// Text embedding capability
pub trait Embedder {
    /// Tokenize text into model tokens with source spans
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, ModelError>;

    /// Embed text into a unit-normalized vector
    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError>;

    /// Model-imposed maximum context length in tokens; caps the chunk size
    fn context_size(&self) -> usize;
}

/// Cross-encoder relevance scoring capability
pub trait RerankScorer {
    /// Score every document against the query in one batch.
    ///
    /// The returned scores are positionally aligned with `documents`.
    fn score_all(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, ModelError>;
}
