//! # Snout Core
//!
//! Hybrid retrieval engine for a personal Bear note corpus:
//!
//! - **Keyword search**: SQLite FTS5 with BM25 scoring over note chunks
//! - **Semantic search**: local embeddings (fastembed, nomic-embed-text-v1.5),
//!   brute-force cosine scoring with a bounded top-K heap
//! - **Rank fusion**: Reciprocal Rank Fusion of both signals
//! - **Reranking**: cross-encoder batch scoring of the fused candidates
//! - **Incremental sync**: checkpoint watermark + content-hash integrity checks,
//!   one transaction per note
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use snout_core::{pipeline, source, sync, IndexStore, SnoutConfig};
//!
//! let config = SnoutConfig::load_default()?;
//! let mut store = IndexStore::open(&config.db_path)?;
//!
//! // Sync Bear notes into the index
//! let notes = source::bear::read_notes(&config.bear_db_path, None)?;
//! let report = sync::run_sync(&mut store, notes, &embedder, &config.sync_options(), &mut |_| {})?;
//!
//! // Query
//! let hits = pipeline::run_query(&store, &embedder, &reranker, "vector clocks", &config.query_options(None))?;
//! ```
//!
//! ## Feature Flags
//!
//! - `models` (default): fastembed-backed [`Embedder`]/[`RerankScorer`] implementations
//! - `bundled-sqlite` (default): compile SQLite (with FTS5) from source

// ============================================================================
// MODULES
// ============================================================================

pub mod chunk_id;
pub mod config;
pub mod hash;
pub mod models;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod sync;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use chunk_id::ChunkRef;
pub use config::{ConfigError, SnoutConfig};
pub use hash::content_hash;
pub use models::{Embedder, ModelCache, ModelError, RerankScorer, Token};
pub use pipeline::{QueryError, QueryHit, QueryOptions, RankedItem, run_query};
pub use source::{Note, SourceError};
pub use storage::{IndexStore, StorageError};
pub use sync::{SyncCheckpoint, SyncOptions, SyncProgress, SyncReport, run_sync};

#[cfg(feature = "models")]
pub use models::{FastembedEmbedder, FastembedReranker};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model identifier
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-ai/nomic-embed-text-v1.5";
