//! Configuration loading.
//!
//! Settings live in a single JSON file under the platform config directory
//! (`~/.config/snout/config.json` on Linux). Every field is optional; an
//! absent file means all defaults. A file that exists but does not parse is a
//! fatal configuration error, never silently ignored.

use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;

use crate::pipeline::QueryOptions;
use crate::sync::SyncOptions;

/// Default RRF smoothing constant
pub const DEFAULT_RRF_K: f32 = 60.0;

/// Default size of the rerank window (fused candidates fed to the cross-encoder)
pub const DEFAULT_RERANK_TOP_K: usize = 50;

/// Default number of final results
pub const DEFAULT_TOP_N: i64 = 10;

/// Default chunk window size in tokens (capped by the embedder's context size)
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// Default overlap between adjacent chunk windows, in tokens
pub const DEFAULT_CHUNK_OVERLAP: usize = 32;

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file was named explicitly but does not exist
    #[error("config not found: {0}")]
    NotFound(PathBuf),
    /// Config file exists but could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Config file exists but is not valid JSON
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Platform directories could not be determined
    #[error("could not determine platform directories")]
    NoProjectDirs,
}

/// On-disk shape of the config file; all fields optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
    bear_db_path: Option<PathBuf>,
    db_path: Option<PathBuf>,
    models_dir: Option<PathBuf>,
    rrf_k: Option<f32>,
    rerank_top_k: Option<usize>,
    top_n: Option<i64>,
    embedding_chunk_size: Option<usize>,
    embedding_chunk_overlap: Option<usize>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct SnoutConfig {
    /// Path to Bear's read-only SQLite database
    pub bear_db_path: PathBuf,
    /// Path to the snout index database
    pub db_path: PathBuf,
    /// Cache directory for model artifacts
    pub models_dir: PathBuf,
    /// RRF smoothing constant
    pub rrf_k: f32,
    /// Fused candidates fed to the reranker
    pub rerank_top_k: usize,
    /// Final result count
    pub top_n: i64,
    /// Chunk window size in tokens
    pub embedding_chunk_size: usize,
    /// Chunk window overlap in tokens
    pub embedding_chunk_overlap: usize,
}

impl SnoutConfig {
    /// Load from the default platform config path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let dirs = project_dirs()?;
        let path = dirs.config_dir().join("config.json");
        if path.exists() {
            Self::load(&path)
        } else {
            Self::from_raw(RawConfig::default())
        }
    }

    /// Load from an explicit path; the file must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: RawConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_raw(parsed)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let dirs = project_dirs()?;
        Ok(Self {
            bear_db_path: match raw.bear_db_path {
                Some(p) => p,
                None => default_bear_db_path()?,
            },
            db_path: raw
                .db_path
                .unwrap_or_else(|| dirs.data_dir().join("snout.db")),
            models_dir: raw
                .models_dir
                .unwrap_or_else(|| dirs.cache_dir().join("models")),
            rrf_k: raw.rrf_k.unwrap_or(DEFAULT_RRF_K),
            rerank_top_k: raw.rerank_top_k.unwrap_or(DEFAULT_RERANK_TOP_K),
            top_n: raw.top_n.unwrap_or(DEFAULT_TOP_N),
            embedding_chunk_size: raw.embedding_chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            embedding_chunk_overlap: raw
                .embedding_chunk_overlap
                .unwrap_or(DEFAULT_CHUNK_OVERLAP),
        })
    }

    /// Sync parameters derived from this config
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            chunk_size: self.embedding_chunk_size,
            chunk_overlap: self.embedding_chunk_overlap,
            ..SyncOptions::default()
        }
    }

    /// Query parameters derived from this config, with an optional top-n override
    pub fn query_options(&self, top_n: Option<i64>) -> QueryOptions {
        QueryOptions {
            rrf_k: self.rrf_k,
            rerank_top_k: self.rerank_top_k,
            top_n: top_n.unwrap_or(self.top_n),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("com", "zeroaltitude", "snout").ok_or(ConfigError::NoProjectDirs)
}

/// Bear's database location inside its macOS group container
fn default_bear_db_path() -> Result<PathBuf, ConfigError> {
    let base = BaseDirs::new().ok_or(ConfigError::NoProjectDirs)?;
    Ok(base.home_dir().join(
        "Library/Group Containers/9K33E3U3T4.net.shinyfrog.bear/Application Data/database.sqlite",
    ))
}

// ============================================================================
// TESTS
// ============================================================================
