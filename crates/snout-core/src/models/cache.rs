//! Process-wide model resolution cache.
//!
//! Resolving a model (preparing its cache directory, triggering a first-run
//! download) is expensive and must happen at most once per resource per
//! process. The cache is an explicit object owned by the entry point, keyed by
//! resource identity, with lookup-or-populate semantics: concurrent callers
//! for the same key block on the in-flight resolution and share its result.
//! Failures are not cached; a later call retries.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::ModelError;

/// Single-flight lookup-or-populate cache for resolved model locations
#[derive(Default)]
pub struct ModelCache {
    entries: Mutex<HashMap<String, Arc<Mutex<Option<PathBuf>>>>>,
}

impl ModelCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached path for `key`, or run `resolve` to populate it.
    ///
    /// Holding the per-key lock across `resolve` is what makes this
    /// single-flight: a second caller for the same key blocks until the first
    /// resolution finishes, then reads its result.
    pub fn resolve<F>(&self, key: &str, resolve: F) -> Result<PathBuf, ModelError>
    where
        F: FnOnce() -> Result<PathBuf, ModelError>,
    {
        let slot = {
            let mut entries = self
                .entries
                .lock()
                .map_err(|_| ModelError::Init("model cache lock poisoned".to_string()))?;
            entries.entry(key.to_string()).or_default().clone()
        };

        let mut guard = slot
            .lock()
            .map_err(|_| ModelError::Init("model cache entry lock poisoned".to_string()))?;
        if let Some(path) = guard.as_ref() {
            return Ok(path.clone());
        }

        let path = resolve()?;
        *guard = Some(path.clone());
        Ok(path)
    }
}

// ============================================================================
// TESTS
// ============================================================================
