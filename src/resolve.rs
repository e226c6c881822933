//! Core resolution pipeline: layer every config source into one store.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no I/O, making the full
//! pipeline testable with synthetic inputs. Steps:
//!
//! 1. Parse and flatten config files (later overrides earlier)
//! 2. Layer env vars on top
//! 3. Layer programmatic overrides on top (highest priority)
//!
//! Every layer is sparse: a key replaces the same key below it and leaves
//! everything else alone.

use std::path::PathBuf;

use crate::env;
use crate::error::SourceError;
use crate::file;
use crate::store::MemoryStore;

/// All pre-loaded data needed to build a store. No I/O happens here.
#[derive(Debug, Default)]
pub struct ResolveInput {
    /// File contents in precedence order: first = lowest priority, last = highest.
    pub files: Vec<(PathBuf, String)>,
    /// Environment variable pairs, `KEY__A__B = value`. Synthetic data works as well as the process environment.
    pub env_vars: Vec<(String, String)>,
    /// Env var prefix (e.g. `"MYAPP"`). `None` means env disabled.
    pub env_prefix: Option<String>,
    /// Overrides as `(colon_key, value)` pairs.
    pub overrides: Vec<(String, String)>,
}

/// Resolve a [`MemoryStore`] from pre-loaded inputs.
pub fn resolve(input: ResolveInput) -> Result<MemoryStore, SourceError> {
    let mut store = MemoryStore::new();

    for (path, content) in &input.files {
        store.extend(file::parse_file(path, content)?);
    }

    if let Some(prefix) = &input.env_prefix {
        let pairs = env::env_to_pairs(prefix, input.env_vars);
        tracing::debug!(prefix = %prefix, keys = pairs.len(), "layering environment");
        store.extend(pairs);
    }

    store.extend(input.overrides);
    tracing::debug!(keys = store.len(), "resolved configuration store");
    Ok(store)
}
