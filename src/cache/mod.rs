//! Generation cache
//!
//! Records, per post UID, a hash of the last rendered page and when it was
//! generated. The generator uses the hash to skip rewriting unchanged pages;
//! the server uses the timestamp to decide when a page is due for
//! regeneration.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Cache file name inside the cache directory
const CACHE_FILE: &str = "db.json";

/// Represents a cached entry for a generated post page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// SHA-256 of the rendered HTML, hex encoded
    pub content_hash: String,
    /// Generation time (unix timestamp)
    pub generated_at: i64,
    /// Output path relative to public dir
    pub output_path: String,
}

/// Cache database for generated pages
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    /// Version of the cache format
    pub version: u32,
    /// Generated post pages, keyed by UID
    pub posts: HashMap<String, CacheEntry>,
    /// When the listing page was last generated (unix timestamp)
    pub index_generated_at: Option<i64>,
}

impl CacheDb {
    /// Current cache format version
    const VERSION: u32 = 2;

    /// Load cache from disk, or create a new empty cache
    pub fn load(cache_dir: &Path) -> Self {
        let cache_path = cache_dir.join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            match serde_json::from_str::<CacheDb>(&content) {
                Ok(cache) if cache.version == Self::VERSION => return cache,
                Ok(_) => tracing::info!("Cache version mismatch, rebuilding cache"),
                Err(e) => tracing::warn!("Ignoring unreadable cache {:?}: {}", cache_path, e),
            }
        }
        Self::new()
    }

    /// Save cache to disk
    pub fn save(&self, cache_dir: &Path) -> Result<()> {
        fs::create_dir_all(cache_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_dir.join(CACHE_FILE), content)?;
        Ok(())
    }

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Whether the page for `uid` was last rendered with this hash
    pub fn is_unchanged(&self, uid: &str, content_hash: &str) -> bool {
        self.posts
            .get(uid)
            .is_some_and(|e| e.content_hash == content_hash)
    }

    /// Whether the page for `uid` is missing or older than `revalidate` seconds
    pub fn is_stale(&self, uid: &str, now: i64, revalidate: u64) -> bool {
        match self.posts.get(uid) {
            Some(entry) => now.saturating_sub(entry.generated_at) >= revalidate as i64,
            None => true,
        }
    }

    /// Record a freshly generated page
    pub fn record(&mut self, uid: &str, content_hash: &str, output_path: &str, now: i64) {
        self.posts.insert(
            uid.to_string(),
            CacheEntry {
                content_hash: content_hash.to_string(),
                generated_at: now,
                output_path: output_path.to_string(),
            },
        );
    }

    /// Forget a page
    pub fn remove(&mut self, uid: &str) -> Option<CacheEntry> {
        self.posts.remove(uid)
    }
}

/// Calculate a hash for rendered content
///
/// The value is persisted, so it must not depend on the toolchain.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
