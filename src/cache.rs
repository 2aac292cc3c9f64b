//! Bounded cache of parsed snapshots keyed by a digest of the source.
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest as _, Sha256};

use crate::error::Error;
use crate::grammar::Grammar;
use crate::tree::{ParseOptions, SyntaxTree};

/// Parse cache shared by every request of a process.
///
/// Editors resend the whole buffer on each call, so identical sources are
/// parsed once. Snapshots are immutable and handed out behind `Arc`. When
/// full, the least recently used snapshot is dropped.
#[derive(Debug)]
pub struct ParseCache {
    /// Digest to snapshot, `None` when the capacity is `0`. The lock is
    /// never held across a parse.
    entries: Option<Mutex<LruCache<String, Arc<SyntaxTree>>>>,
}

impl ParseCache {
    /// Whether the cache holds no snapshots.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Number of snapshots currently held.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        return self.entries.as_ref().map_or(0, |entries| return entries.lock().len());
    }

    /// An empty cache holding at most `capacity` snapshots. `0` disables caching.
    pub fn new(capacity: usize) -> Self {
        return Self { entries: NonZeroUsize::new(capacity).map(|cap| return Mutex::new(LruCache::new(cap))) };
    }

    /// Return the snapshot for `source`, parsing it on a miss.
    ///
    /// # Errors
    ///
    /// Propagates any error from `SyntaxTree::parse`. Failed parses are not cached.
    pub fn parse(
        &self,
        origin: &str,
        source: &str,
        grammar: &Grammar,
        options: ParseOptions<'_>,
    ) -> Result<Arc<SyntaxTree>, Error> {
        let Some(entries) = &self.entries else {
            return SyntaxTree::parse(origin, source.to_string(), grammar, options).map(Arc::new);
        };

        let key = cache_key(grammar.name, options.extra_containers, source);
        if let Some(hit) = entries.lock().get(&key)
            && hit.source() == source
            && hit.language() == grammar.name
        {
            tracing::trace!(origin, key = %key, "parse cache hit");
            return Ok(Arc::clone(hit));
        }

        let tree = Arc::new(SyntaxTree::parse(origin, source.to_string(), grammar, options)?);

        let mut entries = entries.lock();
        if let Some((evicted, _)) = entries.push(key.clone(), Arc::clone(&tree))
            && evicted != key
        {
            tracing::trace!(key = %evicted, "parse cache eviction");
        }

        return Ok(tree);
    }
}

/// Hex SHA-256 over the language, its extra containers, and the source.
fn cache_key(language: &str, extra_containers: &[String], source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(language.as_bytes());
    hasher.update([0]);
    for kind in extra_containers {
        hasher.update(kind.as_bytes());
        hasher.update([0]);
    }
    hasher.update(source.as_bytes());
    return format!("{:x}", hasher.finalize());
}
