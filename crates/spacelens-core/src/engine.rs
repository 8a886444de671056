/// Scan-request façade — the cache-aware entry point frontends call.
///
/// Control flow for one request: cache lookup (skipped when the caller
/// forces a refresh) → staleness check against the root's mtime → either the
/// cached tree or a fresh scan that is then persisted. A cache write failure
/// is logged and the scan result is returned regardless.
use crate::cache::{CacheInfo, CacheStore};
use crate::error::{CacheError, ScanError};
use crate::model::Node;
use crate::scanner::progress::ScanProgress;
use crate::scanner::{Scanner, DEFAULT_MAX_DEPTH};
use crossbeam_channel::Sender;
use std::path::Path;
use tracing::{debug, info, warn};

/// Result of a scan request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    /// The size-annotated tree for the requested root.
    pub tree: Node,
    /// `true` when the tree was served from the cache without walking.
    pub from_cache: bool,
}

/// Scanner and cache wired together behind one request surface.
#[derive(Debug)]
pub struct Engine {
    scanner: Scanner,
    cache: CacheStore,
    max_depth: usize,
}

impl Engine {
    /// Build an engine over `cache` with the default materialisation depth.
    pub fn new(cache: CacheStore) -> Self {
        Self::with_max_depth(cache, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(cache: CacheStore, max_depth: usize) -> Self {
        Self {
            scanner: Scanner::new(),
            cache,
            max_depth,
        }
    }

    /// Serve a scan request for `path`.
    ///
    /// With `force_refresh` the cache is bypassed on the read side but still
    /// written on completion. Fails only with [`ScanError::Access`] or
    /// [`ScanError::Busy`].
    pub fn scan(&self, path: &Path, force_refresh: bool) -> Result<ScanOutcome, ScanError> {
        self.scan_with_progress(path, force_refresh, None)
    }

    /// Like [`scan`](Self::scan), emitting root-level batch progress to
    /// `progress` while walking. No progress is emitted on a cache hit.
    pub fn scan_with_progress(
        &self,
        path: &Path,
        force_refresh: bool,
        progress: Option<&Sender<ScanProgress>>,
    ) -> Result<ScanOutcome, ScanError> {
        if !force_refresh {
            if let Some(entry) = self.cache.lookup(path) {
                if !self.cache.is_stale(&entry, path) {
                    debug!(path = %path.display(), "serving tree from cache");
                    return Ok(ScanOutcome {
                        tree: entry.data,
                        from_cache: true,
                    });
                }
                debug!(path = %path.display(), "cache entry stale, rescanning");
            }
        }

        let tree = self
            .scanner
            .scan_with_progress(path, self.max_depth, progress)?;
        info!(
            path = %path.display(),
            size = tree.size,
            nodes = tree.node_count(),
            "scan complete"
        );

        if let Err(err) = self.cache.store(path, &tree) {
            // Persistence is best-effort; the caller still gets the tree.
            warn!(path = %path.display(), error = %err, "failed to persist scan result");
        }

        Ok(ScanOutcome {
            tree,
            from_cache: false,
        })
    }

    /// Delete all cached scan results. Returns how many entries were removed.
    pub fn clear_cache(&self) -> Result<usize, CacheError> {
        self.cache.clear()
    }

    /// Cache presence info for `path`, if a valid unexpired entry exists.
    pub fn cache_info(&self, path: &Path) -> Option<CacheInfo> {
        self.cache.info(path)
    }
}
