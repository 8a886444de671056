/// On-disk cache of scan results, keyed by normalized path.
///
/// One JSON file per key lives under the cache directory; presence or
/// absence of the per-key file is the source of truth — there is no index.
/// The key is derived from the case-folded path (stable across
/// case-insensitive filesystems), not from content: the expensive operation
/// being avoided is tree *enumeration*, so a path key is exactly right.
///
/// Staleness is judged from the root directory's own modification time plus
/// a time-to-live. Deep structural changes that leave the root's mtime
/// untouched go undetected until a forced refresh — a deliberate
/// cost/precision trade-off, preserved as designed.
///
/// Read-side faults (missing, corrupt, expired) are all uniformly a cache
/// miss. Write-side faults are surfaced as [`CacheError`] for the caller to
/// log; they never block returning a scan result.
use crate::error::CacheError;
use crate::model::Node;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Entries older than this are treated as misses at read time.
pub const CACHE_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// A persisted scan result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The path string as queried.
    pub path: String,
    /// When the entry was written.
    pub timestamp: DateTime<Utc>,
    /// The root path's modification time at scan completion.
    pub root_modified: DateTime<Utc>,
    /// The full scanned tree.
    pub data: Node,
}

/// Summary returned by [`CacheStore::info`] for cache-management UIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheInfo {
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

/// The cache store. Cheap to construct; every operation is a single
/// read-or-write on one key's file.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Open a store rooted at `dir`. The directory is created lazily on the
    /// first write.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Open the store in the platform cache directory
    /// (e.g. `~/.cache/spacelens`).
    pub fn open_default() -> Result<Self, CacheError> {
        let base = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(Self::new(base.join("spacelens")))
    }

    /// Directory this store persists into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the entry for `path`, or `None` when it is absent, unreadable,
    /// structurally invalid, or older than the TTL.
    pub fn lookup(&self, path: &Path) -> Option<CacheEntry> {
        let file = self.entry_file(path);
        let raw = match fs::read_to_string(&file) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "cache miss: unreadable entry");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "cache miss: invalid entry");
                return None;
            }
        };

        let age = Utc::now().signed_duration_since(entry.timestamp);
        if age > Duration::seconds(CACHE_TTL_SECS) {
            debug!(path = %path.display(), "cache miss: entry expired");
            return None;
        }

        Some(entry)
    }

    /// Whether `entry` no longer reflects `path`. A failed stat counts as
    /// stale — fail toward freshness.
    pub fn is_stale(&self, entry: &CacheEntry, path: &Path) -> bool {
        match root_modified(path) {
            Some(modified) => modified != entry.root_modified,
            None => true,
        }
    }

    /// Persist `data` for `path`, replacing any prior entry for the key.
    pub fn store(&self, path: &Path, data: &Node) -> Result<(), CacheError> {
        let root_modified = root_modified(path).ok_or_else(|| {
            CacheError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("cannot stat {} for cache record", path.display()),
            ))
        })?;

        let entry = CacheEntry {
            path: path.to_string_lossy().into_owned(),
            timestamp: Utc::now(),
            root_modified,
            data: data.clone(),
        };

        fs::create_dir_all(&self.dir)?;
        let file = self.entry_file(path);
        fs::write(&file, serde_json::to_string(&entry)?)?;
        debug!(path = %path.display(), file = %file.display(), "cache entry written");
        Ok(())
    }

    /// Delete all persisted entries, best-effort. A single undeletable file
    /// is logged and skipped. Returns the number of entries removed; a
    /// missing cache directory removes zero.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let mut removed = 0;
        for entry in entries.filter_map(Result::ok) {
            let file = entry.path();
            if file.extension().is_some_and(|ext| ext == "json") {
                match fs::remove_file(&file) {
                    Ok(()) => removed += 1,
                    Err(err) => {
                        warn!(file = %file.display(), error = %err, "could not delete cache entry");
                    }
                }
            }
        }
        Ok(removed)
    }

    /// Lightweight presence check for `path`: the queried path and write
    /// time of a valid, unexpired entry.
    pub fn info(&self, path: &Path) -> Option<CacheInfo> {
        self.lookup(path).map(|entry| CacheInfo {
            path: entry.path,
            timestamp: entry.timestamp,
        })
    }

    fn entry_file(&self, path: &Path) -> PathBuf {
        self.dir.join(format!("{:016x}.json", hashed_key(path)))
    }
}

/// Case-folded path string, the normalization under both the cache key and
/// the scanner's in-flight registry. Two spellings of one path on a
/// case-insensitive filesystem map to the same slot.
pub fn normalized_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

/// Stable hash of the normalized key. `DefaultHasher::new()` is keyed with
/// constants, so the value survives across processes.
fn hashed_key(path: &Path) -> u64 {
    let mut hasher = DefaultHasher::new();
    normalized_key(path).hash(&mut hasher);
    hasher.finish()
}

fn root_modified(path: &Path) -> Option<DateTime<Utc>> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}
