/// Error taxonomy for scan and cache operations.
///
/// Only two failures ever cross the scan boundary: the root path being
/// unstattable ([`ScanError::Access`]) and a duplicate request for a path
/// already being scanned ([`ScanError::Busy`]). Every descendant-level fault
/// is absorbed inside the scanner and degrades to "contributes zero, omitted
/// from the tree". Cache faults are never fatal: read problems become cache
/// misses, write problems are logged and the scan result is still returned.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A failure surfaced to the caller of a scan request.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The root path could not be stat'd. Carries the underlying message.
    #[error("cannot access {path}: {source}")]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A scan for this path is already in flight. The request is rejected
    /// immediately rather than queued or deduplicated.
    #[error("a scan of {0} is already in progress")]
    Busy(PathBuf),
}

/// A failure inside the cache store.
///
/// Read-side variants are always recovered to a cache miss by the caller;
/// write-side failures are logged and otherwise ignored.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cache serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no cache directory available on this platform")]
    NoCacheDir,
}
