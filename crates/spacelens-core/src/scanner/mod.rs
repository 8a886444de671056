/// Scanner module — depth-bounded, batch-concurrent directory walking.
///
/// The walk is a fork-join recursion with bounded fan-out: a directory's
/// entries are split into fixed-size batches, batches run sequentially, and
/// within one batch every child is scanned in parallel on the rayon pool and
/// joined before the next batch starts. Siblings share no mutable state, so
/// the walk itself needs no locking.
///
/// Two batch sizes apply. While the tree is still being materialised
/// (above `max_depth`) batches hold [`TREE_BATCH_SIZE`] entries; once past
/// the materialisation depth the scan switches to size-only aggregation in
/// [`SIZE_BATCH_SIZE`]-entry batches, keeping totals exact without building
/// nodes the renderer would never show.
///
/// # Failure semantics
///
/// Only the root stat can fail a scan. Past that point every fault is
/// absorbed: an unreadable directory becomes an empty node of size zero, a
/// child that cannot be scanned contributes neither a node nor any bytes.
pub mod progress;

use crate::cache::normalized_key;
use crate::error::ScanError;
use crate::model::Node;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use progress::ScanProgress;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Entries per batch while child nodes are being materialised.
pub const TREE_BATCH_SIZE: usize = 20;

/// Entries per batch in the size-only aggregation below the cutoff depth.
/// Larger than [`TREE_BATCH_SIZE`] because no nodes are built there, only
/// `u64` sums.
pub const SIZE_BATCH_SIZE: usize = 50;

/// Default depth at which the scan stops materialising child nodes.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Recommended capacity for a progress channel. Progress sends never block:
/// if the consumer falls this far behind, further snapshots are dropped and
/// the next one overwrites them anyway.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// The scan engine.
///
/// Holds the registry of paths currently being scanned. The registry is
/// instance-owned, not process-global, so engines stay independently
/// testable and several can coexist in one process.
#[derive(Debug, Default)]
pub struct Scanner {
    in_flight: Mutex<HashSet<String>>,
}

/// Removes its path from the in-flight registry when dropped, so every exit
/// from a scan (including the root-stat error path) releases the slot.
struct FlightGuard<'a> {
    registry: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root` down to `max_depth`, returning the size-annotated tree.
    ///
    /// Fails only with [`ScanError::Access`] (root unstattable) or
    /// [`ScanError::Busy`] (a scan of the same path is already running).
    pub fn scan(&self, root: &Path, max_depth: usize) -> Result<Node, ScanError> {
        self.scan_with_progress(root, max_depth, None)
    }

    /// Like [`scan`](Self::scan), additionally emitting an
    /// [`ScanProgress`] snapshot after each completed batch of the root's
    /// immediate children. Sends are fire-and-forget and never block the
    /// walk.
    pub fn scan_with_progress(
        &self,
        root: &Path,
        max_depth: usize,
        progress: Option<&Sender<ScanProgress>>,
    ) -> Result<Node, ScanError> {
        let _guard = self.claim(root)?;
        self.walk(root, 0, max_depth, progress)
            .map_err(|source| ScanError::Access {
                path: root.to_path_buf(),
                source,
            })
    }

    /// Register `root` as in flight, rejecting duplicates immediately.
    fn claim(&self, root: &Path) -> Result<FlightGuard<'_>, ScanError> {
        let key = normalized_key(root);
        let mut registry = self.in_flight.lock();
        if !registry.insert(key.clone()) {
            return Err(ScanError::Busy(root.to_path_buf()));
        }
        Ok(FlightGuard {
            registry: &self.in_flight,
            key,
        })
    }

    /// Recursive walk. Returns `Err` only for the root stat; the caller maps
    /// that to [`ScanError::Access`]. At `depth > 0` the parent drops failed
    /// children instead of propagating.
    ///
    /// Stats follow symlinks, matching plain `stat` semantics. Nothing here
    /// guards against symlink cycles; see the crate-level notes.
    fn walk(
        &self,
        path: &Path,
        depth: usize,
        max_depth: usize,
        progress: Option<&Sender<ScanProgress>>,
    ) -> io::Result<Node> {
        let meta = fs::metadata(path)?;

        if meta.is_file() {
            return Ok(Node::file(path, meta.len(), meta.modified().ok()));
        }

        let mut node = Node::dir(path, meta.modified().ok());

        if depth >= max_depth {
            // Past the materialisation depth: exact subtree size, no children.
            node.size = self.aggregate_size(path);
            return Ok(node);
        }

        let entries = match read_entry_paths(path) {
            Ok(entries) => entries,
            Err(err) => {
                // Enumeration failure is absorbed: empty directory, size 0.
                debug!(path = %path.display(), error = %err, "directory enumeration failed");
                return Ok(node);
            }
        };

        let total = entries.len();
        let mut scanned = 0usize;

        for batch in entries.chunks(TREE_BATCH_SIZE) {
            // Fork the whole batch, join before the next one starts.
            let mut children: Vec<Node> = batch
                .par_iter()
                .filter_map(|child| self.walk(child, depth + 1, max_depth, None).ok())
                .collect();
            node.children.append(&mut children);

            scanned += batch.len();
            if depth == 0 {
                if let Some(tx) = progress {
                    let _ = tx.try_send(ScanProgress { scanned, total });
                }
            }
        }

        // Stable sort keeps input order on size ties.
        node.children.sort_by(|a, b| b.size.cmp(&a.size));
        node.size = node.children.iter().map(|c| c.size).sum();
        Ok(node)
    }

    /// Sum all file bytes under `path` without materialising nodes, using
    /// the same batched fork-join as the tree levels. Every fault here
    /// contributes zero.
    fn aggregate_size(&self, path: &Path) -> u64 {
        let entries = match read_entry_paths(path) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut size = 0u64;
        for batch in entries.chunks(SIZE_BATCH_SIZE) {
            size += batch
                .par_iter()
                .map(|entry| match fs::metadata(entry) {
                    Ok(meta) if meta.is_file() => meta.len(),
                    Ok(_) => self.aggregate_size(entry),
                    Err(_) => 0,
                })
                .sum::<u64>();
        }
        size
    }
}

/// Enumerate the immediate entry paths of a directory. Entries that fail to
/// resolve while iterating are skipped.
fn read_entry_paths(path: &Path) -> io::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_bytes(path: &Path, n: usize) {
        let mut f = File::create(path).unwrap();
        f.write_all(&vec![0u8; n]).unwrap();
    }

    /// root/
    ///   a.txt (100)
    ///   sub/
    ///     b.bin (200)
    ///     deep/
    ///       c.dat (300)
    fn make_tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_bytes(&tmp.path().join("a.txt"), 100);
        let sub = tmp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        write_bytes(&sub.join("b.bin"), 200);
        let deep = sub.join("deep");
        fs::create_dir(&deep).unwrap();
        write_bytes(&deep.join("c.dat"), 300);
        tmp
    }

    fn assert_aggregation(node: &Node) {
        if node.is_dir() && !node.children.is_empty() {
            let sum: u64 = node.children.iter().map(|c| c.size).sum();
            assert_eq!(node.size, sum, "size mismatch at {}", node.path.display());
            for child in &node.children {
                assert_aggregation(child);
            }
        }
    }

    fn assert_ordering(node: &Node) {
        for pair in node.children.windows(2) {
            assert!(pair[0].size >= pair[1].size);
        }
        for child in &node.children {
            assert_ordering(child);
        }
    }

    #[test]
    fn scan_aggregates_and_orders() {
        let tmp = make_tree();
        let tree = Scanner::new().scan(tmp.path(), DEFAULT_MAX_DEPTH).unwrap();

        assert_eq!(tree.size, 600);
        assert_aggregation(&tree);
        assert_ordering(&tree);

        // sub (500) sorts before a.txt (100).
        assert_eq!(tree.children[0].name, "sub");
        assert_eq!(tree.children[1].name, "a.txt");
    }

    #[test]
    fn file_root_returns_leaf() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("only.txt");
        write_bytes(&file, 42);

        let node = Scanner::new().scan(&file, DEFAULT_MAX_DEPTH).unwrap();
        assert!(node.is_file);
        assert_eq!(node.size, 42);
        assert!(node.children.is_empty());
    }

    #[test]
    fn missing_root_is_access_error() {
        let tmp = TempDir::new().unwrap();
        let gone = tmp.path().join("does-not-exist");

        let err = Scanner::new().scan(&gone, DEFAULT_MAX_DEPTH).unwrap_err();
        assert!(matches!(err, ScanError::Access { .. }));
    }

    #[test]
    fn depth_cutoff_keeps_sizes_exact() {
        let tmp = make_tree();
        let tree = Scanner::new().scan(tmp.path(), 1).unwrap();

        assert_eq!(tree.size, 600);
        let sub = tree
            .children
            .iter()
            .find(|c| c.name == "sub")
            .expect("sub present");
        // At the cutoff the subtree size is exact but no children exist.
        assert_eq!(sub.size, 500);
        assert!(sub.children.is_empty());
    }

    #[test]
    fn depth_zero_materialises_nothing_below_root() {
        let tmp = make_tree();
        let tree = Scanner::new().scan(tmp.path(), 0).unwrap();
        assert_eq!(tree.size, 600);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn flight_slot_is_released_after_scan() {
        let tmp = make_tree();
        let scanner = Scanner::new();
        scanner.scan(tmp.path(), DEFAULT_MAX_DEPTH).unwrap();
        // A second sequential scan of the same path must not be Busy.
        scanner.scan(tmp.path(), DEFAULT_MAX_DEPTH).unwrap();
    }

    #[test]
    fn flight_slot_is_released_after_access_error() {
        let tmp = TempDir::new().unwrap();
        let gone = tmp.path().join("missing");
        let scanner = Scanner::new();

        assert!(scanner.scan(&gone, DEFAULT_MAX_DEPTH).is_err());
        // The failed claim must not leave the path registered.
        let err = scanner.scan(&gone, DEFAULT_MAX_DEPTH).unwrap_err();
        assert!(matches!(err, ScanError::Access { .. }));
    }

    #[test]
    fn progress_reports_root_batches() {
        let tmp = TempDir::new().unwrap();
        // 45 entries: three batches of 20 / 20 / 5.
        for i in 0..45 {
            write_bytes(&tmp.path().join(format!("f{i:02}")), 10);
        }

        let (tx, rx) = crossbeam_channel::bounded(PROGRESS_CHANNEL_CAPACITY);
        Scanner::new()
            .scan_with_progress(tmp.path(), DEFAULT_MAX_DEPTH, Some(&tx))
            .unwrap();
        drop(tx);

        let snapshots: Vec<ScanProgress> = rx.iter().collect();
        assert_eq!(
            snapshots,
            vec![
                ScanProgress { scanned: 20, total: 45 },
                ScanProgress { scanned: 40, total: 45 },
                ScanProgress { scanned: 45, total: 45 },
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdir_is_absorbed() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        write_bytes(&tmp.path().join("ok.txt"), 50);
        let locked = tmp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        write_bytes(&locked.join("hidden.bin"), 999);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = Scanner::new().scan(tmp.path(), DEFAULT_MAX_DEPTH);

        // Restore before asserting so TempDir can clean up.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let tree = result.unwrap();
        // The locked directory still stats fine, so it appears — but its
        // contents are unreadable and contribute nothing.
        assert_eq!(tree.size, 50);
        let locked_node = tree.children.iter().find(|c| c.name == "locked").unwrap();
        assert_eq!(locked_node.size, 0);
        assert!(locked_node.children.is_empty());
    }
}
