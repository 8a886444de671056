/// A single entry in the scanned file tree.
///
/// Nodes form a strictly owned recursive structure: every directory owns its
/// children outright (no back-references, no shared ownership), so the tree
/// serialises as one self-contained record — which is exactly what the cache
/// persists per scanned root.
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A file or directory with its aggregated size.
///
/// Constructed bottom-up during a scan and immutable thereafter.
///
/// # Invariants (hold for every tree a completed scan returns)
///
/// - For every directory, `size == children.iter().map(|c| c.size).sum()`.
/// - `children` is sorted descending by size, stable on ties.
/// - Files have no children; directories past the scan's materialisation
///   depth carry their full subtree size but an empty `children` vec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// File or directory name. Falls back to the full path for roots like `/`.
    pub name: CompactString,

    /// Absolute path of this entry.
    pub path: PathBuf,

    /// Logical size in bytes. For directories, the sum of all descendant
    /// file sizes.
    pub size: u64,

    /// `true` if this node is a regular file.
    pub is_file: bool,

    /// Last-modified timestamp, if the filesystem reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,

    /// Child nodes, directories only. Empty for files and for directories
    /// beyond the materialisation depth.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a leaf node for a regular file.
    pub fn file(path: &Path, size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            name: display_name(path),
            path: path.to_path_buf(),
            size,
            is_file: true,
            modified: modified.map(DateTime::<Utc>::from),
            children: Vec::new(),
        }
    }

    /// Create a directory node with no children yet. Size starts at zero and
    /// is set by the scanner once the children are collected.
    pub fn dir(path: &Path, modified: Option<SystemTime>) -> Self {
        Self {
            name: display_name(path),
            path: path.to_path_buf(),
            size: 0,
            is_file: false,
            modified: modified.map(DateTime::<Utc>::from),
            children: Vec::new(),
        }
    }

    /// `true` if this node is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        !self.is_file
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }
}

/// Derive a display name for a path: the final component, or the whole
/// path when there is none (filesystem roots such as `/` or `C:\`).
fn display_name(path: &Path) -> CompactString {
    match path.file_name() {
        Some(name) => CompactString::new(name.to_string_lossy()),
        None => CompactString::new(path.to_string_lossy()),
    }
}
