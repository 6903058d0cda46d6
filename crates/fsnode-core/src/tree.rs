//! Tree statistics and payload-free manifests.

use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::access::EntryKind;
use crate::node::{FileNode, NodeKind};

/// Summary statistics for a node tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Total payload size in bytes.
    pub total_bytes: u64,
    /// Total number of files.
    pub files: u64,
    /// Total number of directories, including the root.
    pub directories: u64,
    /// Total number of symbolic links.
    pub symlinks: u64,
    /// Maximum depth below the root.
    pub max_depth: u32,
    /// Largest file (path relative to the root, size).
    pub largest_file: Option<(PathBuf, u64)>,
}

impl TreeStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with a file entry.
    pub fn record_file(&mut self, path: PathBuf, size: u64, depth: u32) {
        self.files += 1;
        self.total_bytes += size;
        self.max_depth = self.max_depth.max(depth);

        if self.largest_file.as_ref().is_none_or(|(_, s)| size > *s) {
            self.largest_file = Some((path, size));
        }
    }

    /// Record a directory.
    pub fn record_dir(&mut self, depth: u32) {
        self.directories += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record a symlink.
    pub fn record_symlink(&mut self, depth: u32) {
        self.symlinks += 1;
        self.max_depth = self.max_depth.max(depth);
    }
}

impl FileNode {
    /// Compute statistics for the tree rooted at this node.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::new();
        collect_stats(self, PathBuf::new(), 0, &mut stats);
        stats
    }
}

fn collect_stats(node: &FileNode, path: PathBuf, depth: u32, stats: &mut TreeStats) {
    match node.kind() {
        NodeKind::File { payload } => stats.record_file(path, payload.len() as u64, depth),
        NodeKind::Symlink { .. } => stats.record_symlink(depth),
        NodeKind::Directory { children } => {
            stats.record_dir(depth);
            for (key, child) in children {
                collect_stats(child, path.join(key.as_str()), depth + 1, stats);
            }
        }
    }
}

/// Serializable description of a tree without payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Name of the entry: the key within its parent, or the root's name.
    pub name: CompactString,
    /// Entry type.
    pub kind: EntryKind,
    /// Payload size (aggregate for directories).
    pub size: u64,
    /// Hex BLAKE3 hash of the payload, for files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Link target, for symlinks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
    /// Children in ascending key order, for directories.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Manifest>,
}

impl Manifest {
    /// Describe `node`, naming the root `name`.
    pub fn from_node(name: impl Into<CompactString>, node: &FileNode) -> Self {
        let (kind, hash, target, children) = match node.kind() {
            NodeKind::File { .. } => (
                EntryKind::File,
                node.content_hash().map(|h| h.to_hex()),
                None,
                Vec::new(),
            ),
            NodeKind::Symlink { target } => (EntryKind::Symlink, None, Some(target.clone()), Vec::new()),
            NodeKind::Directory { children } => (
                EntryKind::Directory,
                None,
                None,
                children
                    .iter()
                    .map(|(key, child)| Manifest::from_node(key.clone(), child))
                    .collect(),
            ),
        };

        Self {
            name: name.into(),
            kind,
            size: node.size(),
            hash,
            target,
            children,
        }
    }
}
