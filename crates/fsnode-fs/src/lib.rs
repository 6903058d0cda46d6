//! Host filesystem access for fsnode trees.
//!
//! [`LocalFs`] implements [`FsAccess`] on top of `std::fs`, using
//! `tempfile` for atomic replacement of file contents. [`read_tree`] and
//! [`write_tree`] bind the core tree operations to it.
//!
//! ```rust,no_run
//! use fsnode_fs::{read_tree, write_tree, ReadOptions, WriteOptions};
//!
//! let mut tree = read_tree("/path/to/source", &ReadOptions::default()).unwrap();
//! println!("{} files", tree.stats().files);
//!
//! write_tree(&mut tree, "/path/to/copy", &WriteOptions::default()).unwrap();
//! ```

mod local;

use std::path::Path;

pub use local::LocalFs;

// Re-export core types for convenience
pub use fsnode_core::{
    Children, ExistingDestination, FileNode, FsAccess, Manifest, NodeError, ReadOptions, TreeStats,
    WriteOptions,
};

/// Snapshot the host filesystem entry at `path`.
pub fn read_tree(path: impl AsRef<Path>, options: &ReadOptions) -> Result<FileNode, NodeError> {
    FileNode::from_filesystem(&LocalFs, path.as_ref(), options)
}

/// Write `node` to `path` on the host filesystem.
pub fn write_tree(
    node: &mut FileNode,
    path: impl AsRef<Path>,
    options: &WriteOptions,
) -> Result<(), NodeError> {
    node.write(&LocalFs, path.as_ref(), options, None)
}

/// Write `node` to `path`, naming `reference` as the location it came from.
pub fn write_tree_from(
    node: &mut FileNode,
    path: impl AsRef<Path>,
    reference: impl AsRef<Path>,
    options: &WriteOptions,
) -> Result<(), NodeError> {
    node.write(&LocalFs, path.as_ref(), options, Some(reference.as_ref()))
}
