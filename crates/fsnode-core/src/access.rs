//! Filesystem access capability consumed by the node tree.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::NodeError;
use crate::location;

/// Type of an entry found on a filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link (only reported when links are not followed).
    Symlink,
}

/// Operations the node tree needs from a filesystem.
///
/// Implementations map their own failures onto the matching [`NodeError`]
/// variant (`Read`, `List`, `Write`, `Create`, `Remove`).
pub trait FsAccess {
    /// Whether anything exists at `path`. Dangling symlinks exist.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is shaped like something a directory can be created at.
    fn is_directory_path(&self, path: &Path) -> bool {
        location::has_directory_syntax(path)
    }

    /// Kind of the entry at `path`.
    fn entry_kind(&self, path: &Path, follow_symlinks: bool) -> Result<EntryKind, NodeError>;

    /// Paths of the immediate children of the directory at `path`.
    fn list_children(&self, path: &Path) -> Result<Vec<PathBuf>, NodeError>;

    /// Absolute path of `path` with every symlink resolved.
    fn canonical_path(&self, path: &Path) -> Result<PathBuf, NodeError>;

    /// Full contents of the file at `path`.
    fn read_all(&self, path: &Path) -> Result<Vec<u8>, NodeError>;

    /// Target of the symlink at `path`.
    fn read_link(&self, path: &Path) -> Result<PathBuf, NodeError>;

    /// Write `bytes` to `path`, replacing any existing file.
    fn write_all(&self, path: &Path, bytes: &[u8], atomic: bool) -> Result<(), NodeError>;

    /// Create a directory at `path`.
    fn create_directory(&self, path: &Path, recursive: bool) -> Result<(), NodeError>;

    /// Create a symlink at `link` pointing to `target`.
    fn create_symlink(&self, target: &Path, link: &Path) -> Result<(), NodeError>;

    /// Remove the entry at `path` and everything below it.
    fn remove_all(&self, path: &Path) -> Result<(), NodeError>;
}
