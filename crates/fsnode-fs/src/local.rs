//! [`FsAccess`] over the host filesystem.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::trace;

use fsnode_core::{EntryKind, FsAccess, NodeError};

/// Host filesystem access through `std::fs`.
///
/// Atomic writes go to a temporary file in the destination's directory and
/// are renamed over the destination once fully written.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Create a new host filesystem handle.
    pub fn new() -> Self {
        Self
    }

    fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl FsAccess for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn entry_kind(&self, path: &Path, follow_symlinks: bool) -> Result<EntryKind, NodeError> {
        let metadata = if follow_symlinks {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        }
        .map_err(|e| NodeError::read(path, e))?;

        let file_type = metadata.file_type();
        if file_type.is_dir() {
            Ok(EntryKind::Directory)
        } else if file_type.is_symlink() {
            Ok(EntryKind::Symlink)
        } else if file_type.is_file() {
            Ok(EntryKind::File)
        } else {
            // FIFOs, sockets and devices
            Err(NodeError::read(
                path,
                io::Error::new(io::ErrorKind::Unsupported, "not a regular file"),
            ))
        }
    }

    fn list_children(&self, path: &Path) -> Result<Vec<PathBuf>, NodeError> {
        let mut children = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| NodeError::list(path, e))? {
            let entry = entry.map_err(|e| NodeError::list(path, e))?;
            children.push(entry.path());
        }
        children.sort();
        Ok(children)
    }

    fn canonical_path(&self, path: &Path) -> Result<PathBuf, NodeError> {
        fs::canonicalize(path).map_err(|e| NodeError::read(path, e))
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, NodeError> {
        fs::read(path).map_err(|e| NodeError::read(path, e))
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf, NodeError> {
        fs::read_link(path).map_err(|e| NodeError::read(path, e))
    }

    fn write_all(&self, path: &Path, bytes: &[u8], atomic: bool) -> Result<(), NodeError> {
        trace!(path = %path.display(), atomic, "write_all");
        let result = if atomic {
            Self::write_atomic(path, bytes)
        } else {
            fs::write(path, bytes)
        };
        result.map_err(|e| NodeError::write(path, e))
    }

    fn create_directory(&self, path: &Path, recursive: bool) -> Result<(), NodeError> {
        let result = if recursive {
            fs::create_dir_all(path)
        } else {
            fs::create_dir(path)
        };
        result.map_err(|e| NodeError::create(path, e))
    }

    fn create_symlink(&self, target: &Path, link: &Path) -> Result<(), NodeError> {
        symlink(target, link).map_err(|e| NodeError::create(link, e))
    }

    fn remove_all(&self, path: &Path) -> Result<(), NodeError> {
        let metadata = fs::symlink_metadata(path).map_err(|e| NodeError::remove(path, e))?;
        let result = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| NodeError::remove(path, e))
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    let resolved = match link.parent() {
        Some(parent) if target.is_relative() => parent.join(target),
        _ => target.to_path_buf(),
    };
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(not(any(unix, windows)))]
fn symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}
