//! In-memory filesystem that records every mutation.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::access::{EntryKind, FsAccess};
use crate::error::NodeError;

/// Maximum number of symlinks followed while resolving one path.
const MAX_SYMLINK_HOPS: usize = 40;

/// A mutating call performed against a [`MemoryFs`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsOp {
    /// A directory was created.
    CreateDirectory(PathBuf),
    /// A file was written.
    WriteFile {
        /// Destination path.
        path: PathBuf,
        /// Whether an atomic write was requested.
        atomic: bool,
    },
    /// A symlink was created.
    CreateSymlink(PathBuf),
    /// An entry and everything below it was removed.
    Remove(PathBuf),
}

impl FsOp {
    /// Path the operation acted on.
    pub fn path(&self) -> &Path {
        match self {
            Self::CreateDirectory(path)
            | Self::WriteFile { path, .. }
            | Self::CreateSymlink(path)
            | Self::Remove(path) => path.as_path(),
        }
    }
}

#[derive(Debug, Clone)]
enum Entry {
    File(Vec<u8>),
    Directory,
    Symlink(PathBuf),
}

/// In-memory [`FsAccess`] implementation rooted at `/`.
///
/// Setup helpers (`insert_*`) are not recorded; calls made through
/// [`FsAccess`] are, once they succeed.
#[derive(Debug)]
pub struct MemoryFs {
    entries: RefCell<BTreeMap<PathBuf, Entry>>,
    log: RefCell<Vec<FsOp>>,
    denied: RefCell<Vec<PathBuf>>,
    unreadable: RefCell<Vec<PathBuf>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create a filesystem containing only the root directory.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::Directory);
        Self {
            entries: RefCell::new(entries),
            log: RefCell::new(Vec::new()),
            denied: RefCell::new(Vec::new()),
            unreadable: RefCell::new(Vec::new()),
        }
    }

    /// Add a file, creating missing parent directories.
    pub fn insert_file(&self, path: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        self.insert_parents(path);
        self.entries
            .borrow_mut()
            .insert(path.to_path_buf(), Entry::File(bytes.into()));
    }

    /// Add a directory, creating missing parent directories.
    pub fn insert_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.insert_parents(path);
        self.entries
            .borrow_mut()
            .insert(path.to_path_buf(), Entry::Directory);
    }

    /// Add a symlink, creating missing parent directories.
    pub fn insert_symlink(&self, path: impl AsRef<Path>, target: impl Into<PathBuf>) {
        let path = path.as_ref();
        self.insert_parents(path);
        self.entries
            .borrow_mut()
            .insert(path.to_path_buf(), Entry::Symlink(target.into()));
    }

    /// Make every mutation at or below `prefix` fail with permission denied.
    pub fn deny_mutations_under(&self, prefix: impl Into<PathBuf>) {
        self.denied.borrow_mut().push(prefix.into());
    }

    /// Make listing and reading contents at or below `prefix` fail with
    /// permission denied. Kind probes still succeed.
    pub fn deny_reads_under(&self, prefix: impl Into<PathBuf>) {
        self.unreadable.borrow_mut().push(prefix.into());
    }

    /// Contents of the file stored at exactly `path`, if it is a file.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.entries.borrow().get(path.as_ref()) {
            Some(Entry::File(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    /// Whether exactly `path` is a directory.
    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        matches!(self.entries.borrow().get(path.as_ref()), Some(Entry::Directory))
    }

    /// Names of the immediate children of `path`, sorted.
    pub fn list(&self, path: impl AsRef<Path>) -> Vec<String> {
        let path = path.as_ref();
        self.entries
            .borrow()
            .keys()
            .filter(|key| key.parent() == Some(path))
            .filter_map(|key| key.file_name()?.to_str().map(str::to_string))
            .collect()
    }

    /// Mutations recorded so far, in call order.
    pub fn operations(&self) -> Vec<FsOp> {
        self.log.borrow().clone()
    }

    /// Forget recorded mutations.
    pub fn clear_operations(&self) {
        self.log.borrow_mut().clear();
    }

    fn insert_parents(&self, path: &Path) {
        let mut entries = self.entries.borrow_mut();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(Entry::Directory);
        }
    }

    fn check_allowed(&self, path: &Path) -> io::Result<()> {
        denied_under(&self.denied.borrow(), path)
    }

    fn check_readable(&self, path: &Path) -> io::Result<()> {
        denied_under(&self.unreadable.borrow(), path)
    }

    fn record(&self, op: FsOp) {
        self.log.borrow_mut().push(op);
    }

    /// Physical location of `path`, substituting symlinks component by
    /// component. The final component is only followed if `follow_last`.
    fn physical(&self, path: &Path, follow_last: bool) -> io::Result<PathBuf> {
        let entries = self.entries.borrow();
        let mut pending: Vec<Component<'_>> = path.components().rev().collect();
        let mut current = PathBuf::from("/");
        let mut hops = 0;

        while let Some(component) = pending.pop() {
            let name = match component {
                Component::Normal(name) => name,
                Component::ParentDir => {
                    current.pop();
                    continue;
                }
                Component::RootDir | Component::CurDir | Component::Prefix(_) => continue,
            };

            let next = current.join(name);
            match entries.get(&next) {
                Some(Entry::Symlink(target)) if follow_last || !pending.is_empty() => {
                    hops += 1;
                    if hops > MAX_SYMLINK_HOPS {
                        return Err(io::Error::other("too many levels of symbolic links"));
                    }
                    if target.is_absolute() {
                        current = PathBuf::from("/");
                    }
                    pending.extend(target.components().rev());
                }
                Some(Entry::File(_)) if !pending.is_empty() => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotADirectory,
                        "not a directory",
                    ));
                }
                Some(_) => current = next,
                None => return Err(not_found()),
            }
        }

        Ok(current)
    }

    fn lookup(&self, path: &Path, follow_symlinks: bool) -> io::Result<(PathBuf, Entry)> {
        let physical = self.physical(path, follow_symlinks)?;
        let entry = self.entries.borrow().get(&physical).cloned().ok_or_else(not_found)?;
        Ok((physical, entry))
    }

    /// Where an entry created at `path` lands: its parent resolved, its own
    /// name kept.
    fn placement(&self, path: &Path) -> io::Result<PathBuf> {
        let (parent, name) = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => (parent, name),
            _ => return Err(not_found()),
        };
        match self.lookup(parent, true)? {
            (parent, Entry::Directory) => Ok(parent.join(name)),
            _ => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                "parent is not a directory",
            )),
        }
    }
}

fn denied_under(prefixes: &[PathBuf], path: &Path) -> io::Result<()> {
    if prefixes.iter().any(|prefix| path.starts_with(prefix)) {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "permission denied",
        ));
    }
    Ok(())
}

fn not_found() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "no such file or directory")
}

impl FsAccess for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        self.lookup(path, false).is_ok()
    }

    fn entry_kind(&self, path: &Path, follow_symlinks: bool) -> Result<EntryKind, NodeError> {
        let (_, entry) = self
            .lookup(path, follow_symlinks)
            .map_err(|e| NodeError::read(path, e))?;
        Ok(match entry {
            Entry::File(_) => EntryKind::File,
            Entry::Directory => EntryKind::Directory,
            Entry::Symlink(_) => EntryKind::Symlink,
        })
    }

    fn list_children(&self, path: &Path) -> Result<Vec<PathBuf>, NodeError> {
        let resolved = self
            .check_readable(path)
            .and_then(|()| self.lookup(path, true))
            .and_then(|(resolved, entry)| match entry {
                Entry::Directory => Ok(resolved),
                _ => Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    "not a directory",
                )),
            })
            .map_err(|e| NodeError::list(path, e))?;

        Ok(self
            .entries
            .borrow()
            .keys()
            .filter(|key| key.parent() == Some(resolved.as_path()))
            .filter_map(|key| key.file_name().map(|name| path.join(name)))
            .collect())
    }

    fn canonical_path(&self, path: &Path) -> Result<PathBuf, NodeError> {
        self.lookup(path, true)
            .map(|(resolved, _)| resolved)
            .map_err(|e| NodeError::read(path, e))
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, NodeError> {
        let entry = self
            .check_readable(path)
            .and_then(|()| self.lookup(path, true))
            .map_err(|e| NodeError::read(path, e))?;
        match entry {
            (_, Entry::File(bytes)) => Ok(bytes),
            _ => Err(NodeError::read(
                path,
                io::Error::new(io::ErrorKind::IsADirectory, "not a file"),
            )),
        }
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf, NodeError> {
        match self.lookup(path, false).map_err(|e| NodeError::read(path, e))? {
            (_, Entry::Symlink(target)) => Ok(target),
            _ => Err(NodeError::read(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "not a symlink"),
            )),
        }
    }

    fn write_all(&self, path: &Path, bytes: &[u8], atomic: bool) -> Result<(), NodeError> {
        let placed = self
            .check_allowed(path)
            .and_then(|()| self.placement(path))
            .map_err(|e| NodeError::write(path, e))?;

        if self.is_dir(&placed) {
            return Err(NodeError::write(
                path,
                io::Error::new(io::ErrorKind::IsADirectory, "is a directory"),
            ));
        }

        self.entries
            .borrow_mut()
            .insert(placed, Entry::File(bytes.to_vec()));
        self.record(FsOp::WriteFile {
            path: path.to_path_buf(),
            atomic,
        });
        Ok(())
    }

    fn create_directory(&self, path: &Path, recursive: bool) -> Result<(), NodeError> {
        self.check_allowed(path)
            .map_err(|e| NodeError::create(path, e))?;

        if self.exists(path) {
            let is_dir = matches!(self.lookup(path, true), Ok((_, Entry::Directory)));
            if recursive && is_dir {
                return Ok(());
            }
            return Err(NodeError::create(
                path,
                io::Error::new(io::ErrorKind::AlreadyExists, "already exists"),
            ));
        }

        let placed = if recursive {
            self.insert_parents(path);
            path.to_path_buf()
        } else {
            self.placement(path).map_err(|e| NodeError::create(path, e))?
        };

        self.entries.borrow_mut().insert(placed, Entry::Directory);
        self.record(FsOp::CreateDirectory(path.to_path_buf()));
        Ok(())
    }

    fn create_symlink(&self, target: &Path, link: &Path) -> Result<(), NodeError> {
        let placed = self
            .check_allowed(link)
            .and_then(|()| self.placement(link))
            .map_err(|e| NodeError::create(link, e))?;

        if self.exists(link) {
            return Err(NodeError::create(
                link,
                io::Error::new(io::ErrorKind::AlreadyExists, "already exists"),
            ));
        }

        self.entries
            .borrow_mut()
            .insert(placed, Entry::Symlink(target.to_path_buf()));
        self.record(FsOp::CreateSymlink(link.to_path_buf()));
        Ok(())
    }

    fn remove_all(&self, path: &Path) -> Result<(), NodeError> {
        let (placed, _) = self
            .check_allowed(path)
            .and_then(|()| self.lookup(path, false))
            .map_err(|e| NodeError::remove(path, e))?;

        self.entries
            .borrow_mut()
            .retain(|key, _| !key.starts_with(&placed));
        self.record(FsOp::Remove(path.to_path_buf()));
        Ok(())
    }
}
