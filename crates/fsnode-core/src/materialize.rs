//! Snapshotting trees from a filesystem and writing them back.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use tracing::{debug, trace};

use crate::access::{EntryKind, FsAccess};
use crate::config::{ExistingDestination, ReadOptions, WriteOptions};
use crate::error::NodeError;
use crate::location;
use crate::naming;
use crate::node::{Children, FileNode, NodeKind};

impl FileNode {
    /// Snapshot the entry at `path`, recursing into directories.
    ///
    /// Both names of the returned node are set to the final component of
    /// `path`; children are keyed by their own final component. When links
    /// are followed, a link that resolves to a directory enclosing one
    /// already being read is recorded as a symlink node instead of entered.
    pub fn from_filesystem<F>(fs: &F, path: &Path, options: &ReadOptions) -> Result<Self, NodeError>
    where
        F: FsAccess + ?Sized,
    {
        location::ensure_local(path)?;
        Self::snapshot(fs, path, options, &mut Vec::new())
    }

    fn snapshot<F>(
        fs: &F,
        path: &Path,
        options: &ReadOptions,
        ancestors: &mut Vec<PathBuf>,
    ) -> Result<Self, NodeError>
    where
        F: FsAccess + ?Sized,
    {
        let kind = match fs.entry_kind(path, options.follow_symlinks)? {
            EntryKind::File => NodeKind::File {
                payload: fs.read_all(path)?,
            },
            EntryKind::Symlink => NodeKind::Symlink {
                target: fs.read_link(path)?,
            },
            EntryKind::Directory => {
                let canonical = if options.follow_symlinks {
                    Some(fs.canonical_path(path)?)
                } else {
                    None
                };

                match canonical {
                    Some(canonical) if ancestors.iter().any(|a| a.starts_with(&canonical)) => {
                        debug!(path = %path.display(), "symlink loop, recording link");
                        NodeKind::Symlink {
                            target: fs.read_link(path)?,
                        }
                    }
                    canonical => {
                        let pushed = canonical.is_some();
                        ancestors.extend(canonical);
                        let children = Self::snapshot_children(fs, path, options, ancestors);
                        if pushed {
                            ancestors.pop();
                        }
                        NodeKind::Directory {
                            children: children?,
                        }
                    }
                }
            }
        };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(CompactString::from);

        debug!(path = %path.display(), "snapshotted entry");

        Ok(Self {
            stored_name: name.clone(),
            preferred_name: name,
            kind,
        })
    }

    fn snapshot_children<F>(
        fs: &F,
        path: &Path,
        options: &ReadOptions,
        ancestors: &mut Vec<PathBuf>,
    ) -> Result<Children, NodeError>
    where
        F: FsAccess + ?Sized,
    {
        let mut children = Children::new();
        for entry in fs.list_children(path)? {
            let child = Self::snapshot(fs, &entry, options, ancestors)?;
            let Some(key) = child.stored_name.clone() else {
                return Err(NodeError::InconsistentChild { path: entry });
            };
            children.insert(key, child);
        }
        Ok(children)
    }

    /// Write this node to `to`, recursing into directories.
    ///
    /// `reference` is the location the tree was originally read from, if any;
    /// it is carried down alongside each child.
    pub fn write<F>(
        &mut self,
        fs: &F,
        to: &Path,
        options: &WriteOptions,
        reference: Option<&Path>,
    ) -> Result<(), NodeError>
    where
        F: FsAccess + ?Sized,
    {
        location::ensure_local(to)?;

        if let Some(reference) = reference {
            trace!(to = %to.display(), reference = %reference.display(), "writing entry");
        }

        match &mut self.kind {
            NodeKind::File { payload } => {
                clear_destination(fs, to)?;
                fs.write_all(to, payload.as_slice(), options.atomic)?;
                debug!(path = %to.display(), bytes = payload.len(), "wrote file");
            }
            NodeKind::Symlink { target } => {
                clear_destination(fs, to)?;
                fs.create_symlink(target.as_path(), to)?;
                debug!(path = %to.display(), target = %target.display(), "wrote symlink");
            }
            NodeKind::Directory { children } => {
                write_directory(fs, to, children, options, reference)?;
            }
        }

        if options.record_names && self.stored_name.is_none() {
            self.stored_name = to
                .file_name()
                .and_then(|n| n.to_str())
                .map(CompactString::from);
        }

        Ok(())
    }
}

/// Remove whatever exists at `path` before a file or symlink is written.
fn clear_destination<F>(fs: &F, path: &Path) -> Result<(), NodeError>
where
    F: FsAccess + ?Sized,
{
    if fs.exists(path) {
        debug!(path = %path.display(), "removing existing entry");
        fs.remove_all(path)?;
    }
    Ok(())
}

fn write_directory<F>(
    fs: &F,
    to: &Path,
    children: &mut Children,
    options: &WriteOptions,
    reference: Option<&Path>,
) -> Result<(), NodeError>
where
    F: FsAccess + ?Sized,
{
    if !fs.is_directory_path(to) {
        return Err(NodeError::DestinationNotDirectoryPath {
            path: to.to_path_buf(),
        });
    }

    let plan = plan_children(to, children)?;

    if fs.exists(to) {
        let cleanup = match options.existing_directory {
            ExistingDestination::Clear => {
                debug!(path = %to.display(), "clearing conflicting destination");
                fs.remove_all(to).err().map(into_io_error)
            }
            ExistingDestination::Keep => None,
        };
        return Err(NodeError::DestinationExists {
            path: to.to_path_buf(),
            cleanup,
        });
    }

    fs.create_directory(to, false)?;
    debug!(path = %to.display(), children = plan.len(), "created directory");

    for (name, child) in plan {
        let child_path = to.join(name.as_str());
        let child_reference = reference.map(|r| r.join(name.as_str()));
        child.write(fs, &child_path, options, child_reference.as_deref())?;
    }

    Ok(())
}

/// Resolve the on-disk name of every child, in ascending key order.
///
/// Fails before anything is written if a name is unusable or two siblings
/// resolve to the same name.
fn plan_children<'a>(
    parent: &Path,
    children: &'a mut Children,
) -> Result<Vec<(CompactString, &'a mut FileNode)>, NodeError> {
    let mut seen = HashSet::with_capacity(children.len());
    let mut plan = Vec::with_capacity(children.len());

    for child in children.values_mut() {
        let name = CompactString::from(child.resolved_name());

        naming::validate_name(&name).map_err(|reason| NodeError::InvalidName {
            name: name.clone(),
            reason,
        })?;

        if !seen.insert(name.clone()) {
            return Err(NodeError::DuplicateResolvedName {
                parent: parent.to_path_buf(),
                name,
            });
        }

        plan.push((name, child));
    }

    Ok(plan)
}

fn into_io_error(err: NodeError) -> std::io::Error {
    match err {
        NodeError::Read { source, .. }
        | NodeError::Write { source, .. }
        | NodeError::List { source, .. }
        | NodeError::Create { source, .. }
        | NodeError::Remove { source, .. } => source,
        other => std::io::Error::other(other.to_string()),
    }
}
