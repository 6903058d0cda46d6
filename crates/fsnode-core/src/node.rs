//! File, directory and symlink node types.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::NodeError;
use crate::naming;

/// Child map of a directory node, iterated in ascending key order.
pub type Children = BTreeMap<CompactString, FileNode>;

/// BLAKE3 content hash of a file payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash a payload.
    pub fn of(payload: &[u8]) -> Self {
        Self(*blake3::hash(payload).as_bytes())
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Type of node and its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Regular file.
    File {
        /// File contents.
        payload: Vec<u8>,
    },
    /// Directory.
    Directory {
        /// Children keyed by their name within this directory.
        children: Children,
    },
    /// Symbolic link.
    Symlink {
        /// Link target path, stored as read.
        target: PathBuf,
    },
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory { .. })
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File { .. })
    }

    /// Check if this is a symlink.
    pub fn is_symlink(&self) -> bool {
        matches!(self, NodeKind::Symlink { .. })
    }
}

/// A file, directory or symlink, detached from any on-disk location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Name fixed by a successful write or a snapshot from disk.
    pub stored_name: Option<CompactString>,

    /// Name under which the node should be filed.
    pub preferred_name: Option<CompactString>,

    pub(crate) kind: NodeKind,
}

impl FileNode {
    /// Create a new file node.
    pub fn new_file(payload: impl Into<Vec<u8>>) -> Self {
        Self::with_kind(NodeKind::File {
            payload: payload.into(),
        })
    }

    /// Create a new directory node owning `children`.
    ///
    /// Children carrying neither a stored nor a preferred name adopt their
    /// key as preferred name.
    pub fn new_directory(mut children: Children) -> Self {
        for (key, child) in &mut children {
            if child.stored_name.is_none() && child.preferred_name.is_none() {
                child.preferred_name = Some(key.clone());
            }
        }
        Self::with_kind(NodeKind::Directory { children })
    }

    /// Create a new empty directory node.
    pub fn empty_directory() -> Self {
        Self::new_directory(Children::new())
    }

    /// Create a new symlink node.
    pub fn new_symlink(target: impl Into<PathBuf>) -> Self {
        Self::with_kind(NodeKind::Symlink {
            target: target.into(),
        })
    }

    pub(crate) fn with_kind(kind: NodeKind) -> Self {
        Self {
            stored_name: None,
            preferred_name: None,
            kind,
        }
    }

    /// Set the preferred name, builder style.
    pub fn named(mut self, name: impl Into<CompactString>) -> Self {
        self.preferred_name = Some(name.into());
        self
    }

    /// Node type and content.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Check if this node is a regular file.
    pub fn is_leaf(&self) -> bool {
        self.kind.is_file()
    }

    /// Alias of [`FileNode::is_leaf`].
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Check if this node is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node is a symlink.
    pub fn is_symlink(&self) -> bool {
        self.kind.is_symlink()
    }

    /// File contents, for file nodes.
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.kind {
            NodeKind::File { payload } => Some(payload),
            _ => None,
        }
    }

    /// Mutable file contents, for file nodes.
    pub fn payload_mut(&mut self) -> Option<&mut Vec<u8>> {
        match &mut self.kind {
            NodeKind::File { payload } => Some(payload),
            _ => None,
        }
    }

    /// Link target, for symlink nodes.
    pub fn symlink_target(&self) -> Option<&Path> {
        match &self.kind {
            NodeKind::Symlink { target } => Some(target),
            _ => None,
        }
    }

    /// Child map, for directory nodes.
    pub fn children(&self) -> Option<&Children> {
        match &self.kind {
            NodeKind::Directory { children } => Some(children),
            _ => None,
        }
    }

    /// Get a direct child by key.
    pub fn child(&self, name: &str) -> Option<&FileNode> {
        self.children()?.get(name)
    }

    /// Get a mutable direct child by key.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut FileNode> {
        match &mut self.kind {
            NodeKind::Directory { children } => children.get_mut(name),
            _ => None,
        }
    }

    /// Remove a direct child and hand it back to the caller.
    pub fn take_child(&mut self, name: &str) -> Option<FileNode> {
        match &mut self.kind {
            NodeKind::Directory { children } => children.remove(name),
            _ => None,
        }
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children().map_or(0, BTreeMap::len)
    }

    /// Move `node` into this directory and return the key it was filed under.
    ///
    /// The preferred name is used when it is free. Otherwise a fresh token is
    /// generated, filed under, and written back into the child's preferred
    /// name.
    pub fn add_child(&mut self, mut node: FileNode) -> Result<CompactString, NodeError> {
        let NodeKind::Directory { children } = &mut self.kind else {
            return Err(NodeError::NotADirectory);
        };

        let free = node
            .preferred_name
            .as_ref()
            .filter(|name| !children.contains_key(name.as_str()))
            .cloned();

        let name = match free {
            Some(name) => name,
            None => {
                let name = naming::fresh_key(children);
                node.preferred_name = Some(name.clone());
                name
            }
        };

        children.insert(name.clone(), node);
        Ok(name)
    }

    /// The name this node would be written under.
    ///
    /// Stored name, else preferred name, else a freshly generated token. A
    /// generated token is not remembered; use [`FileNode::commit_name`] to
    /// fix it.
    pub fn resolved_name(&self) -> Cow<'_, str> {
        match (&self.stored_name, &self.preferred_name) {
            (Some(name), _) | (None, Some(name)) => Cow::Borrowed(name.as_str()),
            (None, None) => Cow::Owned(naming::unique_token().into_string()),
        }
    }

    /// Fix the resolved name into `stored_name` and return it.
    pub fn commit_name(&mut self) -> &str {
        if self.stored_name.is_none() {
            let name = CompactString::from(self.resolved_name());
            self.stored_name = Some(name);
        }
        self.stored_name.as_deref().unwrap_or_default()
    }

    /// Content hash of the payload, for file nodes.
    pub fn content_hash(&self) -> Option<ContentHash> {
        self.payload().map(ContentHash::of)
    }

    /// Payload size for files, aggregate payload size for directories.
    pub fn size(&self) -> u64 {
        match &self.kind {
            NodeKind::File { payload } => payload.len() as u64,
            NodeKind::Directory { children } => children.values().map(FileNode::size).sum(),
            NodeKind::Symlink { .. } => 0,
        }
    }
}
