//! Error types for node construction and materialization.

use std::path::PathBuf;

use compact_str::CompactString;
use thiserror::Error;

/// Errors that can occur while reading, mutating or writing a node tree.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The path cannot be reached through direct filesystem access.
    #[error("Unsupported location: {path}")]
    UnsupportedLocation { path: PathBuf },

    /// Reading file contents or probing an entry failed.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing file contents failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Listing a directory failed.
    #[error("Failed to list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating a directory or symlink failed.
    #[error("Failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removing an existing entry failed.
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory write found something already at the destination.
    ///
    /// `cleanup` holds the error of the removal attempt, if it failed.
    #[error("Destination already exists: {path}")]
    DestinationExists {
        path: PathBuf,
        #[source]
        cleanup: Option<std::io::Error>,
    },

    /// A directory was asked to be written to a path that cannot name one.
    #[error("Destination is not a directory path: {path}")]
    DestinationNotDirectoryPath { path: PathBuf },

    /// A child read from disk ended up without a usable name.
    #[error("Child has no resolvable name: {path}")]
    InconsistentChild { path: PathBuf },

    /// A child operation was attempted on a file or symlink node.
    #[error("Node is not a directory")]
    NotADirectory,

    /// A resolved name cannot be used as a single path component.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: CompactString, reason: String },

    /// Two children of the same directory resolve to the same on-disk name.
    #[error("Duplicate name '{name}' under {parent}")]
    DuplicateResolvedName { parent: PathBuf, name: CompactString },
}

impl NodeError {
    /// Create a read error with path context.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a write error with path context.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Create a listing error with path context.
    pub fn list(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::List {
            path: path.into(),
            source,
        }
    }

    /// Create a creation error with path context.
    pub fn create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Create {
            path: path.into(),
            source,
        }
    }

    /// Create a removal error with path context.
    pub fn remove(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Remove {
            path: path.into(),
            source,
        }
    }

    /// The underlying I/O error, for variants that wrap one.
    pub fn io_error(&self) -> Option<&std::io::Error> {
        match self {
            Self::Read { source, .. }
            | Self::Write { source, .. }
            | Self::List { source, .. }
            | Self::Create { source, .. }
            | Self::Remove { source, .. } => Some(source),
            Self::DestinationExists { cleanup, .. } => cleanup.as_ref(),
            _ => None,
        }
    }
}
