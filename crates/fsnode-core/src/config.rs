//! Read and write configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// What a directory write does when its destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExistingDestination {
    /// Remove whatever is there, then report the conflict.
    #[default]
    Clear,
    /// Leave the destination untouched and report the conflict.
    Keep,
}

/// Configuration for snapshotting a filesystem subtree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct ReadOptions {
    /// Follow symbolic links instead of recording them as symlink nodes.
    ///
    /// A followed link that leads back into a directory being snapshotted is
    /// still recorded as a symlink node.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,
}

/// Configuration for writing a node tree to a destination.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct WriteOptions {
    /// Write file payloads to a temporary file and rename it into place.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub atomic: bool,

    /// Record the on-disk name into `stored_name` of every written node.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub record_names: bool,

    /// Policy for directory destinations that already exist.
    #[builder(default)]
    #[serde(default)]
    pub existing_directory: ExistingDestination,
}

fn default_true() -> bool {
    true
}

impl ReadOptions {
    /// Create a new read options builder.
    pub fn builder() -> ReadOptionsBuilder {
        ReadOptionsBuilder::default()
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
        }
    }
}

impl WriteOptions {
    /// Create a new write options builder.
    pub fn builder() -> WriteOptionsBuilder {
        WriteOptionsBuilder::default()
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            record_names: true,
            existing_directory: ExistingDestination::Clear,
        }
    }
}
