//! Core types and traits for fsnode.
//!
//! This crate provides the in-memory file tree ([`FileNode`]), the
//! [`FsAccess`] capability it reads from and writes through, and an
//! in-memory [`MemoryFs`] that records every mutation in order.
//!
//! ```rust
//! use std::path::Path;
//!
//! use fsnode_core::{FileNode, MemoryFs, WriteOptions};
//!
//! let mut root = FileNode::empty_directory();
//! root.add_child(FileNode::new_file("hello").named("greeting.txt")).unwrap();
//!
//! let fs = MemoryFs::new();
//! root.write(&fs, Path::new("/out"), &WriteOptions::default(), None).unwrap();
//! assert_eq!(fs.file("/out/greeting.txt"), Some(b"hello".to_vec()));
//! ```

mod access;
mod config;
mod error;
pub mod location;
mod materialize;
mod memory;
pub mod naming;
mod node;
mod tree;

pub use access::{EntryKind, FsAccess};
pub use config::{
    ExistingDestination, ReadOptions, ReadOptionsBuilder, WriteOptions, WriteOptionsBuilder,
};
pub use error::NodeError;
pub use memory::{FsOp, MemoryFs};
pub use node::{Children, ContentHash, FileNode, NodeKind};
pub use tree::{Manifest, TreeStats};
