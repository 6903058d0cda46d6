//! Syntactic checks on paths handed to the tree.

use std::path::{Component, Path};

use crate::error::NodeError;

/// Whether `path` refers to something reachable by direct filesystem access.
///
/// Paths carrying a URL scheme (`https://`, `s3://`, `file://`, ...) are not.
pub fn is_local(path: &Path) -> bool {
    match path.to_str() {
        Some(s) => !has_scheme(s),
        None => true,
    }
}

/// Fail with [`NodeError::UnsupportedLocation`] unless `path` is local.
pub fn ensure_local(path: &Path) -> Result<(), NodeError> {
    if is_local(path) {
        Ok(())
    } else {
        Err(NodeError::UnsupportedLocation {
            path: path.to_path_buf(),
        })
    }
}

/// Whether `path` can name a directory to be created.
///
/// The final component must be a normal name: `.`, `..`, a root or an empty
/// path cannot.
pub fn has_directory_syntax(path: &Path) -> bool {
    matches!(path.components().next_back(), Some(Component::Normal(_)))
}

fn has_scheme(s: &str) -> bool {
    let Some(idx) = s.find("://") else {
        return false;
    };
    let scheme = &s[..idx];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}
