//! Name generation and validation.

use std::collections::BTreeMap;

use compact_str::CompactString;
use uuid::Uuid;

/// Generate a globally unique name token.
pub fn unique_token() -> CompactString {
    CompactString::from(Uuid::new_v4().hyphenated().to_string())
}

/// Generate a token that is not already a key of `taken`.
pub(crate) fn fresh_key<V>(taken: &BTreeMap<CompactString, V>) -> CompactString {
    loop {
        let token = unique_token();
        if !taken.contains_key(token.as_str()) {
            return token;
        }
    }
}

/// Validate that `name` can be used as a single path component.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name.len() > 255 {
        return Err("Name is too long (max 255 bytes)".into());
    }

    for c in ['/', '\0'] {
        if name.contains(c) {
            return Err(format!("Name cannot contain '{}'", c.escape_default()));
        }
    }

    #[cfg(windows)]
    if name.contains('\\') {
        return Err("Name cannot contain a backslash".into());
    }

    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    Ok(())
}
