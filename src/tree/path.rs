//! Path and name normalization for the virtual tree
//!
//! A path is the slash-joined sequence of names from a root node down to a
//! node. Root nodes have a path equal to their own name.

use crate::error::TreeError;
use unicode_normalization::UnicodeNormalization;

pub const SEPARATOR: char = '/';

/// Deepest nesting a tree may hold, counted in path segments.
///
/// Each level costs two levels of JSON nesting in a snapshot, so this keeps
/// every valid tree well inside serde_json's recursion limit.
pub const MAX_DEPTH: usize = 32;

/// Normalize a caller-supplied path string
///
/// This function:
/// 1. Normalizes Unicode to NFC
/// 2. Removes leading and trailing slashes
/// 3. Collapses repeated separators
pub fn normalize_path_string(path: &str) -> String {
    let normalized: String = path.nfc().collect();
    normalized
        .split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Validate and NFC-normalize a node name.
pub fn normalize_name(name: &str) -> Result<String, TreeError> {
    let normalized: String = name.nfc().collect();
    let invalid = |reason: &str| TreeError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if normalized.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if normalized.contains('/') || normalized.contains('\\') {
        return Err(invalid("name contains a path separator"));
    }
    if normalized == "." || normalized == ".." {
        return Err(invalid("name is reserved"));
    }
    if normalized.chars().any(char::is_control) {
        return Err(invalid("name contains control characters"));
    }
    Ok(normalized)
}

/// Join a parent path and a child name. An absent parent means the root level.
pub fn join(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!("{}{}{}", parent, SEPARATOR, name),
        _ => name.to_string(),
    }
}

/// Split a normalized path into its segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
}

/// Number of segments in a normalized path; 0 for the root level.
pub fn depth(path: &str) -> usize {
    segments(path).len()
}

/// Parent path of a normalized path, `None` for root-level nodes.
pub fn parent(path: &str) -> Option<&str> {
    path.rsplit_once(SEPARATOR).map(|(parent, _)| parent)
}

/// Last segment of a normalized path.
pub fn file_name(path: &str) -> &str {
    path.rsplit_once(SEPARATOR)
        .map(|(_, name)| name)
        .unwrap_or(path)
}

/// True when `path` is `ancestor` or lies somewhere below it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path[ancestor.len()..].starts_with(SEPARATOR))
}

/// Split a path into `(parent, name)` for create-style commands.
pub fn split_parent(path: &str) -> (Option<String>, String) {
    let normalized = normalize_path_string(path);
    match normalized.rsplit_once(SEPARATOR) {
        Some((parent, name)) => (Some(parent.to_string()), name.to_string()),
        None => (None, normalized),
    }
}
