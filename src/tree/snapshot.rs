//! Snapshot codec
//!
//! A snapshot is a pretty-printed JSON array of node records, each tagged by
//! `"type"` (`file` or `folder`) and carrying `name`, `path`, and either
//! `content` or `children`. Decoding validates every tree invariant and
//! either yields a complete tree or fails without side effects.

use crate::error::SnapshotError;
use crate::tree::node::Node;
use crate::tree::path;
use crate::tree::store::Tree;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Encoded tree text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    text: String,
}

impl Snapshot {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// blake3 digest of the snapshot text, hex encoded.
    pub fn digest(&self) -> String {
        hex::encode(blake3::hash(self.text.as_bytes()).as_bytes())
    }

    /// First 12 hex characters of [`Snapshot::digest`], for log lines.
    pub fn short_digest(&self) -> String {
        self.digest()[..12].to_string()
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RecordRef<'a> {
    File {
        name: &'a str,
        path: &'a str,
        content: &'a str,
    },
    Folder {
        name: &'a str,
        path: &'a str,
        children: Vec<RecordRef<'a>>,
    },
}

impl<'a> RecordRef<'a> {
    fn from_node(node: &'a Node) -> Self {
        match node {
            Node::File(f) => RecordRef::File {
                name: &f.name,
                path: &f.path,
                content: &f.content,
            },
            Node::Folder(d) => RecordRef::Folder {
                name: &d.name,
                path: &d.path,
                children: d.children.iter().map(|c| RecordRef::from_node(c)).collect(),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum NodeRecord {
    File {
        name: String,
        path: String,
        #[serde(default)]
        content: String,
    },
    Folder {
        name: String,
        path: String,
        #[serde(default)]
        children: Vec<NodeRecord>,
    },
}

impl NodeRecord {
    fn name(&self) -> &str {
        match self {
            NodeRecord::File { name, .. } | NodeRecord::Folder { name, .. } => name,
        }
    }

    fn path(&self) -> &str {
        match self {
            NodeRecord::File { path, .. } | NodeRecord::Folder { path, .. } => path,
        }
    }
}

/// Encode a tree. Output is deterministic for a given tree.
pub fn encode(tree: &Tree) -> Result<Snapshot, SnapshotError> {
    encode_nodes(tree.roots())
}

/// Encode any ordered node sequence, such as the roots of a filtered view.
pub fn encode_nodes(roots: &[Arc<Node>]) -> Result<Snapshot, SnapshotError> {
    let records: Vec<RecordRef<'_>> = roots.iter().map(|n| RecordRef::from_node(n)).collect();
    serde_json::to_string_pretty(&records)
        .map(Snapshot::new)
        .map_err(|e| SnapshotError::Encode(e.to_string()))
}

/// Decode and validate a snapshot.
pub fn decode(text: &str) -> Result<Tree, SnapshotError> {
    let records: Vec<NodeRecord> =
        serde_json::from_str(text).map_err(|e| SnapshotError::Parse(e.to_string()))?;
    let roots = build_level(records, None)?;
    Ok(Tree::from_roots(roots))
}

fn build_level(
    records: Vec<NodeRecord>,
    parent: Option<&str>,
) -> Result<Vec<Arc<Node>>, SnapshotError> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut nodes = Vec::with_capacity(records.len());

    for record in records {
        let expected = path::join(parent, record.name());
        if path::depth(&expected) > path::MAX_DEPTH {
            return Err(SnapshotError::Parse(format!(
                "{}: nested deeper than {} levels",
                expected,
                path::MAX_DEPTH
            )));
        }
        let normalized = path::normalize_name(record.name())
            .map_err(|e| SnapshotError::Parse(format!("{}: {}", expected, e)))?;
        if normalized != record.name() {
            return Err(SnapshotError::Parse(format!(
                "{}: name is not NFC-normalized",
                expected
            )));
        }
        if record.path() != expected {
            return Err(SnapshotError::Parse(format!(
                "node '{}' has path '{}', expected '{}'",
                record.name(),
                record.path(),
                expected
            )));
        }
        if !seen.insert(normalized) {
            return Err(SnapshotError::Parse(format!(
                "duplicate entry '{}' in {}",
                record.name(),
                parent.unwrap_or("the project root")
            )));
        }

        let node = match record {
            NodeRecord::File {
                name,
                path,
                content,
            } => Node::file(name, path, content),
            NodeRecord::Folder {
                name,
                path,
                children,
            } => {
                let children = build_level(children, Some(&path))?;
                Node::folder(name, path, children)
            }
        };
        nodes.push(Arc::new(node));
    }

    Ok(nodes)
}
