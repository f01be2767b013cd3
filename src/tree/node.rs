//! Node types for the virtual project tree

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of a node, as spelled in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::File => write!(f, "file"),
            NodeKind::Folder => write!(f, "folder"),
        }
    }
}

/// A file: a name, its full path, and opaque text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) content: String,
}

/// A folder: children are kept in insertion order, which is also display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) children: Vec<Arc<Node>>,
}

/// Tree node
///
/// Nodes are immutable once built and shared through `Arc` between
/// successive versions of a [`Tree`](crate::tree::Tree).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(FileNode),
    Folder(FolderNode),
}

impl Node {
    pub(crate) fn file(name: String, path: String, content: String) -> Self {
        Node::File(FileNode {
            name,
            path,
            content,
        })
    }

    pub(crate) fn folder(name: String, path: String, children: Vec<Arc<Node>>) -> Self {
        Node::Folder(FolderNode {
            name,
            path,
            children,
        })
    }

    pub(crate) fn empty(kind: NodeKind, name: String, path: String) -> Self {
        match kind {
            NodeKind::File => Node::file(name, path, String::new()),
            NodeKind::Folder => Node::folder(name, path, Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::File(f) => &f.name,
            Node::Folder(d) => &d.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Node::File(f) => &f.path,
            Node::Folder(d) => &d.path,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File(_) => NodeKind::File,
            Node::Folder(_) => NodeKind::Folder,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Node::File(_))
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Node::Folder(_))
    }

    /// File content, `None` for folders.
    pub fn content(&self) -> Option<&str> {
        match self {
            Node::File(f) => Some(&f.content),
            Node::Folder(_) => None,
        }
    }

    /// Folder children, empty for files.
    pub fn children(&self) -> &[Arc<Node>] {
        match self {
            Node::File(_) => &[],
            Node::Folder(d) => &d.children,
        }
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&Arc<Node>> {
        self.children().iter().find(|c| c.name() == name)
    }

    /// Rebuild this node and its whole subtree under a new name and parent.
    ///
    /// Every descendant path is recomputed so `path == parent.path/name` holds.
    pub(crate) fn relocated(&self, name: &str, parent: Option<&str>) -> Node {
        let path = crate::tree::path::join(parent, name);
        match self {
            Node::File(f) => Node::file(name.to_string(), path, f.content.clone()),
            Node::Folder(d) => {
                let children = d
                    .children
                    .iter()
                    .map(|child| Arc::new(child.relocated(child.name(), Some(&path))))
                    .collect();
                Node::folder(name.to_string(), path, children)
            }
        }
    }

    /// Levels in this subtree: 1 for a file or an empty folder.
    pub fn height(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|c| c.height())
            .max()
            .unwrap_or(0)
    }

    /// Number of nodes in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|c| c.subtree_len())
            .sum::<usize>()
    }
}
