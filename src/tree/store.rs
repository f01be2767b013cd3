//! Persistent tree and the Tree Store that owns the tree-of-record
//!
//! `Tree` operations never mutate: each returns a new `Tree` that shares
//! every subtree off the edited path with its predecessor. Only the folders
//! between the root and the edited parent are copied, so a mutation costs
//! O(depth × siblings) pointer copies instead of a full rebuild.

use crate::error::{SnapshotError, TreeError};
use crate::tree::node::{Node, NodeKind};
use crate::tree::path;
use crate::tree::snapshot::{self, Snapshot};
use std::sync::Arc;
use tracing::{debug, instrument};

const ROOT_LABEL: &str = "the project root";

/// An ordered sequence of root nodes
#[derive(Debug, Clone, Default)]
pub struct Tree {
    roots: Arc<Vec<Arc<Node>>>,
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.roots, &other.roots) || self.roots == other.roots
    }
}

impl Eq for Tree {}

impl Tree {
    /// An empty tree with no root nodes
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_roots(roots: Vec<Arc<Node>>) -> Self {
        Self {
            roots: Arc::new(roots),
        }
    }

    pub fn roots(&self) -> &[Arc<Node>] {
        &self.roots
    }

    /// True when both trees are the very same version (reference equality).
    pub fn ptr_eq(a: &Tree, b: &Tree) -> bool {
        Arc::ptr_eq(&a.roots, &b.roots)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    pub fn file_count(&self) -> usize {
        self.walk().filter(|n| n.is_file()).count()
    }

    /// Depth-first, pre-order traversal in display order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Look up a node by path. Never mutates.
    pub fn resolve(&self, path: &str) -> Option<&Arc<Node>> {
        let path = path::normalize_path_string(path);
        let mut siblings: &[Arc<Node>] = &self.roots;
        let mut found = None;
        for segment in path::segments(&path) {
            let node = siblings.iter().find(|n| n.name() == segment)?;
            siblings = node.children();
            found = Some(node);
        }
        found
    }

    pub fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    /// Insert an empty file or folder at the end of `parent`'s children
    /// (or at the end of the roots when `parent` is `None`).
    #[instrument(skip(self), level = "debug")]
    pub fn create(
        &self,
        parent: Option<&str>,
        name: &str,
        kind: NodeKind,
    ) -> Result<Tree, TreeError> {
        let name = path::normalize_name(name)?;
        let parent = normalize_parent(parent);
        let siblings = self.children_of(parent.as_deref())?;
        if siblings.iter().any(|n| n.name() == name) {
            return Err(duplicate(parent.as_deref(), &name));
        }

        let node = Arc::new(Node::empty(
            kind,
            name.clone(),
            path::join(parent.as_deref(), &name),
        ));
        check_depth(node.path(), path::depth(node.path()))?;
        debug!(path = node.path(), %kind, "Creating node");
        self.rebuild_children(parent.as_deref(), |children| children.push(node))
    }

    /// Replace the content of the file at `path`.
    #[instrument(skip(self, content), level = "debug")]
    pub fn update(&self, path: &str, content: &str) -> Result<Tree, TreeError> {
        let path = path::normalize_path_string(path);
        match self.resolve(&path) {
            Some(node) if node.is_file() => {}
            _ => return Err(TreeError::NotFound(path)),
        }

        let name = path::file_name(&path);
        let replacement = Arc::new(Node::file(
            name.to_string(),
            path.clone(),
            content.to_string(),
        ));
        self.rebuild_children(path::parent(&path), |children| {
            replace_named(children, name, replacement)
        })
    }

    /// Give a node a new name in place; folders carry their subtree along.
    #[instrument(skip(self), level = "debug")]
    pub fn rename(&self, path: &str, new_name: &str) -> Result<Tree, TreeError> {
        let path = path::normalize_path_string(path);
        let node = self
            .resolve(&path)
            .cloned()
            .ok_or_else(|| TreeError::NotFound(path.clone()))?;
        let new_name = path::normalize_name(new_name)?;
        if node.name() == new_name {
            return Ok(self.clone());
        }

        let parent = path::parent(&path);
        if self
            .children_of(parent)?
            .iter()
            .any(|n| n.name() == new_name)
        {
            return Err(duplicate(parent, &new_name));
        }

        let renamed = Arc::new(node.relocated(&new_name, parent));
        self.rebuild_children(parent, |children| {
            replace_named(children, node.name(), renamed)
        })
    }

    /// Move a node under `new_parent` (or to the root level), appending it
    /// to the destination's children.
    #[instrument(skip(self), level = "debug")]
    pub fn move_node(&self, path: &str, new_parent: Option<&str>) -> Result<Tree, TreeError> {
        let path = path::normalize_path_string(path);
        let node = self
            .resolve(&path)
            .cloned()
            .ok_or_else(|| TreeError::NotFound(path.clone()))?;
        let destination = normalize_parent(new_parent);

        if let Some(dest) = destination.as_deref() {
            if path::is_within(dest, &path) {
                return Err(TreeError::InvalidMove {
                    path: path.clone(),
                    destination: dest.to_string(),
                });
            }
        }

        let dest_children = self.children_of(destination.as_deref())?;
        let current_parent = path::parent(&path);
        if destination.as_deref() == current_parent {
            return Ok(self.clone());
        }
        if dest_children.iter().any(|n| n.name() == node.name()) {
            return Err(duplicate(destination.as_deref(), node.name()));
        }
        let dest_depth = destination.as_deref().map(path::depth).unwrap_or(0);
        check_depth(&path, dest_depth + node.height())?;

        let moved = Arc::new(node.relocated(node.name(), destination.as_deref()));
        let detached = self.rebuild_children(current_parent, |children| {
            children.retain(|n| n.name() != node.name())
        })?;
        detached.rebuild_children(destination.as_deref(), |children| children.push(moved))
    }

    /// Remove a node; deleting a folder removes its whole subtree.
    #[instrument(skip(self), level = "debug")]
    pub fn delete(&self, path: &str) -> Result<Tree, TreeError> {
        let path = path::normalize_path_string(path);
        if self.resolve(&path).is_none() {
            return Err(TreeError::NotFound(path));
        }

        let name = path::file_name(&path);
        self.rebuild_children(path::parent(&path), |children| {
            children.retain(|n| n.name() != name)
        })
    }

    /// Encode the tree as a snapshot.
    pub fn serialize(&self) -> Result<Snapshot, SnapshotError> {
        snapshot::encode(self)
    }

    /// Decode a snapshot, validating every tree invariant.
    pub fn deserialize(text: &str) -> Result<Tree, SnapshotError> {
        snapshot::decode(text)
    }

    fn children_of(&self, parent: Option<&str>) -> Result<&[Arc<Node>], TreeError> {
        match parent {
            None => Ok(self.roots.as_slice()),
            Some(p) => match self.resolve(p) {
                Some(node) if node.is_folder() => Ok(node.children()),
                _ => Err(TreeError::ParentNotFound(p.to_string())),
            },
        }
    }

    /// Path-copy from the root down to `parent` and apply `edit` to its children.
    fn rebuild_children<F>(&self, parent: Option<&str>, edit: F) -> Result<Tree, TreeError>
    where
        F: FnOnce(&mut Vec<Arc<Node>>),
    {
        let segments = parent.map(path::segments).unwrap_or_default();
        rebuild(&self.roots, &segments, edit)
            .map(Tree::from_roots)
            .ok_or_else(|| TreeError::ParentNotFound(parent.unwrap_or(ROOT_LABEL).to_string()))
    }
}

fn rebuild<F>(siblings: &[Arc<Node>], dir: &[&str], edit: F) -> Option<Vec<Arc<Node>>>
where
    F: FnOnce(&mut Vec<Arc<Node>>),
{
    let Some((head, rest)) = dir.split_first() else {
        let mut out = siblings.to_vec();
        edit(&mut out);
        return Some(out);
    };

    let index = siblings.iter().position(|n| n.name() == *head)?;
    let Node::Folder(folder) = siblings[index].as_ref() else {
        return None;
    };
    let children = rebuild(&folder.children, rest, edit)?;

    let mut out = siblings.to_vec();
    out[index] = Arc::new(Node::folder(
        folder.name.clone(),
        folder.path.clone(),
        children,
    ));
    Some(out)
}

fn replace_named(children: &mut [Arc<Node>], name: &str, replacement: Arc<Node>) {
    if let Some(slot) = children.iter_mut().find(|c| c.name() == name) {
        *slot = replacement;
    }
}

fn normalize_parent(parent: Option<&str>) -> Option<String> {
    parent
        .map(path::normalize_path_string)
        .filter(|p| !p.is_empty())
}

fn check_depth(path: &str, levels: usize) -> Result<(), TreeError> {
    if levels > path::MAX_DEPTH {
        return Err(TreeError::TooDeep {
            path: path.to_string(),
            max: path::MAX_DEPTH,
        });
    }
    Ok(())
}

fn duplicate(parent: Option<&str>, name: &str) -> TreeError {
    TreeError::DuplicateName {
        parent: parent.unwrap_or(ROOT_LABEL).to_string(),
        name: name.to_string(),
    }
}

/// Pre-order iterator over a tree
pub struct Walk<'a> {
    stack: Vec<&'a Arc<Node>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Arc<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// Owner of the tree-of-record
///
/// Hands out cheap snapshots of the current tree and swaps in the result of
/// every successful operation. Failed operations leave the current tree as is.
#[derive(Debug, Default)]
pub struct TreeStore {
    current: Tree,
}

impl TreeStore {
    pub fn new(tree: Tree) -> Self {
        Self { current: tree }
    }

    /// The current tree. Holding it keeps that version alive and unchanged.
    pub fn tree(&self) -> Tree {
        self.current.clone()
    }

    pub fn current(&self) -> &Tree {
        &self.current
    }

    pub fn resolve(&self, path: &str) -> Option<Arc<Node>> {
        self.current.resolve(path).cloned()
    }

    pub fn create(
        &mut self,
        parent: Option<&str>,
        name: &str,
        kind: NodeKind,
    ) -> Result<Tree, TreeError> {
        let next = self.current.create(parent, name, kind)?;
        Ok(self.commit(next))
    }

    pub fn update(&mut self, path: &str, content: &str) -> Result<Tree, TreeError> {
        let next = self.current.update(path, content)?;
        Ok(self.commit(next))
    }

    pub fn rename(&mut self, path: &str, new_name: &str) -> Result<Tree, TreeError> {
        let next = self.current.rename(path, new_name)?;
        Ok(self.commit(next))
    }

    pub fn move_node(&mut self, path: &str, new_parent: Option<&str>) -> Result<Tree, TreeError> {
        let next = self.current.move_node(path, new_parent)?;
        Ok(self.commit(next))
    }

    pub fn delete(&mut self, path: &str) -> Result<Tree, TreeError> {
        let next = self.current.delete(path)?;
        Ok(self.commit(next))
    }

    /// Swap in a whole new tree, returning the previous one.
    pub fn replace(&mut self, tree: Tree) -> Tree {
        debug!(nodes = tree.len(), "Replacing tree-of-record");
        std::mem::replace(&mut self.current, tree)
    }

    pub fn serialize(&self) -> Result<Snapshot, SnapshotError> {
        self.current.serialize()
    }

    /// Decode `text` and adopt it as the tree-of-record. On a parse error the
    /// current tree is kept.
    pub fn load_snapshot(&mut self, text: &str) -> Result<Tree, SnapshotError> {
        let tree = Tree::deserialize(text)?;
        self.replace(tree.clone());
        Ok(tree)
    }

    fn commit(&mut self, next: Tree) -> Tree {
        self.current = next.clone();
        next
    }
}
