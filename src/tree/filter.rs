//! Search filter
//!
//! Produces a read-only, depth-preserving view of a tree for a query string.
//! A node is kept when its own name contains the query (case-insensitive),
//! or when it is a folder with at least one kept descendant.

use crate::tree::node::Node;
use crate::tree::path;
use crate::tree::store::Tree;
use std::sync::Arc;

/// Filtered, read-only view of a tree
///
/// Views cannot be turned back into a [`Tree`]; mutations always go through
/// the Tree Store by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredView {
    query: String,
    roots: Vec<Arc<Node>>,
}

impl FilteredView {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn roots(&self) -> &[Arc<Node>] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Paths of every kept node, pre-order.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<&Arc<Node>> = self.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node.path().to_string());
            stack.extend(node.children().iter().rev());
        }
        out
    }

    /// True when the node at `path` is part of the view.
    pub fn matches(&self, path: &str) -> bool {
        let path = path::normalize_path_string(path);
        let mut siblings: &[Arc<Node>] = &self.roots;
        let mut found = false;
        for segment in path::segments(&path) {
            match siblings.iter().find(|n| n.name() == segment) {
                Some(node) => {
                    siblings = node.children();
                    found = true;
                }
                None => return false,
            }
        }
        found
    }
}

/// Filter `tree` by `query`. An empty query yields the identity view.
pub fn filter(tree: &Tree, query: &str) -> FilteredView {
    if query.is_empty() {
        return FilteredView {
            query: String::new(),
            roots: tree.roots().to_vec(),
        };
    }

    let needle = query.to_lowercase();
    FilteredView {
        query: query.to_string(),
        roots: filter_level(tree.roots(), &needle),
    }
}

fn filter_level(nodes: &[Arc<Node>], needle: &str) -> Vec<Arc<Node>> {
    nodes
        .iter()
        .filter_map(|node| keep(node, needle))
        .collect()
}

fn keep(node: &Arc<Node>, needle: &str) -> Option<Arc<Node>> {
    let own_match = node.name().to_lowercase().contains(needle);
    match node.as_ref() {
        Node::File(_) => own_match.then(|| Arc::clone(node)),
        Node::Folder(folder) => {
            let children = filter_level(&folder.children, needle);
            if !own_match && children.is_empty() {
                return None;
            }
            if children.len() == folder.children.len()
                && children
                    .iter()
                    .zip(folder.children.iter())
                    .all(|(a, b)| Arc::ptr_eq(a, b))
            {
                // Nothing was dropped below: share the original subtree.
                return Some(Arc::clone(node));
            }
            Some(Arc::new(Node::folder(
                folder.name.clone(),
                folder.path.clone(),
                children,
            )))
        }
    }
}
