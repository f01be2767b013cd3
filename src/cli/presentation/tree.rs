//! Tree presentation: indented outline and JSON records.

use crate::error::ApiError;
use crate::tree::snapshot;
use crate::tree::{FilteredView, Node};
use owo_colors::OwoColorize;
use std::sync::Arc;

/// Indented outline, folders suffixed with `/`.
pub fn format_tree_text(view: &FilteredView, color: bool) -> String {
    if view.is_empty() {
        return if view.query().is_empty() {
            "(empty project)".to_string()
        } else {
            format!("No matches for '{}'", view.query())
        };
    }
    let mut lines = Vec::new();
    for root in view.roots() {
        outline(root, 0, color, &mut lines);
    }
    lines.join("\n")
}

fn outline(node: &Arc<Node>, depth: usize, color: bool, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match node.as_ref() {
        Node::File(file) => lines.push(format!("{}{}", indent, file.name)),
        Node::Folder(folder) => {
            let label = format!("{}/", folder.name);
            if color {
                lines.push(format!("{}{}", indent, label.blue().bold()));
            } else {
                lines.push(format!("{}{}", indent, label));
            }
            for child in &folder.children {
                outline(child, depth + 1, color, lines);
            }
        }
    }
}

/// The kept nodes in snapshot record form.
pub fn format_tree_json(view: &FilteredView) -> Result<String, ApiError> {
    Ok(snapshot::encode_nodes(view.roots())?.into_string())
}
