//! Seed project used when a session starts without a snapshot

use crate::tree::node::Node;
use crate::tree::store::Tree;
use std::sync::Arc;

pub const WELCOME_SCRIPT: &str = "// Welcome to Canopy\nconsole.log(\"Hello World!\");";
pub const README: &str = "# My Project\n\nWelcome to your project!";

/// `src/index.js` and `README.md`, in that order.
pub fn default_project() -> Tree {
    let index = Node::file(
        "index.js".to_string(),
        "src/index.js".to_string(),
        WELCOME_SCRIPT.to_string(),
    );
    let src = Node::folder(
        "src".to_string(),
        "src".to_string(),
        vec![Arc::new(index)],
    );
    let readme = Node::file(
        "README.md".to_string(),
        "README.md".to_string(),
        README.to_string(),
    );
    Tree::from_roots(vec![Arc::new(src), Arc::new(readme)])
}
