//! CLI presentation: text and json formatters per command family.

mod tree;

pub use tree::{format_tree_json, format_tree_text};
