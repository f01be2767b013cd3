//! Virtual Project Tree
//!
//! Represents a project as an ordered tree of files and folders, addressed
//! by slash-joined paths. Trees are persistent: every mutation returns a new
//! tree that shares all untouched subtrees with the previous one.

pub mod filter;
pub mod node;
pub mod path;
pub mod seed;
pub mod snapshot;
pub mod store;

pub use filter::{filter, FilteredView};
pub use node::{FileNode, FolderNode, Node, NodeKind};
pub use snapshot::Snapshot;
pub use store::{Tree, TreeStore};
