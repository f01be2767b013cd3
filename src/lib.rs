//! Canopy: an in-memory project tree with an editing session
//!
//! A small project is kept as a persistent tree of files and folders. One
//! file at a time is opened into an editing buffer, saved back explicitly,
//! run through a host evaluator, and the whole tree can be pushed to or
//! pulled from a remote repository as a single snapshot.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod sandbox;
pub mod session;
pub mod sync;
pub mod terminal;
pub mod tree;
pub mod workspace;

pub use error::ApiError;
pub use tree::{Tree, TreeStore};
pub use workspace::Workspace;
