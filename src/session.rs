//! Editing Session
//!
//! Two-state machine binding at most one file as active. While bound, the
//! session holds a buffer copied from the file's content; edits touch only
//! the buffer until `save` writes it back through the Tree Store.
//!
//! Opening a different file discards the current buffer without writing it
//! back. Callers that want to protect unsaved work check
//! [`EditingSession::has_unsaved_changes`] before calling `open`.

mod language;

pub use language::Language;

use crate::error::SessionError;
use crate::tree::{Tree, TreeStore};
use tracing::{debug, info};

/// Session state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unbound,
    Bound { path: String, buffer: String },
}

/// Active-file binding and content buffer
#[derive(Debug, Default)]
pub struct EditingSession {
    state: SessionState,
}

impl EditingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.state, SessionState::Bound { .. })
    }

    pub fn active_path(&self) -> Option<&str> {
        match &self.state {
            SessionState::Bound { path, .. } => Some(path),
            SessionState::Unbound => None,
        }
    }

    pub fn buffer(&self) -> Option<&str> {
        match &self.state {
            SessionState::Bound { buffer, .. } => Some(buffer),
            SessionState::Unbound => None,
        }
    }

    /// Name of the active file (last path segment).
    pub fn active_name(&self) -> Option<&str> {
        self.active_path().map(crate::tree::path::file_name)
    }

    /// Editor language of the active file
    pub fn language(&self) -> Option<Language> {
        self.active_name().map(Language::from_file_name)
    }

    /// Bind `path` and copy its content into a fresh buffer.
    ///
    /// Any previously held buffer is dropped, saved or not.
    pub fn open(&mut self, tree: &Tree, path: &str) -> Result<(), SessionError> {
        let node = tree
            .resolve(path)
            .ok_or_else(|| SessionError::NotFound(path.to_string()))?;
        let content = node
            .content()
            .ok_or_else(|| SessionError::NotAFile(node.path().to_string()))?;

        if let Some(previous) = self.active_path() {
            if previous != node.path() {
                debug!(previous, "Discarding buffer of previously active file");
            }
        }
        info!(path = node.path(), "Opened file");
        self.state = SessionState::Bound {
            path: node.path().to_string(),
            buffer: content.to_string(),
        };
        Ok(())
    }

    /// Replace the buffer. Does not touch the tree.
    pub fn edit(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        match &mut self.state {
            SessionState::Bound { buffer, .. } => {
                *buffer = text.into();
                Ok(())
            }
            SessionState::Unbound => Err(SessionError::NoActiveFile),
        }
    }

    /// Write the buffer back through the store. On success the returned tree
    /// is the new tree-of-record; if the file was deleted meanwhile the
    /// store's `NotFound` surfaces and the buffer is kept.
    pub fn save(&self, store: &mut TreeStore) -> Result<Tree, SessionError> {
        match &self.state {
            SessionState::Bound { path, buffer } => {
                let tree = store.update(path, buffer)?;
                info!(path = %path, bytes = buffer.len(), "Saved file");
                Ok(tree)
            }
            SessionState::Unbound => Err(SessionError::NoActiveFile),
        }
    }

    /// True when the buffer differs from the stored content, or the bound
    /// file no longer exists in `tree`.
    pub fn has_unsaved_changes(&self, tree: &Tree) -> bool {
        match &self.state {
            SessionState::Bound { path, buffer } => {
                tree.resolve(path).and_then(|n| n.content()) != Some(buffer.as_str())
            }
            SessionState::Unbound => false,
        }
    }

    /// Drop the binding without writing back.
    pub fn close(&mut self) {
        self.state = SessionState::Unbound;
    }
}
