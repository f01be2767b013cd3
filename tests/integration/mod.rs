//! Integration tests for the Canopy project tree, session, sandbox and sync

mod config_integration;
mod github_remote;
mod sandbox_process;
mod sync_client;
mod tree_store;
