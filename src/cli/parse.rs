//! CLI parse: clap types for Canopy. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Canopy CLI - edit, run and sync a small project tree
#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Browse, edit, run and sync a project tree kept in one snapshot file")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Project snapshot file (overrides [project] snapshot_file)
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write the starter project to the snapshot file
    Init {
        /// Overwrite an existing snapshot file
        #[arg(long)]
        force: bool,
    },
    /// Show the project tree
    Tree {
        /// Keep only nodes whose name contains this text (and their ancestors)
        #[arg(long)]
        filter: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create an empty file
    NewFile {
        /// Full path of the new file, e.g. src/util.js
        path: String,
    },
    /// Create an empty folder
    NewFolder {
        /// Full path of the new folder
        path: String,
    },
    /// Rename a file or folder in place
    Rename {
        path: String,
        /// New name (no slashes)
        name: String,
    },
    /// Move a file or folder under another folder
    Move {
        path: String,
        /// Destination folder; omit to move to the top level
        #[arg(long)]
        to: Option<String>,
    },
    /// Delete a file or a folder with everything below it
    Delete { path: String },
    /// Print a file's content
    Show { path: String },
    /// Replace a file's content (open, edit, save)
    Write {
        path: String,
        /// New content; read from stdin when omitted
        #[arg(long)]
        content: Option<String>,
    },
    /// Run a script file and print what it outputs
    Run { path: String },
    /// Commit the project to the remote repository
    Push {
        /// Commit message
        #[arg(short, long, default_value = "")]
        message: String,
    },
    /// Replace the project with the remote repository's snapshot
    Pull,
    /// Print the effective configuration (token redacted)
    Config,
    /// Interactive session over the project
    Shell,
}
