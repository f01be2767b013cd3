//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name string for log spans (e.g. "tree", "new-file").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Tree { .. } => "tree",
        Commands::NewFile { .. } => "new-file",
        Commands::NewFolder { .. } => "new-folder",
        Commands::Rename { .. } => "rename",
        Commands::Move { .. } => "move",
        Commands::Delete { .. } => "delete",
        Commands::Show { .. } => "show",
        Commands::Write { .. } => "write",
        Commands::Run { .. } => "run",
        Commands::Push { .. } => "push",
        Commands::Pull => "pull",
        Commands::Config => "config",
        Commands::Shell => "shell",
    }
}

/// Whether a successful run of `command` changes the persisted project.
pub fn is_mutating(command: &Commands) -> bool {
    matches!(
        command,
        Commands::NewFile { .. }
            | Commands::NewFolder { .. }
            | Commands::Rename { .. }
            | Commands::Move { .. }
            | Commands::Delete { .. }
            | Commands::Write { .. }
            | Commands::Pull
    )
}

/// Help text for the interactive shell.
pub const SHELL_HELP: &str = "\
Commands:
  tree [QUERY]            show the tree, optionally filtered
  open PATH               open a file into the buffer
  show                    print the buffer
  edit TEXT               replace the buffer (\\n is a newline, \\\\n a literal \\n)
  save                    write the buffer back
  run                     run the buffer
  new-file PATH           create a file
  new-folder PATH         create a folder
  rename PATH NAME        rename a node
  move PATH [PARENT]      move a node (top level when PARENT is omitted)
  delete PATH             delete a node
  push [MESSAGE]          commit the project to the remote
  pull                    replace the project with the remote snapshot
  log                     print the whole terminal log
  help                    this text
  exit | quit             save the project and leave";
