//! CLI domain: parse, route, help, output, presentation and the interactive
//! shell. No domain orchestration; a single route table dispatches to the
//! workspace facade.

mod help;
mod output;
mod parse;
mod presentation;
mod route;
mod shell;

pub use help::{command_name, is_mutating, SHELL_HELP};
pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands};
pub use presentation::{format_tree_json, format_tree_text};
pub use route::RunContext;
pub use shell::{Shell, PROMPT};
