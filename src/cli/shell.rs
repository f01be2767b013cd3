//! Interactive shell: a line-oriented session over one workspace.
//!
//! Each line is one command. After every command the terminal log lines it
//! produced are echoed back, so the shell reads like the terminal panel.

use crate::cli::help::SHELL_HELP;
use crate::cli::presentation::format_tree_text;
use crate::error::{ApiError, SessionError};
use crate::terminal::render_lines;
use crate::workspace::Workspace;
use std::io::{BufRead, Write};
use tokio::runtime::Runtime;
use tracing::debug;

pub const PROMPT: &str = "canopy> ";

enum Step {
    Continue(Option<String>),
    Exit,
}

pub struct Shell<'a> {
    workspace: &'a mut Workspace,
    runtime: &'a Runtime,
    color: bool,
}

impl<'a> Shell<'a> {
    pub fn new(workspace: &'a mut Workspace, runtime: &'a Runtime, color: bool) -> Self {
        Self {
            workspace,
            runtime,
            color,
        }
    }

    /// Read commands from `input` until `exit`, `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<(), ApiError> {
        writeln!(out, "{}", render_lines(self.workspace.terminal().lines()))?;
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        for line in input.lines() {
            let line = line?;
            let before = self.workspace.terminal().len();
            let step = self.dispatch(line.trim());

            let produced = self.workspace.terminal().lines_since(before);
            if !produced.is_empty() {
                writeln!(out, "{}", render_lines(produced))?;
            }
            match step {
                Ok(Step::Exit) => return Ok(()),
                Ok(Step::Continue(Some(text))) => writeln!(out, "{}", text)?,
                Ok(Step::Continue(None)) => {}
                Err(e) => {
                    // Failures already in the log were echoed above.
                    if self.workspace.terminal().len() == before {
                        writeln!(out, "Error: {}", e)?;
                    }
                }
            }
            write!(out, "{}", PROMPT)?;
            out.flush()?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn dispatch(&mut self, line: &str) -> Result<Step, ApiError> {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        debug!(command, "Shell command");

        let text = match command {
            "" => None,
            "exit" | "quit" => return Ok(Step::Exit),
            "help" => Some(SHELL_HELP.to_string()),
            "log" => Some(self.workspace.terminal().render()),
            "tree" => Some(format_tree_text(&self.workspace.search(rest), self.color)),
            "open" => {
                self.workspace.open(required(rest, "open PATH")?)?;
                None
            }
            "show" => Some(
                self.workspace
                    .session()
                    .buffer()
                    .ok_or(SessionError::NoActiveFile)?
                    .to_string(),
            ),
            "edit" => {
                self.workspace.edit(unescape_newlines(rest))?;
                None
            }
            "save" => {
                self.workspace.save()?;
                None
            }
            "run" => {
                self.runtime.block_on(self.workspace.run())?;
                None
            }
            "new-file" => {
                self.workspace
                    .create_at(required(rest, "new-file PATH")?, crate::tree::NodeKind::File)?;
                None
            }
            "new-folder" => {
                self.workspace.create_at(
                    required(rest, "new-folder PATH")?,
                    crate::tree::NodeKind::Folder,
                )?;
                None
            }
            "rename" => {
                let (path, name) = two_args(rest, "rename PATH NAME")?;
                self.workspace.rename(path, name)?;
                None
            }
            "move" => {
                let path = required(first_word(rest), "move PATH [PARENT]")?;
                let parent = rest[path.len()..].trim();
                let parent = (!parent.is_empty()).then_some(parent);
                self.workspace.move_node(path, parent)?;
                None
            }
            "delete" => {
                self.workspace.delete(required(rest, "delete PATH")?)?;
                None
            }
            "push" => {
                self.runtime.block_on(self.workspace.push(rest))?;
                None
            }
            "pull" => {
                self.runtime.block_on(self.workspace.pull())?;
                None
            }
            other => {
                return Err(ApiError::InvalidArgument(format!(
                    "Unknown command '{}' (try 'help')",
                    other
                )))
            }
        };
        Ok(Step::Continue(text))
    }
}

fn required<'s>(value: &'s str, usage: &str) -> Result<&'s str, ApiError> {
    if value.is_empty() {
        Err(ApiError::InvalidArgument(format!("usage: {}", usage)))
    } else {
        Ok(value)
    }
}

/// Turn `\n` into a newline; `\\n` stays a literal backslash followed by `n`.
fn unescape_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('\\') => {
                chars.next();
                if chars.peek() == Some(&'n') {
                    chars.next();
                    out.push_str("\\n");
                } else {
                    out.push_str("\\\\");
                }
            }
            _ => out.push(c),
        }
    }
    out
}

fn first_word(value: &str) -> &str {
    value.split_whitespace().next().unwrap_or("")
}

fn two_args<'s>(value: &'s str, usage: &str) -> Result<(&'s str, &'s str), ApiError> {
    match value.split_once(char::is_whitespace) {
        Some((a, b)) if !b.trim().is_empty() => Ok((a, b.trim())),
        _ => Err(ApiError::InvalidArgument(format!("usage: {}", usage))),
    }
}
