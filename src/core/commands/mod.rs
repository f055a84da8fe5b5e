use std::collections::BTreeMap;
use std::io::Write;

mod bookmark;
mod cd;
mod exit;
mod search;

pub use bookmark::BookmarkCommand;
pub use cd::CdCommand;
pub use exit::ExitCommand;
pub use search::SearchCommand;

use crate::bookmark::{BookmarkError, BookmarkStore};
use crate::parse::{strip_quotes, CommandLine, Tokenizer};
use crate::search::ContentSearch;

#[derive(Debug)]
pub enum CommandError {
    InvalidArguments(String),
    ExecutionError(String),
    Bookmark(BookmarkError),
    IoError(std::io::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::InvalidArguments(msg) => write!(f, "{}", msg),
            CommandError::ExecutionError(msg) => write!(f, "{}", msg),
            CommandError::Bookmark(err) => write!(f, "{}", err),
            CommandError::IoError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        CommandError::IoError(err)
    }
}

impl From<BookmarkError> for CommandError {
    fn from(err: BookmarkError) -> Self {
        CommandError::Bookmark(err)
    }
}

/// What the shell should do after a builtin ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Continue,
    /// Run this line as if it had been typed.
    Replay(CommandLine),
    RequestExit,
}

/// Shell-owned state a builtin may read or change.
pub struct CommandContext<'a> {
    pub bookmarks: &'a mut BookmarkStore,
    pub search: &'a ContentSearch,
    pub tokenizer: &'a Tokenizer,
    pub out: &'a mut dyn Write,
}

pub trait Command {
    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<Action, CommandError>;
}

#[derive(Clone)]
enum CommandType {
    Cd(CdCommand),
    Exit(ExitCommand),
    Bookmark(BookmarkCommand),
    Search(SearchCommand),
}

impl Command for CommandType {
    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<Action, CommandError> {
        match self {
            CommandType::Cd(cmd) => cmd.execute(args, ctx),
            CommandType::Exit(cmd) => cmd.execute(args, ctx),
            CommandType::Bookmark(cmd) => cmd.execute(args, ctx),
            CommandType::Search(cmd) => cmd.execute(args, ctx),
        }
    }
}

#[derive(Clone)]
pub struct Builtins {
    commands: BTreeMap<&'static str, CommandType>,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    pub fn new() -> Self {
        let mut builtins = Self {
            commands: BTreeMap::new(),
        };
        builtins.register("cd", CommandType::Cd(CdCommand::new()));
        builtins.register("exit", CommandType::Exit(ExitCommand::new()));
        builtins.register("bookmark", CommandType::Bookmark(BookmarkCommand::new()));
        builtins.register("search", CommandType::Search(SearchCommand::new()));
        builtins
    }

    fn register(&mut self, name: &'static str, command: CommandType) {
        self.commands.insert(name, command);
    }

    pub fn is_builtin(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Runs `command` if it is a builtin; `None` means it is not one.
    pub fn execute(
        &self,
        command: &str,
        args: &[String],
        ctx: &mut CommandContext<'_>,
    ) -> Option<Result<Action, CommandError>> {
        let cmd = self.commands.get(command)?;
        log::debug!("builtin {} {:?}", command, args);
        Some(cmd.execute(args, ctx))
    }
}

/// Rejoins words the tokenizer split apart and drops one pair of quotes,
/// so `"ls -l"` reaches the builtin as `ls -l`.
pub(crate) fn quoted_argument(words: &[String]) -> String {
    strip_quotes(&words.join(" ")).to_string()
}
