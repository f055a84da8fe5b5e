use crate::bookmark::BookmarkError;
use crate::core::commands::CommandError;
use crate::core::config::ConfigError;
use crate::parse::{PlanError, TokenizeError};
use crate::path::PathError;
use crate::process::ProcessError;

#[derive(Debug)]
pub enum ShellError {
    Readline(rustyline::error::ReadlineError),
    Io(std::io::Error),
    Tokenize(TokenizeError),
    Plan(PlanError),
    Path(PathError),
    ProcessError(ProcessError),
    Command(CommandError),
    Bookmark(BookmarkError),
    ConfigError(ConfigError),
    FlagError(String),
    Logging(String),
}

impl From<rustyline::error::ReadlineError> for ShellError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        ShellError::Readline(err)
    }
}

impl From<std::io::Error> for ShellError {
    fn from(err: std::io::Error) -> Self {
        ShellError::Io(err)
    }
}

impl From<TokenizeError> for ShellError {
    fn from(err: TokenizeError) -> Self {
        ShellError::Tokenize(err)
    }
}

impl From<PlanError> for ShellError {
    fn from(err: PlanError) -> Self {
        ShellError::Plan(err)
    }
}

impl From<PathError> for ShellError {
    fn from(err: PathError) -> Self {
        ShellError::Path(err)
    }
}

impl From<ProcessError> for ShellError {
    fn from(err: ProcessError) -> Self {
        ShellError::ProcessError(err)
    }
}

impl From<CommandError> for ShellError {
    fn from(err: CommandError) -> Self {
        ShellError::Command(err)
    }
}

impl From<BookmarkError> for ShellError {
    fn from(err: BookmarkError) -> Self {
        ShellError::Bookmark(err)
    }
}

impl From<ConfigError> for ShellError {
    fn from(err: ConfigError) -> Self {
        ShellError::ConfigError(err)
    }
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellError::Readline(e) => write!(f, "Readline error: {}", e),
            ShellError::Io(e) => write!(f, "IO error: {}", e),
            ShellError::Tokenize(e) => write!(f, "{}", e),
            ShellError::Plan(e) => write!(f, "{}", e),
            ShellError::Path(e) => write!(f, "{}", e),
            ShellError::ProcessError(e) => write!(f, "{}", e),
            ShellError::Command(e) => write!(f, "{}", e),
            ShellError::Bookmark(e) => write!(f, "{}", e),
            ShellError::ConfigError(e) => write!(f, "Config error: {}", e),
            ShellError::FlagError(msg) => write!(f, "Flag error: {}", msg),
            ShellError::Logging(msg) => write!(f, "Logging error: {}", msg),
        }
    }
}

impl std::error::Error for ShellError {}
