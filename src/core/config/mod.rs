use std::{fmt, path::PathBuf};

mod loader;
mod paths;

use loader::ConfigLoader;
use paths::ConfigPaths;

use crate::parse::{MAX_ARGS, MAX_LINE};
use crate::path::{PathError, PathExpander};
use crate::search::DEFAULT_EXTENSIONS;

pub const DEFAULT_PROMPT: &str = "myshell: ";
pub const DEFAULT_HISTORY_SIZE: usize = 1000;
const HISTORY_FILE: &str = "~/.myshell_history";
const BOOKMARKS_FILE: &str = "~/.myshell_bookmarks";

/// Settings read from the rc file, with defaults for every key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    pub max_line: usize,
    pub max_args: usize,
    pub history_file: PathBuf,
    pub history_size: usize,
    pub bookmarks_file: PathBuf,
    pub search_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let expander = PathExpander::new();
        let home_relative = |path: &str| {
            expander
                .expand(path)
                .unwrap_or_else(|_| PathBuf::from(path.trim_start_matches("~/")))
        };

        Config {
            prompt: DEFAULT_PROMPT.to_string(),
            max_line: MAX_LINE,
            max_args: MAX_ARGS,
            history_file: home_relative(HISTORY_FILE),
            history_size: DEFAULT_HISTORY_SIZE,
            bookmarks_file: home_relative(BOOKMARKS_FILE),
            search_extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl Config {
    /// Defaults overlaid with the rc file (`override_path` or `~/.myshellrc`).
    pub fn load(override_path: Option<&str>) -> Result<Self, ConfigError> {
        let paths = ConfigPaths::new(override_path)?;
        let mut config = Config::default();
        ConfigLoader::new(&paths).load_configs(&mut config)?;
        Ok(config)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    HomeDirNotFound,
    ConfigFileNotFound(String),
    Invalid { line: usize, message: String },
    IoError(std::io::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<PathError> for ConfigError {
    fn from(_: PathError) -> Self {
        ConfigError::HomeDirNotFound
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::HomeDirNotFound => write!(f, "Home directory not found"),
            ConfigError::ConfigFileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::Invalid { line, message } => write!(f, "line {}: {}", line, message),
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
