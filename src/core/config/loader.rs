use std::{fs, path::Path};

use super::{Config, ConfigError, ConfigPaths};
use crate::parse::strip_quotes;
use crate::path::PathExpander;

pub struct ConfigLoader<'a> {
    paths: &'a ConfigPaths,
    expander: PathExpander,
}

impl<'a> ConfigLoader<'a> {
    pub fn new(paths: &'a ConfigPaths) -> Self {
        Self {
            paths,
            expander: PathExpander::new(),
        }
    }

    pub fn load_configs(&self, config: &mut Config) -> Result<(), ConfigError> {
        if self.paths.explicit && !self.paths.rc_path.exists() {
            return Err(ConfigError::ConfigFileNotFound(
                self.paths.rc_path.display().to_string(),
            ));
        }
        self.source_if_exists(&self.paths.rc_path, config)
    }

    fn source_if_exists(&self, path: &Path, config: &mut Config) -> Result<(), ConfigError> {
        if path.exists() {
            log::debug!("reading config from {}", path.display());
            let content = fs::read_to_string(path)?;
            self.load_str(&content, config)?;
        }
        Ok(())
    }

    pub fn load_str(&self, content: &str, config: &mut Config) -> Result<(), ConfigError> {
        for (index, line) in content.lines().enumerate() {
            self.process_line(index + 1, line, config)?;
        }
        Ok(())
    }

    fn process_line(&self, number: usize, line: &str, config: &mut Config) -> Result<(), ConfigError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let invalid = |message: String| ConfigError::Invalid {
            line: number,
            message,
        };

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| invalid(format!("expected `key = value`, found `{}`", line)))?;
        let key = key.trim();
        // Quotes are stripped without trimming so a prompt can end in a space.
        let value = strip_quotes(value.trim());

        match key {
            "prompt" => config.prompt = value.to_string(),
            "max_line" => config.max_line = self.parse_limit(key, value).map_err(invalid)?,
            "max_args" => config.max_args = self.parse_limit(key, value).map_err(invalid)?,
            "history_size" => config.history_size = self.parse_limit(key, value).map_err(invalid)?,
            "history_file" => config.history_file = self.expander.expand(value)?,
            "bookmarks_file" => config.bookmarks_file = self.expander.expand(value)?,
            "search_extensions" => {
                config.search_extensions = value
                    .split(',')
                    .map(|ext| ext.trim().trim_start_matches('.'))
                    .filter(|ext| !ext.is_empty())
                    .map(String::from)
                    .collect();
            }
            "" => return Err(invalid("missing key".to_string())),
            unknown => log::warn!("config line {}: unknown key `{}` ignored", number, unknown),
        }
        Ok(())
    }

    fn parse_limit(&self, key: &str, value: &str) -> Result<usize, String> {
        match value.parse::<usize>() {
            Ok(0) | Err(_) => Err(format!("`{}` needs a positive number, found `{}`", key, value)),
            Ok(n) => Ok(n),
        }
    }
}
