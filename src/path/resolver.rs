use std::env;

use super::PathError;

pub const PATH_DELIMITER: char = ':';
pub const CURRENT_DIR: &str = ".";

/// Ordered directories searched for a bare command name. First match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathList {
    dirs: Vec<String>,
}

/// Splits a search-path string on `delimiter`, dropping empty segments.
pub fn split_paths(raw: &str, delimiter: char) -> Result<PathList, PathError> {
    let dirs: Vec<String> = raw
        .split(delimiter)
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect();

    if dirs.is_empty() {
        return Err(PathError::EmptyPath);
    }

    Ok(PathList { dirs })
}

impl PathList {
    /// Reads `PATH` and appends the current directory entry.
    pub fn from_env() -> Result<Self, PathError> {
        let raw = env::var_os("PATH").ok_or(PathError::EmptyPath)?;
        let raw = raw.to_str().ok_or(PathError::NotUnicode)?;
        Ok(split_paths(raw, PATH_DELIMITER)?.with_current_dir())
    }

    pub fn with_current_dir(mut self) -> Self {
        self.dirs.push(CURRENT_DIR.to_string());
        self
    }

    pub fn dirs(&self) -> &[String] {
        &self.dirs
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Full paths to try, in order, for `program`.
    ///
    /// A program name that already contains a slash is used as given.
    pub fn candidates(&self, program: &str) -> Vec<String> {
        if program.contains('/') {
            return vec![program.to_string()];
        }

        self.dirs
            .iter()
            .map(|dir| format!("{}/{}", dir, program))
            .collect()
    }
}
