use std::{
    fs,
    path::{Path, PathBuf},
};

use rustyline::completion::Pair;

use crate::path::PathExpander;

/// Completes file names for arguments and redirection targets.
#[derive(Clone, Default)]
pub struct PathCompleter {
    expander: PathExpander,
}

impl PathCompleter {
    pub fn new() -> Self {
        Self {
            expander: PathExpander::new(),
        }
    }

    pub fn complete_path(&self, incomplete: &str) -> Vec<Pair> {
        let (typed_dir, file_prefix) = match incomplete.rfind('/') {
            Some(index) => incomplete.split_at(index + 1),
            None => ("", incomplete),
        };

        let Some(dir_to_search) = self.search_dir(typed_dir) else {
            return Vec::new();
        };

        let mut matches = Vec::new();
        if let Ok(entries) = fs::read_dir(&dir_to_search) {
            for entry in entries.filter_map(Result::ok) {
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                if !name.starts_with(file_prefix) {
                    continue;
                }
                // Dotfiles only when asked for.
                if name.starts_with('.') && !file_prefix.starts_with('.') {
                    continue;
                }
                matches.push(completion_pair(typed_dir, &name, &entry.path()));
            }
        }

        matches.sort_by(|a, b| a.display.cmp(&b.display));
        matches
    }

    fn search_dir(&self, typed_dir: &str) -> Option<PathBuf> {
        if typed_dir.is_empty() {
            return Some(PathBuf::from("."));
        }
        self.expander.expand(typed_dir).ok()
    }
}

fn completion_pair(typed_dir: &str, name: &str, path: &Path) -> Pair {
    let full = format!("{}{}", typed_dir, name);
    if path.is_dir() {
        Pair {
            display: format!("{}/", name),
            replacement: format!("{}/", full),
        }
    } else {
        Pair {
            display: name.to_string(),
            replacement: format!("{} ", full),
        }
    }
}
