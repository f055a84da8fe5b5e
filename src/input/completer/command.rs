use std::{collections::BTreeSet, fs};

use rustyline::completion::Pair;

use crate::path::{PathList, CURRENT_DIR};

/// Completes the first word: builtins plus executables on the search path.
#[derive(Clone, Default)]
pub struct CommandCompleter {
    commands: BTreeSet<String>,
}

impl CommandCompleter {
    pub fn new<'a>(builtins: impl IntoIterator<Item = &'a str>, paths: Option<&PathList>) -> Self {
        let mut completer = Self::default();
        completer.commands.extend(builtins.into_iter().map(String::from));
        if let Some(paths) = paths {
            completer.add_path_commands(paths);
        }
        completer
    }

    fn add_path_commands(&mut self, paths: &PathList) {
        // The working directory changes with `cd`; listing it once is misleading.
        for dir in paths.dirs().iter().filter(|dir| dir.as_str() != CURRENT_DIR) {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.filter_map(Result::ok) {
                let is_candidate = entry
                    .file_type()
                    .map(|t| t.is_file() || t.is_symlink())
                    .unwrap_or(false);
                if let (true, Some(name)) = (is_candidate, entry.file_name().to_str()) {
                    self.commands.insert(name.to_string());
                }
            }
        }
    }

    pub fn complete_command(&self, word: &str) -> Vec<Pair> {
        let input = word.trim();
        self.commands
            .range(input.to_string()..)
            .take_while(|cmd| cmd.starts_with(input))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: format!("{} ", cmd),
            })
            .collect()
    }
}
