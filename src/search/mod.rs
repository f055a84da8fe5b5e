//! Keyword search over source files below a directory.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_EXTENSIONS: [&str; 4] = ["c", "C", "h", "H"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub path: PathBuf,
    pub line_number: usize,
    pub line: String,
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.line_number,
            self.path.display(),
            self.line.trim()
        )
    }
}

#[derive(Debug, Clone)]
pub struct ContentSearch {
    extensions: Vec<String>,
}

impl Default for ContentSearch {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect())
    }
}

impl ContentSearch {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Lines containing `keyword` in matching files under `root`, in path order.
    pub fn search(&self, root: &Path, keyword: &str, recursive: bool) -> Vec<SearchResult> {
        let mut results = Vec::new();
        self.visit_dir(root, keyword, recursive, &mut results);
        results
    }

    fn visit_dir(&self, dir: &Path, keyword: &str, recursive: bool, results: &mut Vec<SearchResult>) {
        let mut entries: Vec<_> = match fs::read_dir(dir) {
            Ok(entries) => entries.filter_map(Result::ok).collect(),
            Err(e) => {
                log::debug!("skipping directory {}: {}", dir.display(), e);
                return;
            }
        };
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            // Symlinks are not followed.
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                if recursive {
                    self.visit_dir(&path, keyword, recursive, results);
                }
            } else if file_type.is_file() && self.matches_extension(&path) {
                self.scan_file(&path, keyword, results);
            }
        }
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }

    fn scan_file(&self, path: &Path, keyword: &str, results: &mut Vec<SearchResult>) {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!("skipping unreadable file {}: {}", path.display(), e);
                return;
            }
        };

        let content = String::from_utf8_lossy(&bytes);
        for (index, line) in content.lines().enumerate() {
            if line.contains(keyword) {
                results.push(SearchResult {
                    path: path.to_path_buf(),
                    line_number: index + 1,
                    line: line.to_string(),
                });
            }
        }
    }
}
