//! Index-addressed store of command lines the user wants to replay.

mod file_ops;

use std::{fmt, io, path::PathBuf};

use self::file_ops::FileOps;

#[derive(Debug)]
pub enum BookmarkError {
    NotFound(usize),
    EmptyCommand,
    Io(io::Error),
}

impl fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkError::NotFound(index) => write!(f, "no bookmark at index {}", index),
            BookmarkError::EmptyCommand => write!(f, "cannot bookmark an empty command"),
            BookmarkError::Io(e) => write!(f, "bookmark file error: {}", e),
        }
    }
}

impl std::error::Error for BookmarkError {}

impl From<io::Error> for BookmarkError {
    fn from(err: io::Error) -> Self {
        BookmarkError::Io(err)
    }
}

pub struct BookmarkStore {
    entries: Vec<String>,
    file_ops: Option<FileOps>,
}

impl BookmarkStore {
    /// Store backed by `file`; existing bookmarks are loaded from it.
    pub fn open(file: PathBuf) -> Result<Self, BookmarkError> {
        let file_ops = FileOps::new(file);
        let entries = file_ops.load_entries()?;
        log::debug!(
            "loaded {} bookmarks from {}",
            entries.len(),
            file_ops.path().display()
        );

        Ok(Self {
            entries,
            file_ops: Some(file_ops),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            entries: Vec::new(),
            file_ops: None,
        }
    }

    pub fn insert(&mut self, command_line: &str) -> Result<usize, BookmarkError> {
        let command_line = command_line.trim();
        if command_line.is_empty() {
            return Err(BookmarkError::EmptyCommand);
        }

        self.entries.push(command_line.to_string());
        self.persist()?;
        Ok(self.entries.len() - 1)
    }

    /// Removes bookmark `index`; later bookmarks move down by one.
    pub fn delete_by_index(&mut self, index: usize) -> Result<String, BookmarkError> {
        if index >= self.entries.len() {
            return Err(BookmarkError::NotFound(index));
        }

        let removed = self.entries.remove(index);
        self.persist()?;
        Ok(removed)
    }

    pub fn list_all(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.entries.iter().map(String::as_str).enumerate()
    }

    pub fn get_by_index(&self, index: usize) -> Result<&str, BookmarkError> {
        self.entries
            .get(index)
            .map(String::as_str)
            .ok_or(BookmarkError::NotFound(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> Result<(), BookmarkError> {
        match &self.file_ops {
            Some(file_ops) => file_ops.store_entries(&self.entries),
            None => Ok(()),
        }
    }
}
