mod expander;
mod resolver;

pub use expander::PathExpander;
pub use resolver::{split_paths, PathList, CURRENT_DIR, PATH_DELIMITER};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    EmptyPath,
    NotUnicode,
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::EmptyPath => write!(f, "no search path configured (PATH is empty)"),
            PathError::NotUnicode => write!(f, "PATH is not valid unicode"),
            PathError::HomeDirNotFound => write!(f, "Home directory not found"),
        }
    }
}

impl std::error::Error for PathError {}
