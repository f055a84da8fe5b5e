mod completer;
mod source;

pub use completer::{CommandCompleter, PathCompleter, ShellCompleter};
pub use source::InputSource;
