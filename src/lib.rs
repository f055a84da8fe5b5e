pub mod error;
pub mod flags;
pub mod logging;
pub mod shell;

pub mod bookmark;
pub mod core;
pub mod highlight;
pub mod input;
pub mod parse;
pub mod path;
pub mod process;
pub mod search;
