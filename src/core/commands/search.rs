use std::env;
use std::path::Path;

use super::{quoted_argument, Action, Command, CommandContext, CommandError};

const USAGE: &str = "usage: search [-r] \"<keyword>\"";

/// `search [-r] "<keyword>"` over the working directory.
#[derive(Clone, Default)]
pub struct SearchCommand;

impl SearchCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Command for SearchCommand {
    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<Action, CommandError> {
        let (recursive, words) = match args.first().map(String::as_str) {
            Some("-r") => (true, &args[1..]),
            _ => (false, args),
        };

        let keyword = quoted_argument(words);
        if keyword.is_empty() {
            return Err(CommandError::InvalidArguments(USAGE.to_string()));
        }

        let root = env::current_dir()?;
        let results = ctx.search.search(&root, &keyword, recursive);
        log::debug!("search {:?} found {} matches", keyword, results.len());

        for mut result in results {
            if let Ok(relative) = result.path.strip_prefix(&root) {
                result.path = Path::new(".").join(relative);
            }
            writeln!(ctx.out, "{}", result)?;
        }
        Ok(Action::Continue)
    }
}
