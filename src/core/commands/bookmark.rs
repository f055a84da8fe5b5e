use super::{quoted_argument, Action, Command, CommandContext, CommandError};

const USAGE: &str = "usage: bookmark \"<command>\" | bookmark -l | bookmark -i <index> | bookmark -d <index>";

#[derive(Clone, Default)]
pub struct BookmarkCommand;

impl BookmarkCommand {
    pub fn new() -> Self {
        Self
    }

    fn list(&self, ctx: &mut CommandContext<'_>) -> Result<Action, CommandError> {
        if ctx.bookmarks.is_empty() {
            writeln!(ctx.out, "No bookmarks found.")?;
        }
        for (index, command) in ctx.bookmarks.list_all() {
            writeln!(ctx.out, "{} \"{}\"", index, command)?;
        }
        Ok(Action::Continue)
    }

    fn replay(&self, index: usize, ctx: &mut CommandContext<'_>) -> Result<Action, CommandError> {
        let stored = ctx.bookmarks.get_by_index(index)?;
        let line = ctx
            .tokenizer
            .tokenize_stored(stored)
            .map_err(|e| CommandError::ExecutionError(format!("bookmark {}: {}", index, e)))?;

        if is_replay(&line.args) {
            return Err(CommandError::InvalidArguments(format!(
                "bookmark {} would replay another bookmark",
                index
            )));
        }
        log::debug!("replaying bookmark {}: {:?}", index, line.args);
        Ok(Action::Replay(line))
    }

    fn insert(&self, words: &[String], ctx: &mut CommandContext<'_>) -> Result<Action, CommandError> {
        let joined = words.join(" ");
        if !is_quoted(&joined) {
            return Err(CommandError::InvalidArguments(USAGE.to_string()));
        }
        let index = ctx.bookmarks.insert(&quoted_argument(words))?;
        log::debug!("stored bookmark {}", index);
        Ok(Action::Continue)
    }
}

impl Command for BookmarkCommand {
    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<Action, CommandError> {
        match args.first().map(String::as_str) {
            Some("-l") if args.len() == 1 => self.list(ctx),
            Some("-i") if args.len() == 2 => self.replay(parse_index(&args[1])?, ctx),
            Some("-d") if args.len() == 2 => {
                let index = parse_index(&args[1])?;
                let removed = ctx.bookmarks.delete_by_index(index)?;
                log::debug!("deleted bookmark {}: {}", index, removed);
                Ok(Action::Continue)
            }
            Some(flag) if flag.starts_with('-') => Err(CommandError::InvalidArguments(USAGE.to_string())),
            Some(_) => self.insert(args, ctx),
            None => Err(CommandError::InvalidArguments(USAGE.to_string())),
        }
    }
}

fn parse_index(text: &str) -> Result<usize, CommandError> {
    text.parse()
        .map_err(|_| CommandError::InvalidArguments(format!("bookmark: `{}` is not an index", text)))
}

fn is_quoted(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
}

fn is_replay(args: &[String]) -> bool {
    matches!(args, [command, flag, ..] if command == "bookmark" && flag == "-i")
}
