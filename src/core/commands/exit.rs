use super::{Action, Command, CommandContext, CommandError};

/// Starts the exit protocol; the shell decides whether it may really leave.
#[derive(Clone)]
pub struct ExitCommand;

impl Default for ExitCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl ExitCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Command for ExitCommand {
    fn execute(&self, _args: &[String], _ctx: &mut CommandContext<'_>) -> Result<Action, CommandError> {
        Ok(Action::RequestExit)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::*;

    #[test]
    fn test_exit_requests_exit() {
        let mut harness = Harness::new();
        assert_eq!(harness.run("exit", &[]).ok(), Some(Action::RequestExit));
        assert_eq!(harness.run("exit", &["3"]).ok(), Some(Action::RequestExit));
    }
}
