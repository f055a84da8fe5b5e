use std::io;

use super::{Shell, Step};
use crate::core::commands::{Action, CommandContext, CommandError};
use crate::core::jobs::ExitDecision;
use crate::core::state::SessionState;
use crate::error::ShellError;
use crate::parse::{plan_line, CommandLine};
use crate::path::PathList;
use crate::process::{signal, Launcher};

pub(crate) trait CommandHandler {
    /// Runs one tokenized line. `allow_replay` is false for a line that is
    /// itself a replayed bookmark.
    fn execute_line(&mut self, state: SessionState, line: CommandLine, allow_replay: bool) -> Step;
}

impl CommandHandler for Shell {
    fn execute_line(&mut self, state: SessionState, line: CommandLine, allow_replay: bool) -> Step {
        let Some(program) = line.program() else {
            return Step::Continue(state);
        };

        if self.builtins.is_builtin(program) {
            return match run_builtin(self, &line) {
                Ok(Action::Continue) => Step::Continue(state),
                Ok(Action::Replay(replayed)) if allow_replay => {
                    self.execute_line(state, replayed, false)
                }
                Ok(Action::Replay(_)) => {
                    self.report(&CommandError::InvalidArguments(
                        "a replayed bookmark cannot replay another".to_string(),
                    ));
                    Step::Continue(state)
                }
                Ok(Action::RequestExit) => exit_protocol(self, state),
                Err(e) => {
                    self.report(&e);
                    Step::Continue(state)
                }
            };
        }

        match launch(self, state, line) {
            (state, Ok(())) => Step::Continue(state),
            (state, Err(e)) => {
                self.report(&e);
                Step::Continue(state)
            }
        }
    }
}

fn run_builtin(shell: &mut Shell, line: &CommandLine) -> Result<Action, CommandError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut ctx = CommandContext {
        bookmarks: &mut shell.bookmarks,
        search: &shell.search,
        tokenizer: &shell.tokenizer,
        out: &mut out,
    };
    shell
        .builtins
        .execute(&line.args[0], &line.args[1..], &mut ctx)
        .unwrap_or(Ok(Action::Continue))
}

fn launch(
    shell: &mut Shell,
    state: SessionState,
    line: CommandLine,
) -> (SessionState, Result<(), ShellError>) {
    // PATH is read fresh for every command.
    let paths = match PathList::from_env() {
        Ok(paths) => paths,
        Err(e) => return (state, Err(e.into())),
    };
    let plan = match plan_line(line) {
        Ok(plan) => plan,
        Err(e) => return (state, Err(e.into())),
    };
    log::debug!("redirection: {:?}", plan.redirection);

    let launcher = Launcher::new(&paths);
    let (state, result) = shell.jobs.run(state, &launcher, &plan);
    (state, result.map(|_| ()).map_err(ShellError::from))
}

fn exit_protocol(shell: &mut Shell, state: SessionState) -> Step {
    match shell.jobs.request_exit(&mut shell.input) {
        Ok(ExitDecision::Exit) => Step::Exit(0),
        Ok(ExitDecision::TerminateAndExit) => {
            if let Err(e) = signal::broadcast_terminate() {
                shell.report(&e);
            }
            Step::Exit(0)
        }
        Ok(ExitDecision::Abort) => Step::Continue(state),
        Err(e) => {
            shell.report(&e);
            Step::Continue(state)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::BookmarkStore;
    use crate::core::config::Config;
    use crate::input::InputSource;
    use crate::process::{test_lock, wait, ProcessError};
    use libc::c_int;
    use std::cell::RefCell;
    use std::fs;
    use std::io::{Cursor, Write};
    use std::panic;
    use std::rc::Rc;

    fn shell(script: String) -> Shell {
        // Temporary paths can be longer than an interactive line.
        let config = Config {
            max_line: 4096,
            ..Config::default()
        };
        Shell::with_parts(
            config,
            InputSource::piped(Cursor::new(script)),
            BookmarkStore::in_memory(),
            true,
        )
    }

    /// Collects what the shell writes as diagnostics.
    #[derive(Clone, Default)]
    struct Sink(Rc<RefCell<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Sink {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    fn drain_children() {
        while wait::sweep_children().map(|s| s.outstanding).unwrap_or(false) {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
    }

    #[test]
    fn test_redirect_then_end_of_input() -> Result<(), ShellError> {
        let _lock = test_lock();
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("out.txt");

        let mut shell = shell(format!("echo hello > {}\n", out.display()));
        assert_eq!(shell.run(), 0);
        assert_eq!(fs::read_to_string(&out)?, "hello\n");
        Ok(())
    }

    #[test]
    fn test_failures_do_not_end_the_session() -> Result<(), ShellError> {
        let _lock = test_lock();
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("after.txt");
        let script = format!(
            "no-such-command-for-myshell\ncat <\necho a & b\ncat < /definitely/missing\necho ok > {}\n",
            out.display()
        );

        let mut shell = shell(script);
        let mut state = SessionState::new();
        for _ in 0..5 {
            match shell.iterate(state) {
                Step::Continue(next) => state = next,
                Step::Exit(code) => panic!("session ended early with {}", code),
            }
        }
        assert_eq!(shell.iterate(state), Step::Exit(0));
        assert_eq!(fs::read_to_string(&out)?, "ok\n");
        Ok(())
    }

    #[test]
    fn test_quiet_shell_still_reports_failures() {
        let _lock = test_lock();
        let sink = Sink::default();
        let mut shell = shell(
            "no-such-command-for-myshell\ncat < /definitely/missing\n".to_string(),
        )
        .with_diagnostics(Box::new(sink.clone()));
        assert_eq!(shell.run(), 0);

        let text = sink.text();
        assert!(text.contains("myshell: no-such-command-for-myshell: command not found"), "{}", text);
        assert!(text.contains("cannot redirect"), "{}", text);
        assert_eq!(text.lines().count(), 2);
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_bookmark_replay_runs_like_typed_line() -> Result<(), ShellError> {
        let _lock = test_lock();
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("marked.txt");
        let script = format!(
            "bookmark \"echo marked >> {}\"\nbookmark -i 0\nbookmark -i 0\n",
            out.display()
        );

        let mut shell = shell(script);
        assert_eq!(shell.run(), 0);
        assert_eq!(fs::read_to_string(&out)?, "marked\nmarked\n");
        assert_eq!(shell.bookmarks.len(), 1);
        Ok(())
    }

    #[test]
    fn test_exit_without_children() {
        let _lock = test_lock();
        drain_children();
        let mut shell = shell("exit\necho never\n".to_string());
        assert_eq!(shell.iterate(SessionState::new()), Step::Exit(0));
    }

    #[test]
    fn test_declined_exit_returns_to_prompt() -> Result<(), ProcessError> {
        let _lock = test_lock();
        drain_children();
        let mut shell = shell("sleep 5 &\nexit\nn\n".to_string());

        let Step::Continue(state) = shell.iterate(SessionState::new()) else {
            panic!("background launch ended the session");
        };
        let handle = state.last_process().expect("background handle");
        assert!(handle.is_background());

        let after_exit = shell.iterate(state);
        assert!(matches!(after_exit, Step::Continue(_)));
        if let Step::Continue(state) = after_exit {
            assert_eq!(shell.iterate(state), Step::Exit(0));
        }

        unsafe { libc::kill(handle.pid(), libc::SIGKILL) };
        wait::reap(handle.pid())?;
        Ok(())
    }

    /// Runs inside a forked child that leads its own process group, so the
    /// broadcast reaches only the shell and its background job.
    fn confirmed_exit_in_own_group() -> c_int {
        if unsafe { libc::setpgid(0, 0) } != 0 {
            return 1;
        }
        let mut shell = shell("sleep 30 &\nexit\ny\n".to_string());
        let Step::Continue(state) = shell.iterate(SessionState::new()) else {
            return 2;
        };
        let Some(handle) = state.last_process() else {
            return 3;
        };
        if shell.iterate(state) != Step::Exit(0) {
            return 4;
        }
        match wait::reap(handle.pid()) {
            Ok(status) if status.term_signal() == Some(libc::SIGTERM) => 0,
            Ok(_) => 5,
            Err(_) => 6,
        }
    }

    #[test]
    fn test_confirmed_exit_terminates_background_jobs() -> Result<(), ProcessError> {
        let _lock = test_lock();
        drain_children();

        let pid = unsafe { libc::fork() };
        assert!(pid >= 0, "fork failed");
        if pid == 0 {
            let code = panic::catch_unwind(confirmed_exit_in_own_group).unwrap_or(7);
            unsafe { libc::_exit(code) };
        }

        let status = wait::reap(pid).map_err(ProcessError::Wait)?;
        assert_eq!(status.exit_status(), Some(0), "{:?}", status);
        Ok(())
    }
}
