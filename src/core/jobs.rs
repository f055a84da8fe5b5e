//! Foreground/background lifecycle and the exit protocol.

use std::io;

use super::state::{ExecutionMode, SessionState};
use crate::parse::CommandPlan;
use crate::process::{
    signal::{self, SuspendGuard},
    wait, Completion, Launched, Launcher, ProcessError,
};

/// Asks the user a yes/no question.
pub trait Confirm {
    /// Returns `None` when the input ended before an answer was given.
    fn ask(&mut self, question: &str) -> io::Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    /// Nothing is running; leave right away.
    Exit,
    /// Children are running and the user agreed to terminate them.
    TerminateAndExit,
    /// The user declined; stay in the REPL.
    Abort,
}

const EXIT_QUESTION: &str =
    "There are processes still running in the background. Terminate them and exit? [y/N] ";

#[derive(Debug, Clone, Copy, Default)]
pub struct JobController {
    quiet: bool,
}

impl JobController {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Reinstalls the suspend handler, reports finished background children
    /// and hands back an idle state.
    pub fn begin_iteration(&self, state: SessionState) -> Result<SessionState, ProcessError> {
        signal::install_suspend_handler()?;

        let sweep = wait::sweep_children()?;
        for (pid, status) in sweep.reaped {
            log::info!("background process {} finished: {:?}", pid, status);
            if !self.quiet {
                println!("[{}] done ({})", pid, Completion::from(status));
            }
        }

        Ok(state.reset())
    }

    /// Launches `plan` and tracks the state transitions around it.
    pub fn run(
        &self,
        state: SessionState,
        launcher: &Launcher<'_>,
        plan: &CommandPlan,
    ) -> (SessionState, Result<Completion, ProcessError>) {
        let (state, result) = if plan.background {
            let state = state.with_mode(ExecutionMode::BackgroundRunning);
            (state, launcher.launch(plan))
        } else {
            let state = state.with_mode(ExecutionMode::ForegroundRunning);
            let armed = SuspendGuard::arm();
            let result = launcher.launch(plan);
            drop(armed);
            (state, result)
        };

        match result {
            Ok(Launched { handle, completion }) => {
                match completion {
                    Completion::Detached if !self.quiet => println!("[{}]", handle.pid()),
                    Completion::Suspended if !self.quiet => {
                        println!("\n[{}] still running, back to the prompt", handle.pid())
                    }
                    _ => {}
                }
                (state.finished(handle, completion), Ok(completion))
            }
            Err(e) => (state.reset(), Err(e)),
        }
    }

    /// Decides whether the shell may exit now.
    pub fn request_exit(&self, confirm: &mut dyn Confirm) -> Result<ExitDecision, ProcessError> {
        let sweep = wait::sweep_children()?;
        if !sweep.outstanding {
            log::info!("exit requested with no outstanding children");
            return Ok(ExitDecision::Exit);
        }

        let answer = confirm.ask(EXIT_QUESTION)?;
        let decision = match answer.as_deref().map(str::trim) {
            Some(answer) if is_affirmative(answer) => ExitDecision::TerminateAndExit,
            _ => ExitDecision::Abort,
        };
        log::info!("exit with outstanding children: {:?}", decision);
        Ok(decision)
    }
}

fn is_affirmative(answer: &str) -> bool {
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{plan_line, RawLine, Tokenizer};
    use crate::path::PathList;
    use crate::process::test_lock;
    use std::collections::VecDeque;

    struct Scripted {
        answers: VecDeque<&'static str>,
        asked: usize,
    }

    impl Scripted {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: 0,
            }
        }
    }

    impl Confirm for Scripted {
        fn ask(&mut self, _question: &str) -> io::Result<Option<String>> {
            self.asked += 1;
            Ok(self.answers.pop_front().map(str::to_string))
        }
    }

    fn plan(text: &str) -> CommandPlan {
        let line = Tokenizer::default()
            .tokenize(&RawLine::new(format!("{}\n", text)))
            .expect("tokenize");
        plan_line(line).expect("plan")
    }

    fn drain_children() {
        while wait::sweep_children().map(|s| s.outstanding).unwrap_or(false) {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
    }

    #[test]
    fn test_affirmative_answers() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative("YES"));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("maybe"));
    }

    #[test]
    fn test_exit_without_children() -> Result<(), ProcessError> {
        let _lock = test_lock();
        drain_children();
        let mut confirm = Scripted::new(&[]);
        let decision = JobController::new(true).request_exit(&mut confirm)?;
        assert_eq!(decision, ExitDecision::Exit);
        assert_eq!(confirm.asked, 0);
        Ok(())
    }

    #[test]
    fn test_background_then_exit_protocol() -> Result<(), ProcessError> {
        let _lock = test_lock();
        drain_children();
        let paths = PathList::from_env().expect("PATH");
        let launcher = Launcher::new(&paths);
        let jobs = JobController::new(true);

        let state = jobs.begin_iteration(SessionState::new())?;
        let (state, result) = jobs.run(state, &launcher, &plan("sleep 5 &"));
        assert_eq!(result?, Completion::Detached);
        assert_eq!(state.mode(), ExecutionMode::Idle);
        let handle = state.last_process().expect("handle");
        assert!(handle.is_background());

        let mut declined = Scripted::new(&["n"]);
        assert_eq!(jobs.request_exit(&mut declined)?, ExitDecision::Abort);
        assert_eq!(declined.asked, 1);

        let mut garbled = Scripted::new(&["whatever"]);
        assert_eq!(jobs.request_exit(&mut garbled)?, ExitDecision::Abort);

        let mut closed = Scripted::new(&[]);
        assert_eq!(jobs.request_exit(&mut closed)?, ExitDecision::Abort);

        let mut accepted = Scripted::new(&["y"]);
        assert_eq!(
            jobs.request_exit(&mut accepted)?,
            ExitDecision::TerminateAndExit
        );

        unsafe { libc::kill(handle.pid(), libc::SIGKILL) };
        wait::reap(handle.pid())?;
        Ok(())
    }

    #[test]
    fn test_foreground_run_returns_to_idle() -> Result<(), ProcessError> {
        let _lock = test_lock();
        let paths = PathList::from_env().expect("PATH");
        let launcher = Launcher::new(&paths);
        let jobs = JobController::new(true);

        let (state, result) = jobs.run(SessionState::new(), &launcher, &plan("true"));
        assert_eq!(result?, Completion::Exited(0));
        assert_eq!(state.mode(), ExecutionMode::Idle);
        assert_eq!(state.last_completion(), Some(Completion::Exited(0)));
        assert!(!state.last_process().expect("handle").is_background());
        Ok(())
    }

    #[test]
    fn test_failed_launch_keeps_shell_idle() {
        let _lock = test_lock();
        let paths = PathList::from_env().expect("PATH");
        let launcher = Launcher::new(&paths);
        let jobs = JobController::new(true);

        let (state, result) = jobs.run(
            SessionState::new(),
            &launcher,
            &plan("no-such-command-for-myshell"),
        );
        assert!(matches!(result, Err(ProcessError::Resolution { .. })));
        assert_eq!(state.mode(), ExecutionMode::Idle);
        assert!(state.last_process().is_none());
    }

    #[test]
    fn test_begin_iteration_reaps_finished_background() -> Result<(), ProcessError> {
        let _lock = test_lock();
        drain_children();
        let paths = PathList::from_env().expect("PATH");
        let launcher = Launcher::new(&paths);
        let jobs = JobController::new(true);

        let (state, result) = jobs.run(SessionState::new(), &launcher, &plan("true &"));
        assert_eq!(result?, Completion::Detached);
        std::thread::sleep(std::time::Duration::from_millis(200));

        let state = jobs.begin_iteration(state)?;
        assert_eq!(state.mode(), ExecutionMode::Idle);
        assert!(!wait::sweep_children()?.outstanding);
        Ok(())
    }
}
