use crate::process::{Completion, ProcessHandle};

/// What the shell is doing with the command it launched last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Idle,
    ForegroundRunning,
    BackgroundRunning,
}

/// Session state carried from one REPL iteration into the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    mode: ExecutionMode,
    last_process: Option<ProcessHandle>,
    last_completion: Option<Completion>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh state for the next iteration; the last process is remembered.
    pub fn reset(self) -> Self {
        Self {
            mode: ExecutionMode::Idle,
            ..self
        }
    }

    pub fn with_mode(self, mode: ExecutionMode) -> Self {
        Self { mode, ..self }
    }

    pub fn finished(self, handle: ProcessHandle, completion: Completion) -> Self {
        Self {
            mode: ExecutionMode::Idle,
            last_process: Some(handle),
            last_completion: Some(completion),
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn last_process(&self) -> Option<ProcessHandle> {
        self.last_process
    }

    pub fn last_completion(&self) -> Option<Completion> {
        self.last_completion
    }
}
