use std::{fmt, io};

mod fd;
mod launcher;
pub mod signal;
pub mod wait;

pub use fd::{RedirectGuard, StdStream};
pub use launcher::{Launched, Launcher, ProcessHandle, EXIT_NOT_FOUND};
pub use wait::{Completion, WaitStatus};

pub type Pid = libc::pid_t;

#[derive(Debug)]
pub enum ProcessError {
    Fork(io::Error),
    Resolution { command: String, source: io::Error },
    RedirectionIo { target: String, source: io::Error },
    Wait(io::Error),
    SignalError(String),
    InvalidArgument(String),
    EmptyCommand,
    Io(io::Error),
}

impl From<io::Error> for ProcessError {
    fn from(e: io::Error) -> Self {
        ProcessError::Io(e)
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Fork(e) => write!(f, "failed to create process: {}", e),
            ProcessError::Resolution { command, source } => {
                write!(f, "{}: command not found ({})", command, source)
            }
            ProcessError::RedirectionIo { target, source } => {
                write!(f, "cannot redirect to {}: {}", target, source)
            }
            ProcessError::Wait(e) => write!(f, "failed to wait for process: {}", e),
            ProcessError::SignalError(msg) => write!(f, "Signal error: {}", msg),
            ProcessError::InvalidArgument(arg) => {
                write!(f, "argument contains a NUL byte: {:?}", arg)
            }
            ProcessError::EmptyCommand => write!(f, "empty command"),
            ProcessError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ProcessError {}

/// Maps the `-1` failure convention of libc calls onto `io::Error`.
pub(crate) fn cerr<Int: Copy + TryInto<libc::c_long>>(res: Int) -> io::Result<Int> {
    match res.try_into() {
        Ok(-1) => Err(io::Error::last_os_error()),
        _ => Ok(res),
    }
}

/// Serializes tests that touch the descriptor table, signal dispositions or
/// reap arbitrary children.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
