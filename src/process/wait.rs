//! `waitpid` wrappers for foreground waits and background reaping.

use std::{fmt, io};

use libc::{c_int, WEXITSTATUS, WIFEXITED, WIFSIGNALED, WIFSTOPPED, WNOHANG, WSTOPSIG, WTERMSIG, WUNTRACED};

use super::{cerr, signal, Pid, ProcessError};

/// The raw status reported by `waitpid`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WaitStatus {
    status: c_int,
}

impl WaitStatus {
    pub const fn from_raw(status: c_int) -> Self {
        Self { status }
    }

    pub const fn exit_status(&self) -> Option<c_int> {
        if WIFEXITED(self.status) {
            Some(WEXITSTATUS(self.status))
        } else {
            None
        }
    }

    pub const fn term_signal(&self) -> Option<c_int> {
        if WIFSIGNALED(self.status) {
            Some(WTERMSIG(self.status))
        } else {
            None
        }
    }

    pub const fn stop_signal(&self) -> Option<c_int> {
        if WIFSTOPPED(self.status) {
            Some(WSTOPSIG(self.status))
        } else {
            None
        }
    }
}

impl fmt::Debug for WaitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.exit_status() {
            write!(f, "ExitStatus({code})")
        } else if let Some(sig) = self.term_signal() {
            write!(f, "TermSignal({})", signal::signal_label(sig))
        } else if let Some(sig) = self.stop_signal() {
            write!(f, "StopSignal({})", signal::signal_label(sig))
        } else {
            write!(f, "Unknown")
        }
    }
}

/// How a launched command ended, as far as the shell is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Exited(c_int),
    Signaled(c_int),
    /// The wait was cancelled by the suspend signal; the child keeps running.
    Suspended,
    /// Background launch, never waited for.
    Detached,
}

impl From<WaitStatus> for Completion {
    fn from(status: WaitStatus) -> Self {
        match (status.exit_status(), status.term_signal()) {
            (Some(code), _) => Completion::Exited(code),
            (None, Some(sig)) => Completion::Signaled(sig),
            (None, None) => Completion::Suspended,
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Exited(code) => write!(f, "exit {}", code),
            Completion::Signaled(sig) => write!(f, "killed by {}", signal::signal_label(*sig)),
            Completion::Suspended => write!(f, "wait cancelled"),
            Completion::Detached => write!(f, "running in background"),
        }
    }
}

fn waitpid(pid: Pid, flags: c_int) -> io::Result<(Pid, WaitStatus)> {
    let mut status: c_int = 0;
    let pid = cerr(unsafe { libc::waitpid(pid, &mut status, flags) })?;
    Ok((pid, WaitStatus::from_raw(status)))
}

/// Blocks until `pid` terminates, or until the armed suspend signal cancels
/// the wait. A stopped child counts as a cancelled wait and is continued.
///
/// With the wake stream installed the child is polled and the thread sleeps
/// on the stream, so a suspend that lands between the check and the sleep
/// still wakes it.
pub fn wait_foreground(pid: Pid) -> Result<Completion, ProcessError> {
    let flags = if signal::wakeups_installed() {
        WNOHANG | WUNTRACED
    } else {
        WUNTRACED
    };
    loop {
        if signal::take_suspend_request() {
            return Ok(cancel_wait(pid));
        }
        match waitpid(pid, flags) {
            Ok((0, _)) => signal::wait_for_wakeup().map_err(ProcessError::Wait)?,
            Ok((_, status)) if status.stop_signal().is_some() => {
                return Ok(cancel_wait(pid));
            }
            Ok((_, status)) => return Ok(status.into()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProcessError::Wait(e)),
        }
    }
}

fn cancel_wait(pid: Pid) -> Completion {
    signal::take_suspend_request();
    if let Err(e) = signal::continue_process(pid) {
        log::warn!("could not continue process {}: {}", pid, e);
    }
    log::info!("wait for process {} cancelled by suspend", pid);
    Completion::Suspended
}

/// Outcome of a non-blocking sweep over all children.
#[derive(Debug, Default)]
pub struct ChildSweep {
    pub reaped: Vec<(Pid, WaitStatus)>,
    pub outstanding: bool,
}

/// Reaps every child that has already terminated, without blocking, and
/// reports whether any child is still running.
pub fn sweep_children() -> io::Result<ChildSweep> {
    let mut sweep = ChildSweep::default();
    loop {
        match waitpid(-1, WNOHANG) {
            Ok((0, _)) => {
                sweep.outstanding = true;
                return Ok(sweep);
            }
            Ok((pid, status)) => sweep.reaped.push((pid, status)),
            Err(e) if e.raw_os_error() == Some(libc::ECHILD) => return Ok(sweep),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Blocking wait used to collect a child that is known to be exiting.
pub(crate) fn reap(pid: Pid) -> io::Result<WaitStatus> {
    loop {
        match waitpid(pid, 0) {
            Ok((_, status)) => return Ok(status),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
