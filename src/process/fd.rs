use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    os::{
        fd::{AsRawFd, BorrowedFd, OwnedFd, RawFd},
        unix::fs::OpenOptionsExt,
    },
};

use super::{cerr, ProcessError};
use crate::parse::Redirection;
use crate::path::PathExpander;

const CREATE_MODE: u32 = 0o644;

/// Standard stream slot a redirection is installed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Input,
    Output,
}

impl StdStream {
    pub fn raw_fd(self) -> RawFd {
        match self {
            StdStream::Input => libc::STDIN_FILENO,
            StdStream::Output => libc::STDOUT_FILENO,
        }
    }

    /// `2>` lands on the output slot, not on stderr.
    pub fn for_redirection(redirection: &Redirection) -> Option<Self> {
        match redirection {
            Redirection::None => None,
            Redirection::StdinRead(_) => Some(StdStream::Input),
            Redirection::StdoutTruncate(_)
            | Redirection::StdoutAppend(_)
            | Redirection::StderrAppend(_) => Some(StdStream::Output),
        }
    }
}

/// Holds the shell's own descriptor for a stream while a redirection target
/// occupies its slot. Dropping the guard puts the original back.
#[derive(Debug)]
pub struct RedirectGuard {
    stream: StdStream,
    saved: OwnedFd,
}

impl RedirectGuard {
    /// Opens the target and installs it. Returns `None` for `Redirection::None`.
    ///
    /// Nothing in the descriptor table changes unless every step succeeds.
    pub fn install(redirection: &Redirection) -> Result<Option<Self>, ProcessError> {
        let (Some(stream), Some(target)) =
            (StdStream::for_redirection(redirection), redirection.target())
        else {
            return Ok(None);
        };

        let file = open_target(redirection, target).map_err(|source| {
            ProcessError::RedirectionIo {
                target: target.to_string(),
                source,
            }
        })?;

        if stream == StdStream::Output {
            io::stdout().flush().ok();
        }

        // SAFETY: the standard stream descriptors stay open for the lifetime of the shell.
        let saved = unsafe { BorrowedFd::borrow_raw(stream.raw_fd()) }.try_clone_to_owned()?;

        cerr(unsafe { libc::dup2(file.as_raw_fd(), stream.raw_fd()) })?;
        log::debug!(
            "installed {} {} on fd {} (saved as fd {})",
            redirection.operator().unwrap_or_default(),
            target,
            stream.raw_fd(),
            saved.as_raw_fd()
        );

        Ok(Some(Self { stream, saved }))
    }
}

impl Drop for RedirectGuard {
    fn drop(&mut self) {
        if self.stream == StdStream::Output {
            io::stdout().flush().ok();
        }
        if let Err(e) = cerr(unsafe { libc::dup2(self.saved.as_raw_fd(), self.stream.raw_fd()) })
        {
            log::error!("failed to restore fd {}: {}", self.stream.raw_fd(), e);
        }
    }
}

fn open_target(redirection: &Redirection, target: &str) -> io::Result<File> {
    let path = PathExpander::new()
        .expand(target)
        .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e.to_string()))?;

    let mut options = OpenOptions::new();
    match redirection {
        Redirection::StdinRead(_) => options.read(true),
        Redirection::StdoutTruncate(_) => options.write(true).create(true).truncate(true),
        Redirection::StdoutAppend(_) | Redirection::StderrAppend(_) => {
            options.append(true).create(true)
        }
        Redirection::None => return Err(io::Error::from(io::ErrorKind::InvalidInput)),
    };
    options.mode(CREATE_MODE).open(path)
}
