use std::ffi::CString;
use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;

use libc::c_char;

use super::{cerr, wait, Completion, Pid, ProcessError, RedirectGuard};
use crate::parse::CommandPlan;
use crate::path::PathList;

/// Exit status of a child that found no executable candidate.
pub const EXIT_NOT_FOUND: libc::c_int = 127;

/// Identity of a spawned child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pid: Pid,
    background: bool,
}

impl ProcessHandle {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn is_background(&self) -> bool {
        self.background
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Launched {
    pub handle: ProcessHandle,
    pub completion: Completion,
}

/// Creates child processes for planned commands.
#[derive(Debug, Clone, Copy)]
pub struct Launcher<'a> {
    paths: &'a PathList,
}

impl<'a> Launcher<'a> {
    pub fn new(paths: &'a PathList) -> Self {
        Self { paths }
    }

    /// Runs `plan`: installs its redirection, forks, restores the shell's
    /// streams, then waits unless the plan is a background one.
    pub fn launch(&self, plan: &CommandPlan) -> Result<Launched, ProcessError> {
        let program = plan.args.first().ok_or(ProcessError::EmptyCommand)?;
        let candidates = self
            .paths
            .candidates(program)
            .into_iter()
            .map(to_cstring)
            .collect::<Result<Vec<_>, _>>()?;
        let args = plan.args[1..]
            .iter()
            .cloned()
            .map(to_cstring)
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "launching {:?} ({} candidates, background: {})",
            plan.args,
            candidates.len(),
            plan.background
        );

        let redirect = RedirectGuard::install(&plan.redirection)?;
        let spawned = spawn(program, &candidates, &args);
        drop(redirect);
        let pid = spawned?;

        let handle = ProcessHandle {
            pid,
            background: plan.background,
        };
        let completion = if plan.background {
            Completion::Detached
        } else {
            wait::wait_foreground(pid)?
        };

        Ok(Launched { handle, completion })
    }
}

fn to_cstring(arg: String) -> Result<CString, ProcessError> {
    CString::new(arg).map_err(|e| {
        ProcessError::InvalidArgument(String::from_utf8_lossy(&e.into_vec()).into_owned())
    })
}

/// Forks and tries every candidate path in the child. Returns once the child
/// has replaced its image, or with `Resolution` if no candidate worked.
fn spawn(program: &str, candidates: &[CString], args: &[CString]) -> Result<Pid, ProcessError> {
    // Closed on exec, so a read of zero bytes means the exec succeeded.
    let (mut errpipe_tx, mut errpipe_rx) = UnixStream::pair().map_err(ProcessError::Fork)?;

    // Everything the child touches is allocated before the fork.
    let mut argv: Vec<*const c_char> = Vec::with_capacity(args.len() + 2);
    argv.push(std::ptr::null());
    argv.extend(args.iter().map(|arg| arg.as_ptr()));
    argv.push(std::ptr::null());

    io::stdout().flush().ok();
    let pid = cerr(unsafe { libc::fork() }).map_err(ProcessError::Fork)?;

    if pid == 0 {
        drop(errpipe_rx);
        let mut error_code = libc::ENOENT;
        for candidate in candidates {
            argv[0] = candidate.as_ptr();
            unsafe { libc::execv(candidate.as_ptr(), argv.as_ptr()) };
            match io::Error::last_os_error().raw_os_error() {
                Some(libc::ENOENT) | Some(libc::ENOTDIR) | None => {}
                Some(code) => error_code = code,
            }
        }
        errpipe_tx.write_all(&error_code.to_ne_bytes()).ok();
        unsafe { libc::_exit(EXIT_NOT_FOUND) }
    }

    drop(errpipe_tx);
    log::debug!("forked {} as pid {}", program, pid);

    match read_exec_error(&mut errpipe_rx) {
        Ok(None) => Ok(pid),
        Ok(Some(code)) => {
            if let Err(e) = wait::reap(pid) {
                log::warn!("could not reap failed child {}: {}", pid, e);
            }
            Err(ProcessError::Resolution {
                command: program.to_string(),
                source: io::Error::from_raw_os_error(code),
            })
        }
        Err(e) => {
            log::warn!("could not read exec status of {}: {}", pid, e);
            Ok(pid)
        }
    }
}

fn read_exec_error(errpipe_rx: &mut UnixStream) -> io::Result<Option<libc::c_int>> {
    let mut buf = [0u8; std::mem::size_of::<libc::c_int>()];
    let mut filled = 0;
    while filled < buf.len() {
        match errpipe_rx.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    match filled {
        0 => Ok(None),
        n if n == buf.len() => Ok(Some(libc::c_int::from_ne_bytes(buf))),
        _ => Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{plan_line, RawLine, Tokenizer};
    use crate::process::{signal, test_lock};
    use std::fs;
    use std::time::{Duration, Instant};

    fn plan(text: &str) -> CommandPlan {
        let line = Tokenizer::new(4096, 64)
            .tokenize(&RawLine::new(format!("{}\n", text)))
            .expect("tokenize");
        plan_line(line).expect("plan")
    }

    fn paths() -> PathList {
        PathList::from_env().expect("PATH must be set for tests")
    }

    #[test]
    fn test_redirect_to_file() -> Result<(), ProcessError> {
        let _lock = test_lock();
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("out.txt");
        let paths = paths();

        let launched =
            Launcher::new(&paths).launch(&plan(&format!("echo hello > {}", out.display())))?;
        assert_eq!(launched.completion, Completion::Exited(0));
        assert!(!launched.handle.is_background());
        assert_eq!(fs::read_to_string(&out)?, "hello\n");
        Ok(())
    }

    #[test]
    fn test_append_keeps_previous_output() -> Result<(), ProcessError> {
        let _lock = test_lock();
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("log.txt");
        let paths = paths();
        let launcher = Launcher::new(&paths);

        launcher.launch(&plan(&format!("echo one >> {}", out.display())))?;
        launcher.launch(&plan(&format!("echo two >> {}", out.display())))?;
        assert_eq!(fs::read_to_string(&out)?, "one\ntwo\n");

        launcher.launch(&plan(&format!("echo three > {}", out.display())))?;
        assert_eq!(fs::read_to_string(&out)?, "three\n");
        Ok(())
    }

    #[test]
    fn test_error_redirection_uses_output_slot() -> Result<(), ProcessError> {
        let _lock = test_lock();
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("err.txt");
        let paths = paths();

        Launcher::new(&paths).launch(&plan(&format!("echo routed 2> {}", out.display())))?;
        assert_eq!(fs::read_to_string(&out)?, "routed\n");
        Ok(())
    }

    #[test]
    fn test_input_redirection() -> Result<(), ProcessError> {
        let _lock = test_lock();
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("in.txt");
        fs::write(&input, "haystack\nneedle\n")?;
        let paths = paths();
        let launcher = Launcher::new(&paths);

        let found = launcher.launch(&plan(&format!("grep -q needle < {}", input.display())))?;
        assert_eq!(found.completion, Completion::Exited(0));

        let missing = launcher.launch(&plan(&format!("grep -q pin < {}", input.display())))?;
        assert_eq!(missing.completion, Completion::Exited(1));
        Ok(())
    }

    #[test]
    fn test_missing_input_file_launches_nothing() {
        let _lock = test_lock();
        let paths = paths();
        let result = Launcher::new(&paths).launch(&plan("cat < /definitely/not/here.txt"));
        assert!(matches!(result, Err(ProcessError::RedirectionIo { .. })));
    }

    #[test]
    fn test_unknown_command() {
        let _lock = test_lock();
        let paths = paths();
        let result = Launcher::new(&paths).launch(&plan("no-such-command-for-myshell --flag"));
        match result {
            Err(ProcessError::Resolution { command, source }) => {
                assert_eq!(command, "no-such-command-for-myshell");
                assert_eq!(source.raw_os_error(), Some(libc::ENOENT));
            }
            other => panic!("expected resolution error, got {:?}", other),
        }
    }

    #[test]
    fn test_absolute_program_path() -> Result<(), ProcessError> {
        let _lock = test_lock();
        let paths = paths();
        let launched = Launcher::new(&paths).launch(&plan("/bin/sh -c true"))?;
        assert_eq!(launched.completion, Completion::Exited(0));
        Ok(())
    }

    #[test]
    fn test_nonzero_exit_status() -> Result<(), ProcessError> {
        let _lock = test_lock();
        let paths = paths();
        let launched = Launcher::new(&paths).launch(&plan("false"))?;
        assert_eq!(launched.completion, Completion::Exited(1));
        Ok(())
    }

    #[test]
    fn test_background_returns_immediately() -> Result<(), ProcessError> {
        let _lock = test_lock();
        let paths = paths();
        let start = Instant::now();
        let launched = Launcher::new(&paths).launch(&plan("sleep 2 &"))?;
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(launched.completion, Completion::Detached);
        assert!(launched.handle.is_background());

        unsafe { libc::kill(launched.handle.pid(), libc::SIGKILL) };
        wait::reap(launched.handle.pid())?;
        Ok(())
    }

    #[test]
    fn test_suspend_cancels_foreground_wait() -> Result<(), ProcessError> {
        let _lock = test_lock();
        signal::install_suspend_handler()?;
        let paths = paths();
        let waiter = unsafe { libc::pthread_self() };
        let notifier = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            unsafe { libc::pthread_kill(waiter, libc::SIGTSTP) };
        });

        let start = Instant::now();
        let guard = signal::SuspendGuard::arm();
        let launched = Launcher::new(&paths).launch(&plan("sleep 5"))?;
        drop(guard);
        let _ = notifier.join();

        assert_eq!(launched.completion, Completion::Suspended);
        assert!(start.elapsed() < Duration::from_secs(4));

        unsafe { libc::kill(launched.handle.pid(), libc::SIGKILL) };
        wait::reap(launched.handle.pid())?;
        Ok(())
    }

    #[test]
    fn test_suspend_handled_off_the_waiting_thread() -> Result<(), ProcessError> {
        let _lock = test_lock();
        signal::install_suspend_handler()?;
        let paths = paths();
        // The waiter never sees EINTR here; only the wake stream can end its sleep.
        let notifier = std::thread::spawn(|| {
            std::thread::sleep(Duration::from_millis(200));
            unsafe { libc::pthread_kill(libc::pthread_self(), libc::SIGTSTP) };
        });

        let start = Instant::now();
        let guard = signal::SuspendGuard::arm();
        let launched = Launcher::new(&paths).launch(&plan("sleep 5"))?;
        drop(guard);
        let _ = notifier.join();

        assert_eq!(launched.completion, Completion::Suspended);
        assert!(start.elapsed() < Duration::from_secs(4));

        unsafe { libc::kill(launched.handle.pid(), libc::SIGKILL) };
        wait::reap(launched.handle.pid())?;
        Ok(())
    }

    #[test]
    fn test_read_exec_error() -> io::Result<()> {
        let (mut tx, mut rx) = UnixStream::pair()?;
        tx.write_all(&libc::EACCES.to_ne_bytes())?;
        drop(tx);
        assert_eq!(read_exec_error(&mut rx)?, Some(libc::EACCES));

        let (tx, mut rx) = UnixStream::pair()?;
        drop(tx);
        assert_eq!(read_exec_error(&mut rx)?, None);
        Ok(())
    }
}
